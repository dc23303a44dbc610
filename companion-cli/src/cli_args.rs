use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use companion_pipeline::RunOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "companion",
    version,
    about = "Run prompt recipes against a local model with PII guardrails"
)]
pub struct Cli {
    /// Config file (default: $COMPANION_CONFIG, then ./companion.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a recipe on some text.
    Run(RunArgs),
    /// List registered recipes.
    Recipes(RecipesArgs),
    /// Show what would be redacted, without calling the model.
    Scan(ScanArgs),
}

/// Where to read input text from. Stdin when neither is given.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Read input from a file.
    #[arg(long, value_name = "FILE", conflicts_with = "text")]
    pub input: Option<PathBuf>,

    /// Use this text as input.
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Recipe id, e.g. summary, action_items, brainstorm.
    #[arg(short, long)]
    pub recipe: String,

    #[command(flatten)]
    pub source: InputArgs,

    /// Use this model instead of the recipe's profile.
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_name = "N")]
    pub max_new_length: Option<u32>,

    /// Force greedy decoding.
    #[arg(long, conflicts_with = "sampling")]
    pub deterministic: bool,

    /// Force sampling.
    #[arg(long)]
    pub sampling: bool,

    #[arg(long)]
    pub temperature: Option<f32>,

    /// Lower the output character limit for this run.
    #[arg(long, value_name = "N")]
    pub max_chars: Option<usize>,

    /// Extra template variable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Append a redacted run event to this JSON file.
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,
}

impl RunArgs {
    pub fn overrides(&self) -> RunOverrides {
        let deterministic = if self.deterministic {
            Some(true)
        } else if self.sampling {
            Some(false)
        } else {
            None
        };
        RunOverrides {
            max_new_length: self.max_new_length,
            deterministic,
            temperature: self.temperature,
            model: self.model.clone(),
            max_output_chars: self.max_chars,
            variables: self.vars.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Args)]
pub struct RecipesArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: InputArgs,

    #[arg(long)]
    pub json: bool,
}

/// Parse `KEY=VALUE`.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
