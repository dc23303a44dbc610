use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Context;
use companion_guardrails::GuardrailFilter;
use companion_persist::{EventLog, JsonFileEventLog, RunEvent};
use companion_pipeline::{Pipeline, clean_text};
use companion_provider::{GenerationInvoker, OllamaGenerator};
use serde::Serialize;

use crate::cli_args::{Cli, Command, InputArgs, RecipesArgs, RunArgs, ScanArgs};
use crate::config::CompanionConfig;

/// Load config and execute the parsed command, writing to stdout.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = CompanionConfig::load(cli.config.as_deref())?;
    let mut out = std::io::stdout();
    match cli.command {
        Command::Run(args) => run(&config, &args, &mut out).await,
        Command::Recipes(args) => recipes(&config, &args, &mut out),
        Command::Scan(args) => scan(&config, &args, &mut out),
    }
}

pub fn build_pipeline(config: &CompanionConfig) -> anyhow::Result<Pipeline> {
    let registry = config
        .registry()
        .context("invalid recipe configuration")?;
    let guardrails = GuardrailFilter::new(config.guardrails.clone())
        .context("invalid guardrail configuration")?;
    let generator = OllamaGenerator::new(&config.generator.base_url)?;
    let invoker = GenerationInvoker::new(Arc::new(generator), config.invoker.clone())
        .context("invalid invoker configuration")?;
    Ok(Pipeline::new(
        Arc::new(registry),
        Arc::new(guardrails),
        invoker,
    ))
}

pub async fn run<W: Write>(config: &CompanionConfig, args: &RunArgs, out: &mut W) -> anyhow::Result<()> {
    let (text, source) = read_input(&args.source)?;
    let pipeline = build_pipeline(config)?;
    let result = pipeline
        .run_text(&args.recipe, &text, args.overrides())
        .await?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        writeln!(out, "{}", result.text)?;
    }

    if let Some(path) = &args.events {
        JsonFileEventLog::new(path)
            .append(&RunEvent::from_result(&result, Some(&source)))
            .with_context(|| format!("failed to append run event to {}", path.display()))?;
    }
    Ok(())
}

pub fn recipes<W: Write>(config: &CompanionConfig, args: &RecipesArgs, out: &mut W) -> anyhow::Result<()> {
    let registry = config
        .registry()
        .context("invalid recipe configuration")?;
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(registry.all())?)?;
        return Ok(());
    }
    for recipe in registry.all() {
        writeln!(
            out,
            "{:<14} {:<14} {}",
            recipe.id, recipe.profile.name, recipe.description
        )?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScanOutput<'a> {
    matches: &'a BTreeMap<String, usize>,
    keywords: &'a [&'static str],
    redacted: &'a str,
}

pub fn scan<W: Write>(config: &CompanionConfig, args: &ScanArgs, out: &mut W) -> anyhow::Result<()> {
    let (text, _) = read_input(&args.source)?;
    let filter = GuardrailFilter::new(config.guardrails.clone())
        .context("invalid guardrail configuration")?;
    let text = clean_text(&text);
    let report = filter.scan(&text);
    let redaction = filter.redact(&text);

    if args.json {
        let output = ScanOutput {
            matches: &report.matches,
            keywords: &report.keywords,
            redacted: &redaction.text,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    if report.is_clean() {
        writeln!(out, "no PII found")?;
    }
    for (rule, count) in &report.matches {
        writeln!(out, "{rule}: {count}")?;
    }
    if !report.keywords.is_empty() {
        writeln!(out, "keywords: {}", report.keywords.join(", "))?;
    }
    writeln!(out)?;
    writeln!(out, "{}", redaction.text)?;
    Ok(())
}

/// Input text plus a label for where it came from.
fn read_input(source: &InputArgs) -> anyhow::Result<(String, String)> {
    if let Some(path) = &source.input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))?;
        let label = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        return Ok((text, label));
    }
    if let Some(text) = &source.text {
        return Ok((text.clone(), "text".to_string()));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok((text, "stdin".to_string()))
}
