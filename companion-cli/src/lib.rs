pub mod cli_args;
pub mod commands;
pub mod config;

pub use cli_args::{Cli, Command, InputArgs, RecipesArgs, RunArgs, ScanArgs, parse_var};
pub use config::{CompanionConfig, GeneratorConfig};
