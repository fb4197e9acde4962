//! CLI command definitions and dispatch.

pub mod generate;
pub mod plan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stackwire_common::config::GeneratorConfig;

/// stackwire: container definitions in, compose manifests out.
#[derive(Parser, Debug)]
#[command(name = "stackwire", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the generator config file. Environment variables named after
    /// its keys (e.g. `SUBNET`) take precedence over it.
    #[arg(
        long,
        global = true,
        env = "STACKWIRE_CONFIG",
        default_value = stackwire_common::constants::DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write every fragment and the master manifest.
    Generate(generate::GenerateArgs),
    /// Print what `generate` would write, without touching the filesystem.
    Plan(plan::PlanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = GeneratorConfig::load(&cli.config)?;
    tracing::debug!(?config, "resolved configuration");
    match cli.command {
        Command::Generate(args) => generate::execute(&args, &config),
        Command::Plan(args) => plan::execute(&args, &config),
    }
}
