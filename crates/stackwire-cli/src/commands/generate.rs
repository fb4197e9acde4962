//! `stackwire generate`: compile definitions and write the manifests.

use clap::Args;
use stackwire_common::config::GeneratorConfig;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Suppress the summary printed after a successful run.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `generate` command.
///
/// The composes folder is deleted and recreated on every run.
///
/// # Errors
///
/// Returns an error if any definition cannot be read or any output cannot
/// be written.
pub fn execute(args: &GenerateArgs, config: &GeneratorConfig) -> anyhow::Result<()> {
    tracing::info!(
        containers = %config.containers_folder.display(),
        composes = %config.composes_folder.display(),
        "generating manifests"
    );
    let summary = stackwire_compose::generator::generate(config)?;

    if !args.quiet {
        print!("{}", crate::output::format_summary(&summary));
    }
    Ok(())
}
