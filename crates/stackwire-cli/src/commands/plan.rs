//! `stackwire plan`: display the manifests a run would write.

use clap::{Args, ValueEnum};
use stackwire_common::config::GeneratorConfig;

/// Output encoding for the `plan` command.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// YAML documents, as `generate` writes them.
    #[default]
    Yaml,
    /// A single JSON object.
    Json,
}

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    pub format: Format,
}

/// Executes the `plan` command.
///
/// Loads and compiles every definition, then prints the master manifest
/// followed by each fragment.
///
/// # Errors
///
/// Returns an error if any definition cannot be read or rendering fails.
pub fn execute(args: &PlanArgs, config: &GeneratorConfig) -> anyhow::Result<()> {
    let plan = stackwire_compose::generator::plan(config)?;
    let rendered = match args.format {
        Format::Yaml => crate::output::render_yaml(&plan, config)?,
        Format::Json => crate::output::render_json(&plan, config)?,
    };
    print!("{rendered}");
    Ok(())
}
