//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use stackwire_common::config::GeneratorConfig;
use stackwire_compose::generator::{Plan, RunSummary};

/// Formats the summary printed after `generate`.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generated {} -> {} service(s) from {} file(s)",
        summary.output.display(),
        summary.services,
        summary.files
    );
    for fragment in &summary.fragments {
        let _ = writeln!(out, "  + {}", fragment.display());
    }
    if summary.skipped_containers > 0 || summary.skipped_volumes > 0 {
        let _ = writeln!(
            out,
            "Skipped {} container(s) and {} volume(s); run with RUST_LOG=warn for details",
            summary.skipped_containers, summary.skipped_volumes
        );
    }
    out
}

/// Renders a plan as a YAML stream: the master manifest, then one document
/// per fragment, each headed by the path it would be written to.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_yaml(plan: &Plan, config: &GeneratorConfig) -> anyhow::Result<String> {
    let mut out = format!("# {}\n", config.output.display());
    out.push_str(&stackwire_compose::generator::render_yaml(&plan.manifest)?);
    for fragment in &plan.fragments {
        let _ = write!(out, "---\n# {}\n", fragment.path.display());
        out.push_str(&stackwire_compose::generator::render_yaml(fragment)?);
    }
    Ok(out)
}

/// Renders a plan as one JSON object keyed by output path.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(plan: &Plan, config: &GeneratorConfig) -> anyhow::Result<String> {
    let mut documents = serde_json::Map::new();
    let _ = documents.insert(
        config.output.display().to_string(),
        serde_json::to_value(&plan.manifest)?,
    );
    for fragment in &plan.fragments {
        let _ = documents.insert(
            fragment.path.display().to_string(),
            serde_json::to_value(fragment)?,
        );
    }
    let mut out = serde_json::to_string_pretty(&documents)?;
    out.push('\n');
    Ok(out)
}
