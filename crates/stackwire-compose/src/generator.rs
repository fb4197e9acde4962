//! The run driver.
//!
//! Files are processed one at a time in sorted order. A container that
//! cannot be compiled is logged and skipped; only I/O failures and invalid
//! configuration abort the run. The same inputs always produce
//! byte-identical output.

use std::path::{Path, PathBuf};

use serde::Serialize;

use stackwire_common::config::GeneratorConfig;
use stackwire_common::error::{Result, StackwireError};

use crate::definition::{self, ContainerDefinition, SourceFile};
use crate::manifest::{Fragment, MasterManifest};
use crate::naming::{NameRegistry, resolve_names};
use crate::network::NetworkSpec;
use crate::service::compile;

/// Everything a run would write, held in memory.
#[derive(Debug)]
pub struct Plan {
    /// Non-empty fragments in source file order.
    pub fragments: Vec<Fragment>,
    /// The master manifest.
    pub manifest: MasterManifest,
    /// Number of definition files read.
    pub files: usize,
    /// Containers skipped as undecodable or incomplete.
    pub skipped_containers: usize,
    /// Volume entries skipped as malformed.
    pub skipped_volumes: usize,
}

impl Plan {
    /// Number of services in the master manifest.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.manifest.entries.len()
    }
}

/// What a completed run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of definition files read.
    pub files: usize,
    /// Number of services emitted.
    pub services: usize,
    /// Containers skipped.
    pub skipped_containers: usize,
    /// Volume entries skipped.
    pub skipped_volumes: usize,
    /// Fragment files written.
    pub fragments: Vec<PathBuf>,
    /// Master manifest written.
    pub output: PathBuf,
}

/// Where a source file's fragment goes and how the manifest names it.
fn fragment_for(source: &SourceFile, composes_folder: &Path) -> Fragment {
    let file_name = source.file_name();
    let folder = composes_folder.to_string_lossy();
    let reference = format!("{}/{file_name}", folder.trim_end_matches('/'));
    Fragment::new(composes_folder.join(&file_name), reference)
}

/// Compiles already-loaded source files into a plan.
///
/// # Errors
///
/// Returns an error if the configured network is invalid.
pub fn compile_sources(sources: Vec<SourceFile>, config: &GeneratorConfig) -> Result<Plan> {
    let mut manifest = MasterManifest::new(NetworkSpec::from_config(config)?);
    let mut registry = NameRegistry::new();
    let mut plan_fragments = Vec::new();
    let mut skipped_containers = 0;
    let mut skipped_volumes = 0;
    let files = sources.len();

    for source in sources {
        let stem = source.stem();
        let mut fragment = fragment_for(&source, &config.composes_folder);
        tracing::info!(path = %source.path.display(), "compiling definition file");

        let mut definitions: Vec<ContainerDefinition> = Vec::new();
        for (index, document) in source.documents.into_iter().enumerate() {
            match document.and_then(|raw| raw.into_definition(&stem)) {
                Ok(definition) => definitions.push(definition),
                Err(err) => {
                    skipped_containers += 1;
                    tracing::warn!(
                        path = %source.path.display(),
                        document = index,
                        error = %err,
                        "skipping container"
                    );
                }
            }
        }

        for named in resolve_names(&stem, definitions, &mut registry) {
            let compiled = compile(&named, config);
            skipped_volumes += compiled.rejected_volumes.len();
            fragment.services.push((compiled.name, compiled.service));
        }

        if fragment.is_empty() {
            tracing::warn!(path = %source.path.display(), "no services compiled, no fragment");
            continue;
        }
        manifest.include(&fragment);
        plan_fragments.push(fragment);
    }

    Ok(Plan {
        fragments: plan_fragments,
        manifest,
        files,
        skipped_containers,
        skipped_volumes,
    })
}

/// Loads the containers folder and compiles it without writing anything.
///
/// # Errors
///
/// Returns an error if the containers folder or a file in it cannot be
/// read, or if the configured network is invalid.
pub fn plan(config: &GeneratorConfig) -> Result<Plan> {
    let sources = definition::load_dir(&config.containers_folder)?;
    compile_sources(sources, config)
}

/// Renders a document as YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

fn write_failure(path: &Path) -> impl FnOnce(std::io::Error) -> StackwireError {
    let path = path.to_path_buf();
    move |source| StackwireError::OutputWriteFailure { path, source }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(write_failure(path))
}

/// Writes a plan: recreates the composes folder, writes every fragment,
/// then writes the master manifest.
///
/// The composes folder is deleted first; anything else in it is lost.
///
/// # Errors
///
/// Returns [`StackwireError::OutputWriteFailure`] on the first failed write.
/// Whatever was written before the failure is not a valid manifest.
pub fn write_plan(plan: &Plan, config: &GeneratorConfig) -> Result<RunSummary> {
    let composes = &config.composes_folder;

    if composes.exists() {
        std::fs::remove_dir_all(composes).map_err(write_failure(composes))?;
    }
    std::fs::create_dir_all(composes).map_err(write_failure(composes))?;

    let mut written = Vec::with_capacity(plan.fragments.len());
    for fragment in &plan.fragments {
        write_file(&fragment.path, &render_yaml(fragment)?)?;
        tracing::debug!(path = %fragment.path.display(), "wrote fragment");
        written.push(fragment.path.clone());
    }

    let output = &config.output;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_failure(parent))?;
    }
    write_file(output, &render_yaml(&plan.manifest)?)?;

    Ok(RunSummary {
        files: plan.files,
        services: plan.service_count(),
        skipped_containers: plan.skipped_containers,
        skipped_volumes: plan.skipped_volumes,
        fragments: written,
        output: output.clone(),
    })
}

/// Runs the generator end to end.
///
/// # Errors
///
/// Returns an error if any input cannot be read, the configuration is
/// invalid, or any output cannot be written.
pub fn generate(config: &GeneratorConfig) -> Result<RunSummary> {
    let plan = plan(config)?;
    let summary = write_plan(&plan, config)?;
    tracing::info!(
        files = summary.files,
        services = summary.services,
        skipped_containers = summary.skipped_containers,
        skipped_volumes = summary.skipped_volumes,
        output = %summary.output.display(),
        "generated manifest"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            bind_path: "/srv".into(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn multi_document_file_shares_one_fragment() {
        let source = SourceFile::parse(
            "containers/web.yaml",
            "image: nginx\nfolder: web\n---\nimage: nginx\nfolder: web\n",
        );
        let plan = compile_sources(vec![source], &config()).expect("plan");
        assert_eq!(plan.fragments.len(), 1);
        let names: Vec<&str> = plan.fragments[0]
            .services
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["web", "web_2"]);
        assert_eq!(plan.fragments[0].reference, "composes/web.yaml");
        assert_eq!(plan.fragments[0].services[1].1.container_name, "web_2");
        assert!(plan.manifest.entries.iter().all(|e| e.file == "composes/web.yaml"));
    }

    #[test]
    fn container_without_image_is_skipped() {
        let source = SourceFile::parse("containers/a.yaml", "name: broken\n---\nimage: ok\n");
        let plan = compile_sources(vec![source], &config()).expect("plan");
        assert_eq!(plan.skipped_containers, 1);
        assert_eq!(plan.service_count(), 1);
        assert_eq!(plan.manifest.entries[0].name, "a");
    }

    #[test]
    fn file_with_no_valid_container_yields_no_fragment() {
        let source = SourceFile::parse("containers/a.yaml", "name: broken\n");
        let plan = compile_sources(vec![source], &config()).expect("plan");
        assert!(plan.fragments.is_empty());
        assert_eq!(plan.files, 1);
    }

    #[test]
    fn invalid_subnet_aborts() {
        let config = GeneratorConfig {
            subnet: "bogus".into(),
            ..config()
        };
        assert!(compile_sources(Vec::new(), &config).is_err());
    }

    #[test]
    fn fragment_reference_trims_trailing_slash() {
        let source = SourceFile::parse("x/db.yml", "image: postgres\n");
        let fragment = fragment_for(&source, Path::new("out/"));
        assert_eq!(fragment.reference, "out/db.yml");
    }
}
