//! Service name and bind folder assignment.
//!
//! Names must be unique across the whole master manifest, so the
//! [`NameRegistry`] is created once per run and threaded through every file
//! in sorted order. That order decides which duplicate keeps the bare name.

use std::collections::HashSet;

use crate::definition::ContainerDefinition;

/// Names already issued during a run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Every requested base name, in request order. Drives the numeral.
    requested: Vec<String>,
    /// Every name handed out.
    issued: HashSet<String>,
}

/// The unique name and bind folder given to one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedName {
    /// Service, host, and container name.
    pub name: String,
    /// Folder under the bind root.
    pub folder: String,
}

impl NameRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a unique name for `base`.
    ///
    /// The first request for `base` gets it unchanged. Later ones get
    /// `base_N` with `N = 1 + prior requests for base`, and an explicit
    /// `folder` gets the same `N` appended directly.
    pub fn assign(&mut self, base: &str, folder: Option<&str>) -> AssignedName {
        let assigned = if self.issued.contains(base) {
            let mut n = 1 + self.requested.iter().filter(|r| *r == base).count();
            while self.issued.contains(&format!("{base}_{n}")) {
                n += 1;
            }
            let name = format!("{base}_{n}");
            let folder = folder.map_or_else(|| name.clone(), |f| format!("{f}{n}"));
            tracing::debug!(base, name = %name, "renamed duplicate service");
            AssignedName { name, folder }
        } else {
            AssignedName {
                name: base.to_string(),
                folder: folder.unwrap_or(base).to_string(),
            }
        };

        self.requested.push(base.to_string());
        let _ = self.issued.insert(assigned.name.clone());
        assigned
    }
}

/// A container definition together with its final name and folder.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDefinition {
    /// Unique name and folder.
    pub assigned: AssignedName,
    /// The definition as authored.
    pub definition: ContainerDefinition,
}

/// Names every definition loaded from one file.
///
/// Definitions without an explicit `name` fall back to `stem`, the file
/// name without extension.
pub fn resolve_names(
    stem: &str,
    definitions: Vec<ContainerDefinition>,
    registry: &mut NameRegistry,
) -> Vec<NamedDefinition> {
    definitions
        .into_iter()
        .map(|definition| {
            let base = definition.name.as_deref().unwrap_or(stem);
            let assigned = registry.assign(base, definition.folder.as_deref());
            NamedDefinition {
                assigned,
                definition,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: Option<&str>, folder: Option<&str>) -> ContainerDefinition {
        ContainerDefinition {
            name: name.map(Into::into),
            folder: folder.map(Into::into),
            ..ContainerDefinition::new("img")
        }
    }

    #[test]
    fn unnamed_definition_takes_file_stem() {
        let mut registry = NameRegistry::new();
        let resolved = resolve_names("grafana", vec![named(None, None)], &mut registry);
        assert_eq!(resolved[0].assigned.name, "grafana");
        assert_eq!(resolved[0].assigned.folder, "grafana");
    }

    #[test]
    fn explicit_folder_is_kept() {
        let mut registry = NameRegistry::new();
        let resolved = resolve_names("x", vec![named(Some("db"), Some("postgres"))], &mut registry);
        assert_eq!(resolved[0].assigned.name, "db");
        assert_eq!(resolved[0].assigned.folder, "postgres");
    }

    #[test]
    fn duplicates_in_one_file_get_numbered() {
        let mut registry = NameRegistry::new();
        let resolved = resolve_names(
            "stack",
            vec![named(Some("web"), Some("web")), named(Some("web"), Some("web"))],
            &mut registry,
        );
        assert_eq!(resolved[0].assigned.name, "web");
        assert_eq!(resolved[0].assigned.folder, "web");
        assert_eq!(resolved[1].assigned.name, "web_2");
        assert_eq!(resolved[1].assigned.folder, "web2");
    }

    #[test]
    fn duplicates_defaulting_to_stem_get_numbered() {
        let mut registry = NameRegistry::new();
        let resolved = resolve_names("web", vec![named(None, None), named(None, None)], &mut registry);
        assert_eq!(resolved[0].assigned.name, "web");
        assert_eq!(resolved[1].assigned.name, "web_2");
        assert_eq!(resolved[1].assigned.folder, "web_2");
    }

    #[test]
    fn collisions_span_files() {
        let mut registry = NameRegistry::new();
        let _ = resolve_names("a", vec![named(Some("cache"), None)], &mut registry);
        let _ = resolve_names("b", vec![named(Some("cache"), None)], &mut registry);
        let third = resolve_names("c", vec![named(Some("cache"), None)], &mut registry);
        assert_eq!(third[0].assigned.name, "cache_3");
    }

    #[test]
    fn numbering_skips_names_already_taken() {
        let mut registry = NameRegistry::new();
        let _ = registry.assign("web_2", None);
        let _ = registry.assign("web", None);
        let third = registry.assign("web", None);
        assert_eq!(third.name, "web_3");
    }
}
