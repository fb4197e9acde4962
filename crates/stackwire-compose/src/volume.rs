//! Volume binding resolution.
//!
//! Authors list container paths and let the resolver pick the host side.
//! A raw spec follows `body[;name]` where `body` is one to three
//! `:`-separated segments and a trailing `ro`/`rw` is an access mode:
//!
//! - `/data` is an implicit bind. The host path is synthesized as
//!   `<bind_path>/<folder>/<basename>`, or `<bind_path>/<folder>` when the
//!   whole-folder shortcut applies.
//! - `/srv/data:/data` is an explicit bind and is left untouched.
//! - `/data;db` overrides the synthesized basename with `db`.
//!
//! The used-name log lives in one [`VolumeBindingResolver`] per container.

use stackwire_common::error::{Result, StackwireError};

/// Access mode suffix of a volume spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `ro`
    ReadOnly,
    /// `rw`
    ReadWrite,
}

impl Mode {
    /// Parses a trailing segment as a mode.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "ro" => Some(Self::ReadOnly),
            "rw" => Some(Self::ReadWrite),
            _ => None,
        }
    }

    /// Returns the suffix as written in a spec.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

/// A syntactically valid volume spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    /// Path segments with the mode removed; one to three entries.
    pub segments: Vec<String>,
    /// Trailing access mode.
    pub mode: Option<Mode>,
    /// Basename override given after `;`.
    pub custom_name: Option<String>,
}

impl VolumeSpec {
    /// Parses a raw spec.
    ///
    /// # Errors
    ///
    /// Returns [`StackwireError::AmbiguousVolumeSpec`] for an empty body, an
    /// empty segment, more than three segments, more than one `;`, a body
    /// that is only a mode, or an implicit bind of `/` without a custom name.
    pub fn parse(raw: &str) -> Result<Self> {
        let ambiguous = |reason| StackwireError::AmbiguousVolumeSpec {
            spec: raw.to_string(),
            reason,
        };

        let (body, custom_name) = match raw.split_once(';') {
            Some((_, name)) if name.contains(';') => return Err(ambiguous("more than one `;`")),
            Some((body, name)) => (body, Some(name).filter(|n| !n.is_empty())),
            None => (raw, None),
        };
        if body.is_empty() {
            return Err(ambiguous("empty spec"));
        }

        let mut segments: Vec<&str> = body.split(':').collect();
        if segments.len() > 3 {
            return Err(ambiguous("more than three `:`-separated segments"));
        }
        let mode = segments.last().copied().and_then(Mode::parse);
        if mode.is_some() {
            if segments.len() == 1 {
                return Err(ambiguous("no path before the access mode"));
            }
            let _ = segments.pop();
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ambiguous("empty path segment"));
        }
        if segments.len() == 1 && custom_name.is_none() && basename(segments[0]).is_empty() {
            return Err(ambiguous("container path has no name to bind under"));
        }

        Ok(Self {
            segments: segments.into_iter().map(String::from).collect(),
            mode,
            custom_name: custom_name.map(String::from),
        })
    }
}

/// Counts the implicit binds in an unprocessed volume list.
///
/// An entry counts when its body splits into one segment, or into two
/// where the second is `ro`/`rw`. The count is taken from the raw list,
/// so malformed entries are counted by the same textual rule.
#[must_use]
pub fn count_implicit_binds(raw_specs: &[String]) -> usize {
    raw_specs
        .iter()
        .filter(|raw| {
            let body = raw.split(';').next().unwrap_or_default();
            let segments: Vec<&str> = body.split(':').collect();
            match segments.as_slice() {
                [_] => true,
                [_, last] => Mode::parse(last).is_some(),
                _ => false,
            }
        })
        .count()
}

/// Last `/`-separated component of a path, ignoring trailing slashes.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Resolves the volume list of a single container.
#[derive(Debug)]
pub struct VolumeBindingResolver<'a> {
    bind_path: &'a str,
    folder: &'a str,
    /// Set when the container's only implicit bind gets the whole folder.
    whole_folder: bool,
    used: Vec<String>,
}

impl<'a> VolumeBindingResolver<'a> {
    /// Creates a resolver for a container whose raw volume list is `raw_specs`.
    #[must_use]
    pub fn new(
        bind_path: &'a str,
        folder: &'a str,
        use_full_directory: bool,
        raw_specs: &[String],
    ) -> Self {
        Self {
            bind_path,
            folder,
            whole_folder: use_full_directory && count_implicit_binds(raw_specs) == 1,
            used: Vec::new(),
        }
    }

    /// Resolves one raw spec into its final `host:container[:mode]` form.
    ///
    /// # Errors
    ///
    /// Returns [`StackwireError::AmbiguousVolumeSpec`] if `raw` is malformed.
    /// The used-name log is left unchanged in that case.
    pub fn resolve(&mut self, raw: &str) -> Result<String> {
        let VolumeSpec {
            segments,
            mode,
            custom_name,
        } = VolumeSpec::parse(raw)?;

        let mut segments = match <[String; 1]>::try_from(segments) {
            Ok([container_path]) => {
                let host_path = self.bind_implicit(&container_path, custom_name);
                vec![host_path, container_path]
            }
            Err(segments) => {
                self.used.push(basename(&segments[0]).to_string());
                segments
            }
        };

        if let Some(mode) = mode {
            segments.push(mode.as_str().to_string());
        }
        let resolved = segments.join(":");
        tracing::debug!(raw, resolved = %resolved, "resolved volume");
        Ok(resolved)
    }

    /// Synthesizes the host path for an implicit bind and logs its names.
    fn bind_implicit(&mut self, container_path: &str, custom_name: Option<String>) -> String {
        let derived = custom_name.unwrap_or_else(|| basename(container_path).to_string());
        let volume = self.unique(&derived);

        let mut host_path = format!("{}/{}", self.bind_path, self.folder);
        if !self.whole_folder {
            host_path.push('/');
            host_path.push_str(&volume);
        }

        let host_name = basename(&host_path).to_string();
        if host_name != derived {
            self.used.push(derived);
        }
        self.used.push(host_name);
        host_path
    }

    /// Resolves every spec in order, returning the resolved specs and the
    /// rejected entries.
    pub fn resolve_all(&mut self, raw_specs: &[String]) -> (Vec<String>, Vec<StackwireError>) {
        let mut resolved = Vec::with_capacity(raw_specs.len());
        let mut rejected = Vec::new();
        for raw in raw_specs {
            match self.resolve(raw) {
                Ok(spec) => resolved.push(spec),
                Err(err) => rejected.push(err),
            }
        }
        (resolved, rejected)
    }

    /// Appends the smallest free numeral to `derived` if it was used before.
    fn unique(&self, derived: &str) -> String {
        if !self.used.iter().any(|u| u == derived) {
            return derived.to_string();
        }
        let mut n = 1 + self.used.iter().filter(|u| *u == derived).count();
        while self.used.iter().any(|u| *u == format!("{derived}{n}")) {
            n += 1;
        }
        format!("{derived}{n}")
    }
}

/// Resolves a container's full volume list in one call.
pub fn resolve_volumes(
    bind_path: &str,
    folder: &str,
    use_full_directory: bool,
    raw_specs: &[String],
) -> (Vec<String>, Vec<StackwireError>) {
    VolumeBindingResolver::new(bind_path, folder, use_full_directory, raw_specs)
        .resolve_all(raw_specs)
}
