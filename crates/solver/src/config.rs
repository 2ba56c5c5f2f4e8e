use std::path::{Path, PathBuf};

use crate::error::SolverError;

/// Default solver binary name.
pub const DEFAULT_BINARY: &str = "dReal";

/// Installation directories checked after `PATH`.
pub const FALLBACK_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/dreal/bin"];

/// Solver configuration.
///
/// Holds everything needed to start the solver process. The executable is
/// located lazily; [`SolverConfig::resolved`] fixes it so the search runs
/// once and tests can inject a stub path with [`SolverConfig::with_executable`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    binary: String,
    search_dirs: Vec<PathBuf>,
    executable: Option<PathBuf>,
    args: Vec<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let mut search_dirs: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        search_dirs.extend(FALLBACK_DIRS.iter().map(PathBuf::from));
        Self {
            binary: DEFAULT_BINARY.to_string(),
            search_dirs,
            executable: None,
            args: vec!["--in".to_string(), "--model".to_string()],
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binary name looked up in the search directories.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use this executable instead of searching.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Replace the solver arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the search directories.
    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Find the solver executable.
    ///
    /// An explicit executable must exist and be executable. Otherwise the
    /// search directories are tried in order for `binary`.
    pub fn locate(&self) -> Result<PathBuf, SolverError> {
        if let Some(path) = &self.executable {
            return if is_executable(path) {
                Ok(path.clone())
            } else {
                Err(SolverError::NotFound(path.clone()))
            };
        }

        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.binary))
            .find(|candidate| is_executable(candidate))
            .ok_or_else(|| SolverError::NotFound(PathBuf::from(&self.binary)))
    }

    /// Copy of this configuration with the executable fixed.
    pub fn resolved(&self) -> Result<Self, SolverError> {
        let executable = self.locate()?;
        tracing::debug!(path = %executable.display(), "resolved solver executable");
        Ok(Self {
            executable: Some(executable),
            ..self.clone()
        })
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
