//! Configuration shared by detection and the package backends.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::path::normalize_path;
use crate::runtime::{Runtime, reroot};

/// Environment variable that forces the JHBuild backend.
pub const DEFAULT_OVERRIDE_VAR: &str = "CERTIFIED_GNOMIE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Filesystem root that marker files, locale roots and package database
    /// files are resolved against. Package tools are pointed at it too.
    pub root: PathBuf,
    /// Locale roots searched in addition to the backend's own.
    pub extra_locale_roots: Vec<PathBuf>,
    /// Name of the environment variable that forces JHBuild detection.
    pub override_var: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            extra_locale_roots: Vec::new(),
            override_var: DEFAULT_OVERRIDE_VAR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must be readable. Otherwise
    /// `<config_dir>/distrodb/config.json` is used when present, and the
    /// defaults when not.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path(runtime) {
                Some(path) if runtime.exists(&path) => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading config from {:?}", path);
        let content = runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn default_path<R: Runtime>(runtime: &R) -> Option<PathBuf> {
        runtime
            .config_dir()
            .map(|dir| dir.join("distrodb").join("config.json"))
    }

    /// Resolve an absolute host path below the configured root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        reroot(&self.root, path.as_ref())
    }

    /// The root to hand to package tools, or `None` when it is the host's
    /// own `/`.
    pub fn tool_root(&self) -> Option<PathBuf> {
        let root = normalize_path(&self.root);
        (root != Path::new("/")).then_some(root)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
