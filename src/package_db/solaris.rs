//! Solaris: locale lookup only.
//!
//! Several modules are shipped in a single Solaris package, so per-module
//! versions, files and dependencies cannot be answered.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::version::Version;

pub struct SolarisBackend<R: Runtime> {
    runtime: Arc<R>,
    locales: LocaleRoots,
}

impl<R: Runtime> SolarisBackend<R> {
    pub fn new(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            runtime,
            locales: LocaleRoots::new::<&str>(config, &[]),
        }
    }
}

fn unsupported(operation: &'static str) -> Error {
    Error::unsupported(BackendKind::Solaris.name(), operation)
}

impl<R: Runtime> PackageDb for SolarisBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Solaris
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn version(&self, _name: &str) -> Result<Version> {
        Err(unsupported("version"))
    }

    fn files(&self, _name: &str) -> Result<Vec<PathBuf>> {
        Err(unsupported("files"))
    }

    fn dependencies(&self, _name: &str) -> Result<BTreeSet<String>> {
        Err(unsupported("dependencies"))
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }
}
