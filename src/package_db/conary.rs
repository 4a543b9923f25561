//! Conary package database (rPath based distributions).

use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb, parse_version, run_tool};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::{CommandOutput, Runtime, args};
use crate::version::Version;

const CONARY: &str = "conary";

pub struct ConaryBackend<R: Runtime> {
    runtime: Arc<R>,
    root: Option<PathBuf>,
    locales: LocaleRoots,
}

/// Upstream version from a full trove spec such as
/// `gedit=/conary.rpath.com@rpl:devel//1/2.18.0-1-0.1[is: x86]`.
///
/// The trailing revision is the part after the last `/`; the upstream
/// version is its text before the first `-`.
fn trove_version<'a>(name: &str, line: &'a str) -> Option<&'a str> {
    let spec = line.strip_prefix(name)?.strip_prefix('=')?;
    let spec = spec.split('[').next()?.trim();
    let revision = spec.rsplit('/').next()?;
    revision.split('-').next().filter(|v| !v.is_empty())
}

impl<R: Runtime> ConaryBackend<R> {
    pub fn new(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            runtime,
            root: config.tool_root(),
            locales: LocaleRoots::new::<&str>(config, &[]),
        }
    }

    fn query(&self, name: &str, flag: &str) -> Result<CommandOutput> {
        let mut query = args(["q", name, flag]);
        if let Some(root) = &self.root {
            query.push(format!("--root={}", root.display()));
        }
        let output = run_tool(&*self.runtime, CONARY, &query)?;
        if !output.success {
            debug!("conary q {} {} failed: {}", name, flag, output.stderr.trim());
            return Err(Error::PackageNotFound(name.to_string()));
        }
        Ok(output)
    }
}

impl<R: Runtime> PackageDb for ConaryBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Conary
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            version: true,
            files: true,
            dependencies: false,
        }
    }

    #[tracing::instrument(skip(self))]
    fn version(&self, name: &str) -> Result<Version> {
        let output = self.query(name, "--full-versions")?;
        let upstream = output
            .lines()
            .find_map(|line| trove_version(name, line))
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        parse_version(name, upstream)
    }

    #[tracing::instrument(skip(self))]
    fn files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let output = self.query(name, "--ls")?;
        Ok(output.lines().map(PathBuf::from).collect())
    }

    fn dependencies(&self, _name: &str) -> Result<BTreeSet<String>> {
        Err(Error::unsupported(BackendKind::Conary.name(), "dependencies"))
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }
}
