//! RPM package database (Fedora, RHEL, SUSE).

use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb, parse_version, run_tool};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::{Runtime, args};
use crate::version::Version;

const RPM: &str = "rpm";
const NO_FILES: &str = "(contains no files)";

pub struct RpmBackend<R: Runtime> {
    runtime: Arc<R>,
    root: Option<PathBuf>,
    locales: LocaleRoots,
}

impl<R: Runtime> RpmBackend<R> {
    pub fn new(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            runtime,
            root: config.tool_root(),
            locales: LocaleRoots::new::<&str>(config, &[]),
        }
    }

    /// `rpm [--root <root>] -q`, followed by `rest`.
    fn rpm_query(&self, rest: &[&str]) -> Vec<String> {
        let mut query = Vec::new();
        if let Some(root) = &self.root {
            query.push("--root".to_string());
            query.push(root.display().to_string());
        }
        query.push("-q".to_string());
        query.extend(args(rest.iter().copied()));
        query
    }

    /// `rpm -q` for an installed package. A non-zero exit means the package
    /// is not installed.
    fn query(&self, name: &str, extra: &[&str]) -> Result<Vec<String>> {
        let mut query = self.rpm_query(extra);
        query.push(name.to_string());

        let output = run_tool(&*self.runtime, RPM, &query)?;
        if !output.success {
            debug!("rpm reports {} as not installed: {}", name, output.stdout.trim());
            return Err(Error::PackageNotFound(name.to_string()));
        }
        Ok(output.lines().map(String::from).collect())
    }

    /// Names of the installed packages providing `requirement`, which may be
    /// a package name, a library so-name, a file or a virtual capability.
    fn providers(&self, requirement: &str) -> Result<Vec<String>> {
        let query = self.rpm_query(&["--whatprovides", requirement, "--queryformat", "%{NAME}\n"]);
        let output = run_tool(&*self.runtime, RPM, &query)?;
        if !output.success {
            debug!("Nothing provides {}", requirement);
            return Ok(Vec::new());
        }
        Ok(output.lines().map(String::from).collect())
    }
}

/// The capability part of a `rpm -qR` line, without any version constraint.
///
/// Rich dependencies such as `(foo if bar)` are boolean expressions, not
/// capabilities, and are skipped.
fn requirement_name(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with('(') {
        debug!("Skipping rich dependency {}", line);
        return None;
    }
    line.split_whitespace().next()
}

impl<R: Runtime> PackageDb for RpmBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Rpm
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    #[tracing::instrument(skip(self))]
    fn version(&self, name: &str) -> Result<Version> {
        let lines = self.query(name, &["--queryformat", "%{VERSION}\n"])?;
        // First match only; multilib installs report one line per arch
        let upstream = lines
            .first()
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        parse_version(name, upstream)
    }

    #[tracing::instrument(skip(self))]
    fn files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let lines = self.query(name, &["-l"])?;
        Ok(lines
            .into_iter()
            .filter(|line| line != NO_FILES)
            .map(PathBuf::from)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let requirements: BTreeSet<String> = self
            .query(name, &["-R"])?
            .iter()
            .filter_map(|line| requirement_name(line))
            .map(String::from)
            .collect();

        let mut result = BTreeSet::new();
        for requirement in &requirements {
            for provider in self.providers(requirement)? {
                if provider != name {
                    result.insert(provider);
                }
            }
        }
        Ok(result)
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }
}
