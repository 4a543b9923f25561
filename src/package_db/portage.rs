//! Portage package database (Gentoo).

use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb, parse_version, run_tool};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::{Runtime, args};
use crate::version::Version;

const PORTAGEQ: &str = "portageq";
const VDB_PATH: &str = "/var/db/pkg";

pub struct PortageBackend<R: Runtime> {
    runtime: Arc<R>,
    /// `${EROOT}` handed to `portageq`.
    eroot: String,
    vdb: PathBuf,
    locales: LocaleRoots,
}

/// Split an installed atom such as `app-editors/gedit-44.2_p1-r3` into its
/// category and `${PF}` (`app-editors`, `gedit-44.2_p1-r3`).
fn split_category(atom: &str) -> (Option<&str>, &str) {
    match atom.split_once('/') {
        Some((category, pf)) => (Some(category), pf),
        None => (None, atom),
    }
}

/// Upstream version of a `${PF}`: the `-rN` revision and any `_suffix`
/// are dropped.
fn upstream_version(pf: &str) -> Option<&str> {
    let without_revision = match pf.rsplit_once('-') {
        Some((rest, revision))
            if revision.len() > 1
                && revision.starts_with('r')
                && revision[1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => pf,
    };
    let (_, version) = without_revision.rsplit_once('-')?;
    version.split('_').next()
}

/// Paths recorded in a vdb `CONTENTS` file, in file order.
fn parse_contents(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .filter_map(|line| {
            let (kind, rest) = line.split_once(' ')?;
            let path = match kind {
                "dir" => rest,
                // obj <path> <md5> <mtime>; the path may contain spaces
                "obj" => rest.rsplitn(3, ' ').nth(2)?,
                // sym <path> -> <target> <mtime>
                "sym" => rest.split_once(" -> ")?.0,
                _ => return None,
            };
            Some(PathBuf::from(path))
        })
        .collect()
}

impl<R: Runtime> PortageBackend<R> {
    pub fn new(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            runtime,
            eroot: config
                .tool_root()
                .map_or_else(|| "/".to_string(), |root| root.display().to_string()),
            vdb: config.resolve(VDB_PATH),
            locales: LocaleRoots::new::<&str>(config, &[]),
        }
    }

    /// First installed atom matching `name`. With slotted packages only the
    /// first slot is considered.
    fn installed_atom(&self, name: &str) -> Result<String> {
        let query = args(["match", self.eroot.as_str(), name]);
        let output = run_tool(&*self.runtime, PORTAGEQ, &query)?;
        if !output.success {
            debug!("portageq match {} failed: {}", name, output.stderr.trim());
            return Err(Error::PackageNotFound(name.to_string()));
        }
        output
            .lines()
            .next()
            .map(String::from)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))
    }
}

impl<R: Runtime> PackageDb for PortageBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Portage
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
        let atom = self.installed_atom(name)?;
        let (_, pf) = split_category(&atom);
        let upstream =
            upstream_version(pf).ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        parse_version(name, upstream)
    }

    #[tracing::instrument(skip(self))]
    fn files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let atom = self.installed_atom(name)?;
        let (Some(category), pf) = split_category(&atom) else {
            return Err(Error::PackageNotFound(name.to_string()));
        };

        let contents_path = self.vdb.join(category).join(pf).join("CONTENTS");
        debug!("Reading {:?}", contents_path);
        let contents = self
            .runtime
            .read_to_string(&contents_path)
            .map_err(|source| Error::Io {
                path: contents_path,
                source,
            })?;
        Ok(parse_contents(&contents))
    }

    fn dependencies(&self, _name: &str) -> Result<BTreeSet<String>> {
        Err(Error::unsupported(
            BackendKind::Portage.name(),
            "dependencies",
        ))
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }
}
