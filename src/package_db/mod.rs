//! Package database abstraction.
//!
//! This module provides a uniform query surface over the native package
//! managers of the supported distributions. Each backend implements
//! [`PackageDb`]; operations a backend cannot answer are reported up front
//! through [`PackageDb::capabilities`] and fail with
//! [`Error::Unsupported`](crate::error::Error::Unsupported).

mod apt;
mod conary;
mod jhbuild;
mod locale;
mod portage;
mod rpm;
mod solaris;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::runtime::{CommandOutput, Runtime};
use crate::version::Version;

pub use apt::AptBackend;
pub use conary::ConaryBackend;
pub use jhbuild::JhBuildBackend;
pub use locale::{DEFAULT_LOCALE_ROOT, LocaleRoots, is_mo_file};
pub use portage::PortageBackend;
pub use rpm::RpmBackend;
pub use solaris::SolarisBackend;

/// Identifies a backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Rpm,
    Apt,
    UbuntuApt,
    Portage,
    Conary,
    Solaris,
    JhBuild,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Rpm => "RPM",
            BackendKind::Apt => "APT",
            BackendKind::UbuntuApt => "Ubuntu APT",
            BackendKind::Portage => "Portage",
            BackendKind::Conary => "Conary",
            BackendKind::Solaris => "Solaris",
            BackendKind::JhBuild => "JHBuild",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which queries a backend can answer. Locale file lookup is always
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub version: bool,
    pub files: bool,
    pub dependencies: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        version: true,
        files: true,
        dependencies: true,
    };
    pub const NONE: Capabilities = Capabilities {
        version: false,
        files: false,
        dependencies: false,
    };
}

/// Uniform query interface over a native package database.
pub trait PackageDb: Send + Sync {
    fn backend_kind(&self) -> BackendKind;

    fn capabilities(&self) -> Capabilities;

    /// Upstream version of an installed package.
    ///
    /// Distribution revisions (`-3.fc39`, `-0ubuntu1`, `-r2`) are not part
    /// of the result.
    fn version(&self, name: &str) -> Result<Version>;

    /// Paths owned by the package, in the order the native tool reports them.
    fn files(&self, name: &str) -> Result<Vec<PathBuf>>;

    /// Names of the packages this package depends on, never including
    /// `name` itself.
    fn dependencies(&self, name: &str) -> Result<BTreeSet<String>>;

    fn locale_roots(&self) -> &LocaleRoots;

    /// Every gettext catalog below the locale roots, or only those of
    /// `locale` when given.
    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>>;

    /// Drop any memoized handle to the native database so the next query
    /// sees current data.
    fn invalidate(&self) {}
}

/// Run a package tool, mapping a failure to start it to [`Error::Tool`].
pub(crate) fn run_tool<R: Runtime + ?Sized>(
    runtime: &R,
    program: &str,
    args: &[String],
) -> Result<CommandOutput> {
    runtime.run(program, args).map_err(|source| Error::Tool {
        command: format!("{} {}", program, args.join(" ")),
        source,
    })
}

pub(crate) fn parse_version(package: &str, upstream: &str) -> Result<Version> {
    Version::parse(upstream).map_err(|source| Error::InvalidVersion {
        package: package.to_string(),
        source,
    })
}
