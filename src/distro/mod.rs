//! Distribution model.
//!
//! A [`Distro`] pairs the detected [`DistroKind`] with the one package
//! database backend selected for it. Backend selection is a flat lookup
//! ([`DistroKind::backend_kind`]); RHEL and Fedora share the RPM backend,
//! Ubuntu is the APT backend with an extra locale root.

mod detect;

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::package_db::{
    AptBackend, BackendKind, ConaryBackend, JhBuildBackend, PackageDb, PortageBackend,
    RpmBackend, SolarisBackend,
};
use crate::runtime::Runtime;

pub use detect::{DistroDetector, is_affirmative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistroKind {
    Fedora,
    Rhel,
    Debian,
    Ubuntu,
    Suse,
    Gentoo,
    Conary,
    Solaris,
    JhBuild,
}

impl DistroKind {
    pub const ALL: [DistroKind; 9] = [
        DistroKind::Fedora,
        DistroKind::Rhel,
        DistroKind::Debian,
        DistroKind::Ubuntu,
        DistroKind::Suse,
        DistroKind::Gentoo,
        DistroKind::Conary,
        DistroKind::Solaris,
        DistroKind::JhBuild,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DistroKind::Fedora => "Fedora",
            DistroKind::Rhel => "RHEL",
            DistroKind::Debian => "Debian",
            DistroKind::Ubuntu => "Ubuntu",
            DistroKind::Suse => "Suse",
            DistroKind::Gentoo => "Gentoo",
            DistroKind::Conary => "Conary",
            DistroKind::Solaris => "Solaris",
            DistroKind::JhBuild => "JHBuild",
        }
    }

    /// The package database implementation serving this distribution.
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            DistroKind::Fedora | DistroKind::Rhel | DistroKind::Suse => BackendKind::Rpm,
            DistroKind::Debian => BackendKind::Apt,
            DistroKind::Ubuntu => BackendKind::UbuntuApt,
            DistroKind::Gentoo => BackendKind::Portage,
            DistroKind::Conary => BackendKind::Conary,
            DistroKind::Solaris => BackendKind::Solaris,
            DistroKind::JhBuild => BackendKind::JhBuild,
        }
    }
}

impl fmt::Display for DistroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DistroKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// The running distribution and its bound package database.
pub struct Distro {
    kind: DistroKind,
    package_db: Box<dyn PackageDb>,
}

impl fmt::Debug for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distro")
            .field("kind", &self.kind)
            .field("backend", &self.package_db.backend_kind())
            .finish()
    }
}

impl Distro {
    /// Detect the running distribution and bind its backend.
    pub fn detect<R: Runtime + 'static>(runtime: Arc<R>, config: &Config) -> Result<Self> {
        let kind = DistroDetector::new(&*runtime, config).detect()?;
        Self::bind(kind, runtime, config)
    }

    /// Construct the backend for `kind`.
    ///
    /// Only the JHBuild backend can fail here, when its build environment is
    /// incomplete.
    pub fn bind<R: Runtime + 'static>(
        kind: DistroKind,
        runtime: Arc<R>,
        config: &Config,
    ) -> Result<Self> {
        let package_db: Box<dyn PackageDb> = match kind.backend_kind() {
            BackendKind::Rpm => Box::new(RpmBackend::new(runtime, config)),
            BackendKind::Apt => Box::new(AptBackend::new(runtime, config)),
            BackendKind::UbuntuApt => Box::new(AptBackend::ubuntu(runtime, config)),
            BackendKind::Portage => Box::new(PortageBackend::new(runtime, config)),
            BackendKind::Conary => Box::new(ConaryBackend::new(runtime, config)),
            BackendKind::Solaris => Box::new(SolarisBackend::new(runtime, config)),
            BackendKind::JhBuild => Box::new(JhBuildBackend::new(runtime, config)?),
        };
        Ok(Self { kind, package_db })
    }

    /// Pair `kind` with an already constructed backend.
    pub fn with_package_db(kind: DistroKind, package_db: Box<dyn PackageDb>) -> Self {
        Self { kind, package_db }
    }

    pub fn kind(&self) -> DistroKind {
        self.kind
    }

    pub fn package_db(&self) -> &dyn PackageDb {
        self.package_db.as_ref()
    }
}
