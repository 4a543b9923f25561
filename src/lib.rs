pub mod commands;
pub mod config;
pub mod distro;
pub mod error;
pub mod i18n;
pub mod package_db;
pub mod runtime;
pub mod version;

pub use config::Config;
pub use distro::{Distro, DistroDetector, DistroKind};
pub use error::{Error, Result};
pub use package_db::{BackendKind, Capabilities, PackageDb};
pub use version::Version;
