use std::path::PathBuf;

use thiserror::Error;

use crate::version::ParseVersionError;

pub const PATCH_MESSAGE: &str = "Please send patches to add support for it";

/// Errors raised by distribution detection and package queries.
#[derive(Error, Debug)]
pub enum Error {
    /// No detection rule matched, or the matched platform is not supported.
    #[error("Distribution not supported: {0}. {hint}", hint = PATCH_MESSAGE)]
    DistributionNotSupported(String),

    /// The queried package is absent from the backend's data source.
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// The operation is categorically unsupported on this backend.
    #[error("{operation} is not implemented for the {backend} package database")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// A package tool could not be run at all.
    #[error("Failed to run `{command}`")]
    Tool {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Environment variable {0} is not set")]
    MissingEnvironment(String),

    #[error("Package {package} reports an invalid version")]
    InvalidVersion {
        package: String,
        #[source]
        source: ParseVersionError,
    },

    #[error("Failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Error::Unsupported { backend, operation }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PackageNotFound(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
