use log::{debug, info, warn};

use super::DistroKind;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

const SOLARIS_RELEASE: &str = "/etc/release";
const SOLARIS_SIGNATURE: &str = "Solaris";
const UNKNOWN: &str = "Unknown";

/// Outcome of a matching marker probe.
#[derive(Debug, Clone, Copy)]
enum Verdict {
    Supported(DistroKind),
    /// Recognized, but there is no backend for it.
    Unsupported(&'static str),
}

/// Marker files in priority order. The first one present wins.
const MARKERS: [(&str, Verdict); 8] = [
    ("/etc/SuSE-release", Verdict::Supported(DistroKind::Suse)),
    ("/etc/fedora-release", Verdict::Supported(DistroKind::Fedora)),
    ("/etc/redhat-release", Verdict::Supported(DistroKind::Rhel)),
    ("/usr/share/doc/ubuntu-minimal", Verdict::Supported(DistroKind::Ubuntu)),
    ("/etc/debian_version", Verdict::Supported(DistroKind::Debian)),
    ("/etc/gentoo-release", Verdict::Supported(DistroKind::Gentoo)),
    ("/etc/slackware-version", Verdict::Unsupported("Slackware")),
    ("/var/lib/conarydb/conarydb", Verdict::Supported(DistroKind::Conary)),
];

/// Is an environment value one of `yes`, `true`, `1`, `on` (any case)?
pub fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}

/// Runs the ordered detection probes against a [`Runtime`].
pub struct DistroDetector<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    config: &'a Config,
}

impl<'a, R: Runtime + ?Sized> DistroDetector<'a, R> {
    pub fn new(runtime: &'a R, config: &'a Config) -> Self {
        Self { runtime, config }
    }

    /// Identify the running distribution.
    ///
    /// Probes are evaluated in a fixed order and the first match wins.
    /// Fails with [`Error::DistributionNotSupported`] for Slackware and when
    /// nothing matches.
    #[tracing::instrument(skip(self))]
    pub fn detect(&self) -> Result<DistroKind> {
        let kind = self.probe().inspect_err(|err| warn!("{}", err))?;
        info!("Detecting distribution: {}", kind);
        Ok(kind)
    }

    fn probe(&self) -> Result<DistroKind> {
        if self.override_requested() {
            debug!("{} is set, forcing JHBuild", self.config.override_var);
            return Ok(DistroKind::JhBuild);
        }

        for (marker, verdict) in MARKERS {
            if !self.runtime.exists(&self.config.resolve(marker)) {
                continue;
            }
            debug!("Found {}", marker);
            return match verdict {
                Verdict::Supported(kind) => Ok(kind),
                Verdict::Unsupported(label) => {
                    Err(Error::DistributionNotSupported(label.to_string()))
                }
            };
        }

        if self.is_solaris() {
            debug!("{} identifies Solaris", SOLARIS_RELEASE);
            return Ok(DistroKind::Solaris);
        }

        Err(Error::DistributionNotSupported(UNKNOWN.to_string()))
    }

    fn override_requested(&self) -> bool {
        self.runtime
            .env_var(&self.config.override_var)
            .is_ok_and(|value| is_affirmative(&value))
    }

    fn is_solaris(&self) -> bool {
        let release = self.config.resolve(SOLARIS_RELEASE);
        if !self.runtime.exists(&release) {
            return false;
        }
        match self.runtime.read_first_line(&release) {
            Ok(line) => line.contains(SOLARIS_SIGNATURE),
            Err(err) => {
                debug!("Cannot read {:?}: {:#}", release, err);
                false
            }
        }
    }
}
