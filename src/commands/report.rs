use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use crate::distro::DistroKind;
use crate::package_db::{BackendKind, Capabilities};
use crate::version::Version;

/// Result of a command, printed as text (one item per line) or as a single
/// JSON document.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Detect {
        distro: DistroKind,
        backend: BackendKind,
    },
    Version {
        package: String,
        version: Version,
    },
    Files {
        package: String,
        files: Vec<PathBuf>,
    },
    Dependencies {
        package: String,
        dependencies: BTreeSet<String>,
    },
    MoFiles {
        locale: Option<String>,
        files: BTreeSet<PathBuf>,
    },
    PackageMoFiles {
        package: String,
        include_deps: bool,
        files: BTreeSet<PathBuf>,
    },
    Domains {
        package: String,
        domains: Vec<String>,
    },
    Capabilities {
        backend: BackendKind,
        capabilities: Capabilities,
    },
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

impl Report {
    pub fn write_to<W: Write>(&self, out: &mut W, json: bool) -> Result<()> {
        if json {
            serde_json::to_writer_pretty(&mut *out, self).context("Failed to encode report")?;
            writeln!(out)?;
            return Ok(());
        }

        match self {
            Report::Detect { distro, .. } => writeln!(out, "{}", distro)?,
            Report::Version { version, .. } => writeln!(out, "{}", version)?,
            Report::Files { files, .. } => {
                for file in files {
                    writeln!(out, "{}", file.display())?;
                }
            }
            Report::Dependencies { dependencies, .. } => {
                for dep in dependencies {
                    writeln!(out, "{}", dep)?;
                }
            }
            Report::MoFiles { files, .. } | Report::PackageMoFiles { files, .. } => {
                for file in files {
                    writeln!(out, "{}", file.display())?;
                }
            }
            Report::Domains { domains, .. } => {
                for domain in domains {
                    writeln!(out, "{}", domain)?;
                }
            }
            Report::Capabilities {
                backend,
                capabilities,
            } => {
                writeln!(out, "backend: {}", backend)?;
                writeln!(out, "version: {}", yes_no(capabilities.version))?;
                writeln!(out, "files: {}", yes_no(capabilities.files))?;
                writeln!(out, "dependencies: {}", yes_no(capabilities.dependencies))?;
            }
        }
        Ok(())
    }

    /// Print to stdout.
    pub fn print(&self, json: bool) -> Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.write_to(&mut lock, json)
    }
}
