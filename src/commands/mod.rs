//! Command implementations behind the `distrodb` binary.
//!
//! Each command queries the bound [`Distro`] and returns a [`Report`]; the
//! binary decides how to print it.

use anyhow::{Context, Result};
use log::debug;

use crate::distro::Distro;
use crate::i18n;

mod report;

pub use report::Report;

pub fn detect(distro: &Distro) -> Report {
    Report::Detect {
        distro: distro.kind(),
        backend: distro.package_db().backend_kind(),
    }
}

#[tracing::instrument(skip(distro))]
pub fn version(distro: &Distro, package: &str) -> Result<Report> {
    let version = distro
        .package_db()
        .version(package)
        .with_context(|| format!("Failed to query the version of {}", package))?;
    Ok(Report::Version {
        package: package.to_string(),
        version,
    })
}

#[tracing::instrument(skip(distro))]
pub fn files(distro: &Distro, package: &str) -> Result<Report> {
    let files = distro
        .package_db()
        .files(package)
        .with_context(|| format!("Failed to list the files of {}", package))?;
    debug!("{} owns {} path(s)", package, files.len());
    Ok(Report::Files {
        package: package.to_string(),
        files,
    })
}

#[tracing::instrument(skip(distro))]
pub fn dependencies(distro: &Distro, package: &str) -> Result<Report> {
    let dependencies = distro
        .package_db()
        .dependencies(package)
        .with_context(|| format!("Failed to list the dependencies of {}", package))?;
    Ok(Report::Dependencies {
        package: package.to_string(),
        dependencies,
    })
}

#[tracing::instrument(skip(distro))]
pub fn mo_files(distro: &Distro, locale: Option<&str>) -> Result<Report> {
    let files = distro
        .package_db()
        .mo_files(locale)
        .context("Failed to search the locale directories")?;
    Ok(Report::MoFiles {
        locale: locale.map(String::from),
        files,
    })
}

#[tracing::instrument(skip(distro))]
pub fn package_mo_files(distro: &Distro, package: &str, include_deps: bool) -> Result<Report> {
    let files = i18n::mo_files_for_package(distro.package_db(), package, include_deps)
        .with_context(|| format!("Failed to collect the catalogs of {}", package))?;
    Ok(Report::PackageMoFiles {
        package: package.to_string(),
        include_deps,
        files,
    })
}

#[tracing::instrument(skip(distro))]
pub fn domains(
    distro: &Distro,
    package: &str,
    include_deps: bool,
    lang: Option<&str>,
) -> Result<Report> {
    let domains = i18n::translation_domains(distro, package, include_deps, lang)
        .with_context(|| format!("Failed to collect the translation domains of {}", package))?;
    Ok(Report::Domains {
        package: package.to_string(),
        domains,
    })
}

pub fn capabilities(distro: &Distro) -> Report {
    let db = distro.package_db();
    Report::Capabilities {
        backend: db.backend_kind(),
        capabilities: db.capabilities(),
    }
}
