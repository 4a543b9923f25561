//! Gettext catalogs and translation domains of installed packages.

use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::distro::{Distro, DistroKind};
use crate::error::Result;
use crate::package_db::{PackageDb, is_mo_file};

/// Domains that are never reported. Looking up `popt` makes gettext bail
/// out.
pub const DOMAIN_BLACKLIST: [&str; 1] = ["popt"];

const UBUNTU_LANGUAGE_PACK_PREFIX: &str = "language-pack-gnome-";

/// `.mo` files owned by `name` and, with `include_deps`, by each of its
/// dependencies.
///
/// Dependencies are followed one level only; backends already report the
/// full dependency closure where they can. Dependencies that are not
/// installed are skipped. A backend without dependency support yields the
/// package's own catalogs.
#[tracing::instrument(skip(db))]
pub fn mo_files_for_package(
    db: &dyn PackageDb,
    name: &str,
    include_deps: bool,
) -> Result<BTreeSet<PathBuf>> {
    let mut found: BTreeSet<PathBuf> = db
        .files(name)?
        .into_iter()
        .filter(|path| is_mo_file(path))
        .collect();

    if !include_deps {
        return Ok(found);
    }

    let deps = match db.dependencies(name) {
        Ok(deps) => deps,
        Err(err) if err.is_unsupported() => {
            debug!("{}, using only the files of {}", err, name);
            return Ok(found);
        }
        Err(err) => return Err(err),
    };

    for dep in &deps {
        match db.files(dep) {
            Ok(files) => found.extend(files.into_iter().filter(|path| is_mo_file(path))),
            Err(err) if err.is_not_found() => debug!("Skipping dependency {}: {}", dep, err),
            Err(err) => return Err(err),
        }
    }
    Ok(found)
}

/// Domain of a catalog path shaped `<...>/<locale>/LC_MESSAGES/<domain>.mo`.
pub fn translation_domain(path: &Path) -> Option<&str> {
    if !is_mo_file(path) {
        return None;
    }
    let messages = path.parent()?;
    if messages.file_name()? != "LC_MESSAGES" {
        return None;
    }
    // The locale directory itself
    messages.parent()?.file_name()?;
    path.file_stem()?.to_str()
}

/// Distinct translation domains of the catalogs of `name` (and its
/// dependencies with `include_deps`).
pub fn translation_domains_for_package(
    db: &dyn PackageDb,
    name: &str,
    include_deps: bool,
) -> Result<BTreeSet<String>> {
    Ok(mo_files_for_package(db, name, include_deps)?
        .iter()
        .filter_map(|path| translation_domain(path))
        .map(String::from)
        .collect())
}

/// Translation domains to search for the strings of `name`.
///
/// On Ubuntu most translations live in one language pack per language,
/// so the domains of `language-pack-gnome-<ll>` (from the first two letters
/// of `lang`) come first. Blacklisted domains are dropped and every domain
/// appears once.
#[tracing::instrument(skip(distro))]
pub fn translation_domains(
    distro: &Distro,
    name: &str,
    include_deps: bool,
    lang: Option<&str>,
) -> Result<Vec<String>> {
    let db = distro.package_db();
    let mut domains: Vec<String> = Vec::new();
    let mut push = |domain: String| {
        if !DOMAIN_BLACKLIST.contains(&domain.as_str()) && !domains.contains(&domain) {
            domains.push(domain);
        }
    };

    if distro.kind() == DistroKind::Ubuntu {
        match lang.and_then(|lang| lang.get(..2)) {
            Some(code) => {
                let pack = format!("{}{}", UBUNTU_LANGUAGE_PACK_PREFIX, code);
                match translation_domains_for_package(db, &pack, true) {
                    Ok(pack_domains) => pack_domains.into_iter().for_each(&mut push),
                    Err(err) if err.is_not_found() => debug!("{} is not installed", pack),
                    Err(err) => return Err(err),
                }
            }
            None => debug!("No usable language, skipping language packs"),
        }
    }

    translation_domains_for_package(db, name, include_deps)?
        .into_iter()
        .for_each(&mut push);
    Ok(domains)
}
