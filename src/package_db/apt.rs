//! APT/dpkg package database (Debian, Ubuntu).

use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb, parse_version, run_tool};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::{Runtime, args};
use crate::version::Version;

const DPKG: &str = "dpkg";
const DPKG_QUERY: &str = "dpkg-query";
const CACHE_FORMAT: &str = "${Package}\t${Status}\t${Version}\t${Depends}\n";
const UBUNTU_LANGPACK_ROOT: &str = "/usr/share/locale-langpack";
const ADMIN_DIR: &str = "/var/lib/dpkg";

/// One entry of the dpkg status database.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    installed: bool,
    version: String,
    depends: String,
}

/// Snapshot of the dpkg status database, loaded once per backend.
#[derive(Debug, Default)]
struct AptCache {
    packages: HashMap<String, CacheEntry>,
}

impl AptCache {
    fn parse(output: &str) -> Self {
        let mut packages: HashMap<String, CacheEntry> = HashMap::new();
        for line in output.lines() {
            let mut fields = line.split('\t');
            let (Some(name), Some(status), Some(version)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let entry = CacheEntry {
                installed: status.split_whitespace().last() == Some("installed"),
                version: version.to_string(),
                depends: fields.next().unwrap_or_default().to_string(),
            };
            // Multi-arch packages are listed once per architecture
            match packages.get_mut(name) {
                Some(existing) => {
                    if entry.installed && !existing.installed {
                        *existing = entry;
                    }
                }
                None => {
                    packages.insert(name.to_string(), entry);
                }
            }
        }
        Self { packages }
    }

    fn installed(&self, name: &str) -> Option<&CacheEntry> {
        self.packages.get(name).filter(|entry| entry.installed)
    }
}

/// Upstream part of a Debian version: `1:2.76.1+dfsg-1ubuntu0.1` is `2.76.1`.
fn upstream_version(debian_version: &str) -> &str {
    let without_epoch = debian_version
        .split_once(':')
        .map_or(debian_version, |(_, rest)| rest);
    let without_revision = without_epoch
        .rsplit_once('-')
        .map_or(without_epoch, |(upstream, _)| upstream);
    without_revision
        .split(['+', '~'])
        .next()
        .unwrap_or(without_revision)
}

/// Target package names of a `Depends` field. Only the first alternative of
/// each `a | b` group counts.
fn depends_names(depends: &str) -> impl Iterator<Item = &str> {
    depends.split(',').filter_map(|group| {
        let first = group.split('|').next()?.trim();
        let name = first
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()?;
        let name = name.split(':').next()?;
        (!name.is_empty()).then_some(name)
    })
}

pub struct AptBackend<R: Runtime> {
    runtime: Arc<R>,
    kind: BackendKind,
    /// dpkg database below an alternate root; `None` queries the host's.
    admin_dir: Option<PathBuf>,
    locales: LocaleRoots,
    cache: Mutex<Option<Arc<AptCache>>>,
}

impl<R: Runtime> AptBackend<R> {
    pub fn new(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            runtime,
            kind: BackendKind::Apt,
            admin_dir: config.tool_root().map(|_| config.resolve(ADMIN_DIR)),
            locales: LocaleRoots::new::<&str>(config, &[]),
            cache: Mutex::new(None),
        }
    }

    /// Ubuntu ships most translations in language packs below an extra
    /// locale root.
    pub fn ubuntu(runtime: Arc<R>, config: &Config) -> Self {
        Self {
            kind: BackendKind::UbuntuApt,
            locales: LocaleRoots::new(config, &[UBUNTU_LANGPACK_ROOT]),
            ..Self::new(runtime, config)
        }
    }

    /// Arguments for `dpkg`/`dpkg-query`, prefixed with `--admindir` when
    /// querying an alternate root.
    fn dpkg_args(&self, rest: &[&str]) -> Vec<String> {
        let mut query = Vec::new();
        if let Some(admin_dir) = &self.admin_dir {
            query.push(format!("--admindir={}", admin_dir.display()));
        }
        query.extend(args(rest.iter().copied()));
        query
    }

    /// The memoized status database, loaded on first use.
    ///
    /// The lock is held while loading so concurrent first queries run
    /// `dpkg-query` only once.
    fn cache(&self) -> Result<Arc<AptCache>> {
        let mut slot = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cache) = slot.as_ref() {
            return Ok(Arc::clone(cache));
        }

        let query = self.dpkg_args(&["-W", "-f", CACHE_FORMAT]);
        let output = run_tool(&*self.runtime, DPKG_QUERY, &query)?;
        let cache = Arc::new(AptCache::parse(&output.stdout));
        debug!("Loaded {} dpkg entries", cache.packages.len());
        *slot = Some(Arc::clone(&cache));
        Ok(cache)
    }
}

impl<R: Runtime> PackageDb for AptBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    #[tracing::instrument(skip(self))]
    fn version(&self, name: &str) -> Result<Version> {
        let cache = self.cache()?;
        let entry = cache
            .installed(name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        parse_version(name, upstream_version(&entry.version))
    }

    #[tracing::instrument(skip(self))]
    fn files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let output = run_tool(&*self.runtime, DPKG, &self.dpkg_args(&["-L", name]))?;
        let files: Vec<PathBuf> = output.lines().map(PathBuf::from).collect();
        if !output.success || files.is_empty() {
            debug!("dpkg -L {}: {}", name, output.stderr.trim());
            return Err(Error::PackageNotFound(name.to_string()));
        }
        Ok(files)
    }

    #[tracing::instrument(skip(self))]
    fn dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let cache = self.cache()?;
        let entry = cache
            .installed(name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        Ok(depends_names(&entry.depends)
            .filter(|dep| *dep != name)
            .map(String::from)
            .collect())
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }

    fn invalidate(&self) {
        debug!("Dropping dpkg cache");
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};

    const STATUS: &str = "\
gedit\tinstall ok installed\t44.2-1ubuntu1\tgedit-common (<< 44.3), gedit-common (>= 44), \
libc6 (>= 2.34), libglib2.0-0 (>= 2.76), gsettings-desktop-schemas | gsettings-backend, \
python3:any\n\
gedit-common\tinstall ok installed\t44.2-1ubuntu1\t\n\
libc6\tinstall ok installed\t2.38-1ubuntu6\tlibgcc-s1\n\
libc6\tinstall ok installed\t2.38-1ubuntu6\tlibgcc-s1\n\
evince\tdeinstall ok config-files\t45.0-1\tlibc6\n\
selfish\tinstall ok installed\t1:1.0+dfsg-2\tselfish, libc6\n\
broken\tinstall ok installed\tnot-a-version\t\n";

    fn runtime_with_status(times: usize) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| {
                program == "dpkg-query" && args.first().map(String::as_str) == Some("-W")
            })
            .times(times)
            .returning(|_, _| Ok(CommandOutput::ok(STATUS)));
        runtime
    }

    fn backend(runtime: MockRuntime) -> AptBackend<MockRuntime> {
        AptBackend::new(Arc::new(runtime), &Config::default())
    }

    #[test]
    fn test_upstream_version() {
        assert_eq!(upstream_version("44.2-1ubuntu1"), "44.2");
        assert_eq!(upstream_version("1:2.76.1+dfsg-1ubuntu0.1"), "2.76.1");
        assert_eq!(upstream_version("0.8.0~rc1-2"), "0.8.0");
        assert_eq!(upstream_version("2.1.4-3-1"), "2.1.4-3");
        assert_eq!(upstream_version("3.24"), "3.24");
    }

    #[test]
    fn test_depends_names() {
        let names: Vec<_> =
            depends_names("libc6 (>= 2.34), foo | bar, python3:any, libx11-6,  ").collect();
        assert_eq!(names, vec!["libc6", "foo", "python3", "libx11-6"]);
        assert_eq!(depends_names("").count(), 0);
    }

    #[test]
    fn test_version_strips_revision() {
        let db = backend(runtime_with_status(1));
        assert_eq!(db.version("gedit").unwrap(), Version::parse("44.2").unwrap());
        assert_eq!(db.version("selfish").unwrap(), Version::parse("1.0").unwrap());
    }

    #[test]
    fn test_cache_is_loaded_once() {
        let db = backend(runtime_with_status(1));
        db.version("gedit").unwrap();
        db.version("libc6").unwrap();
        db.dependencies("gedit").unwrap();
    }

    #[test]
    fn test_invalidate_reloads_cache() {
        let db = backend(runtime_with_status(2));
        db.version("gedit").unwrap();
        db.invalidate();
        db.version("gedit").unwrap();
    }

    #[test]
    fn test_version_not_found() {
        let db = backend(runtime_with_status(1));
        let err = db.version("nonexistent-pkg-xyz").unwrap_err();
        assert!(matches!(err, Error::PackageNotFound(ref n) if n == "nonexistent-pkg-xyz"));

        // Removed packages with leftover config files are not installed
        assert!(db.version("evince").unwrap_err().is_not_found());
    }

    #[test]
    fn test_version_unparsable() {
        let db = backend(runtime_with_status(1));
        let err = db.version("broken").unwrap_err();
        assert!(matches!(err, Error::InvalidVersion { .. }));
    }

    #[test]
    fn test_dependencies_first_alternative_deduped() {
        let db = backend(runtime_with_status(1));
        let deps = db.dependencies("gedit").unwrap();
        let expected: BTreeSet<String> = [
            "gedit-common",
            "gsettings-desktop-schemas",
            "libc6",
            "libglib2.0-0",
            "python3",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(deps, expected);
    }

    #[test]
    fn test_dependencies_exclude_self() {
        let db = backend(runtime_with_status(1));
        let deps = db.dependencies("selfish").unwrap();
        assert!(!deps.contains("selfish"));
        assert!(deps.contains("libc6"));
    }

    #[test]
    fn test_dependencies_not_found() {
        let db = backend(runtime_with_status(1));
        assert!(db.dependencies("evince").unwrap_err().is_not_found());
    }

    #[test]
    fn test_files_from_dpkg() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| program == "dpkg" && args.join(" ") == "-L gedit")
            .returning(|_, _| Ok(CommandOutput::ok("/.\n/usr\n/usr/bin/gedit\n\n")));

        let files = backend(runtime).files("gedit").unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/."),
                PathBuf::from("/usr"),
                PathBuf::from("/usr/bin/gedit"),
            ]
        );
    }

    #[test]
    fn test_files_not_installed() {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| {
            Ok(CommandOutput::failed(
                "dpkg-query: package 'nonexistent-pkg-xyz' is not installed\n",
            ))
        });

        let err = backend(runtime).files("nonexistent-pkg-xyz").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_alternate_root_uses_its_dpkg_database() {
        const ADMIN_DIR_ARG: &str = "--admindir=/srv/debian/var/lib/dpkg";
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| {
                program == "dpkg-query"
                    && args.first().map(String::as_str) == Some(ADMIN_DIR_ARG)
                    && args.get(1).map(String::as_str) == Some("-W")
            })
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok(STATUS)));
        runtime
            .expect_run()
            .withf(|program, args| {
                program == "dpkg" && args.join(" ") == format!("{} -L gedit", ADMIN_DIR_ARG)
            })
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok("/usr/bin/gedit\n")));

        let config = Config::default().with_root("/srv/debian");
        let db = AptBackend::ubuntu(Arc::new(runtime), &config);
        assert_eq!(db.version("gedit").unwrap(), Version::parse("44.2").unwrap());
        assert_eq!(db.files("gedit").unwrap(), vec![PathBuf::from("/usr/bin/gedit")]);
    }

    #[test]
    fn test_ubuntu_flavour_adds_langpack_root() {
        let db = AptBackend::ubuntu(Arc::new(MockRuntime::new()), &Config::default());
        assert_eq!(db.backend_kind(), BackendKind::UbuntuApt);
        assert_eq!(
            db.locale_roots().roots(),
            &[
                PathBuf::from("/usr/share/locale"),
                PathBuf::from("/usr/share/locale-langpack"),
            ]
        );

        let debian = backend(MockRuntime::new());
        assert_eq!(debian.locale_roots().roots().len(), 1);
    }
}
