//! Locale roots and gettext catalog lookup.

use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

pub const DEFAULT_LOCALE_ROOT: &str = "/usr/share/locale";

/// Does the given filename look like a gettext mo file?
pub fn is_mo_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() > 3 && name.ends_with(".mo"))
}

/// A locale must be a single plain path component such as `de` or `pt_BR`.
fn is_plain_locale(locale: &str) -> bool {
    let mut components = Path::new(locale).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Ordered list of directories holding `<locale>/LC_MESSAGES/*.mo` trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRoots {
    roots: Vec<PathBuf>,
}

impl LocaleRoots {
    /// The default root plus `extra` (backend specific) and the configured
    /// extra roots, all resolved below the configured filesystem root.
    pub fn new<P: AsRef<Path>>(config: &Config, extra: &[P]) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();
        let candidates = std::iter::once(Path::new(DEFAULT_LOCALE_ROOT))
            .chain(extra.iter().map(|p| p.as_ref()))
            .chain(config.extra_locale_roots.iter().map(PathBuf::as_path));
        for candidate in candidates {
            let resolved = config.resolve(candidate);
            if !roots.contains(&resolved) {
                roots.push(resolved);
            }
        }
        Self { roots }
    }

    pub fn from_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Collect every `.mo` file below the roots.
    ///
    /// With a locale only `<root>/<locale>` is walked. Roots that do not exist
    /// are skipped.
    #[tracing::instrument(skip(self, runtime))]
    pub fn mo_files<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        locale: Option<&str>,
    ) -> Result<BTreeSet<PathBuf>> {
        let mut found = BTreeSet::new();

        if let Some(locale) = locale
            && !is_plain_locale(locale)
        {
            warn!("Ignoring invalid locale {:?}", locale);
            return Ok(found);
        }

        for root in &self.roots {
            let dir = match locale {
                Some(locale) => root.join(locale),
                None => root.clone(),
            };

            if !runtime.is_dir(&dir) {
                debug!("Locale directory {:?} does not exist, skipping", dir);
                continue;
            }
            walk(runtime, &dir, &mut found)?;
        }

        debug!("Found {} mo file(s)", found.len());
        Ok(found)
    }
}

/// Recursively collect mo files. Symlinked directories are not followed.
fn walk<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    found: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    let entries = runtime.read_dir(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        if runtime.is_dir(&entry) {
            if runtime.is_symlink(&entry) {
                debug!("Not following symlinked directory {:?}", entry);
                continue;
            }
            walk(runtime, &entry, found)?;
        } else if is_mo_file(&entry) {
            found.insert(entry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime, is_path_under};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_is_mo_file() {
        assert!(is_mo_file(Path::new(
            "/usr/share/locale/de/LC_MESSAGES/glib20.mo"
        )));
        assert!(!is_mo_file(Path::new("/usr/share/locale/de/LC_MESSAGES")));
        assert!(!is_mo_file(Path::new("/usr/share/locale/locale.alias")));
        assert!(!is_mo_file(Path::new("/usr/share/doc/demo.mov")));
        assert!(!is_mo_file(Path::new("/usr/share/.mo")));
    }

    #[test]
    fn test_new_resolves_and_dedupes_roots() {
        let config = Config {
            extra_locale_roots: vec![PathBuf::from("/usr/share/locale")],
            ..Config::default()
        }
        .with_root("/srv/chroot");

        let roots = LocaleRoots::new(&config, &["/usr/share/locale-langpack"]);
        assert_eq!(
            roots.roots(),
            &[
                PathBuf::from("/srv/chroot/usr/share/locale"),
                PathBuf::from("/srv/chroot/usr/share/locale-langpack"),
            ]
        );
    }

    #[test]
    fn test_mo_files_walks_all_roots() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("locale");
        let second = dir.path().join("locale-langpack");
        touch(&first.join("de/LC_MESSAGES/glib20.mo"));
        touch(&first.join("fr/LC_MESSAGES/gtk30.mo"));
        touch(&first.join("locale.alias"));
        touch(&second.join("de/LC_MESSAGES/gedit.mo"));

        let roots = LocaleRoots::from_roots(vec![first.clone(), second.clone()]);
        let found = roots.mo_files(&RealRuntime, None).unwrap();

        let expected: BTreeSet<PathBuf> = [
            first.join("de/LC_MESSAGES/glib20.mo"),
            first.join("fr/LC_MESSAGES/gtk30.mo"),
            second.join("de/LC_MESSAGES/gedit.mo"),
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_mo_files_scoped_to_locale() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("locale");
        touch(&root.join("de/LC_MESSAGES/glib20.mo"));
        touch(&root.join("de_AT/LC_MESSAGES/glib20.mo"));
        touch(&root.join("fr/LC_MESSAGES/glib20.mo"));

        let roots = LocaleRoots::from_roots(vec![root.clone()]);
        let found = roots.mo_files(&RealRuntime, Some("de")).unwrap();

        assert_eq!(found.len(), 1);
        for path in &found {
            assert!(is_path_under(path, &root.join("de")));
        }
    }

    #[test]
    fn test_mo_files_rejects_escaping_locale() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("locale");
        touch(&root.join("de/LC_MESSAGES/glib20.mo"));
        touch(&dir.path().join("elsewhere/evil.mo"));

        let roots = LocaleRoots::from_roots(vec![root]);
        assert!(roots.mo_files(&RealRuntime, Some("../elsewhere")).unwrap().is_empty());
        assert!(roots.mo_files(&RealRuntime, Some("..")).unwrap().is_empty());
        assert!(roots.mo_files(&RealRuntime, Some(".")).unwrap().is_empty());
        assert!(roots.mo_files(&RealRuntime, Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_mo_files_rejects_sibling_locale() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("locale");
        touch(&root.join("de/LC_MESSAGES/x.mo"));
        touch(&root.join("fr/LC_MESSAGES/x.mo"));

        let roots = LocaleRoots::from_roots(vec![root]);
        assert!(roots.mo_files(&RealRuntime, Some("de/../fr")).unwrap().is_empty());
        assert!(roots.mo_files(&RealRuntime, Some("de/LC_MESSAGES")).unwrap().is_empty());
        assert!(roots.mo_files(&RealRuntime, Some("./fr")).unwrap().is_empty());
    }

    #[test]
    fn test_is_plain_locale() {
        for locale in ["de", "pt_BR", "sr@latin", "de_DE.UTF-8"] {
            assert!(is_plain_locale(locale), "{}", locale);
        }
        for locale in ["", ".", "..", "/etc", "de/../fr", "de/LC_MESSAGES", "./de"] {
            assert!(!is_plain_locale(locale), "{}", locale);
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_mo_files_does_not_follow_directory_symlinks() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("locale");
        touch(&root.join("de/LC_MESSAGES/x.mo"));
        std::os::unix::fs::symlink(&root, root.join("de/loop")).unwrap();

        let roots = LocaleRoots::from_roots(vec![root.clone()]);
        let expected: BTreeSet<PathBuf> = [root.join("de/LC_MESSAGES/x.mo")].into_iter().collect();
        assert_eq!(roots.mo_files(&RealRuntime, None).unwrap(), expected);
        assert_eq!(roots.mo_files(&RealRuntime, Some("de")).unwrap(), expected);
    }

    #[test]
    fn test_mo_files_skips_missing_roots() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/usr/share/locale/xx")))
            .returning(|_| false);

        let roots = LocaleRoots::from_roots(vec![PathBuf::from("/usr/share/locale")]);
        let found = roots.mo_files(&runtime, Some("xx")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_mo_files_reports_unreadable_directory() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        runtime.expect_is_symlink().returning(|_| false);
        runtime
            .expect_read_dir()
            .returning(|_| Err(anyhow::anyhow!("Permission denied")));

        let roots = LocaleRoots::from_roots(vec![PathBuf::from("/usr/share/locale")]);
        let err = roots.mo_files(&runtime, None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
