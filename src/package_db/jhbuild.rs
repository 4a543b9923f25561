//! JHBuild: modules built from source into a development prefix.

use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{BackendKind, Capabilities, LocaleRoots, PackageDb, parse_version, run_tool};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::runtime::{CommandOutput, Runtime, args, common_prefix};
use crate::version::Version;

const JHBUILD: &str = "jhbuild";
const INSTALL_VERSION: &str = "Install version:";

/// Variables set by `jhbuild shell` that all point into the install prefix.
pub const PREFIX_VARS: [&str; 3] = ["LD_LIBRARY_PATH", "XDG_CONFIG_DIRS", "PKG_CONFIG_PATH"];

pub struct JhBuildBackend<R: Runtime> {
    runtime: Arc<R>,
    /// `jhbuild` only knows the host's checkout, so its queries are refused
    /// below an alternate root.
    host_root: bool,
    prefix: PathBuf,
    manifests: PathBuf,
    locales: LocaleRoots,
}

impl<R: Runtime> JhBuildBackend<R> {
    /// Derive the install prefix from the build environment.
    ///
    /// Fails with [`Error::MissingEnvironment`] unless every variable in
    /// [`PREFIX_VARS`] is set.
    pub fn new(runtime: Arc<R>, config: &Config) -> Result<Self> {
        let mut entries = Vec::with_capacity(PREFIX_VARS.len());
        for var in PREFIX_VARS {
            let value = runtime
                .env_var(var)
                .map_err(|_| Error::MissingEnvironment(var.to_string()))?;
            // Search path lists start with the jhbuild prefix
            let first = value.split(':').next().unwrap_or_default().to_string();
            entries.push(first);
        }

        let prefix = common_prefix(&entries);
        debug!("JHBuild prefix is {:?}", prefix);

        Ok(Self {
            host_root: config.tool_root().is_none(),
            manifests: config.resolve(prefix.join("_jhbuild").join("manifests")),
            locales: LocaleRoots::new(config, &[prefix.join("share").join("locale")]),
            prefix,
            runtime,
        })
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn jhbuild(&self, operation: &'static str, command: &str, name: &str) -> Result<CommandOutput> {
        if !self.host_root {
            debug!("jhbuild {} needs the host root", command);
            return Err(Error::unsupported(BackendKind::JhBuild.name(), operation));
        }
        run_tool(&*self.runtime, JHBUILD, &args([command, name]))
    }
}

/// Value of the `Install version:` line of `jhbuild info`, without any
/// `-suffix`.
fn install_version(info: &str) -> Option<&str> {
    let value = info
        .lines()
        .find_map(|line| line.trim().strip_prefix(INSTALL_VERSION))?
        .trim();
    value.split('-').next().filter(|v| !v.is_empty())
}

impl<R: Runtime> PackageDb for JhBuildBackend<R> {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::JhBuild
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            version: self.host_root,
            files: true,
            dependencies: self.host_root,
        }
    }

    #[tracing::instrument(skip(self))]
    fn version(&self, name: &str) -> Result<Version> {
        let output = self.jhbuild("version", "info", name)?;
        if !output.success {
            return Err(Error::PackageNotFound(name.to_string()));
        }
        let upstream = install_version(&output.stdout)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        parse_version(name, upstream)
    }

    #[tracing::instrument(skip(self))]
    fn files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let manifest = self.manifests.join(name);
        if !self.runtime.exists(&manifest) {
            debug!("No manifest at {:?}", manifest);
            return Err(Error::PackageNotFound(name.to_string()));
        }
        let content = self
            .runtime
            .read_to_string(&manifest)
            .map_err(|source| Error::Io {
                path: manifest,
                source,
            })?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let output = self.jhbuild("dependencies", "list", name)?;
        if !output.success {
            debug!("jhbuild list {} failed: {}", name, output.stderr.trim());
            return Err(Error::PackageNotFound(name.to_string()));
        }
        Ok(output
            .lines()
            .filter(|module| *module != name)
            .map(String::from)
            .collect())
    }

    fn locale_roots(&self) -> &LocaleRoots {
        &self.locales
    }

    fn mo_files(&self, locale: Option<&str>) -> Result<BTreeSet<PathBuf>> {
        self.locales.mo_files(&*self.runtime, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};
    use mockall::predicate::eq;
    use std::env::VarError;

    fn jhbuild_env(runtime: &mut MockRuntime) {
        runtime.expect_env_var().returning(|key| match key {
            "LD_LIBRARY_PATH" => Ok("/opt/gnome/lib64:/usr/lib64".to_string()),
            "XDG_CONFIG_DIRS" => Ok("/opt/gnome/etc/xdg:/etc/xdg".to_string()),
            "PKG_CONFIG_PATH" => Ok("/opt/gnome/lib64/pkgconfig".to_string()),
            _ => Err(VarError::NotPresent),
        });
    }

    fn backend(mut runtime: MockRuntime) -> JhBuildBackend<MockRuntime> {
        jhbuild_env(&mut runtime);
        JhBuildBackend::new(Arc::new(runtime), &Config::default()).unwrap()
    }

    #[test]
    fn test_prefix_is_component_wise() {
        let db = backend(MockRuntime::new());
        assert_eq!(db.prefix(), Path::new("/opt/gnome"));
        assert_eq!(
            db.locale_roots().roots(),
            &[
                PathBuf::from("/usr/share/locale"),
                PathBuf::from("/opt/gnome/share/locale"),
            ]
        );
    }

    #[test]
    fn test_missing_environment() {
        let mut runtime = MockRuntime::new();
        runtime.expect_env_var().returning(|key| match key {
            "LD_LIBRARY_PATH" => Ok("/opt/gnome/lib64".to_string()),
            _ => Err(VarError::NotPresent),
        });

        let err = JhBuildBackend::new(Arc::new(runtime), &Config::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingEnvironment(ref v) if v == "XDG_CONFIG_DIRS"));
    }

    #[test]
    fn test_install_version() {
        assert_eq!(
            install_version("Name: gedit\nModule Set: gnome-apps\nInstall version: 44.2-3f0a\n"),
            Some("44.2")
        );
        assert_eq!(install_version("Name: gedit\nInstall version: \n"), None);
        assert_eq!(install_version("Name: gedit\n"), None);
    }

    #[test]
    fn test_version() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| program == "jhbuild" && args.join(" ") == "info glib")
            .returning(|_, _| {
                Ok(CommandOutput::ok(
                    "Name: glib\nInstall version: 2.78.0\nInstall date: 2024-01-01 10:00:00\n",
                ))
            });

        let version = backend(runtime).version("glib").unwrap();
        assert_eq!(version, Version::parse("2.78.0").unwrap());
    }

    #[test]
    fn test_version_not_installed() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .returning(|_, _| Ok(CommandOutput::ok("Name: glib\nModule Set: core\n")));

        assert!(backend(runtime).version("glib").unwrap_err().is_not_found());
    }

    #[test]
    fn test_files_from_manifest() {
        let manifest = PathBuf::from("/opt/gnome/_jhbuild/manifests/glib");
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(manifest.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(manifest))
            .returning(|_| {
                Ok("/opt/gnome/lib64/libglib-2.0.so\n\
                    /opt/gnome/share/locale/de/LC_MESSAGES/glib20.mo\n"
                    .to_string())
            });

        let files = backend(runtime).files("glib").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], PathBuf::from("/opt/gnome/lib64/libglib-2.0.so"));
    }

    #[test]
    fn test_files_without_manifest() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        assert!(backend(runtime).files("glib").unwrap_err().is_not_found());
    }

    #[test]
    fn test_dependencies_deduped_without_self() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| program == "jhbuild" && args.join(" ") == "list gedit")
            .returning(|_, _| {
                Ok(CommandOutput::ok(
                    "glib\n  gtk\n\ngtksourceview\nglib\ngedit\n",
                ))
            });

        let deps = backend(runtime).dependencies("gedit").unwrap();
        let expected: BTreeSet<String> = ["glib", "gtk", "gtksourceview"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(deps, expected);
    }

    #[test]
    fn test_alternate_root_refuses_tool_queries() {
        let mut runtime = MockRuntime::new();
        jhbuild_env(&mut runtime);
        runtime.expect_run().never();
        let manifest = PathBuf::from("/srv/chroot/opt/gnome/_jhbuild/manifests/glib");
        runtime
            .expect_exists()
            .with(eq(manifest.clone()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(manifest))
            .returning(|_| Ok("/opt/gnome/lib64/libglib-2.0.so\n".to_string()));

        let config = Config::default().with_root("/srv/chroot");
        let db = JhBuildBackend::new(Arc::new(runtime), &config).unwrap();

        let err = db.version("glib").unwrap_err();
        assert!(matches!(
            err,
            Error::Unsupported { backend: "JHBuild", operation: "version" }
        ));
        assert!(db.dependencies("glib").unwrap_err().is_unsupported());
        assert_eq!(db.files("glib").unwrap().len(), 1);
        assert_eq!(
            db.capabilities(),
            Capabilities {
                version: false,
                files: true,
                dependencies: false,
            }
        );
    }

    #[test]
    fn test_dependencies_unknown_module() {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| {
            Ok(CommandOutput::failed("jhbuild: module 'nonexistent-pkg-xyz' not found\n"))
        });

        let err = backend(runtime).dependencies("nonexistent-pkg-xyz").unwrap_err();
        assert!(err.is_not_found());
    }
}
