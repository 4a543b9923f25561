//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep the `..` if there is nothing left to pop
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(dir))
}

/// Longest common leading directory of all `paths`, compared component by
/// component.
///
/// `/opt/gnome/lib` and `/opt/gnome/lib64/pkgconfig` share `/opt/gnome`, not
/// `/opt/gnome/lib`. Returns an empty path when there is nothing in common or
/// `paths` is empty.
pub fn common_prefix<P: AsRef<Path>>(paths: &[P]) -> PathBuf {
    let Some((first, rest)) = paths.split_first() else {
        return PathBuf::new();
    };

    let mut prefix: Vec<Component<'_>> = first.as_ref().components().collect();
    for path in rest {
        let shared = prefix
            .iter()
            .zip(path.as_ref().components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }

    prefix.iter().collect()
}

/// Place an absolute path below `root`.
///
/// `reroot("/srv/chroot", "/etc/fedora-release")` is
/// `/srv/chroot/etc/fedora-release`. With root `/` the path is returned
/// unchanged.
pub fn reroot(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}
