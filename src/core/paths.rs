//! core::paths
//!
//! Lexical path resolution.
//!
//! # Design
//!
//! Paths given on the command line are resolved against a base directory
//! without touching the filesystem: the result is absolute (when the base
//! is), `.` segments are dropped and `..` segments pop the previous
//! component. Existence is never checked.
//!
//! # Example
//!
//! ```
//! use pkgkit::core::paths::resolve;
//! use std::path::{Path, PathBuf};
//!
//! assert_eq!(
//!     resolve(Path::new("/work"), Path::new("./src/../.package")),
//!     PathBuf::from("/work/.package")
//! );
//! assert_eq!(
//!     resolve(Path::new("/work"), Path::new("/abs/out")),
//!     PathBuf::from("/abs/out")
//! );
//! ```

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and normalize the result lexically.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined)
}

/// Drop `.` components and fold `..` components.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Express `path` relative to `base`.
///
/// Both paths are normalized first. When they share no common root the
/// normalized `path` is returned unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);
    if path.has_root() != base.has_root() {
        return path;
    }

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 && path.has_root() {
        return path;
    }

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    mod resolve {
        use super::*;

        #[test]
        fn relative_joins_base() {
            assert_eq!(
                resolve(Path::new("/work"), Path::new("tsconfig.json")),
                PathBuf::from("/work/tsconfig.json")
            );
        }

        #[test]
        fn absolute_ignores_base() {
            assert_eq!(
                resolve(Path::new("/work"), Path::new("/other/dir")),
                PathBuf::from("/other/dir")
            );
        }

        #[test]
        fn folds_dot_segments() {
            assert_eq!(
                resolve(Path::new("/work/pkg"), Path::new("../shared/./out")),
                PathBuf::from("/work/shared/out")
            );
        }

        #[test]
        fn parent_stops_at_root() {
            assert_eq!(
                resolve(Path::new("/"), Path::new("../../x")),
                PathBuf::from("/x")
            );
        }

        #[test]
        fn bin_entry_with_leading_dot() {
            assert_eq!(
                resolve(Path::new("/work/.package"), Path::new("./bin/bin.js")),
                PathBuf::from("/work/.package/bin/bin.js")
            );
        }
    }

    mod relative_to {
        use super::*;

        #[test]
        fn child_of_base() {
            assert_eq!(
                relative_to(Path::new("/index.ts"), Path::new("/")),
                PathBuf::from("index.ts")
            );
            assert_eq!(
                relative_to(Path::new("/work/src/a.ts"), Path::new("/work")),
                PathBuf::from("src/a.ts")
            );
        }

        #[test]
        fn sibling_uses_parent_segments() {
            assert_eq!(
                relative_to(Path::new("/work/lib/a.ts"), Path::new("/work/app")),
                PathBuf::from("../lib/a.ts")
            );
        }

        #[test]
        fn same_path_is_dot() {
            assert_eq!(
                relative_to(Path::new("/work"), Path::new("/work")),
                PathBuf::from(".")
            );
        }
    }
}
