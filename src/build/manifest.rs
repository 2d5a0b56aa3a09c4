//! build::manifest
//!
//! Reading executable entry points from a staged `package.json`.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::core::paths;

/// Permission bits given to executable entry points.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// String values of the manifest's `bin` field.
///
/// Both the object form (`{"name": "path"}`) and an array of paths are
/// read; non-string values are skipped. A missing `bin`, or the
/// single-string form, yields no entries.
pub fn executable_entries(manifest: &Value) -> Vec<String> {
    let values: Vec<&Value> = match manifest.get("bin") {
        Some(Value::Object(bin)) => bin.values().collect(),
        Some(Value::Array(bin)) => bin.iter().collect(),
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Location of an entry relative to the staged package.
///
/// A leading `/` is dropped, so absolute entries are joined onto `out_dir`.
/// `..` segments are folded lexically and may lead outside `out_dir`, the
/// same way a relative path in the manifest would resolve.
pub fn entry_path(out_dir: &Path, entry: &str) -> PathBuf {
    let relative: PathBuf = Path::new(entry)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    paths::normalize(&out_dir.join(relative))
}
