//! engine::args
//!
//! Typed view over the parsed arguments of the matched command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use thiserror::Error;

use super::node::{HELP, VERSION, WORK_DIR};
use super::schema::{ArgSchema, OptionKind};
use crate::core::paths;

/// A parsed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Boolean(bool),
    Number(f64),
    Path(PathBuf),
}

impl ArgValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            ArgValue::String(_) => OptionKind::String,
            ArgValue::Boolean(_) => OptionKind::Boolean,
            ArgValue::Number(_) => OptionKind::Number,
            ArgValue::Path(_) => OptionKind::Path,
        }
    }
}

/// Errors from typed argument access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgError {
    #[error("option '--{0}' is not declared for this command")]
    Undeclared(String),

    #[error("option '--{0}' has no value")]
    Missing(String),

    #[error("option '--{name}' is a {actual:?} option, not {requested:?}")]
    Mismatch {
        name: String,
        requested: OptionKind,
        actual: OptionKind,
    },
}

/// Arguments of the matched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    route: Vec<String>,
    work_dir: PathBuf,
    declared: BTreeMap<String, OptionKind>,
    values: BTreeMap<String, ArgValue>,
}

impl Args {
    /// Extract every option of `schema` from the matches of the matched node.
    ///
    /// Path options are resolved against `work-dir`.
    pub(crate) fn from_matches(
        route: Vec<String>,
        schema: &ArgSchema,
        matches: &ArgMatches,
        fallback_work_dir: &Path,
    ) -> Self {
        let work_dir = matches
            .try_get_one::<PathBuf>(WORK_DIR)
            .ok()
            .flatten()
            .cloned()
            .unwrap_or_else(|| fallback_work_dir.to_path_buf());

        let mut declared = BTreeMap::new();
        let mut values = BTreeMap::new();
        for spec in schema.iter() {
            let name = spec.name();
            declared.insert(name.to_string(), spec.kind());
            let value = match spec.kind() {
                OptionKind::String => matches
                    .try_get_one::<String>(name)
                    .ok()
                    .flatten()
                    .cloned()
                    .map(ArgValue::String),
                OptionKind::Boolean => Some(ArgValue::Boolean(
                    matches
                        .try_get_one::<bool>(name)
                        .ok()
                        .flatten()
                        .copied()
                        .unwrap_or(false),
                )),
                OptionKind::Number => matches
                    .try_get_one::<f64>(name)
                    .ok()
                    .flatten()
                    .copied()
                    .map(ArgValue::Number),
                OptionKind::Path => matches
                    .try_get_one::<PathBuf>(name)
                    .ok()
                    .flatten()
                    .map(|path| ArgValue::Path(paths::resolve(&work_dir, path))),
            };
            if let Some(value) = value {
                values.insert(name.to_string(), value);
            }
        }

        Self {
            route,
            work_dir,
            declared,
            values,
        }
    }

    /// Build arguments directly, mostly for handler tests.
    pub fn from_values<I>(route: Vec<String>, work_dir: impl Into<PathBuf>, values: I) -> Self
    where
        I: IntoIterator<Item = (String, ArgValue)>,
    {
        let work_dir = work_dir.into();
        let mut declared = BTreeMap::new();
        let mut map = BTreeMap::new();
        for (name, value) in values {
            declared.insert(name.clone(), value.kind());
            map.insert(name, value);
        }
        declared.insert(WORK_DIR.to_string(), OptionKind::Path);
        map.insert(WORK_DIR.to_string(), ArgValue::Path(work_dir.clone()));
        for flag in [HELP, VERSION] {
            declared.entry(flag.to_string()).or_insert(OptionKind::Boolean);
            map.entry(flag.to_string()).or_insert(ArgValue::Boolean(false));
        }
        Self {
            route,
            work_dir,
            declared,
            values: map,
        }
    }

    /// Names of the matched command, from the root.
    pub fn route(&self) -> &[String] {
        &self.route
    }

    /// Absolute working directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn help(&self) -> bool {
        self.flag(HELP).unwrap_or(false)
    }

    pub fn version(&self) -> bool {
        self.flag(VERSION).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    fn lookup(&self, name: &str, requested: OptionKind) -> Result<&ArgValue, ArgError> {
        let actual = *self
            .declared
            .get(name)
            .ok_or_else(|| ArgError::Undeclared(name.to_string()))?;
        if actual != requested {
            return Err(ArgError::Mismatch {
                name: name.to_string(),
                requested,
                actual,
            });
        }
        self.values
            .get(name)
            .ok_or_else(|| ArgError::Missing(name.to_string()))
    }

    pub fn string(&self, name: &str) -> Result<&str, ArgError> {
        match self.lookup(name, OptionKind::String)? {
            ArgValue::String(value) => Ok(value),
            other => Err(self.mismatch(name, OptionKind::String, other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, ArgError> {
        match self.lookup(name, OptionKind::Boolean)? {
            ArgValue::Boolean(value) => Ok(*value),
            other => Err(self.mismatch(name, OptionKind::Boolean, other)),
        }
    }

    pub fn number(&self, name: &str) -> Result<f64, ArgError> {
        match self.lookup(name, OptionKind::Number)? {
            ArgValue::Number(value) => Ok(*value),
            other => Err(self.mismatch(name, OptionKind::Number, other)),
        }
    }

    /// An absolute path option.
    pub fn path(&self, name: &str) -> Result<&Path, ArgError> {
        match self.lookup(name, OptionKind::Path)? {
            ArgValue::Path(value) => Ok(value),
            other => Err(self.mismatch(name, OptionKind::Path, other)),
        }
    }

    fn mismatch(&self, name: &str, requested: OptionKind, value: &ArgValue) -> ArgError {
        ArgError::Mismatch {
            name: name.to_string(),
            requested,
            actual: value.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::from_values(
            vec!["package".into(), "build".into()],
            "/work",
            [
                ("out-dir".to_string(), ArgValue::Path("/work/.package".into())),
                ("name".to_string(), ArgValue::String("demo".into())),
                ("jobs".to_string(), ArgValue::Number(4.0)),
            ],
        )
    }

    #[test]
    fn typed_access() {
        let args = args();
        assert_eq!(args.route(), ["package", "build"]);
        assert_eq!(args.work_dir(), Path::new("/work"));
        assert_eq!(args.path("work-dir").unwrap(), Path::new("/work"));
        assert_eq!(args.path("out-dir").unwrap(), Path::new("/work/.package"));
        assert_eq!(args.string("name").unwrap(), "demo");
        assert_eq!(args.number("jobs").unwrap(), 4.0);
        assert!(!args.help());
        assert!(!args.version());
    }

    #[test]
    fn undeclared_and_mismatch() {
        let args = args();
        assert_eq!(
            args.string("nope").unwrap_err(),
            ArgError::Undeclared("nope".into())
        );
        assert!(matches!(
            args.flag("name").unwrap_err(),
            ArgError::Mismatch {
                requested: OptionKind::Boolean,
                actual: OptionKind::String,
                ..
            }
        ));
    }
}
