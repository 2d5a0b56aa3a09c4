//! compiler::traits
//!
//! Compiler adapter trait and the values passed across it.
//!
//! # Design
//!
//! The adapter exposes the five operations the build needs: parse a project
//! configuration, create a program, list pre-emit diagnostics, emit, and
//! format diagnostics. Configuration problems (unreadable or malformed
//! `tsconfig.json`) are diagnostics, not errors; [`CompilerError`] is
//! reserved for failures of the compiler itself.
//!
//! # Example
//!
//! ```ignore
//! use pkgkit::compiler::{CompilerAdapter, CompilerOptions};
//!
//! async fn check(adapter: &dyn CompilerAdapter, host: Arc<CompilerHost>) -> Result<usize, CompilerError> {
//!     let config = adapter.parse_config(Path::new("/work/tsconfig.json"), &CompilerOptions::default())?;
//!     let program = adapter.create_program(&config, host);
//!     Ok(adapter.pre_emit_diagnostics(&program).await?.len())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::diagnostic::{format_diagnostics, Diagnostic};
use super::host::CompilerHost;
use crate::core::paths;

/// Failures of the compiler itself.
#[derive(Debug, Clone, Error)]
pub enum CompilerError {
    /// The compiler executable could not be started.
    #[error("failed to run '{command}': {message}")]
    Spawn { command: String, message: String },

    /// The compiler exited abnormally without reporting diagnostics.
    #[error("compiler exited with status {status}: {output}")]
    Failed { status: i32, output: String },

    /// A blocking helper task panicked or was cancelled.
    #[error("compiler task failed: {0}")]
    Task(String),
}

/// Compiler options relevant to the build plus the raw configured set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub out_dir: Option<PathBuf>,
    /// `compilerOptions` as written in the configuration.
    pub raw: Map<String, Value>,
}

impl CompilerOptions {
    pub fn with_out_dir(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: Some(out_dir.into()),
            raw: Map::new(),
        }
    }

    /// Apply `overrides` on top of these options.
    pub fn merge(&mut self, overrides: &CompilerOptions) {
        if let Some(out_dir) = &overrides.out_dir {
            self.out_dir = Some(out_dir.clone());
        }
        for (key, value) in &overrides.raw {
            self.raw.insert(key.clone(), value.clone());
        }
    }
}

/// A project configuration after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConfig {
    pub config_path: PathBuf,
    /// Root source files, absolute.
    pub root_names: Vec<PathBuf>,
    pub options: CompilerOptions,
    /// Problems found while reading the configuration.
    pub errors: Vec<Diagnostic>,
}

const CANNOT_READ_FILE: u32 = 5083;
const FAILED_TO_PARSE_FILE: u32 = 5014;

impl ParsedConfig {
    /// Read and parse a `tsconfig.json`.
    ///
    /// Relative paths are resolved against the configuration's directory.
    /// `overrides` win over configured options.
    pub fn load(config_path: &Path, overrides: &CompilerOptions) -> Self {
        let mut parsed = ParsedConfig {
            config_path: config_path.to_path_buf(),
            root_names: Vec::new(),
            options: CompilerOptions::default(),
            errors: Vec::new(),
        };

        let text = match std::fs::read_to_string(config_path) {
            Ok(text) => text,
            Err(_) => {
                parsed.errors.push(Diagnostic::error(
                    CANNOT_READ_FILE,
                    format!("Cannot read file '{}'.", config_path.display()),
                ));
                parsed.options.merge(overrides);
                return parsed;
            }
        };

        match parse_config_text(&text) {
            Ok(json) => parsed.apply(&json),
            Err(err) => parsed.errors.push(Diagnostic::error(
                FAILED_TO_PARSE_FILE,
                format!("Failed to parse file '{}': {}.", config_path.display(), err),
            )),
        }
        parsed.options.merge(overrides);
        parsed
    }

    /// Directory relative configuration paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    fn apply(&mut self, json: &Value) {
        let base = self.base_dir().to_path_buf();
        if let Some(options) = json.get("compilerOptions").and_then(Value::as_object) {
            self.options.raw = options.clone();
            if let Some(out_dir) = options.get("outDir").and_then(Value::as_str) {
                self.options.out_dir = Some(paths::resolve(&base, Path::new(out_dir)));
            }
        }
        if let Some(files) = json.get("files").and_then(Value::as_array) {
            self.root_names = files
                .iter()
                .filter_map(Value::as_str)
                .map(|file| paths::resolve(&base, Path::new(file)))
                .collect();
        }
    }
}

/// Parse configuration text as JSON, falling back to JSON5 for the comments
/// and trailing commas the compiler accepts.
///
/// On failure the strict parser's error is returned, as it points at the
/// first offending token.
fn parse_config_text(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text).or_else(|err| json_five::from_str::<Value>(text).map_err(|_| err))
}

/// A compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    config: ParsedConfig,
    host: Arc<CompilerHost>,
}

impl Program {
    pub fn new(config: ParsedConfig, host: Arc<CompilerHost>) -> Self {
        Self { config, host }
    }

    pub fn config(&self) -> &ParsedConfig {
        &self.config
    }

    pub fn root_names(&self) -> &[PathBuf] {
        &self.config.root_names
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.config.options
    }

    pub fn host(&self) -> &Arc<CompilerHost> {
        &self.host
    }
}

/// Outcome of emitting a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitResult {
    pub diagnostics: Vec<Diagnostic>,
    pub emit_skipped: bool,
}

/// The compiler as seen by the build.
#[async_trait]
pub trait CompilerAdapter: Send + Sync {
    /// Load the configuration at `config_path` with `overrides` applied.
    fn parse_config(
        &self,
        config_path: &Path,
        overrides: &CompilerOptions,
    ) -> Result<ParsedConfig, CompilerError>;

    /// Create a program from a parsed configuration.
    fn create_program(&self, config: &ParsedConfig, host: Arc<CompilerHost>) -> Program {
        Program::new(config.clone(), host)
    }

    /// Diagnostics found without producing output, including
    /// configuration errors.
    async fn pre_emit_diagnostics(&self, program: &Program)
        -> Result<Vec<Diagnostic>, CompilerError>;

    /// Write output files.
    async fn emit(&self, program: &Program) -> Result<EmitResult, CompilerError>;

    /// Render diagnostics for display.
    fn format_diagnostics(&self, diagnostics: &[Diagnostic], host: &CompilerHost) -> String {
        format_diagnostics(diagnostics, host)
    }
}
