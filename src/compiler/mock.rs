//! compiler::mock
//!
//! In-memory compiler adapter for deterministic testing.
//!
//! # Design
//!
//! `MockCompiler` reads the real `tsconfig.json` (so configuration
//! diagnostics behave like the real adapter), returns injected diagnostics
//! and "emits" each root file by copying its text to `<out_dir>/<name>.js`.
//! Operations are recorded for verification and any step can be made to
//! fail.
//!
//! # Example
//!
//! ```ignore
//! use pkgkit::compiler::mock::{MockCompiler, FailOn};
//!
//! let compiler = MockCompiler::new()
//!     .with_pre_emit(vec![Diagnostic::error(2322, "Type mismatch.")]);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::diagnostic::Diagnostic;
use super::traits::{
    CompilerAdapter, CompilerError, CompilerOptions, EmitResult, ParsedConfig, Program,
};
use crate::core::paths;

const COULD_NOT_WRITE_FILE: u32 = 5033;

/// Mock compiler for testing.
#[derive(Debug, Clone, Default)]
pub struct MockCompiler {
    inner: Arc<Mutex<MockCompilerInner>>,
}

#[derive(Debug, Default)]
struct MockCompilerInner {
    pre_emit: Vec<Diagnostic>,
    emit: Vec<Diagnostic>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    ParseConfig(CompilerError),
    PreEmitDiagnostics(CompilerError),
    Emit(CompilerError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    ParseConfig {
        config_path: PathBuf,
        out_dir: Option<PathBuf>,
    },
    CreateProgram {
        root_names: Vec<PathBuf>,
    },
    PreEmitDiagnostics,
    Emit {
        written: Vec<PathBuf>,
    },
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics reported before emission.
    pub fn with_pre_emit(self, diagnostics: Vec<Diagnostic>) -> Self {
        self.lock().pre_emit = diagnostics;
        self
    }

    /// Diagnostics reported by emission.
    pub fn with_emit(self, diagnostics: Vec<Diagnostic>) -> Self {
        self.lock().emit = diagnostics;
        self
    }

    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockCompilerInner> {
        // A panicking test thread must not hide the recorded state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Result<(), CompilerError> {
        match &self.lock().fail_on {
            Some(FailOn::ParseConfig(e)) if expected == "parse_config" => Err(e.clone()),
            Some(FailOn::PreEmitDiagnostics(e)) if expected == "pre_emit_diagnostics" => {
                Err(e.clone())
            }
            Some(FailOn::Emit(e)) if expected == "emit" => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

fn output_path(root: &Path, base_dir: &Path, out_dir: &Path) -> PathBuf {
    let relative = paths::relative_to(root, base_dir);
    paths::resolve(out_dir, &relative.with_extension("js"))
}

#[async_trait]
impl CompilerAdapter for MockCompiler {
    fn parse_config(
        &self,
        config_path: &Path,
        overrides: &CompilerOptions,
    ) -> Result<ParsedConfig, CompilerError> {
        self.record(MockOperation::ParseConfig {
            config_path: config_path.to_path_buf(),
            out_dir: overrides.out_dir.clone(),
        });
        self.check_fail("parse_config")?;
        Ok(ParsedConfig::load(config_path, overrides))
    }

    fn create_program(&self, config: &ParsedConfig, host: Arc<super::CompilerHost>) -> Program {
        self.record(MockOperation::CreateProgram {
            root_names: config.root_names.clone(),
        });
        Program::new(config.clone(), host)
    }

    async fn pre_emit_diagnostics(
        &self,
        program: &Program,
    ) -> Result<Vec<Diagnostic>, CompilerError> {
        self.record(MockOperation::PreEmitDiagnostics);
        self.check_fail("pre_emit_diagnostics")?;
        let mut diagnostics = program.config().errors.clone();
        diagnostics.extend(self.lock().pre_emit.iter().cloned());
        Ok(diagnostics)
    }

    async fn emit(&self, program: &Program) -> Result<EmitResult, CompilerError> {
        self.check_fail("emit")?;
        let mut result = EmitResult {
            diagnostics: self.lock().emit.clone(),
            emit_skipped: false,
        };

        let config = program.config();
        let out_dir = match (&config.options.out_dir, config.errors.is_empty()) {
            (Some(out_dir), true) => out_dir.clone(),
            _ => {
                result.emit_skipped = true;
                self.record(MockOperation::Emit {
                    written: Vec::new(),
                });
                return Ok(result);
            }
        };

        let mut written = Vec::new();
        for root in program.root_names() {
            let target = output_path(root, config.base_dir(), &out_dir);
            let text = program
                .host()
                .sources()
                .get(root)
                .map(|source| source.text().to_string())
                .unwrap_or_default();
            let write = async {
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&target, text).await
            };
            match write.await {
                Ok(()) => written.push(target),
                Err(err) => result.diagnostics.push(Diagnostic::error(
                    COULD_NOT_WRITE_FILE,
                    format!("Could not write file '{}': {}.", target.display(), err),
                )),
            }
        }
        self.record(MockOperation::Emit { written });
        Ok(result)
    }
}
