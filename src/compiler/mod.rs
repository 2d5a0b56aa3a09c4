//! compiler
//!
//! Compiler wrapper used by the build pipeline.
//!
//! # Modules
//!
//! - [`diagnostic`] - Diagnostics, severity table and rendering
//! - [`host`] - Compiler host and source cache
//! - [`traits`] - The `CompilerAdapter` trait
//! - [`tsc`] - Adapter driving the `tsc` executable
//! - [`mock`] - In-memory adapter for tests
//!
//! # Design
//!
//! [`Compiler`] parses the project configuration once, on construction, with
//! the output directory forced. Each [`Compiler::compile`] builds a fresh
//! program against the same host, so sources read for formatting are cached
//! for the lifetime of the wrapper.

pub mod diagnostic;
pub mod host;
pub mod mock;
pub mod traits;
pub mod tsc;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use diagnostic::{format_diagnostics, Diagnostic, DiagnosticCategory, DiagnosticFile, FormatHost};
pub use host::{CompilerHost, SourceCache, SourceText};
pub use mock::MockCompiler;
pub use traits::{CompilerAdapter, CompilerError, CompilerOptions, EmitResult, ParsedConfig, Program};
pub use tsc::TscAdapter;

/// Outcome of one compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    /// True iff at least one diagnostic is an error.
    pub has_errors: bool,
    /// Emission diagnostics followed by pre-emit diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            has_errors: diagnostics.iter().any(Diagnostic::is_error),
            diagnostics,
        }
    }
}

/// A configured compiler.
pub struct Compiler {
    adapter: Arc<dyn CompilerAdapter>,
    config: ParsedConfig,
    host: Arc<CompilerHost>,
}

impl Compiler {
    /// Parse `ts_config` with its output directory forced to `out_dir`.
    ///
    /// Diagnostics are rendered relative to `current_dir`.
    pub fn new(
        adapter: Arc<dyn CompilerAdapter>,
        ts_config: &Path,
        out_dir: &Path,
        current_dir: impl Into<PathBuf>,
    ) -> Result<Self, CompilerError> {
        let config = adapter.parse_config(ts_config, &CompilerOptions::with_out_dir(out_dir))?;
        tracing::debug!(
            config = %ts_config.display(),
            roots = config.root_names.len(),
            config_errors = config.errors.len(),
            "compiler configured"
        );
        Ok(Self {
            adapter,
            config,
            host: Arc::new(CompilerHost::new(current_dir)),
        })
    }

    pub fn config(&self) -> &ParsedConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<CompilerHost> {
        &self.host
    }

    /// Type-check and emit.
    ///
    /// An emit diagnostic that repeats a pre-emit one (see
    /// [`Diagnostic::same_report`]) is reported once, as pre-emit.
    pub async fn compile(&self) -> Result<CompilationResult, CompilerError> {
        let program = self
            .adapter
            .create_program(&self.config, Arc::clone(&self.host));
        let pre_emit = self.adapter.pre_emit_diagnostics(&program).await?;
        let emitted = self.adapter.emit(&program).await?;
        tracing::debug!(
            pre_emit = pre_emit.len(),
            emit = emitted.diagnostics.len(),
            emit_skipped = emitted.emit_skipped,
            "compiled"
        );

        let mut diagnostics: Vec<Diagnostic> = emitted
            .diagnostics
            .into_iter()
            .filter(|emitted| !pre_emit.iter().any(|seen| seen.same_report(emitted)))
            .collect();
        diagnostics.extend(pre_emit);
        Ok(CompilationResult::new(diagnostics))
    }

    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        self.adapter.format_diagnostics(diagnostics, &self.host)
    }
}
