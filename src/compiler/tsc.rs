//! compiler::tsc
//!
//! Adapter driving the TypeScript compiler executable.
//!
//! # Design
//!
//! Type checking and emission are two runs of the same project:
//!
//! - pre-emit: `tsc --project <cfg> --outDir <out> --pretty false --noEmit`
//! - emit: `tsc --project <cfg> --outDir <out> --pretty false --noCheck`
//!
//! Both run with the configuration's directory as working directory. The
//! plain (non-pretty) output is parsed back into [`Diagnostic`]s; reported
//! line/column pairs are turned into offsets through the host's source
//! cache so rendering reproduces the compiler's own positions.
//!
//! `--noCheck` still reports syntax and option errors, so the emit run
//! repeats some pre-emit diagnostics; [`super::Compiler::compile`] drops
//! the repeats.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use super::diagnostic::{Diagnostic, DiagnosticCategory, DiagnosticFile};
use super::host::SourceCache;
use super::traits::{
    CompilerAdapter, CompilerError, CompilerOptions, EmitResult, ParsedConfig, Program,
};
use crate::core::paths;

fn located_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?P<cat>error|warning|suggestion|message) TS(?P<code>\d+): (?P<msg>.*)$",
        )
        .expect("valid diagnostic pattern")
    })
}

fn global_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<cat>error|warning|suggestion|message) TS(?P<code>\d+): (?P<msg>.*)$")
            .expect("valid diagnostic pattern")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Check,
    Emit,
}

/// Compiler adapter backed by a `tsc` executable.
#[derive(Debug, Clone)]
pub struct TscAdapter {
    command: String,
}

impl TscAdapter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn run(&self, program: &Program, mode: Mode) -> Result<Vec<Diagnostic>, CompilerError> {
        let config = program.config();
        let mut command = Command::new(&self.command);
        command
            .arg("--project")
            .arg(&config.config_path)
            .current_dir(config.base_dir());
        if let Some(out_dir) = &config.options.out_dir {
            command.arg("--outDir").arg(out_dir);
        }
        command.args(["--pretty", "false"]);
        command.arg(match mode {
            Mode::Check => "--noEmit",
            Mode::Emit => "--noCheck",
        });

        tracing::debug!(command = %self.command, ?mode, config = %config.config_path.display(), "running compiler");
        let output = command.output().await.map_err(|e| CompilerError::Spawn {
            command: self.command.clone(),
            message: e.to_string(),
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        // Parsing reads every reported source into the host's cache.
        let diagnostics = {
            let text = text.clone();
            let base_dir = config.base_dir().to_path_buf();
            let host = Arc::clone(program.host());
            tokio::task::spawn_blocking(move || parse_output(&text, &base_dir, host.sources()))
                .await
                .map_err(|e| CompilerError::Task(e.to_string()))?
        };
        tracing::debug!(status = ?output.status.code(), diagnostics = diagnostics.len(), "compiler finished");

        if !output.status.success() && diagnostics.is_empty() {
            return Err(CompilerError::Failed {
                status: output.status.code().unwrap_or(-1),
                output: text.trim().to_string(),
            });
        }
        Ok(diagnostics)
    }
}

impl Default for TscAdapter {
    fn default() -> Self {
        Self::new("tsc")
    }
}

#[async_trait]
impl CompilerAdapter for TscAdapter {
    fn parse_config(
        &self,
        config_path: &Path,
        overrides: &CompilerOptions,
    ) -> Result<ParsedConfig, CompilerError> {
        Ok(ParsedConfig::load(config_path, overrides))
    }

    async fn pre_emit_diagnostics(
        &self,
        program: &Program,
    ) -> Result<Vec<Diagnostic>, CompilerError> {
        if !program.config().errors.is_empty() {
            return Ok(program.config().errors.clone());
        }
        self.run(program, Mode::Check).await
    }

    async fn emit(&self, program: &Program) -> Result<EmitResult, CompilerError> {
        if !program.config().errors.is_empty() {
            return Ok(EmitResult {
                diagnostics: Vec::new(),
                emit_skipped: true,
            });
        }
        Ok(EmitResult {
            diagnostics: self.run(program, Mode::Emit).await?,
            emit_skipped: false,
        })
    }
}

/// Parse non-pretty compiler output.
///
/// Relative file names are resolved against `base_dir`. Indented lines
/// continue the previous diagnostic's message; anything else is ignored.
pub fn parse_output(output: &str, base_dir: &Path, sources: &SourceCache) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(caps) = located_re().captures(line) {
            let (Some(category), Ok(code), Ok(row), Ok(col)) = (
                DiagnosticCategory::from_label(&caps["cat"]),
                caps["code"].parse::<u32>(),
                caps["line"].parse::<usize>(),
                caps["col"].parse::<usize>(),
            ) else {
                continue;
            };
            let file = paths::resolve(base_dir, Path::new(&caps["file"]));
            let start = sources
                .get(&file)
                .map(|source| source.offset_of(row.saturating_sub(1), col.saturating_sub(1)));
            let mut diagnostic = Diagnostic::new(category, code, &caps["msg"]);
            diagnostic.file = Some(DiagnosticFile { file_name: file });
            diagnostic.start = start;
            diagnostics.push(diagnostic);
        } else if let Some(caps) = global_re().captures(line) {
            let (Some(category), Ok(code)) = (
                DiagnosticCategory::from_label(&caps["cat"]),
                caps["code"].parse::<u32>(),
            ) else {
                continue;
            };
            diagnostics.push(Diagnostic::new(category, code, &caps["msg"]));
        } else if line.starts_with(' ') && !line.trim().is_empty() {
            if let Some(last) = diagnostics.last_mut() {
                last.message_text.push('\n');
                last.message_text.push_str(line);
            }
        }
    }
    diagnostics
}
