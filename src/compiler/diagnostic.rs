//! compiler::diagnostic
//!
//! Compiler diagnostics, their severity table and their text rendering.
//!
//! # Severity table
//!
//! | Category | Value | Log level |
//! |------------|-------|-----------|
//! | Warning    | 0     | warning   |
//! | Error      | 1     | error     |
//! | Suggestion | 2     | info      |
//! | Message    | 3     | info      |
//!
//! Only `Error` makes a compilation fail.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::host::SourceText;
use crate::core::paths;
use crate::ui::LogLevel;

/// Severity category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

impl DiagnosticCategory {
    /// Lowercase label used in rendered diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        }
    }

    /// Parse the label used in compiler output.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "warning" => Some(DiagnosticCategory::Warning),
            "error" => Some(DiagnosticCategory::Error),
            "suggestion" => Some(DiagnosticCategory::Suggestion),
            "message" => Some(DiagnosticCategory::Message),
            _ => None,
        }
    }
}

impl From<DiagnosticCategory> for u8 {
    fn from(category: DiagnosticCategory) -> Self {
        category as u8
    }
}

impl TryFrom<u8> for DiagnosticCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(DiagnosticCategory::Warning),
            1 => Ok(DiagnosticCategory::Error),
            2 => Ok(DiagnosticCategory::Suggestion),
            3 => Ok(DiagnosticCategory::Message),
            other => Err(format!("invalid diagnostic category {}", other)),
        }
    }
}

impl From<DiagnosticCategory> for LogLevel {
    fn from(category: DiagnosticCategory) -> Self {
        match category {
            DiagnosticCategory::Warning => LogLevel::Warning,
            DiagnosticCategory::Error => LogLevel::Error,
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => LogLevel::Info,
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The file a diagnostic points into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticFile {
    pub file_name: PathBuf,
}

/// One issue reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<DiagnosticFile>,
    /// Byte offset of the start of the span in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl Diagnostic {
    /// A diagnostic without a source location.
    pub fn new(category: DiagnosticCategory, code: u32, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message_text: message.into(),
            file: None,
            start: None,
            length: None,
        }
    }

    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Error, code, message)
    }

    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Self::new(DiagnosticCategory::Warning, code, message)
    }

    /// Attach a source location.
    pub fn at(mut self, file_name: impl Into<PathBuf>, start: usize, length: usize) -> Self {
        self.file = Some(DiagnosticFile {
            file_name: file_name.into(),
        });
        self.start = Some(start);
        self.length = Some(length);
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Same code at the same place, whatever the wording.
    pub fn same_report(&self, other: &Diagnostic) -> bool {
        self.code == other.code && self.file == other.file && self.start == other.start
    }

    /// Log level used when the diagnostic is reported.
    pub fn log_level(&self) -> LogLevel {
        self.category.into()
    }
}

/// What rendering needs from the compiler host.
pub trait FormatHost {
    /// Directory file names are made relative to.
    fn current_directory(&self) -> &Path;

    /// Line terminator.
    fn new_line(&self) -> &str;

    /// Source text of a file, if readable.
    fn source(&self, path: &Path) -> Option<Arc<SourceText>>;
}

/// Render diagnostics the way the compiler prints them without `--pretty`.
///
/// Each diagnostic becomes
/// `file(line,col): <category> TS<code>: <message><newline>`, or
/// `<category> TS<code>: <message><newline>` when it has no file.
pub fn format_diagnostics(diagnostics: &[Diagnostic], host: &dyn FormatHost) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        if let Some(file) = &diagnostic.file {
            let (line, column) = match (diagnostic.start, host.source(&file.file_name)) {
                (Some(start), Some(source)) => source.line_and_column(start),
                _ => (0, 0),
            };
            let name = paths::relative_to(&file.file_name, host.current_directory());
            out.push_str(&format!(
                "{}({},{}): ",
                name.display(),
                line + 1,
                column + 1
            ));
        }
        out.push_str(&format!(
            "{} TS{}: {}{}",
            diagnostic.category.label(),
            diagnostic.code,
            diagnostic.message_text.replace('\n', host.new_line()),
            host.new_line()
        ));
    }
    out
}
