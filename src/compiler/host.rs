//! compiler::host
//!
//! Compiler host: working directory, newline and a lazily populated source
//! cache shared by every read within one [`super::Compiler`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::diagnostic::FormatHost;

/// A source file with precomputed line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Zero-based line and column (in characters) of a byte offset.
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn line_and_column(&self, offset: usize) -> (usize, usize) {
        let offset = self.floor_boundary(offset.min(self.text.len()));
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        (line, self.text[start..offset].chars().count())
    }

    /// Byte offset of a zero-based line and column.
    ///
    /// Columns past the end of the line clamp to the line end.
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        let Some(&start) = self.line_starts.get(line) else {
            return self.text.len();
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text[start..end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    fn floor_boundary(&self, mut offset: usize) -> usize {
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

/// Path to parsed source, filled on first read.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: Mutex<HashMap<PathBuf, Arc<SourceText>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a file's source, reading it on the first request.
    ///
    /// Unreadable files are not cached, so a later read can succeed.
    pub fn get(&self, path: &Path) -> Option<Arc<SourceText>> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(source) = entries.get(path) {
            return Some(Arc::clone(source));
        }
        let text = std::fs::read_to_string(path).ok()?;
        tracing::trace!(path = %path.display(), "source cached");
        let source = Arc::new(SourceText::new(text));
        entries.insert(path.to_path_buf(), Arc::clone(&source));
        Some(source)
    }

    /// Seed an entry without touching the filesystem.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(path.into(), Arc::new(SourceText::new(text)));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Environment the compiler runs in.
#[derive(Debug)]
pub struct CompilerHost {
    current_directory: PathBuf,
    new_line: String,
    sources: SourceCache,
}

impl CompilerHost {
    pub fn new(current_directory: impl Into<PathBuf>) -> Self {
        Self {
            current_directory: current_directory.into(),
            new_line: "\n".to_string(),
            sources: SourceCache::new(),
        }
    }

    pub fn with_new_line(mut self, new_line: impl Into<String>) -> Self {
        self.new_line = new_line.into();
        self
    }

    pub fn sources(&self) -> &SourceCache {
        &self.sources
    }
}

impl FormatHost for CompilerHost {
    fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    fn new_line(&self) -> &str {
        &self.new_line
    }

    fn source(&self, path: &Path) -> Option<Arc<SourceText>> {
        self.sources.get(path)
    }
}
