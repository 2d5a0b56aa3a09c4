//! ui::log
//!
//! Leveled user-facing logging.
//!
//! # Design
//!
//! Everything the user sees goes through the [`Log`] trait. Logging never
//! fails: a logger swallows its own I/O problems. [`ConsoleLog`] sends
//! `error` lines to stderr and everything else to stdout, and drops lines
//! above its maximum level (stack traces are logged at `debug`, so they stay
//! hidden unless the level is raised).
//!
//! Internal instrumentation uses `tracing` instead; see `main.rs`.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::process::Process;

/// Log level, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Lowercase name as used on the command line and in the environment.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// A leveled logger.
pub trait Log: Send + Sync {
    /// Emit one message at the given level.
    fn log(&self, level: LogLevel, message: &str);
}

/// Shorthands for the four levels.
pub trait LogExt: Log {
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

impl<T: Log + ?Sized> LogExt for T {}

/// Logger writing to the process streams.
pub struct ConsoleLog {
    process: Arc<dyn Process>,
    new_line: String,
    max_level: LogLevel,
}

impl ConsoleLog {
    /// Create a console logger with the platform newline and `info` level.
    pub fn new(process: Arc<dyn Process>) -> Self {
        let new_line = if cfg!(windows) { "\r\n" } else { "\n" };
        Self {
            process,
            new_line: new_line.to_string(),
            max_level: LogLevel::Info,
        }
    }

    /// Override the line terminator.
    pub fn with_new_line(mut self, new_line: impl Into<String>) -> Self {
        self.new_line = new_line.into();
        self
    }

    /// Drop messages less severe than `level`.
    pub fn with_max_level(mut self, level: LogLevel) -> Self {
        self.max_level = level;
        self
    }
}

impl fmt::Debug for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLog")
            .field("new_line", &self.new_line)
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl Log for ConsoleLog {
    fn log(&self, level: LogLevel, message: &str) {
        if level > self.max_level {
            return;
        }
        let line = format!("{}{}", message, self.new_line);
        match level {
            LogLevel::Error => self.process.write_stderr(&line),
            LogLevel::Warning | LogLevel::Info | LogLevel::Debug => {
                self.process.write_stdout(&line)
            }
        }
    }
}

/// One recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }
}

/// Logger that records every entry in memory.
///
/// Used by tests to assert on exact output.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded messages at one level, in order.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}

impl Log for MemoryLog {
    fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry::new(level, message));
        }
    }
}
