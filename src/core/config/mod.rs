//! core::config
//!
//! Runtime settings.
//!
//! # Overview
//!
//! Settings come from the environment of the injected [`Process`]; command
//! specific values (paths, flags) come from the command line and are handled
//! by the engine.
//!
//! # Variables
//!
//! | Variable           | Meaning                                     | Default |
//! |--------------------|---------------------------------------------|---------|
//! | `PKGKIT_TSC`       | Compiler executable for the default adapter | `tsc`   |
//! | `PKGKIT_LOG_LEVEL` | Maximum console log level                   | `info`  |
//! | `PKGKIT_TRACE`     | `tracing` filter directive                  | unset   |
//!
//! # Example
//!
//! ```
//! use pkgkit::core::config::Settings;
//! use pkgkit::ui::{LogLevel, MockProcess};
//!
//! let process = MockProcess::new(Vec::<String>::new()).with_env("PKGKIT_LOG_LEVEL", "debug");
//! let settings = Settings::from_process(&process).unwrap();
//! assert_eq!(settings.log_level, LogLevel::Debug);
//! assert_eq!(settings.compiler_command, "tsc");
//! ```

use thiserror::Error;

use crate::ui::{LogLevel, Process};

/// Environment variable naming the compiler executable.
pub const ENV_TSC: &str = "PKGKIT_TSC";
/// Environment variable holding the console log level.
pub const ENV_LOG_LEVEL: &str = "PKGKIT_LOG_LEVEL";
/// Environment variable holding the tracing filter.
pub const ENV_TRACE: &str = "PKGKIT_TRACE";

const DEFAULT_COMPILER_COMMAND: &str = "tsc";

/// Errors from settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Executable invoked by the default compiler adapter.
    pub compiler_command: String,
    /// Maximum level written by the console logger.
    pub log_level: LogLevel,
    /// `tracing` env-filter directive, if any.
    pub trace_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler_command: DEFAULT_COMPILER_COMMAND.to_string(),
            log_level: LogLevel::Info,
            trace_filter: None,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Unset or empty variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to
    /// something that cannot be interpreted.
    pub fn from_process(process: &dyn Process) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();

        if let Some(command) = non_empty(process.env(ENV_TSC)) {
            settings.compiler_command = command;
        }

        if let Some(level) = non_empty(process.env(ENV_LOG_LEVEL)) {
            settings.log_level =
                level
                    .parse()
                    .map_err(|reason| ConfigError::InvalidValue {
                        key: ENV_LOG_LEVEL,
                        value: level.clone(),
                        reason,
                    })?;
        }

        settings.trace_filter = non_empty(process.env(ENV_TRACE));

        Ok(settings)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
