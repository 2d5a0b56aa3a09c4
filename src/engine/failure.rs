//! engine::failure
//!
//! Failure classification and reporting.
//!
//! # Exit codes
//!
//! | Kind       | Log lines                              | Exit |
//! |------------|----------------------------------------|------|
//! | Validation | `info(help)`, `error(message)`         | 2    |
//! | Runtime    | `error(message)`, `debug(chain)`       | 1    |
//! | Unknown    | `error("Unknown error: <value>")`      | 1    |

use std::fmt;

use clap::Command;
use thiserror::Error;

use crate::ui::{Log, LogExt};

/// Exit code for argument validation failures.
pub const EXIT_VALIDATION: i32 = 2;
/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// A command-line input error.
///
/// Carries the failing node so its help is rendered only when reported.
#[derive(Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    command: Command,
}

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>, command: Command) -> Self {
        Self {
            message: message.into(),
            command,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Help text of the node that failed validation.
    pub fn render_help(&self) -> String {
        render_help(&self.command)
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationError")
            .field("message", &self.message)
            .field("command", &self.command.get_name())
            .finish()
    }
}

pub(crate) fn render_help(command: &Command) -> String {
    command
        .clone()
        .render_help()
        .to_string()
        .trim_end()
        .to_string()
}

/// Discriminant of [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Runtime,
    Unknown,
}

/// Any failure of a CLI invocation.
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Validation(ValidationError),

    #[error(transparent)]
    Runtime(#[from] anyhow::Error),

    /// A handler panicked; holds the payload as text.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Validation(_) => FailureKind::Validation,
            Failure::Runtime(_) => FailureKind::Runtime,
            Failure::Unknown(_) => FailureKind::Unknown,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            FailureKind::Validation => EXIT_VALIDATION,
            FailureKind::Runtime | FailureKind::Unknown => EXIT_FAILURE,
        }
    }

    /// Log the failure and return the exit code to use.
    pub fn report(&self, log: &dyn Log) -> i32 {
        match self {
            Failure::Validation(err) => {
                log.info(&err.render_help());
                log.error(err.message());
            }
            Failure::Runtime(err) => {
                log.error(&err.to_string());
                log.debug(&format!("{:?}", err));
            }
            Failure::Unknown(_) => log.error(&self.to_string()),
        }
        self.exit_code()
    }
}

impl From<ValidationError> for Failure {
    fn from(err: ValidationError) -> Self {
        Failure::Validation(err)
    }
}
