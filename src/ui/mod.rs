//! ui
//!
//! Process and user-output boundary.
//!
//! # Modules
//!
//! - [`process`] - Process accessors (argv, cwd, exit, streams, env)
//! - [`log`] - Leveled user-facing logging
//!
//! # Design
//!
//! All output to the user goes through [`log::Log`], and all access to the
//! hosting process goes through [`process::Process`]. Both are injected, never
//! read from globals, so every component can run against in-memory doubles.

pub mod log;
pub mod process;

pub use log::{ConsoleLog, Log, LogEntry, LogExt, LogLevel, MemoryLog};
pub use process::{MockProcess, Process, SystemProcess};
