//! pkgkit - a command toolkit for building distributable NPM packages
//!
//! pkgkit composes a tree of commands, parses the process arguments against
//! it and runs the matched command. Its one built-in command,
//! `package build`, stages a package directory: it copies the manifest,
//! license and readme, compiles the TypeScript sources and marks the
//! declared executables.
//!
//! # Architecture
//!
//! - [`cli`] - Toolkit wiring and command descriptors
//! - [`engine`] - Command composition, parsing, help/version and failure classification
//! - [`build`] - The package build pipeline
//! - [`compiler`] - Compiler adapter seam, diagnostics and the `tsc` adapter
//! - [`fs`] - Filesystem seam
//! - [`core`] - Settings and path helpers
//! - [`ui`] - Process and log boundary
//!
//! # Invariants
//!
//! 1. No component reads process globals; process and log are injected
//! 2. Only the engine exits the process, and only on failure
//! 3. Validation failures exit with 2, every other failure with 1

pub mod build;
pub mod cli;
pub mod compiler;
pub mod core;
pub mod engine;
pub mod fs;
pub mod ui;
