//! cli::commands
//!
//! Command descriptors registered by the toolkit.
//!
//! Each command is a function returning a [`crate::engine::CommandDescriptor`];
//! the collaborators it needs are passed in, never read from globals.

pub mod package;

pub use package::{build_command, package_command};
