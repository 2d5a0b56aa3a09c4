//! core
//!
//! Shared settings and path handling.
//!
//! # Modules
//!
//! - [`config`] - Settings loaded from the process environment
//! - [`paths`] - Lexical path resolution

pub mod config;
pub mod paths;
