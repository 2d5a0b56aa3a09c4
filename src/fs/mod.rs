//! fs
//!
//! Filesystem abstraction for the build pipeline.
//!
//! # Modules
//!
//! - [`traits`] - The `Fs` trait, options and `FsError`
//! - [`local`] - Local filesystem implementation (`tokio::fs`)

pub mod local;
pub mod traits;

pub use local::LocalFs;
pub use traits::{Fs, FsError, MkdirOptions, RmOptions, Syscall};
