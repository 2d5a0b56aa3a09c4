//! fs::traits
//!
//! Filesystem trait definition.
//!
//! # Design
//!
//! The `Fs` trait is async because the build pipeline overlaps file copies
//! with compilation. Errors carry a Node-style message
//! (`ENOENT: no such file or directory, copyfile 'a' -> 'b'`) that is
//! propagated verbatim up to the user.
//!
//! # Example
//!
//! ```ignore
//! use pkgkit::fs::{Fs, RmOptions, MkdirOptions};
//!
//! async fn recreate(fs: &dyn Fs, dir: &Path) -> Result<(), FsError> {
//!     fs.rm(dir, RmOptions { recursive: true, force: true }).await?;
//!     fs.mkdir(dir, MkdirOptions { recursive: true }).await
//! }
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Options for [`Fs::rm`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Remove directories and their contents.
    pub recursive: bool,
    /// Succeed when the path does not exist.
    pub force: bool,
}

/// Options for [`Fs::mkdir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MkdirOptions {
    /// Create missing parents; succeed if the directory exists.
    pub recursive: bool,
}

/// The filesystem call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    CopyFile,
    Rm,
    Mkdir,
    Chmod,
    Open,
}

impl Syscall {
    pub fn as_str(self) -> &'static str {
        match self {
            Syscall::CopyFile => "copyfile",
            Syscall::Rm => "rm",
            Syscall::Mkdir => "mkdir",
            Syscall::Chmod => "chmod",
            Syscall::Open => "open",
        }
    }
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from a filesystem operation.
///
/// The message names the error code, the failing call and the path(s)
/// involved, for example
/// `ENOENT: no such file or directory, open '/work/package.json'`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FsError {
    message: String,
    syscall: Syscall,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl FsError {
    /// Wrap an I/O error raised by `syscall` on `path`.
    pub fn new(source: io::Error, syscall: Syscall, path: &Path) -> Self {
        Self::build(source, syscall, path, None)
    }

    /// Wrap an I/O error raised by a two-path call such as `copyfile`.
    pub fn with_dest(source: io::Error, syscall: Syscall, path: &Path, dest: &Path) -> Self {
        Self::build(source, syscall, path, Some(dest))
    }

    fn build(source: io::Error, syscall: Syscall, path: &Path, dest: Option<&Path>) -> Self {
        let mut message = match error_code(&source) {
            Some((code, description)) => format!(
                "{}: {}, {} '{}'",
                code,
                description,
                syscall,
                path.display()
            ),
            None => format!("{}, {} '{}'", source, syscall, path.display()),
        };
        if let Some(dest) = dest {
            message.push_str(&format!(" -> '{}'", dest.display()));
        }
        Self {
            message,
            syscall,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The failing call.
    pub fn syscall(&self) -> Syscall {
        self.syscall
    }

    /// The primary path involved.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

fn error_code(err: &io::Error) -> Option<(&'static str, &'static str)> {
    match err.kind() {
        io::ErrorKind::NotFound => Some(("ENOENT", "no such file or directory")),
        io::ErrorKind::PermissionDenied => Some(("EACCES", "permission denied")),
        io::ErrorKind::AlreadyExists => Some(("EEXIST", "file already exists")),
        _ => None,
    }
}

/// Filesystem operations used by the build pipeline.
///
/// Implementations must be thread-safe; the pipeline runs operations from
/// several spawned tasks at once.
#[async_trait]
pub trait Fs: Send + Sync {
    /// Copy `src` to `dest`, overwriting `dest`.
    async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), FsError>;

    /// Remove a file or directory.
    async fn rm(&self, path: &Path, options: RmOptions) -> Result<(), FsError>;

    /// Create a directory.
    async fn mkdir(&self, path: &Path, options: MkdirOptions) -> Result<(), FsError>;

    /// Set permission bits.
    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError>;

    /// Read a whole file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;
}
