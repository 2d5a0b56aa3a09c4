//! fs::local
//!
//! [`Fs`] implementation over the local filesystem using `tokio::fs`.

use std::io;
use std::path::Path;

use async_trait::async_trait;

use super::traits::{Fs, FsError, MkdirOptions, RmOptions, Syscall};

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fs for LocalFs {
    async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), FsError> {
        tracing::trace!(src = %src.display(), dest = %dest.display(), "copy_file");
        tokio::fs::copy(src, dest)
            .await
            .map(|_| ())
            .map_err(|e| FsError::with_dest(e, Syscall::CopyFile, src, dest))
    }

    async fn rm(&self, path: &Path, options: RmOptions) -> Result<(), FsError> {
        tracing::trace!(path = %path.display(), ?options, "rm");
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound && options.force => return Ok(()),
            Err(e) => return Err(FsError::new(e, Syscall::Rm, path)),
        };

        let result = if metadata.is_dir() {
            if options.recursive {
                tokio::fs::remove_dir_all(path).await
            } else {
                tokio::fs::remove_dir(path).await
            }
        } else {
            tokio::fs::remove_file(path).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound && options.force => Ok(()),
            Err(e) => Err(FsError::new(e, Syscall::Rm, path)),
        }
    }

    async fn mkdir(&self, path: &Path, options: MkdirOptions) -> Result<(), FsError> {
        tracing::trace!(path = %path.display(), ?options, "mkdir");
        let result = if options.recursive {
            tokio::fs::create_dir_all(path).await
        } else {
            tokio::fs::create_dir(path).await
        };
        result.map_err(|e| FsError::new(e, Syscall::Mkdir, path))
    }

    #[cfg(unix)]
    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        use std::os::unix::fs::PermissionsExt;

        tracing::trace!(path = %path.display(), mode = %format!("{:o}", mode), "chmod");
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| FsError::new(e, Syscall::Chmod, path))
    }

    #[cfg(not(unix))]
    async fn chmod(&self, path: &Path, _mode: u32) -> Result<(), FsError> {
        // No executable bit outside unix; still fail for missing files.
        tokio::fs::metadata(path)
            .await
            .map(|_| ())
            .map_err(|e| FsError::new(e, Syscall::Chmod, path))
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| FsError::new(e, Syscall::Open, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copy_and_read() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        std::fs::write(&src, "hello").unwrap();

        let fs = LocalFs::new();
        fs.copy_file(&src, &dest).await.unwrap();
        assert_eq!(fs.read_file(&dest).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn copy_missing_source_is_enoent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("package.json");
        let dest = dir.path().join("out.json");

        let err = LocalFs::new().copy_file(&src, &dest).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("ENOENT: no such file or directory, copyfile"));
        assert!(message.contains("package.json"));
    }

    #[tokio::test]
    async fn rm_force_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let fs = LocalFs::new();

        fs.rm(
            &missing,
            RmOptions {
                recursive: true,
                force: true,
            },
        )
        .await
        .unwrap();

        let err = fs.rm(&missing, RmOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rm_recursive_and_mkdir_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out/a/b");
        let fs = LocalFs::new();

        fs.mkdir(&nested, MkdirOptions { recursive: true })
            .await
            .unwrap();
        std::fs::write(nested.join("f.txt"), "x").unwrap();
        // Recursive mkdir on an existing directory succeeds.
        fs.mkdir(&nested, MkdirOptions { recursive: true })
            .await
            .unwrap();

        fs.rm(
            &dir.path().join("out"),
            RmOptions {
                recursive: true,
                force: false,
            },
        )
        .await
        .unwrap();
        assert!(!dir.path().join("out").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn chmod_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bin.js");
        std::fs::write(&file, "#!/usr/bin/env node").unwrap();

        LocalFs::new().chmod(&file, 0o755).await.unwrap();
        let mode = std::fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
