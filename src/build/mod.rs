//! build
//!
//! The package build pipeline.
//!
//! # Steps
//!
//! ```text
//! info("Building package...")
//! rm -rf <out> ; mkdir -p <out>
//! ┌ copy package.json ┐
//! │ copy LICENSE      │  concurrently, all-or-nothing
//! │ copy README.md    │
//! └ compile           ┘
//! chmod 755 every `bin` entry of <out>/package.json (concurrently)
//! info("Package built successfully.")
//! ```
//!
//! Any failure logs `Package build failed.` and is returned unchanged, so
//! the engine reports the failing step's message. Failed joins do not cancel the
//! other tasks; they run to completion and their results are dropped. There
//! is no rollback of files already staged.

pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::compiler::{Compiler, CompilerAdapter, CompilerError};
use crate::fs::{Fs, FsError, MkdirOptions, RmOptions};
use crate::ui::{Log, LogExt};

pub use manifest::{entry_path, executable_entries, EXECUTABLE_MODE};

/// Files copied verbatim from the working directory.
pub const STAGED_FILES: [&str; 3] = ["package.json", "LICENSE", "README.md"];

/// Errors from the build pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),

    /// At least one diagnostic had error severity.
    #[error("Compilation failed.")]
    CompilationFailed,

    #[error("Failed to parse '{}': {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("build task failed: {0}")]
    Task(#[from] JoinError),
}

/// Inputs of one build.
#[derive(Clone)]
pub struct BuildPackage {
    pub work_dir: PathBuf,
    pub out_dir: PathBuf,
    pub ts_config: PathBuf,
    pub log: Arc<dyn Log>,
    pub fs: Arc<dyn Fs>,
    pub compiler: Arc<dyn CompilerAdapter>,
}

/// Build the package described by `args`.
///
/// # Errors
///
/// Returns the first failure observed: a filesystem error (message kept
/// verbatim), a compiler error, [`BuildError::CompilationFailed`] or an
/// unparseable staged manifest.
pub async fn build_package(args: BuildPackage) -> Result<(), BuildError> {
    args.log.info("Building package...");
    match run(&args).await {
        Ok(()) => {
            args.log.info("Package built successfully.");
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, "build failed");
            args.log.error("Package build failed.");
            Err(err)
        }
    }
}

async fn run(args: &BuildPackage) -> Result<(), BuildError> {
    clean_out_dir(args.fs.as_ref(), &args.out_dir).await?;

    let mut tasks: Vec<JoinHandle<Result<(), BuildError>>> = STAGED_FILES
        .iter()
        .map(|name| {
            let fs = Arc::clone(&args.fs);
            let src = args.work_dir.join(name);
            let dest = args.out_dir.join(name);
            tokio::spawn(async move { fs.copy_file(&src, &dest).await.map_err(BuildError::from) })
        })
        .collect();
    tasks.push(tokio::spawn(compile(args.clone())));
    join_all_or_nothing(tasks).await?;

    make_bin_files_executable(args).await
}

async fn clean_out_dir(fs: &dyn Fs, out_dir: &Path) -> Result<(), BuildError> {
    fs.rm(
        out_dir,
        RmOptions {
            recursive: true,
            force: true,
        },
    )
    .await?;
    fs.mkdir(out_dir, MkdirOptions { recursive: true }).await?;
    Ok(())
}

async fn compile(args: BuildPackage) -> Result<(), BuildError> {
    let compiler = {
        let adapter = Arc::clone(&args.compiler);
        let ts_config = args.ts_config.clone();
        let out_dir = args.out_dir.clone();
        let work_dir = args.work_dir.clone();
        // Loading the configuration reads it synchronously.
        tokio::task::spawn_blocking(move || Compiler::new(adapter, &ts_config, &out_dir, work_dir))
            .await??
    };
    let result = compiler.compile().await?;
    for diagnostic in &result.diagnostics {
        args.log.log(
            diagnostic.log_level(),
            &compiler.format_diagnostics(std::slice::from_ref(diagnostic)),
        );
    }
    if result.has_errors {
        return Err(BuildError::CompilationFailed);
    }
    Ok(())
}

async fn make_bin_files_executable(args: &BuildPackage) -> Result<(), BuildError> {
    let path = args.out_dir.join("package.json");
    let bytes = args.fs.read_file(&path).await?;
    let manifest: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| BuildError::Manifest { path, source })?;

    let tasks: Vec<JoinHandle<Result<(), BuildError>>> = executable_entries(&manifest)
        .iter()
        .map(|entry| {
            let fs = Arc::clone(&args.fs);
            let target = entry_path(&args.out_dir, entry);
            tokio::spawn(async move {
                fs.chmod(&target, EXECUTABLE_MODE)
                    .await
                    .map_err(BuildError::from)
            })
        })
        .collect();
    join_all_or_nothing(tasks).await
}

/// Wait for every task; return the first failure as soon as it is seen.
///
/// Dropping the remaining handles detaches their tasks.
async fn join_all_or_nothing(
    tasks: Vec<JoinHandle<Result<(), BuildError>>>,
) -> Result<(), BuildError> {
    try_join_all(tasks.into_iter().map(|task| async move { task.await? })).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MockCompiler;
    use crate::fs::LocalFs;
    use crate::ui::{LogEntry, MemoryLog};
    use tempfile::TempDir;

    fn package(dir: &Path) {
        std::fs::write(dir.join("package.json"), r#"{"name": "demo"}"#).unwrap();
        std::fs::write(dir.join("LICENSE"), "MIT").unwrap();
        std::fs::write(dir.join("README.md"), "# demo").unwrap();
        std::fs::write(dir.join("tsconfig.json"), "{}").unwrap();
    }

    fn args(dir: &Path, log: Arc<MemoryLog>) -> BuildPackage {
        BuildPackage {
            work_dir: dir.to_path_buf(),
            out_dir: dir.join(".package"),
            ts_config: dir.join("tsconfig.json"),
            log,
            fs: Arc::new(LocalFs::new()),
            compiler: Arc::new(MockCompiler::new()),
        }
    }

    #[tokio::test]
    async fn stages_files() {
        let dir = TempDir::new().unwrap();
        package(dir.path());
        let log = Arc::new(MemoryLog::new());

        build_package(args(dir.path(), Arc::clone(&log))).await.unwrap();

        for name in STAGED_FILES {
            assert!(dir.path().join(".package").join(name).is_file(), "{}", name);
        }
        assert_eq!(
            log.entries(),
            vec![
                LogEntry::info("Building package..."),
                LogEntry::info("Package built successfully."),
            ]
        );
    }

    #[tokio::test]
    async fn missing_license_fails_with_fs_message() {
        let dir = TempDir::new().unwrap();
        package(dir.path());
        std::fs::remove_file(dir.path().join("LICENSE")).unwrap();
        let log = Arc::new(MemoryLog::new());

        let err = build_package(args(dir.path(), Arc::clone(&log)))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Fs(_)));
        assert!(err
            .to_string()
            .starts_with("ENOENT: no such file or directory, copyfile"));
        assert_eq!(
            log.entries().last(),
            Some(&LogEntry::error("Package build failed."))
        );
    }

    #[tokio::test]
    async fn stale_output_is_removed() {
        let dir = TempDir::new().unwrap();
        package(dir.path());
        let stale = dir.path().join(".package/stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        build_package(args(dir.path(), Arc::new(MemoryLog::new())))
            .await
            .unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn unparseable_staged_manifest_fails() {
        let dir = TempDir::new().unwrap();
        package(dir.path());
        std::fs::write(dir.path().join("package.json"), "{ nope").unwrap();

        let err = build_package(args(dir.path(), Arc::new(MemoryLog::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Manifest { .. }));
    }

    #[tokio::test]
    async fn join_reports_first_failure() {
        let ok: JoinHandle<Result<(), BuildError>> = tokio::spawn(async { Ok(()) });
        let failed: JoinHandle<Result<(), BuildError>> =
            tokio::spawn(async { Err(BuildError::CompilationFailed) });

        let err = join_all_or_nothing(vec![ok, failed]).await.unwrap_err();
        assert_eq!(err.to_string(), "Compilation failed.");
    }
}
