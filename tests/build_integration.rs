//! Integration tests for `package build`.
//!
//! These run the real command tree through `ToolkitCli` on a temporary
//! package directory, with the local filesystem and the mock compiler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use pkgkit::cli::ToolkitCli;
use pkgkit::compiler::{Diagnostic, MockCompiler};
use pkgkit::core::config::Settings;
use pkgkit::ui::{LogEntry, LogLevel, MemoryLog, MockProcess};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A package directory on disk.
struct TestPackage {
    dir: TempDir,
}

impl TestPackage {
    /// A package with `bin/demo.ts` declared as an executable and
    /// `lib/util.ts` as a plain module.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let package = Self { dir };
        package.write(
            "package.json",
            r#"{"name": "demo", "version": "1.0.0", "bin": {"demo": "bin/demo.js"}}"#,
        );
        package.write("LICENSE", "MIT");
        package.write("README.md", "# demo\n");
        package.write(
            "tsconfig.json",
            r#"{"compilerOptions": {"strict": true}, "files": ["bin/demo.ts", "lib/util.ts"]}"#,
        );
        package.write("bin/demo.ts", "console.log('demo');\n");
        package.write("lib/util.ts", "export const one = 1;\n");
        package
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn out(&self, name: &str) -> PathBuf {
        self.path().join(".package").join(name)
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn remove(&self, name: &str) {
        std::fs::remove_file(self.path().join(name)).unwrap();
    }

    /// Run `pkgkit package build <extra>` with this package as cwd.
    async fn build(&self, compiler: MockCompiler, extra: &[&str]) -> Outcome {
        let args: Vec<&str> = ["package", "build"].iter().chain(extra).copied().collect();
        let process = Arc::new(MockProcess::new(args).with_cwd(self.path()));
        let log = Arc::new(MemoryLog::new());
        ToolkitCli::new(process.clone(), &Settings::default())
            .with_log(log.clone())
            .with_compiler(Arc::new(compiler))
            .start()
            .await;
        Outcome { process, log }
    }
}

struct Outcome {
    process: Arc<MockProcess>,
    log: Arc<MemoryLog>,
}

impl Outcome {
    fn entries(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    fn exit_code(&self) -> Option<i32> {
        self.process.exit_code()
    }
}

#[cfg(unix)]
fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn builds_the_package() {
    let package = TestPackage::new();
    let outcome = package.build(MockCompiler::new(), &[]).await;

    assert_eq!(outcome.exit_code(), None);
    assert_eq!(
        outcome.entries(),
        vec![
            LogEntry::info("Building package..."),
            LogEntry::info("Package built successfully."),
        ]
    );
    for name in ["package.json", "LICENSE", "README.md", "bin/demo.js", "lib/util.js"] {
        assert!(package.out(name).is_file(), "missing {}", name);
    }
    assert_eq!(
        std::fs::read_to_string(package.out("LICENSE")).unwrap(),
        "MIT"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn only_declared_entries_become_executable() {
    let package = TestPackage::new();
    let outcome = package.build(MockCompiler::new(), &[]).await;

    assert_eq!(outcome.exit_code(), None);
    assert_eq!(mode(&package.out("bin/demo.js")), 0o755);
    assert_eq!(mode(&package.out("lib/util.js")) & 0o111, 0);
}

#[tokio::test]
async fn building_twice_gives_the_same_tree() {
    let package = TestPackage::new();
    let first = package.build(MockCompiler::new(), &[]).await;
    assert_eq!(first.exit_code(), None);
    std::fs::write(package.out("stale.js"), "old").unwrap();

    let second = package.build(MockCompiler::new(), &[]).await;
    assert_eq!(second.exit_code(), None);
    assert_eq!(first.entries(), second.entries());
    assert!(!package.out("stale.js").exists());
    assert!(package.out("bin/demo.js").is_file());
}

#[tokio::test]
async fn string_bin_is_ignored() {
    let package = TestPackage::new();
    package.write(
        "package.json",
        r#"{"name": "demo", "bin": "bin/missing.js"}"#,
    );

    let outcome = package.build(MockCompiler::new(), &[]).await;
    assert_eq!(outcome.exit_code(), None);
}

#[cfg(unix)]
#[tokio::test]
async fn array_bin_entries_become_executable() {
    let package = TestPackage::new();
    package.write(
        "package.json",
        r#"{"name": "demo", "bin": ["bin/demo.js", 7]}"#,
    );

    let outcome = package.build(MockCompiler::new(), &[]).await;
    assert_eq!(outcome.exit_code(), None);
    assert_eq!(mode(&package.out("bin/demo.js")), 0o755);
    assert_eq!(mode(&package.out("lib/util.js")) & 0o111, 0);
}

#[tokio::test]
async fn commented_tsconfig_builds() {
    let package = TestPackage::new();
    package.write(
        "tsconfig.json",
        "{\n  // Generated by tsc --init\n  \"compilerOptions\": {\"strict\": true,},\n  \"files\": [\"bin/demo.ts\", \"lib/util.ts\"],\n}\n",
    );

    let outcome = package.build(MockCompiler::new(), &[]).await;
    assert_eq!(outcome.exit_code(), None);
    assert_eq!(
        outcome.entries(),
        vec![
            LogEntry::info("Building package..."),
            LogEntry::info("Package built successfully."),
        ]
    );
    assert!(package.out("bin/demo.js").is_file());
}

#[tokio::test]
async fn custom_out_dir_and_tsconfig() {
    let package = TestPackage::new();
    package.write("tsconfig.build.json", r#"{"files": ["lib/util.ts"]}"#);
    package.write("package.json", r#"{"name": "demo"}"#);

    let outcome = package
        .build(
            MockCompiler::new(),
            &["-o", "dist", "--tsconfig", "tsconfig.build.json"],
        )
        .await;

    assert_eq!(outcome.exit_code(), None);
    let dist = package.path().join("dist");
    assert!(dist.join("package.json").is_file());
    assert!(dist.join("lib/util.js").is_file());
    assert!(!dist.join("bin/demo.js").exists());
    assert!(!package.path().join(".package").exists());
}

#[tokio::test]
async fn work_dir_selects_the_package() {
    let package = TestPackage::new();
    let elsewhere = TempDir::new().unwrap();

    let process = Arc::new(
        MockProcess::new([
            "--work-dir",
            package.path().to_str().unwrap(),
            "package",
            "build",
        ])
        .with_cwd(elsewhere.path()),
    );
    let log = Arc::new(MemoryLog::new());
    ToolkitCli::new(process.clone(), &Settings::default())
        .with_log(log.clone())
        .with_compiler(Arc::new(MockCompiler::new()))
        .start()
        .await;

    assert_eq!(process.exit_code(), None);
    assert!(package.out("package.json").is_file());
    assert!(!elsewhere.path().join(".package").exists());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn missing_package_json() {
    let package = TestPackage::new();
    package.remove("package.json");

    let outcome = package.build(MockCompiler::new(), &[]).await;

    assert_eq!(outcome.exit_code(), Some(1));
    let expected = format!(
        "ENOENT: no such file or directory, copyfile '{}' -> '{}'",
        package.path().join("package.json").display(),
        package.out("package.json").display()
    );
    let entries = outcome.entries();
    assert_eq!(
        entries[..3],
        [
            LogEntry::info("Building package..."),
            LogEntry::error("Package build failed."),
            LogEntry::error(expected),
        ]
    );
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3].level, LogLevel::Debug);
}

#[tokio::test]
async fn type_error_fails_the_build() {
    let package = TestPackage::new();
    package.write("index.ts", "const x: string = 1;\n");
    let diagnostic = Diagnostic::error(2322, "Type 'number' is not assignable to type 'string'.")
        .at(package.path().join("index.ts"), 6, 1);

    let outcome = package
        .build(MockCompiler::new().with_pre_emit(vec![diagnostic]), &[])
        .await;

    assert_eq!(outcome.exit_code(), Some(1));
    let entries = outcome.entries();
    assert_eq!(
        entries[..4],
        [
            LogEntry::info("Building package..."),
            LogEntry::error(
                "index.ts(1,7): error TS2322: Type 'number' is not assignable to type 'string'.\n"
            ),
            LogEntry::error("Package build failed."),
            LogEntry::error("Compilation failed."),
        ]
    );
    assert_eq!(entries[4].level, LogLevel::Debug);
}

#[tokio::test]
async fn warnings_do_not_fail_the_build() {
    let package = TestPackage::new();
    let warning = Diagnostic::warning(6133, "'one' is declared but its value is never read.")
        .at(package.path().join("lib/util.ts"), 13, 3);

    let outcome = package
        .build(MockCompiler::new().with_emit(vec![warning]), &[])
        .await;

    assert_eq!(outcome.exit_code(), None);
    assert_eq!(
        outcome.entries(),
        vec![
            LogEntry::info("Building package..."),
            LogEntry::warning(
                "lib/util.ts(1,14): warning TS6133: 'one' is declared but its value is never read.\n"
            ),
            LogEntry::info("Package built successfully."),
        ]
    );
}

#[tokio::test]
async fn missing_tsconfig_is_a_diagnostic() {
    let package = TestPackage::new();
    package.remove("tsconfig.json");

    let outcome = package.build(MockCompiler::new(), &[]).await;

    assert_eq!(outcome.exit_code(), Some(1));
    let errors = outcome.log.messages(LogLevel::Error);
    assert_eq!(
        errors[0],
        format!(
            "error TS5083: Cannot read file '{}'.\n",
            package.path().join("tsconfig.json").display()
        )
    );
    assert_eq!(errors.last().map(String::as_str), Some("Compilation failed."));
}

#[tokio::test]
async fn missing_executable_fails_chmod() {
    let package = TestPackage::new();
    package.write(
        "package.json",
        r#"{"name": "demo", "bin": {"ghost": "bin/ghost.js"}}"#,
    );

    let outcome = package.build(MockCompiler::new(), &[]).await;

    assert_eq!(outcome.exit_code(), Some(1));
    let errors = outcome.log.messages(LogLevel::Error);
    assert_eq!(
        errors,
        vec![
            "Package build failed.".to_string(),
            format!(
                "ENOENT: no such file or directory, chmod '{}'",
                package.out("bin/ghost.js").display()
            ),
        ]
    );
}
