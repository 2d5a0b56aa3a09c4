//! Architecture enforcement tests.
//!
//! Failures are turned into exit codes in exactly one place: the engine's
//! runner. Everything else reports errors through `Result` and the `Log`
//! trait. These tests scan the sources so a stray exit is caught in CI.
//!
//! # Test Categories
//!
//! 1. **Exit Detection** - Only the runner may call `Process::exit`
//! 2. **Global Access** - Only the process adapter reads process globals
//! 3. **Output Detection** - Library code does not print directly

use std::fs;
use std::path::{Path, PathBuf};

/// Files allowed to call `.exit(`.
///
/// - `engine/runner.rs` - The failure classifier
/// - `ui/process.rs` - The `Process` implementations themselves
/// - `main.rs` - Start-up failures before the engine exists
const EXIT_ALLOWED: &[&str] = &["engine/runner.rs", "ui/process.rs", "main.rs"];

/// Files allowed to read process globals (`std::env`, `current_dir`).
const GLOBALS_ALLOWED: &[&str] = &["ui/process.rs"];

/// Files allowed to use `println!`/`eprintln!`.
const PRINT_ALLOWED: &[&str] = &[];

fn source_files(dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).expect("Failed to read source directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            source_files(&path, files);
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            files.push(path);
        }
    }
}

/// Source files under `src/`, with their path relative to `src/` and the
/// text before any `#[cfg(test)]` module.
fn sources() -> Vec<(String, String)> {
    let root = Path::new("src");
    let mut files = Vec::new();
    source_files(root, &mut files);
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|_| panic!("Failed to read {}", relative));
            let code = match content.find("#[cfg(test)]") {
                Some(index) => content[..index].to_string(),
                None => content,
            };
            (relative, code)
        })
        .collect()
}

/// Lines of `code` that are not comments.
fn code_lines(code: &str) -> impl Iterator<Item = (usize, &str)> {
    code.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with("//"))
}

fn violations(allowed: &[&str], patterns: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for (file, code) in sources() {
        if allowed.contains(&file.as_str()) {
            continue;
        }
        for (number, line) in code_lines(&code) {
            if patterns.iter().any(|pattern| line.contains(pattern)) {
                found.push(format!("{}:{}: {}", file, number, line));
            }
        }
    }
    found
}

// =============================================================================
// Exit Detection
// =============================================================================

/// Only the runner decides the exit code.
#[test]
fn only_the_runner_exits() {
    let found = violations(EXIT_ALLOWED, &[".exit(", "process::exit"]);
    assert!(
        found.is_empty(),
        "Process exits outside the engine runner:\n  {}",
        found.join("\n  ")
    );
}

/// The runner really is the place that exits.
#[test]
fn runner_calls_exit() {
    let runner = fs::read_to_string("src/engine/runner.rs").expect("Failed to read runner");
    assert!(runner.contains("process.exit(code)"));
}

// =============================================================================
// Global Access
// =============================================================================

#[test]
fn process_globals_go_through_the_process_trait() {
    let found = violations(
        GLOBALS_ALLOWED,
        &["std::env::args", "std::env::var", "env::current_dir"],
    );
    assert!(
        found.is_empty(),
        "Process globals read outside ui/process.rs:\n  {}",
        found.join("\n  ")
    );
}

// =============================================================================
// Output Detection
// =============================================================================

#[test]
fn output_goes_through_the_log() {
    let found = violations(PRINT_ALLOWED, &["println!", "eprintln!", "print!("]);
    assert!(
        found.is_empty(),
        "Direct printing outside the Log trait:\n  {}",
        found.join("\n  ")
    );
}
