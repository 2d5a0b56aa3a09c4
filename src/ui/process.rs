//! ui::process
//!
//! Process accessors: argv, working directory, exit, standard streams and
//! environment.
//!
//! # Design
//!
//! Nothing in the crate reads process globals directly. Components receive a
//! `&dyn Process` (or `Arc<dyn Process>`) so tests can substitute
//! [`MockProcess`]. Only the engine runner calls [`Process::exit`], plus `main.rs`
//! when start-up fails before the engine exists.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Access to the hosting process.
pub trait Process: Send + Sync {
    /// Full argument vector, including the program name at index 0.
    fn argv(&self) -> Vec<String>;

    /// Current working directory.
    fn cwd(&self) -> PathBuf;

    /// Terminate the process with the given exit code.
    fn exit(&self, code: i32);

    /// Write raw text to standard output.
    fn write_stdout(&self, text: &str);

    /// Write raw text to standard error.
    fn write_stderr(&self, text: &str);

    /// Read an environment variable.
    fn env(&self, key: &str) -> Option<String>;
}

/// The real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl Process for SystemProcess {
    fn argv(&self) -> Vec<String> {
        std::env::args().collect()
    }

    fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn exit(&self, code: i32) {
        std::process::exit(code);
    }

    fn write_stdout(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed pipe must not turn logging into a failure.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn write_stderr(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }

    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory process for tests.
///
/// `exit` records the code instead of terminating, and both streams are
/// captured.
#[derive(Debug)]
pub struct MockProcess {
    argv: Vec<String>,
    cwd: PathBuf,
    env: HashMap<String, String>,
    exits: Mutex<Vec<i32>>,
    stdout: Mutex<String>,
    stderr: Mutex<String>,
}

impl MockProcess {
    /// Program name placed at `argv[0]`.
    pub const PROGRAM: &'static str = "pkgkit";

    /// Create a process invoked with `args` (program name is prepended) in `/`.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = std::iter::once(Self::PROGRAM.to_string())
            .chain(args.into_iter().map(Into::into))
            .collect();
        Self {
            argv,
            cwd: PathBuf::from("/"),
            env: HashMap::new(),
            exits: Mutex::new(Vec::new()),
            stdout: Mutex::new(String::new()),
            stderr: Mutex::new(String::new()),
        }
    }

    /// Set the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The first exit code requested, if any.
    pub fn exit_code(&self) -> Option<i32> {
        self.exits.lock().ok().and_then(|exits| exits.first().copied())
    }

    /// Everything written to stdout.
    pub fn stdout(&self) -> String {
        self.stdout.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Everything written to stderr.
    pub fn stderr(&self) -> String {
        self.stderr.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Process for MockProcess {
    fn argv(&self) -> Vec<String> {
        self.argv.clone()
    }

    fn cwd(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn exit(&self, code: i32) {
        if let Ok(mut exits) = self.exits.lock() {
            exits.push(code);
        }
    }

    fn write_stdout(&self, text: &str) {
        if let Ok(mut stdout) = self.stdout.lock() {
            stdout.push_str(text);
        }
    }

    fn write_stderr(&self, text: &str) {
        if let Ok(mut stderr) = self.stderr.lock() {
            stderr.push_str(text);
        }
    }

    fn env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_prepends_program_name() {
        let process = MockProcess::new(["package", "build"]);
        assert_eq!(process.argv(), vec!["pkgkit", "package", "build"]);
    }

    #[test]
    fn mock_records_exit_without_terminating() {
        let process = MockProcess::new(Vec::<String>::new());
        assert_eq!(process.exit_code(), None);
        process.exit(2);
        process.exit(1);
        assert_eq!(process.exit_code(), Some(2));
    }

    #[test]
    fn mock_captures_streams_and_env() {
        let process = MockProcess::new(Vec::<String>::new())
            .with_cwd("/work")
            .with_env("PKGKIT_TSC", "/bin/tsc");
        process.write_stdout("out\n");
        process.write_stderr("err\n");
        assert_eq!(process.stdout(), "out\n");
        assert_eq!(process.stderr(), "err\n");
        assert_eq!(process.cwd(), PathBuf::from("/work"));
        assert_eq!(process.env("PKGKIT_TSC").as_deref(), Some("/bin/tsc"));
        assert_eq!(process.env("MISSING"), None);
    }
}
