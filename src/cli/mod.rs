//! cli
//!
//! The toolkit command-line interface.
//!
//! # Responsibilities
//!
//! - Wire the default collaborators (console log, local filesystem, `tsc`)
//! - Register the toolkit's commands
//! - Hand the invocation to [`crate::engine::execute`]
//!
//! Every collaborator can be replaced, which is how the integration tests
//! drive the real command tree against a mock process and compiler.

pub mod commands;

use std::sync::Arc;

use crate::compiler::{CompilerAdapter, TscAdapter};
use crate::core::config::Settings;
use crate::engine::{self, Commands};
use crate::fs::{Fs, LocalFs};
use crate::ui::{ConsoleLog, Log, Process};

/// The toolkit CLI with its collaborators.
pub struct ToolkitCli {
    process: Arc<dyn Process>,
    log: Arc<dyn Log>,
    fs: Arc<dyn Fs>,
    compiler: Arc<dyn CompilerAdapter>,
}

impl ToolkitCli {
    /// Default collaborators configured from `settings`.
    pub fn new(process: Arc<dyn Process>, settings: &Settings) -> Self {
        let log = ConsoleLog::new(Arc::clone(&process)).with_max_level(settings.log_level);
        Self {
            process,
            log: Arc::new(log),
            fs: Arc::new(LocalFs::new()),
            compiler: Arc::new(TscAdapter::new(settings.compiler_command.clone())),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = log;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn Fs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn CompilerAdapter>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn log(&self) -> &Arc<dyn Log> {
        &self.log
    }

    /// The registered root commands.
    pub fn commands(&self) -> Commands {
        let mut commands = Commands::new();
        commands.command(commands::package_command(
            Arc::clone(&self.fs),
            Arc::clone(&self.compiler),
        ));
        commands
    }

    /// Run the invocation described by the process.
    pub async fn start(&self) {
        engine::execute(self.commands(), self.process.as_ref(), Arc::clone(&self.log)).await;
    }
}
