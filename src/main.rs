use std::panic;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pkgkit::cli::ToolkitCli;
use pkgkit::core::config::Settings;
use pkgkit::ui::{Process, SystemProcess};

fn init_tracing(settings: &Settings) {
    let filter = match settings.trace_filter.as_deref() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::new("off"),
    };
    // Diagnostics go to stderr; stdout belongs to the console log.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        tracing::debug!(panic = %info, "panic");
        // Handler panics are caught and reported by the engine.
        if tracing::enabled!(tracing::Level::DEBUG) {
            default_hook(info);
        }
    }));
}

fn main() {
    let process: Arc<dyn Process> = Arc::new(SystemProcess);

    let settings = match Settings::from_process(process.as_ref()) {
        Ok(settings) => settings,
        Err(err) => {
            process.write_stderr(&format!("{}\n", err));
            process.exit(1);
            return;
        }
    };

    init_tracing(&settings);
    install_panic_hook();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            process.write_stderr(&format!("failed to start async runtime: {}\n", err));
            process.exit(1);
            return;
        }
    };

    let cli = ToolkitCli::new(Arc::clone(&process), &settings);
    runtime.block_on(cli.start());
}
