//! engine::runner
//!
//! The single entry point for a CLI invocation.
//!
//! # Lifecycle
//!
//! ```text
//! compose -> parse argv -> help? -> version? -> handler -> classify
//! ```
//!
//! Help and version are decided after parsing, on the matched node, and
//! before its handler runs; help wins over version. Every failure is turned
//! into log lines and an exit code here, and only here.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgMatches, Command};
use futures::FutureExt;

use super::args::Args;
use super::command::{Commands, HandlerContext, Services};
use super::failure::{render_help, Failure, ValidationError};
use super::node::{compose, HELP, VERSION};
use crate::ui::{Log, LogExt, Process};

/// Version reported by `--version`.
pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

/// Run one invocation against `process`.
///
/// On failure the failure is logged and `process.exit` is called with its
/// exit code; on success `exit` is never called.
pub async fn execute(commands: Commands, process: &dyn Process, log: Arc<dyn Log>) {
    let services = Services {
        log: Arc::clone(&log),
    };
    if let Err(failure) = run(&commands, process, services).await {
        tracing::debug!(kind = ?failure.kind(), "invocation failed");
        let code = failure.report(log.as_ref());
        process.exit(code);
    }
}

async fn run(commands: &Commands, process: &dyn Process, services: Services) -> Result<(), Failure> {
    let argv = process.argv();
    let cwd = process.cwd();

    let tree = compose(commands, &cwd, &services).map_err(anyhow::Error::from)?;
    let mut root = tree.command.clone();
    root.build();

    let matches = match root.try_get_matches_from_mut(&argv) {
        Ok(matches) => matches,
        Err(err) => return Err(validation_failure(&root, &argv, &err).into()),
    };

    let (route, leaf) = matched_route(&matches);
    tracing::debug!(route = %route.join(" "), "parsed");

    if is_set(leaf, HELP) {
        services.log.info(&render_help(node_at(&root, &route)));
        return Ok(());
    }
    if is_set(leaf, VERSION) {
        services.log.info(VERSION_STRING);
        return Ok(());
    }

    let Some(handler) = tree.entry(&route).and_then(|entry| entry.handler.clone()) else {
        return Ok(());
    };
    let schema = tree.schema(&route).clone();
    let args = Args::from_matches(route, &schema, leaf, &cwd);
    let ctx = HandlerContext { args, services };

    let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler(ctx)))
        .map_err(|payload| Failure::Unknown(panic_message(payload)))?;
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result.map_err(Failure::Runtime),
        Err(payload) => Err(Failure::Unknown(panic_message(payload))),
    }
}

fn matched_route(matches: &ArgMatches) -> (Vec<String>, &ArgMatches) {
    let mut route = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        route.push(name.to_string());
        current = sub;
    }
    (route, current)
}

fn is_set(matches: &ArgMatches, name: &str) -> bool {
    matches!(matches.try_get_one::<bool>(name), Ok(Some(true)))
}

fn node_at<'a>(root: &'a Command, route: &[String]) -> &'a Command {
    route.iter().fold(root, |node, name| {
        node.find_subcommand(name).unwrap_or(node)
    })
}

/// The deepest node named by the leading subcommand tokens of `argv`.
///
/// Option values given as a separate token are skipped, so they are never
/// mistaken for a subcommand name.
fn failing_node<'a>(root: &'a Command, argv: &[String]) -> &'a Command {
    let mut node = root;
    let mut tokens = argv.iter().skip(1);
    while let Some(token) = tokens.next() {
        if token == "--" {
            break;
        }
        if let Some(flag) = token.strip_prefix('-') {
            if takes_separate_value(node, flag) {
                tokens.next();
            }
            continue;
        }
        match node.find_subcommand(token) {
            Some(child) => node = child,
            None => break,
        }
    }
    node
}

/// Whether `flag` (a token without its leading `-`) is an option of `node`
/// whose value is the next token.
fn takes_separate_value(node: &Command, flag: &str) -> bool {
    let arg = match flag.strip_prefix('-') {
        Some(long) if long.contains('=') => return false,
        Some(long) => node.get_arguments().find(|arg| arg.get_long() == Some(long)),
        None => {
            let mut chars = flag.chars();
            match (chars.next(), chars.next()) {
                (Some(short), None) => node.get_arguments().find(|arg| arg.get_short() == Some(short)),
                _ => return false,
            }
        }
    };
    arg.is_some_and(|arg| arg.get_action().takes_values())
}

fn validation_failure(root: &Command, argv: &[String], err: &clap::Error) -> ValidationError {
    let message = match err.kind() {
        ErrorKind::UnknownArgument | ErrorKind::InvalidSubcommand => {
            let token = err
                .get(ContextKind::InvalidArg)
                .or_else(|| err.get(ContextKind::InvalidSubcommand))
                .and_then(|value| match value {
                    ContextValue::String(s) => Some(s.clone()),
                    _ => None,
                });
            match token {
                Some(token) => format!("Unknown argument: {}", token),
                None => first_line(err),
            }
        }
        _ => first_line(err),
    };
    ValidationError::new(message, failing_node(root, argv).clone())
}

fn first_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
