//! engine::node
//!
//! Parser nodes and recursive command-tree composition.
//!
//! # Design
//!
//! A [`ParserNode`] is the opaque builder handed to command builders. It wraps
//! the clap command for one tree position together with the node's argument
//! schema (inherited options included) and its route from the root. Builders
//! can only chain [`ParserNode::option`] and [`ParserNode::subcommand`] (the
//! latter via [`Descend::command`]), so every node they return extends its
//! parent. The engine still re-checks that after each builder returns.
//!
//! Composition is synchronous; it finishes before anything is parsed.
//!
//! # Example
//!
//! ```ignore
//! let build = CommandDescriptor::new("build")
//!     .builder(|ctx| ctx.node.option(OptionSpec::path("out-dir").short('o')));
//! let package = CommandDescriptor::new("package")
//!     .builder(move |ctx| ctx.descend.command(ctx.node, build.clone()));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{ArgAction, ColorChoice, Command};
use thiserror::Error;

use super::command::{BuilderContext, CommandDescriptor, Commands, Handler, Services};
use super::schema::{ArgSchema, OptionSpec};
use crate::core::paths;

/// Name shown in usage lines.
pub const PROGRAM_NAME: &str = "pkgkit";

pub const WORK_DIR: &str = "work-dir";
pub const HELP: &str = "help";
pub const VERSION: &str = "version";

/// Errors raised while composing the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("option '--{0}' is declared more than once")]
    DuplicateOption(String),

    #[error("short flag '-{short}' of option '--{option}' is already used by '--{existing}'")]
    DuplicateShort {
        short: char,
        existing: String,
        option: String,
    },

    #[error("command '{0}' is declared more than once")]
    DuplicateCommand(String),

    #[error("command '{0}' does not extend the arguments of its parent")]
    NotASuperset(String),

    #[error("builder of command '{expected}' returned the node of '{found}'")]
    ForeignNode { expected: String, found: String },
}

/// One position in the command tree under construction.
#[derive(Debug, Clone)]
pub struct ParserNode {
    command: Command,
    schema: ArgSchema,
    route: Vec<String>,
}

impl ParserNode {
    /// The root node with the global `work-dir`, `help` and `version`
    /// options. `work-dir` is resolved against `cwd`.
    pub(crate) fn root(cwd: &Path) -> Self {
        let base = cwd.to_path_buf();
        let work_dir = clap::Arg::new(WORK_DIR)
            .long(WORK_DIR)
            .short('w')
            .global(true)
            .action(ArgAction::Set)
            .value_parser(move |raw: &str| -> Result<PathBuf, String> {
                Ok(paths::resolve(&base, Path::new(raw)))
            })
            .default_value(cwd.to_string_lossy().into_owned())
            .hide_default_value(true)
            .help("The working directory used to resolve all relative paths [default: process working directory]");

        let mut schema = ArgSchema::new();
        let mut command = configure(Command::new(PROGRAM_NAME).bin_name(PROGRAM_NAME))
            .color(ColorChoice::Never)
            .arg(work_dir);

        let globals = [
            OptionSpec::path(WORK_DIR).short('w'),
            OptionSpec::boolean(HELP).short('h').description("Show help"),
            OptionSpec::boolean(VERSION)
                .short('v')
                .description("Show version number"),
        ];
        for spec in globals {
            if spec.name() != WORK_DIR {
                command = command.arg(spec.to_arg());
            }
            // Fresh schema: these cannot collide.
            let _ = schema.declare(spec);
        }

        Self {
            command,
            schema,
            route: Vec::new(),
        }
    }

    fn child(parent: &ParserNode, descriptor: &CommandDescriptor) -> Self {
        let mut about = descriptor.description.clone().unwrap_or_default();
        if descriptor.deprecated {
            if !about.is_empty() {
                about.push(' ');
            }
            about.push_str("[deprecated]");
        }
        let mut command = configure(Command::new(descriptor.name.clone()))
            .visible_aliases(descriptor.aliases.clone());
        if !about.is_empty() {
            command = command.about(about);
        }

        let mut route = parent.route.clone();
        route.push(descriptor.name.clone());
        Self {
            command,
            schema: parent.schema.clone(),
            route,
        }
    }

    /// Declare an option on this node and its descendants.
    pub fn option(mut self, spec: OptionSpec) -> Result<Self, CompositionError> {
        let arg = spec.to_arg();
        self.schema.declare(spec)?;
        self.command = self.command.arg(arg);
        Ok(self)
    }

    /// Attach a composed child node.
    pub(crate) fn subcommand(mut self, child: ParserNode) -> Result<Self, CompositionError> {
        let name = child.command.get_name().to_string();
        if self.command.find_subcommand(&name).is_some() {
            return Err(CompositionError::DuplicateCommand(name));
        }
        self.command = self.command.subcommand(child.command);
        Ok(self)
    }

    pub fn schema(&self) -> &ArgSchema {
        &self.schema
    }

    pub fn route(&self) -> &[String] {
        &self.route
    }

    fn display_route(route: &[String]) -> String {
        if route.is_empty() {
            PROGRAM_NAME.to_string()
        } else {
            route.join(" ")
        }
    }
}

fn configure(command: Command) -> Command {
    command
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
}

/// What the engine keeps per composed route.
#[derive(Clone)]
pub(crate) struct Entry {
    pub schema: ArgSchema,
    pub handler: Option<Handler>,
}

/// Recursive composition helper handed to builders.
pub struct Descend {
    entries: RefCell<HashMap<Vec<String>, Entry>>,
    services: Services,
}

impl Descend {
    fn new(services: Services) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            services,
        }
    }

    /// Compose `descriptor` as a subcommand of `parent` and return `parent`
    /// with the child attached.
    pub fn command(
        &self,
        parent: ParserNode,
        descriptor: CommandDescriptor,
    ) -> Result<ParserNode, CompositionError> {
        let child = self.compose(&parent, &descriptor)?;
        parent.subcommand(child)
    }

    fn compose(
        &self,
        parent: &ParserNode,
        descriptor: &CommandDescriptor,
    ) -> Result<ParserNode, CompositionError> {
        let seed = ParserNode::child(parent, descriptor);
        let expected = seed.route.clone();

        let node = (descriptor.builder)(BuilderContext {
            node: seed,
            descend: self,
            services: &self.services,
        })?;

        if node.route != expected {
            return Err(CompositionError::ForeignNode {
                expected: ParserNode::display_route(&expected),
                found: ParserNode::display_route(&node.route),
            });
        }
        if !node.schema.is_superset_of(&parent.schema) {
            return Err(CompositionError::NotASuperset(ParserNode::display_route(
                &expected,
            )));
        }

        tracing::trace!(route = %ParserNode::display_route(&expected), options = node.schema.len(), "composed");
        self.entries.borrow_mut().insert(
            expected,
            Entry {
                schema: node.schema.clone(),
                handler: descriptor.handler.clone(),
            },
        );
        Ok(node)
    }
}

/// A fully composed tree ready for parsing.
pub(crate) struct CommandTree {
    pub command: Command,
    pub root_schema: ArgSchema,
    pub entries: HashMap<Vec<String>, Entry>,
}

impl CommandTree {
    /// Schema and handler of the node at `route`.
    pub fn entry(&self, route: &[String]) -> Option<&Entry> {
        self.entries.get(route)
    }

    pub fn schema(&self, route: &[String]) -> &ArgSchema {
        self.entry(route)
            .map(|entry| &entry.schema)
            .unwrap_or(&self.root_schema)
    }
}

/// Compose `commands` under a fresh root.
pub(crate) fn compose(
    commands: &Commands,
    cwd: &Path,
    services: &Services,
) -> Result<CommandTree, CompositionError> {
    let descend = Descend::new(services.clone());
    let mut root = ParserNode::root(cwd);
    let root_schema = root.schema.clone();
    for (name, descriptor) in commands.iter() {
        let mut descriptor = descriptor.clone();
        descriptor.name = name.to_string();
        root = descend.command(root, descriptor)?;
    }
    Ok(CommandTree {
        command: root.command,
        root_schema,
        entries: descend.entries.into_inner(),
    })
}
