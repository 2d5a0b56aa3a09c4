//! engine::command
//!
//! The command descriptor protocol.
//!
//! # Design
//!
//! A [`CommandDescriptor`] pairs a *builder*, which extends the parser node
//! it is given (options, nested commands), with an optional *handler*, which
//! receives the parsed arguments and the shared services. A descriptor
//! without a handler is a namespace: it only groups subcommands.
//!
//! Descriptors are immutable once registered and cheap to clone; builders
//! and handlers are shared behind `Arc`.
//!
//! # Example
//!
//! ```ignore
//! use pkgkit::engine::{CommandDescriptor, OptionSpec};
//! use pkgkit::ui::LogExt;
//!
//! let greet = CommandDescriptor::new("greet")
//!     .description("Print a greeting")
//!     .builder(|ctx| ctx.node.option(OptionSpec::string("name").default_value("world")))
//!     .handler(|ctx| async move {
//!         ctx.services.log.info(&format!("Hello, {}!", ctx.args.string("name")?));
//!         Ok(())
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::args::Args;
use super::node::{CompositionError, Descend, ParserNode};
use crate::ui::Log;

/// Future returned by command handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub(crate) type Builder =
    Arc<dyn Fn(BuilderContext<'_>) -> Result<ParserNode, CompositionError> + Send + Sync>;

pub(crate) type Handler = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

fn extend_nothing(ctx: BuilderContext<'_>) -> Result<ParserNode, CompositionError> {
    Ok(ctx.node)
}

/// Services shared with builders and handlers.
#[derive(Clone)]
pub struct Services {
    pub log: Arc<dyn Log>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// What a builder receives.
pub struct BuilderContext<'a> {
    /// The node to extend; already carries every inherited option.
    pub node: ParserNode,
    /// Composes nested descriptors under `node`.
    pub descend: &'a Descend,
    pub services: &'a Services,
}

/// What a handler receives.
#[derive(Debug)]
pub struct HandlerContext {
    pub args: Args,
    pub services: Services,
}

/// A named command.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) aliases: Vec<String>,
    pub(crate) deprecated: bool,
    pub(crate) builder: Builder,
    pub(crate) handler: Option<Handler>,
}

impl CommandDescriptor {
    /// A command that accepts only inherited options and has no handler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            deprecated: false,
            builder: Arc::new(extend_nothing),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(BuilderContext<'_>) -> Result<ParserNode, CompositionError> + Send + Sync + 'static,
    {
        self.builder = Arc::new(builder);
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |ctx: HandlerContext| {
            Box::pin(handler(ctx)) as HandlerFuture
        }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("aliases", &self.aliases)
            .field("deprecated", &self.deprecated)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Root commands, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Commands {
    entries: Vec<(String, CommandDescriptor)>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name.
    pub fn command(&mut self, descriptor: CommandDescriptor) -> &mut Self {
        let name = descriptor.name.clone();
        self.insert(name, descriptor)
    }

    /// Register a command under `name`, which replaces the descriptor's own.
    /// An existing entry with the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: CommandDescriptor) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.entries.push((name, descriptor)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandDescriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let descriptor = CommandDescriptor::new("build");
        assert_eq!(descriptor.name(), "build");
        assert!(!descriptor.has_handler());
        assert!(!descriptor.deprecated);
        assert!(descriptor.aliases.is_empty());
    }

    #[test]
    fn insert_replaces_same_name() {
        let mut commands = Commands::new();
        commands
            .command(CommandDescriptor::new("a"))
            .command(CommandDescriptor::new("b"))
            .insert("a", CommandDescriptor::new("other").description("second"));

        let names: Vec<&str> = commands.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        let (_, first) = commands.iter().next().unwrap();
        assert_eq!(first.description.as_deref(), Some("second"));
    }

    #[test]
    fn debug_hides_closures() {
        let descriptor = CommandDescriptor::new("x").handler(|_| async { Ok::<(), anyhow::Error>(()) });
        let rendered = format!("{:?}", descriptor);
        assert!(rendered.contains("has_handler: true"));
    }
}
