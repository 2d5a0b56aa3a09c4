//! engine
//!
//! Command composition and execution.
//!
//! # Architecture
//!
//! The engine turns a set of [`CommandDescriptor`]s into a parser tree,
//! parses the process arguments against it and runs the matched handler:
//!
//! ```text
//! Commands -> compose (builders, descend) -> parse -> help | version | handler
//!                                                          |
//!                                                     classify -> exit code
//! ```
//!
//! # Invariants
//!
//! - Every node's argument schema extends its parent's; the root carries
//!   `work-dir`, `help` and `version`
//! - `--help` and `--version` suppress the matched handler, help first
//! - Only [`execute`] calls `Process::exit`, and only on failure
//!
//! # Modules
//!
//! - [`command`] - Descriptor protocol and handler context
//! - [`schema`] - Option declarations and schema checks
//! - [`node`] - Parser nodes and recursive composition
//! - [`args`] - Typed parsed arguments
//! - [`failure`] - Failure kinds, reporting and exit codes
//! - [`runner`] - The `execute` entry point

pub mod args;
pub mod command;
pub mod failure;
pub mod node;
pub mod runner;
pub mod schema;

pub use args::{ArgError, ArgValue, Args};
pub use command::{
    BuilderContext, CommandDescriptor, Commands, HandlerContext, HandlerFuture, Services,
};
pub use failure::{Failure, FailureKind, ValidationError, EXIT_FAILURE, EXIT_VALIDATION};
pub use node::{CompositionError, Descend, ParserNode};
pub use runner::{execute, VERSION_STRING};
pub use schema::{ArgSchema, OptionKind, OptionSpec};
