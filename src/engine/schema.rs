//! engine::schema
//!
//! Argument schemas: the ordered set of options a command node accepts,
//! including everything inherited from its ancestors.
//!
//! # Design
//!
//! Every option is declared as a *global* clap argument on the node that
//! introduces it, so descendants accept it and list it in their help. The
//! schema mirrors those declarations so the engine can check, at
//! composition time, that a child's shape extends its parent's and can
//! extract typed values for the matched node.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction};

use super::node::CompositionError;

/// Value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Boolean,
    Number,
    /// A path resolved against `work-dir` before handlers see it.
    Path,
}

/// Declaration of a single option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    name: String,
    kind: OptionKind,
    short: Option<char>,
    description: Option<String>,
    default_value: Option<String>,
    default_description: Option<String>,
}

impl OptionSpec {
    fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            short: None,
            description: None,
            default_value: None,
            default_description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Boolean)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Number)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, OptionKind::Path)
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Raw value used when the option is absent. Ignored for booleans,
    /// which default to `false`.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Text shown in help instead of the raw default.
    pub fn default_description(mut self, text: impl Into<String>) -> Self {
        self.default_description = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn short_flag(&self) -> Option<char> {
        self.short
    }

    /// The clap argument for this option.
    pub(crate) fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .global(true);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }

        arg = match self.kind {
            OptionKind::Boolean => arg.action(ArgAction::SetTrue),
            OptionKind::String => arg.action(ArgAction::Set).value_parser(value_parser!(String)),
            OptionKind::Number => arg.action(ArgAction::Set).value_parser(value_parser!(f64)),
            OptionKind::Path => arg.action(ArgAction::Set).value_parser(value_parser!(PathBuf)),
        };

        if self.kind != OptionKind::Boolean {
            if let Some(default) = &self.default_value {
                arg = arg.default_value(default.clone());
            }
        }

        let mut help = self.description.clone().unwrap_or_default();
        if let Some(text) = &self.default_description {
            arg = arg.hide_default_value(true);
            if !help.is_empty() {
                help.push(' ');
            }
            help.push_str(&format!("[default: {}]", text));
        }
        if !help.is_empty() {
            arg = arg.help(help);
        }
        arg
    }
}

/// Ordered option declarations of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSchema {
    options: Vec<OptionSpec>,
}

impl ArgSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option. Names and short flags must be unique across the
    /// whole schema, inherited options included.
    pub fn declare(&mut self, spec: OptionSpec) -> Result<(), CompositionError> {
        if self.get(spec.name()).is_some() {
            return Err(CompositionError::DuplicateOption(spec.name().to_string()));
        }
        if let Some(short) = spec.short {
            if let Some(existing) = self.options.iter().find(|o| o.short == Some(short)) {
                return Err(CompositionError::DuplicateShort {
                    short,
                    existing: existing.name().to_string(),
                    option: spec.name().to_string(),
                });
            }
        }
        self.options.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// True when every option of `other` is declared here with the same kind.
    pub fn is_superset_of(&self, other: &ArgSchema) -> bool {
        other
            .options
            .iter()
            .all(|o| self.get(o.name()).is_some_and(|mine| mine.kind == o.kind))
    }
}
