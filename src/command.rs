// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Commands and the Builder Surface
//!
//! [`Command`] is the external value the tree ingests; everything
//! about it except its components, optional flag, sender predicate,
//! and permission is opaque to the tree. [`CommandBuilder`] and
//! [`ComponentBuilder`] are a convenience surface for constructing
//! one, in the spirit of the teacher's `CommandTree`/`Command`/
//! `Parameter` builders — out of scope for correctness, but the
//! natural way to build a `Command` in this crate's own tests and
//! doctests.

use std::sync::Arc;

use crate::component::{ComponentParser, LiteralPlaceholderParser, LiteralSuggestionProvider, NoSuggestions, SuggestionProvider};
use crate::node::{ComponentKind, DefaultValue};
use crate::permission::Permission;

/// A handler invoked once a command has been resolved by the walker.
pub type Handler<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// A predicate restricting which senders may execute a command.
pub type SenderPredicate<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

/// The external value inserted into the tree: an ordered sequence of
/// non-flag components, an optional trailing flag group, a required
/// sender predicate, a permission, and a handler.
pub struct Command<S> {
    /// Non-flag components, in path order.
    pub components: Vec<crate::node::CommandComponent<S>>,
    /// The flag component, if this command accepts flags.
    pub flag: Option<crate::node::CommandComponent<S>>,
    /// The permission required to execute this command.
    pub permission: Permission,
    /// If set, only senders satisfying this predicate may execute the
    /// command; `sender_kind_name` names the requirement for error
    /// messages.
    pub sender_predicate: Option<SenderPredicate<S>>,
    /// Human-readable name of the sender kind required, used in
    /// `InvalidCommandSender` messages.
    pub sender_kind_name: Option<String>,
    /// Invoked with the sender once the command is resolved.
    pub handler: Handler<S>,
}

impl<S> Command<S> {
    /// Whether `sender` satisfies this command's sender predicate (if
    /// any).
    pub fn accepts_sender(&self, sender: &S) -> bool {
        match &self.sender_predicate {
            Some(predicate) => predicate(sender),
            None => true,
        }
    }
}

/// Describes one component of a command, independent of the tree.
/// Consumed by [`CommandBuilder::component`].
pub struct ComponentDescriptor<S> {
    pub(crate) name: String,
    pub(crate) kind: ComponentKind,
    pub(crate) aliases: Vec<String>,
    pub(crate) parser: Arc<dyn ComponentParser<S>>,
    pub(crate) suggestion_provider: Arc<dyn SuggestionProvider<S>>,
    pub(crate) required: bool,
    pub(crate) default_value: Option<DefaultValue<S>>,
}

/// Builds a [`ComponentDescriptor`].
pub struct ComponentBuilder<S> {
    name: String,
    kind: ComponentKind,
    aliases: Vec<String>,
    parser: Option<Arc<dyn ComponentParser<S>>>,
    suggestion_provider: Option<Arc<dyn SuggestionProvider<S>>>,
    required: bool,
    default_value: Option<DefaultValue<S>>,
}

impl<S: 'static> ComponentBuilder<S> {
    /// Start building a LITERAL component matching `name` (and any
    /// aliases added with [`ComponentBuilder::alias`]).
    pub fn literal(name: impl Into<String>) -> Self {
        let name = name.into();
        ComponentBuilder {
            aliases: vec![name.clone()],
            name,
            kind: ComponentKind::Literal,
            parser: Some(Arc::new(LiteralPlaceholderParser)),
            suggestion_provider: None,
            required: true,
            default_value: None,
        }
    }

    /// Start building an ARGUMENT component named `name`, parsed by
    /// `parser`.
    pub fn argument(name: impl Into<String>, parser: Arc<dyn ComponentParser<S>>) -> Self {
        ComponentBuilder {
            name: name.into(),
            kind: ComponentKind::Argument,
            aliases: Vec::new(),
            parser: Some(parser),
            suggestion_provider: None,
            required: true,
            default_value: None,
        }
    }

    /// Start building a FLAG component named `name`, parsed by
    /// `parser`.
    pub fn flag(name: impl Into<String>, parser: Arc<dyn ComponentParser<S>>) -> Self {
        ComponentBuilder {
            name: name.into(),
            kind: ComponentKind::Flag,
            aliases: Vec::new(),
            parser: Some(parser),
            suggestion_provider: None,
            required: false,
            default_value: None,
        }
    }

    /// Add an additional alias this LITERAL component matches.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Mark this component optional (default: required).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Supply a default value used when this component is optional
    /// and the input is exhausted.
    pub fn default_value(mut self, default: DefaultValue<S>) -> Self {
        self.required = false;
        self.default_value = Some(default);
        self
    }

    /// Override the suggestion provider (defaults to the literal's
    /// own aliases for LITERAL components, or no suggestions
    /// otherwise).
    pub fn suggestions(mut self, provider: Arc<dyn SuggestionProvider<S>>) -> Self {
        self.suggestion_provider = Some(provider);
        self
    }

    /// Finish building, producing a [`ComponentDescriptor`].
    pub fn build(self) -> ComponentDescriptor<S> {
        let suggestion_provider = self.suggestion_provider.unwrap_or_else(|| match self.kind {
            ComponentKind::Literal => {
                Arc::new(LiteralSuggestionProvider::new(self.aliases.clone())) as Arc<dyn SuggestionProvider<S>>
            }
            _ => Arc::new(NoSuggestions) as Arc<dyn SuggestionProvider<S>>,
        });
        ComponentDescriptor {
            name: self.name,
            kind: self.kind,
            aliases: self.aliases,
            parser: self
                .parser
                .unwrap_or_else(|| panic!("ARGUMENT/FLAG components require a parser")),
            suggestion_provider,
            required: self.required,
            default_value: self.default_value,
        }
    }
}

/// Builds a [`Command`].
pub struct CommandBuilder<S> {
    components: Vec<ComponentDescriptor<S>>,
    flag: Option<ComponentDescriptor<S>>,
    permission: Permission,
    sender_predicate: Option<SenderPredicate<S>>,
    sender_kind_name: Option<String>,
}

impl<S: 'static> CommandBuilder<S> {
    /// Start a new command whose first path component is the LITERAL
    /// `name`.
    pub fn new(name: impl Into<String>) -> Self {
        CommandBuilder {
            components: vec![ComponentBuilder::literal(name).build()],
            flag: None,
            permission: Permission::named("command.default"),
            sender_predicate: None,
            sender_kind_name: None,
        }
    }

    /// Append a component to the command's path.
    pub fn component(mut self, descriptor: ComponentDescriptor<S>) -> Self {
        self.components.push(descriptor);
        self
    }

    /// Set the command's flag group.
    pub fn flag(mut self, descriptor: ComponentDescriptor<S>) -> Self {
        self.flag = Some(descriptor);
        self
    }

    /// Set the permission required to execute this command.
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Restrict this command to senders matching `predicate`, naming
    /// the requirement as `kind_name` for error messages.
    pub fn requires_sender(
        mut self,
        kind_name: impl Into<String>,
        predicate: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.sender_predicate = Some(Arc::new(predicate));
        self.sender_kind_name = Some(kind_name.into());
        self
    }

    /// Finish building, producing a [`Command`] with the given
    /// handler.
    pub fn handler(self, handler: impl Fn(&S) + Send + Sync + 'static) -> Command<S> {
        Command {
            components: self
                .components
                .into_iter()
                .map(descriptor_into_component)
                .collect(),
            flag: self.flag.map(descriptor_into_component),
            permission: self.permission,
            sender_predicate: self.sender_predicate,
            sender_kind_name: self.sender_kind_name,
            handler: Arc::new(handler),
        }
    }
}

fn descriptor_into_component<S>(d: ComponentDescriptor<S>) -> crate::node::CommandComponent<S> {
    crate::node::CommandComponent::for_tree(
        d.name,
        d.kind,
        d.aliases,
        d.parser,
        d.suggestion_provider,
        d.required,
        d.default_value,
    )
}
