// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Tree Nodes
//!
//! [`CommandNode`] is the trie node; [`CommandComponent`] is the
//! descriptive payload a node carries (or the synthetic root, which
//! carries none).

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::command::Command;
use crate::component::{ComponentParser, SuggestionProvider};
use crate::permission::Permission;

/// What kind of segment a [`CommandComponent`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    /// Matches a fixed set of alias strings.
    Literal,
    /// A typed positional argument.
    Argument,
    /// A `-x value` / `--long value` style flag.
    Flag,
}

/// A default value for an optional component.
pub enum DefaultValue<S> {
    /// Supply this value directly, bypassing the parser entirely.
    Constant(crate::component::ParsedValue),
    /// Re-feed this text through the component's own parser.
    Parsed(String, std::marker::PhantomData<S>),
}

impl<S> Clone for DefaultValue<S> {
    fn clone(&self) -> Self {
        match self {
            DefaultValue::Constant(v) => DefaultValue::Constant(v.clone()),
            DefaultValue::Parsed(text, _) => DefaultValue::Parsed(text.clone(), std::marker::PhantomData),
        }
    }
}

impl<S> DefaultValue<S> {
    /// Build a `Constant` default from a concrete value.
    pub fn constant<T: std::any::Any + Send + Sync>(value: T) -> Self {
        DefaultValue::Constant(crate::component::boxed_value(value))
    }

    /// Build a `Parsed` default from text to re-feed through the
    /// parser.
    pub fn parsed(text: impl Into<String>) -> Self {
        DefaultValue::Parsed(text.into(), std::marker::PhantomData)
    }
}

/// One segment of a command path: a literal keyword, a typed
/// argument, or a flag.
pub struct CommandComponent<S> {
    /// Stable identifier used to store parsed values.
    pub name: String,
    /// Which kind of component this is.
    pub kind: ComponentKind,
    /// Alias strings this component matches. Non-empty for LITERAL;
    /// the first alias is canonical. Mutable because inserting a
    /// second command through the same LITERAL node merges in new
    /// aliases (see `insert::insert_alias`).
    pub(crate) aliases: RwLock<Vec<String>>,
    /// Parses a prefix of the input into a value.
    pub parser: Arc<dyn ComponentParser<S>>,
    /// Produces completion candidates for this component.
    pub suggestion_provider: Arc<dyn SuggestionProvider<S>>,
    /// Whether this component must be supplied; optional components
    /// may be elided at the tail of a command.
    pub required: bool,
    /// The value to use when this component is optional and absent.
    pub default_value: Option<DefaultValue<S>>,
    /// Set exactly once, when this component becomes a command's
    /// terminal during insertion.
    pub(crate) owning_command: RwLock<Option<Arc<Command<S>>>>,
}

impl<S> CommandComponent<S> {
    /// The current alias list (a snapshot; literal matching reads
    /// this directly).
    pub fn aliases(&self) -> Vec<String> {
        self.aliases.read().clone()
    }

    /// The canonical (first) alias, or `name` for non-literal
    /// components.
    pub fn canonical_alias(&self) -> String {
        self.aliases
            .read()
            .first()
            .cloned()
            .unwrap_or_else(|| self.name.clone())
    }

    /// Whether `token` matches one of this component's aliases
    /// (case-sensitive, per §9).
    pub fn matches_literal(&self, token: &str) -> bool {
        self.aliases.read().iter().any(|a| a == token)
    }

    /// The command owning this component as a terminal, if any.
    pub fn owning_command(&self) -> Option<Arc<Command<S>>> {
        self.owning_command.read().clone()
    }
}

/// A node in the command trie. The synthetic root has `component =
/// None`; every other node carries one.
pub struct CommandNode<S> {
    /// This node's component, or `None` only for the root.
    pub component: Option<CommandComponent<S>>,
    /// Children, kept sorted LITERAL-first by `sort_children`.
    pub(crate) children: RwLock<Vec<Arc<CommandNode<S>>>>,
    /// Non-owning back-reference to the parent, used only to build a
    /// chain for error messages and permission aggregation.
    pub(crate) parent: RwLock<Weak<CommandNode<S>>>,
    /// The aggregated permission required to reach this node, cached
    /// by `verify_and_register` (see §4.4). `None` means "not yet
    /// computed" or "root" (the root has no permission requirement).
    pub(crate) permission: RwLock<Option<Permission>>,
}

impl<S> CommandNode<S> {
    /// Construct the synthetic root node.
    pub fn new_root() -> Arc<Self> {
        Arc::new(CommandNode {
            component: None,
            children: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
            permission: RwLock::new(None),
        })
    }

    fn new_child(component: CommandComponent<S>) -> Arc<Self> {
        Arc::new(CommandNode {
            component: Some(component),
            children: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
            permission: RwLock::new(None),
        })
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.component.is_none()
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.read().is_empty()
    }

    /// A snapshot of this node's children, in sorted order.
    pub fn children(&self) -> Vec<Arc<CommandNode<S>>> {
        self.children.read().clone()
    }

    /// This node's parent, if any (the root and any detached node
    /// have none).
    pub fn parent(&self) -> Option<Arc<CommandNode<S>>> {
        self.parent.read().upgrade()
    }

    /// The cached aggregated permission for this node, if computed.
    pub fn cached_permission(&self) -> Option<Permission> {
        self.permission.read().clone()
    }

    /// The command owning this node's component as a terminal, if
    /// any. `None` at the root.
    pub fn owning_command(&self) -> Option<Arc<Command<S>>> {
        self.component.as_ref().and_then(|c| c.owning_command())
    }

    /// Find an existing child matching `component` by the tree's
    /// equality rule: LITERALs match by any overlapping alias;
    /// ARGUMENT/FLAG components match by name and kind.
    pub(crate) fn find_matching_child(
        self: &Arc<Self>,
        kind: ComponentKind,
        name: &str,
        aliases: &[String],
    ) -> Option<Arc<CommandNode<S>>> {
        self.children.read().iter().find(|child| {
            let Some(existing) = &child.component else {
                return false;
            };
            if existing.kind != kind {
                return false;
            }
            match kind {
                ComponentKind::Literal => existing
                    .aliases
                    .read()
                    .iter()
                    .any(|a| aliases.iter().any(|b| a == b)),
                ComponentKind::Argument | ComponentKind::Flag => existing.name == name,
            }
        }).cloned()
    }

    /// Append a new child built from `component`, set its parent
    /// link, and return it.
    pub(crate) fn add_child(self: &Arc<Self>, component: CommandComponent<S>) -> Arc<CommandNode<S>> {
        let child = Self::new_child(component);
        *child.parent.write() = Arc::downgrade(self);
        self.children.write().push(child.clone());
        child
    }

    /// Remove a child by pointer identity.
    pub fn remove_child(self: &Arc<Self>, target: &Arc<CommandNode<S>>) {
        self.children
            .write()
            .retain(|c| !Arc::ptr_eq(c, target));
    }

    /// Reorder children so LITERALs precede non-LITERALs, preserving
    /// relative order within each class (invariant 6).
    pub(crate) fn sort_children(self: &Arc<Self>) {
        self.children.write().sort_by_key(|c| {
            match c.component.as_ref().map(|comp| comp.kind) {
                Some(ComponentKind::Literal) => 0,
                _ => 1,
            }
        });
    }

    /// The root-to-here chain of nodes, root first.
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<CommandNode<S>>> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            current = node.parent();
            chain.push(node);
        }
        chain.reverse();
        chain
    }

    /// A human-readable rendering of the chain to this node, using
    /// each component's canonical alias or `<name>` for arguments.
    pub fn format_chain(self: &Arc<Self>) -> String {
        self.chain()
            .into_iter()
            .filter_map(|n| {
                n.component.as_ref().map(|c| match c.kind {
                    ComponentKind::Literal => c.canonical_alias(),
                    ComponentKind::Argument => format!("<{}>", c.name),
                    ComponentKind::Flag => format!("[{}]", c.name),
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<S> CommandComponent<S> {
    /// Build a fresh `CommandComponent` for grafting onto the tree.
    /// Used by `insert` to construct tree-owned components from a
    /// `Command`'s descriptive components.
    pub(crate) fn for_tree(
        name: String,
        kind: ComponentKind,
        aliases: Vec<String>,
        parser: Arc<dyn ComponentParser<S>>,
        suggestion_provider: Arc<dyn SuggestionProvider<S>>,
        required: bool,
        default_value: Option<DefaultValue<S>>,
    ) -> Self {
        CommandComponent {
            name,
            kind,
            aliases: RwLock::new(aliases),
            parser,
            suggestion_provider,
            required,
            default_value,
            owning_command: RwLock::new(None),
        }
    }
}
