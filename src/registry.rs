// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Command Registry
//!
//! [`CommandRegistry`] owns the tree and is the crate's external
//! entry point: insert commands into it, parse input against it, and
//! ask it for completions.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::command::Command;
use crate::context::{ParseContext, SuggestionContext};
use crate::error::{InsertError, ParseError};
use crate::insert;
use crate::node::CommandNode;
use crate::permission::{AllowAll, PermissionAuthority};
use crate::walker;

/// Tunables that change tree-building and dispatch behavior without
/// touching the algorithms themselves (§7B).
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// When `true`, a command's flag component is grafted as a child
    /// at every node from its last LITERAL onward, rather than only
    /// at the command's terminal node, so the flag can be typed
    /// anywhere after the last fixed keyword.
    pub liberal_flag_parsing: bool,
    /// When `true`, an intermediary node's own `owning_command`
    /// permission replaces (rather than is OR'd into) the aggregated
    /// permission of its descendants.
    pub enforce_intermediary_permissions: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            liberal_flag_parsing: true,
            enforce_intermediary_permissions: false,
        }
    }
}

/// Owns a command trie for sender type `S` and serializes structural
/// mutation behind a single write lock, mirroring the teacher's own
/// `CommandTable`.
pub struct CommandRegistry<S> {
    root: Arc<CommandNode<S>>,
    write_lock: RwLock<()>,
    authority: Arc<dyn PermissionAuthority<S>>,
    config: DispatcherConfig,
    registration_handler: Arc<dyn Fn(Arc<Command<S>>) + Send + Sync>,
    suggestion_processor: Arc<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>,
}

impl<S: Send + Sync + 'static> CommandRegistry<S> {
    /// Build an empty registry that grants every permission to every
    /// sender and does nothing on registration.
    pub fn new() -> Self {
        Self::with_authority(Arc::new(AllowAll))
    }

    /// Build an empty registry consulting `authority` for permission
    /// checks.
    pub fn with_authority(authority: Arc<dyn PermissionAuthority<S>>) -> Self {
        CommandRegistry {
            root: CommandNode::new_root(),
            write_lock: RwLock::new(()),
            authority,
            config: DispatcherConfig::default(),
            registration_handler: Arc::new(|_| {}),
            suggestion_processor: Arc::new(default_suggestion_processor),
        }
    }

    /// Override the dispatcher configuration (§7B).
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a callback invoked with every leaf's owning command
    /// each time the tree is successfully verified (see
    /// `insert::verify_and_register`).
    pub fn with_registration_handler(
        mut self,
        handler: impl Fn(Arc<Command<S>>) + Send + Sync + 'static,
    ) -> Self {
        self.registration_handler = Arc::new(handler);
        self
    }

    /// Override the suggestion processor consulted by `suggest` to
    /// post-process the raw candidate set collected by the walker
    /// (§6's `suggestion_processor` consumed capability). Defaults to
    /// sorting and deduplicating.
    pub fn with_suggestion_processor(
        mut self,
        processor: impl Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.suggestion_processor = Arc::new(processor);
        self
    }

    /// Insert `command` into the tree. Serialized against concurrent
    /// insertions; readers (`parse`/`suggest`) are not blocked by it
    /// except while a single node's children are being read or
    /// written (§5).
    pub fn insert_command(&self, command: Command<S>) -> Result<Arc<Command<S>>, InsertError> {
        let _guard = self.write_lock.write();
        let handler = self.registration_handler.clone();
        let result = insert::insert_command(&self.root, command, &self.config, &move |owner| {
            handler(owner)
        });
        if let Ok(owner) = &result {
            info!(chain = %owner.components.iter().map(|c| c.canonical_alias()).collect::<Vec<_>>().join(" "), "command registered");
        }
        result
    }

    /// Parse `line` against the tree on behalf of `sender`. On
    /// success, returns the resolved command alongside the context
    /// holding its parsed argument values; the caller is responsible
    /// for invoking the command's handler.
    pub async fn parse(&self, line: &str, sender: S) -> Result<(Arc<Command<S>>, ParseContext<S>), ParseError> {
        let mut ctx = ParseContext::new(sender, self.authority.clone());
        let mut input = crate::input::CommandInput::new(line);
        let command = walker::parse(&self.root, &mut ctx, &mut input, &self.config).await?;
        Ok((command, ctx))
    }

    /// Compute completion candidates for `line` on behalf of `sender`,
    /// running the walker's raw output through the suggestion
    /// processor (see `with_suggestion_processor`).
    pub async fn suggest(&self, line: &str, sender: S) -> Vec<String> {
        let mut ctx = SuggestionContext::new(sender, self.authority.clone());
        let mut input = crate::input::CommandInput::new(line);
        let raw = crate::suggest::suggest(&self.root, &mut ctx, &mut input, &self.config).await;
        (self.suggestion_processor)(raw)
    }

    /// The top-level (LITERAL) nodes directly under the root.
    pub fn root_nodes(&self) -> Vec<Arc<CommandNode<S>>> {
        self.root.children()
    }

    /// Find a direct child of the root matching `name`, case-insensitively
    /// (unlike LITERAL matching during `parse`/`suggest`, which is exact;
    /// see §9).
    pub fn named_node(&self, name: &str) -> Option<Arc<CommandNode<S>>> {
        self.root.children().into_iter().find(|n| {
            n.component
                .as_ref()
                .is_some_and(|c| c.aliases().iter().any(|a| a.eq_ignore_ascii_case(name)))
        })
    }

    /// Remove `node` (and its whole subtree), invoking `on_command`
    /// for every owning command encountered in the removed subtree,
    /// then re-run verification and permission recomputation over
    /// what remains. `is_root` tells the caller's intent apart from a
    /// structural check: pass `true` to clear every child of `node`
    /// in place (used when `node` is the tree's own root, which has
    /// no parent to detach from); `false` detaches `node` from its
    /// parent.
    pub fn delete_recursively(
        &self,
        node: &Arc<CommandNode<S>>,
        is_root: bool,
        on_command: impl Fn(Arc<Command<S>>),
    ) -> Result<(), InsertError> {
        let _guard = self.write_lock.write();
        for owner in insert::collect_owning_commands(node) {
            on_command(owner);
        }
        if is_root {
            for child in node.children() {
                node.remove_child(&child);
            }
        } else if let Some(parent) = node.parent() {
            parent.remove_child(node);
        }
        let handler = self.registration_handler.clone();
        insert::verify_and_register(&self.root, &self.config, &move |owner| handler(owner))
    }
}

impl<S: Send + Sync + 'static> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn default_suggestion_processor(mut suggestions: Vec<String>) -> Vec<String> {
    suggestions.sort();
    suggestions.dedup();
    suggestions
}
