// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Insertion and Verification
//!
//! Grafting a [`Command`] onto the trie (§4.3), then verifying the
//! whole-tree invariants and recomputing cached permissions (§4.4).
//! `insert_command` is atomic: if verification fails, every mutation
//! made while grafting this command is undone before the error is
//! returned.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::InsertError;
use crate::node::{CommandComponent, CommandNode, ComponentKind};
use crate::permission::Permission;
use crate::registry::DispatcherConfig;

/// A freshly created `(parent, child)` edge.
type CreatedEdge<S> = (Arc<CommandNode<S>>, Arc<CommandNode<S>>);

/// Records what `graft` did, so a failed verification can be undone.
struct InsertJournal<S> {
    /// `(parent, child)` pairs freshly created and appended.
    created: Vec<CreatedEdge<S>>,
    /// `(node, original_len)` for LITERAL nodes whose alias list we
    /// appended to.
    alias_merges: Vec<(Arc<CommandNode<S>>, usize)>,
    /// The terminal node, if we set its `owning_command`.
    terminal: Option<Arc<CommandNode<S>>>,
}

impl<S> InsertJournal<S> {
    fn new() -> Self {
        InsertJournal {
            created: Vec::new(),
            alias_merges: Vec::new(),
            terminal: None,
        }
    }

    fn rollback(self) {
        for (parent, child) in self.created.into_iter().rev() {
            parent.remove_child(&child);
        }
        for (node, original_len) in self.alias_merges {
            if let Some(component) = &node.component {
                component.aliases.write().truncate(original_len);
            }
        }
        if let Some(terminal) = self.terminal {
            if let Some(component) = &terminal.component {
                *component.owning_command.write() = None;
            }
        }
    }
}

fn find_or_create_child<S>(
    journal: &mut InsertJournal<S>,
    current: &Arc<CommandNode<S>>,
    comp: &CommandComponent<S>,
) -> Arc<CommandNode<S>> {
    let aliases = comp.aliases();
    match current.find_matching_child(comp.kind, &comp.name, &aliases) {
        Some(existing) => {
            if comp.kind == ComponentKind::Literal {
                if let Some(existing_component) = &existing.component {
                    let mut guard = existing_component.aliases.write();
                    let original_len = guard.len();
                    for alias in &aliases {
                        if !guard.contains(alias) {
                            guard.push(alias.clone());
                        }
                    }
                    if guard.len() != original_len {
                        drop(guard);
                        journal.alias_merges.push((existing.clone(), original_len));
                    }
                }
            }
            existing
        }
        None => {
            let fresh = CommandComponent::for_tree(
                comp.name.clone(),
                comp.kind,
                aliases,
                comp.parser.clone(),
                comp.suggestion_provider.clone(),
                comp.required,
                comp.default_value.clone(),
            );
            let child = current.add_child(fresh);
            journal.created.push((current.clone(), child.clone()));
            child
        }
    }
}

/// Graft `cmd` onto the tree rooted at `root`, then verify and
/// register. On failure, every mutation made by this call is undone.
pub fn insert_command<S>(
    root: &Arc<CommandNode<S>>,
    cmd: Command<S>,
    config: &DispatcherConfig,
    registration_handler: &dyn Fn(Arc<Command<S>>),
) -> Result<Arc<Command<S>>, InsertError> {
    if cmd.components.is_empty() || cmd.components[0].kind != ComponentKind::Literal {
        let name = cmd
            .components
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "<empty command>".to_string());
        return Err(InsertError::TopLevelVariable { name });
    }

    let flag_start_index = if config.liberal_flag_parsing {
        cmd.components
            .iter()
            .rposition(|c| c.kind == ComponentKind::Literal)
            .unwrap_or(cmd.components.len() - 1)
    } else {
        cmd.components.len() - 1
    };

    let mut journal = InsertJournal::new();
    let cmd = Arc::new(cmd);

    let mut current = root.clone();
    for (i, comp) in cmd.components.iter().enumerate() {
        let node = find_or_create_child(&mut journal, &current, comp);
        current.sort_children();
        if let Some(flag) = &cmd.flag {
            if i >= flag_start_index {
                let _ = find_or_create_child(&mut journal, &node, flag);
                node.sort_children();
            }
        }
        current = node;
    }

    let terminal = current;
    {
        let component = terminal
            .component
            .as_ref()
            .expect("terminal node always has a component");
        let mut guard = component.owning_command.write();
        if guard.is_some() {
            journal.rollback();
            return Err(InsertError::DuplicateCommand {
                chain: terminal.format_chain(),
            });
        }
        *guard = Some(cmd.clone());
    }
    journal.terminal = Some(terminal.clone());

    debug!(chain = %terminal.format_chain(), "grafted command onto tree");

    match verify_and_register(root, config, registration_handler) {
        Ok(()) => Ok(cmd),
        Err(e) => {
            warn!(error = %e, "insertion violated an invariant, rolling back");
            journal.rollback();
            Err(e)
        }
    }
}

/// Enforce the ambiguity and leaf invariants over the whole tree,
/// register every leaf's owning command, and recompute cached
/// permissions. Does not mutate tree shape, only `owning_command`
/// reads and the `permission` cache.
pub fn verify_and_register<S>(
    root: &Arc<CommandNode<S>>,
    config: &DispatcherConfig,
    registration_handler: &dyn Fn(Arc<Command<S>>),
) -> Result<(), InsertError> {
    for child in root.children() {
        if child.component.as_ref().map(|c| c.kind) != Some(ComponentKind::Literal) {
            return Err(InsertError::TopLevelVariable {
                name: child
                    .component
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
            });
        }
    }

    check_ambiguity(root)?;

    let mut leaves = Vec::new();
    collect_leaves(root, &mut leaves);
    for leaf in &leaves {
        match leaf.owning_command() {
            Some(owner) => registration_handler(owner),
            None => {
                // A FLAG leaf grafted onto an already-owned node (§4.3)
                // never owns a command of its own — when its marker
                // isn't typed it resolves to the nearest ancestor's
                // owning command instead (§4.7). Invariant 3 is
                // satisfied as long as that ancestor exists.
                let is_flag = leaf.component.as_ref().map(|c| c.kind) == Some(ComponentKind::Flag);
                if !is_flag || !has_owning_ancestor(leaf) {
                    return Err(InsertError::NoCommandInLeaf {
                        chain: leaf.format_chain(),
                    });
                }
            }
        }
    }

    recompute_permissions(root, &leaves, config);
    Ok(())
}

fn has_owning_ancestor<S>(node: &Arc<CommandNode<S>>) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.owning_command().is_some() {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

fn check_ambiguity<S>(node: &Arc<CommandNode<S>>) -> Result<(), InsertError> {
    let children = node.children();
    let non_literal_count = children
        .iter()
        .filter(|c| c.component.as_ref().map(|comp| comp.kind) != Some(ComponentKind::Literal))
        .count();
    if non_literal_count > 1 {
        return Err(InsertError::AmbiguousNode {
            chain: node.format_chain(),
            detail: "more than one variable child".to_string(),
        });
    }

    for i in 0..children.len() {
        let Some(a) = &children[i].component else {
            continue;
        };
        if a.kind != ComponentKind::Literal {
            continue;
        }
        for sibling in &children[i + 1..] {
            let Some(b) = &sibling.component else {
                continue;
            };
            if b.kind != ComponentKind::Literal {
                continue;
            }
            let a_aliases = a.aliases();
            if b.aliases().iter().any(|alias| a_aliases.contains(alias)) {
                return Err(InsertError::AmbiguousNode {
                    chain: node.format_chain(),
                    detail: format!(
                        "literal siblings `{}` and `{}` share an alias",
                        a.canonical_alias(),
                        b.canonical_alias()
                    ),
                });
            }
        }
    }

    for child in &children {
        check_ambiguity(child)?;
    }
    Ok(())
}

/// Every owning command found in `node`'s subtree, `node` included
/// (an intermediary node may own a command just as a leaf can).
pub fn collect_owning_commands<S>(node: &Arc<CommandNode<S>>) -> Vec<Arc<Command<S>>> {
    let mut out = Vec::new();
    collect_owning_commands_into(node, &mut out);
    out
}

fn collect_owning_commands_into<S>(node: &Arc<CommandNode<S>>, out: &mut Vec<Arc<Command<S>>>) {
    if let Some(owner) = node.owning_command() {
        out.push(owner);
    }
    for child in node.children() {
        collect_owning_commands_into(&child, out);
    }
}

fn collect_leaves<S>(node: &Arc<CommandNode<S>>, out: &mut Vec<Arc<CommandNode<S>>>) {
    let children = node.children();
    if children.is_empty() {
        if !node.is_root() {
            out.push(node.clone());
        }
        return;
    }
    for child in children {
        collect_leaves(&child, out);
    }
}

fn reset_permissions<S>(node: &Arc<CommandNode<S>>) {
    *node.permission.write() = None;
    for child in node.children() {
        reset_permissions(&child);
    }
}

fn recompute_permissions<S>(root: &Arc<CommandNode<S>>, leaves: &[Arc<CommandNode<S>>], config: &DispatcherConfig) {
    reset_permissions(root);
    for leaf in leaves {
        let Some(owner) = leaf.owning_command() else {
            continue;
        };
        let p = owner.permission.clone();
        *leaf.permission.write() = Some(p.clone());

        let mut current = leaf.parent();
        while let Some(ancestor) = current {
            let existing = ancestor.permission.read().clone();
            let mut merged = match existing {
                Some(e) => Permission::any_of(p.clone(), e),
                None => p.clone(),
            };
            if let Some(owner) = ancestor.owning_command() {
                merged = if config.enforce_intermediary_permissions {
                    owner.permission.clone()
                } else {
                    Permission::any_of(merged, owner.permission.clone())
                };
            }
            *ancestor.permission.write() = Some(merged);
            current = ancestor.parent();
        }
    }
}

/// Find the permission, if any, that blocks `sender` from proceeding
/// past `node` (§4.4). Returns `None` if the sender may proceed.
pub fn find_missing_permission<S>(
    sender: &S,
    node: &Arc<CommandNode<S>>,
    authority: &dyn crate::permission::PermissionAuthority<S>,
) -> Option<Permission> {
    if let Some(p) = node.cached_permission() {
        return if p.is_granted(sender, authority) {
            None
        } else {
            Some(p)
        };
    }
    if node.is_leaf() {
        return node
            .owning_command()
            .and_then(|owner| {
                if owner.permission.is_granted(sender, authority) {
                    None
                } else {
                    Some(owner.permission.clone())
                }
            });
    }
    let mut missing = Vec::new();
    for child in node.children() {
        match find_missing_permission(sender, &child, authority) {
            None => return None,
            Some(p) => missing.push(p),
        }
    }
    missing.into_iter().reduce(Permission::any_of)
}
