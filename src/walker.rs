// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Tree Walker
//!
//! `parse` resolves an input line to a `Command` by walking the trie
//! component by component, backtracking across sibling failures but
//! surfacing a real error once a branch has been committed to (§4.6,
//! §4.7).

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::trace;

use crate::command::Command;
use crate::component::{ParseOutcome, ParsedValue};
use crate::context::ParseContext;
use crate::error::{ArgumentError, ParseError};
use crate::input::CommandInput;
use crate::insert::find_missing_permission;
use crate::node::{CommandNode, ComponentKind, DefaultValue};
use crate::registry::DispatcherConfig;

/// Entry point: resolve `input` to a `Command` against the tree
/// rooted at `root`.
pub async fn parse<S: Send + Sync>(
    root: &Arc<CommandNode<S>>,
    ctx: &mut ParseContext<S>,
    input: &mut CommandInput,
    config: &DispatcherConfig,
) -> Result<Arc<Command<S>>, ParseError> {
    if root.children().is_empty() {
        return Err(ParseError::NoSuchCommand {
            chain: root.format_chain(),
            token: input.peek_string().to_string(),
        });
    }
    let command = parse_at(root.clone(), ctx, input, config).await?;
    if !command.accepts_sender(&ctx.sender) {
        return Err(ParseError::InvalidCommandSender {
            chain: root.format_chain(),
        });
    }
    Ok(command)
}

/// Resolve the rest of `input` starting at `node` (§4.6).
fn parse_at<'a, S: Send + Sync + 'a>(
    node: Arc<CommandNode<S>>,
    ctx: &'a mut ParseContext<S>,
    input: &'a mut CommandInput,
    config: &'a DispatcherConfig,
) -> BoxFuture<'a, Result<Arc<Command<S>>, ParseError>> {
    Box::pin(async move {
        trace!(chain = %node.format_chain(), "parse_at");

        if let Some(missing) = find_missing_permission(&ctx.sender, &node, &*ctx.authority) {
            return Err(ParseError::NoPermission {
                missing,
                chain: node.format_chain(),
            });
        }

        if let Some(outcome) = attempt_unambiguous_child(node.clone(), ctx, input, config).await {
            return outcome;
        }

        let children = node.children();
        if children.is_empty() {
            return match (node.owning_command(), input.is_empty(true)) {
                (Some(owner), true) => Ok(owner),
                _ => Err(ParseError::InvalidSyntax {
                    chain: node.format_chain(),
                }),
            };
        }

        for child in &children {
            let Some(component) = &child.component else {
                continue;
            };
            if component.kind == ComponentKind::Literal {
                if component.matches_literal(input.peek_string()) {
                    input.read_string();
                    return parse_at(child.clone(), ctx, input, config).await;
                }
                continue;
            }
            let snapshot = input.cursor();
            match component.parser.parse_future(ctx, input).await {
                ParseOutcome::Success(value) => {
                    ctx.store(&component.name, value);
                    return parse_at(child.clone(), ctx, input, config).await;
                }
                ParseOutcome::Failure(_) => {
                    input.set_cursor(snapshot);
                }
            }
        }

        if node.is_root() {
            return Err(ParseError::NoSuchCommand {
                chain: node.format_chain(),
                token: input.peek_string().to_string(),
            });
        }
        match (node.owning_command(), input.is_empty(true)) {
            (Some(owner), true) => {
                if owner.permission.is_granted(&ctx.sender, &*ctx.authority) {
                    Ok(owner)
                } else {
                    Err(ParseError::NoPermission {
                        missing: owner.permission.clone(),
                        chain: node.format_chain(),
                    })
                }
            }
            _ => Err(ParseError::InvalidSyntax {
                chain: node.format_chain(),
            }),
        }
    })
}

/// If `node` has a single unambiguous variable child, resolve through
/// it directly (§4.7). Returns `None` ("no fast branch") when the
/// caller should fall back to the ordinary sibling scan.
fn attempt_unambiguous_child<'a, S: Send + Sync + 'a>(
    node: Arc<CommandNode<S>>,
    ctx: &'a mut ParseContext<S>,
    input: &'a mut CommandInput,
    config: &'a DispatcherConfig,
) -> BoxFuture<'a, Option<Result<Arc<Command<S>>, ParseError>>> {
    Box::pin(async move {
        let children = node.children();
        let peek = input.peek_string();
        if !peek.is_empty()
            && children.iter().any(|c| {
                c.component
                    .as_ref()
                    .is_some_and(|comp| comp.kind == ComponentKind::Literal && comp.matches_literal(peek))
            })
        {
            return None;
        }

        let variable_children: Vec<_> = children
            .iter()
            .filter(|c| c.component.as_ref().is_some_and(|comp| comp.kind != ComponentKind::Literal))
            .cloned()
            .collect();
        if variable_children.is_empty() {
            return None;
        }
        if variable_children.len() > 1 {
            return Some(Err(ParseError::AmbiguousChildren {
                chain: node.format_chain(),
            }));
        }
        let child = variable_children[0].clone();
        let component = child.component.as_ref().expect("variable child has a component");

        if !input.is_empty(true) {
            if let Some(missing) = find_missing_permission(&ctx.sender, &child, &*ctx.authority) {
                return Some(Err(ParseError::NoPermission {
                    missing,
                    chain: child.format_chain(),
                }));
            }
        }

        if input.is_empty(true) && component.kind != ComponentKind::Flag {
            if let Some(default) = &component.default_value {
                match default {
                    DefaultValue::Parsed(text, _) => {
                        input.append_string(text);
                        return attempt_unambiguous_child(node, ctx, input, config).await;
                    }
                    DefaultValue::Constant(value) => {
                        let value = value.clone();
                        let name = component.name.clone();
                        ctx.store(&name, value);
                        return Some(resolve_or_descend(child, ctx, input, config).await);
                    }
                }
            } else if !component.required {
                let mut current = child.clone();
                loop {
                    if let Some(owner) = current.owning_command() {
                        return Some(Ok(owner));
                    }
                    let kids = current.children();
                    match kids.len() {
                        1 => current = kids.into_iter().next().unwrap(),
                        _ => {
                            return Some(Err(ParseError::InvalidSyntax {
                                chain: current.format_chain(),
                            }))
                        }
                    }
                }
            } else {
                // Required, no default, no input: whether `child` is a
                // leaf or not, the only candidate is the parent's own
                // owning command (§4.7).
                Some(resolve_parent_owner(&node, ctx))
            }
        } else {
            let value = match parse_argument(ctx, &child, input).await {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            ctx.store(&component.name, value);
            if child.is_leaf() {
                return Some(if input.is_empty(true) {
                    // A flag parser that found its marker absent
                    // succeeds without consuming input and without
                    // owning a command itself — the command it
                    // completes is the one owned by the node it grafts
                    // onto (§4.3's flag-grafting).
                    match child.owning_command() {
                        Some(owner) => Ok(owner),
                        None => resolve_parent_owner(&node, ctx),
                    }
                } else {
                    Err(ParseError::InvalidSyntax {
                        chain: child.format_chain(),
                    })
                });
            }
            return Some(parse_at(child, ctx, input, config).await);
        }
    })
}

/// A required variable child with no input left: succeed with the
/// parent's owning command if the sender is permitted, else fail.
fn resolve_parent_owner<S>(node: &Arc<CommandNode<S>>, ctx: &ParseContext<S>) -> Result<Arc<Command<S>>, ParseError> {
    match node.owning_command() {
        Some(owner) => {
            if owner.permission.is_granted(&ctx.sender, &*ctx.authority) {
                Ok(owner)
            } else {
                Err(ParseError::NoPermission {
                    missing: owner.permission.clone(),
                    chain: node.format_chain(),
                })
            }
        }
        None => Err(ParseError::InvalidSyntax {
            chain: node.format_chain(),
        }),
    }
}

/// After resolving a `Constant` default with no remaining input:
/// succeed here if `child` is a leaf, otherwise keep walking.
async fn resolve_or_descend<S: Send + Sync>(
    child: Arc<CommandNode<S>>,
    ctx: &mut ParseContext<S>,
    input: &mut CommandInput,
    config: &DispatcherConfig,
) -> Result<Arc<Command<S>>, ParseError> {
    if child.is_leaf() {
        child.owning_command().ok_or_else(|| ParseError::InvalidSyntax {
            chain: child.format_chain(),
        })
    } else {
        parse_at(child, ctx, input, config).await
    }
}

/// `preprocess` + `parse_future`, converting any failure into a
/// surfaced `ArgumentParseException` rather than a silent one (§4.5,
/// §4.7).
async fn parse_argument<S>(
    ctx: &mut ParseContext<S>,
    child: &Arc<CommandNode<S>>,
    input: &mut CommandInput,
) -> Result<ParsedValue, ParseError> {
    let component = child.component.as_ref().expect("child has a component");
    ctx.current_component = Some(component.name.clone());

    let allowed = {
        let ctx_ref: &ParseContext<S> = &*ctx;
        let input_ref: &CommandInput = &*input;
        component.parser.preprocess(ctx_ref, input_ref).await
    };
    match allowed {
        Ok(true) => {}
        Ok(false) => {
            return Err(ParseError::ArgumentParseException {
                chain: child.format_chain(),
                source: ArgumentError::new("preprocess rejected the remaining input"),
            })
        }
        Err(source) => {
            return Err(ParseError::ArgumentParseException {
                chain: child.format_chain(),
                source,
            })
        }
    }

    match component.parser.parse_future(ctx, input).await {
        ParseOutcome::Success(value) => Ok(value),
        ParseOutcome::Failure(source) => Err(ParseError::ArgumentParseException {
            chain: child.format_chain(),
            source,
        }),
    }
}
