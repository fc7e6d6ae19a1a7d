// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Suggester
//!
//! `suggest` speculatively descends the trie alongside the input,
//! producing completion candidates from literal aliases, typed
//! parsers, flag parsers, and aggregate parsers (§4.8, §4.9). The raw,
//! unprocessed suggestion set is returned; `CommandRegistry::suggest`
//! runs it through the injected suggestion processor.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::{SuggestionContext, FLAG_META_KEY};
use crate::input::CommandInput;
use crate::insert::find_missing_permission;
use crate::node::{CommandNode, ComponentKind};
use crate::registry::DispatcherConfig;

/// Entry point: collect raw completion candidates for `input` against
/// the tree rooted at `root`. The caller (`CommandRegistry::suggest`)
/// is responsible for running the result through its suggestion
/// processor.
pub async fn suggest<S: Send + Sync>(
    root: &Arc<CommandNode<S>>,
    ctx: &mut SuggestionContext<S>,
    input: &mut CommandInput,
    config: &DispatcherConfig,
) -> Vec<String> {
    suggest_at(root.clone(), ctx, input, config).await;
    ctx.suggestions.clone()
}

fn suggest_at<'a, S: Send + Sync + 'a>(
    node: Arc<CommandNode<S>>,
    ctx: &'a mut SuggestionContext<S>,
    input: &'a mut CommandInput,
    config: &'a DispatcherConfig,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if find_missing_permission(&ctx.sender, &node, &*ctx.authority).is_some() {
            return;
        }

        let children = node.children();
        let literal_children: Vec<_> = children
            .iter()
            .filter(|c| c.component.as_ref().is_some_and(|comp| comp.kind == ComponentKind::Literal))
            .cloned()
            .collect();
        let dynamic_children: Vec<_> = children
            .iter()
            .filter(|c| c.component.as_ref().is_some_and(|comp| comp.kind != ComponentKind::Literal))
            .cloned()
            .collect();

        let peek = input.peek_string().to_string();
        if !peek.is_empty() && input.effective_remaining_tokens() > 1 {
            if let Some(literal_child) = literal_children
                .iter()
                .find(|c| c.component.as_ref().is_some_and(|comp| comp.matches_literal(&peek)))
            {
                input.read_string();
                suggest_at(literal_child.clone(), ctx, input, config).await;
                return;
            }
        }

        if input.effective_remaining_tokens() <= 1 {
            let peek = input.peek_string().to_string();
            for child in &literal_children {
                let component = child.component.as_ref().expect("literal child has a component");
                let candidates = component.suggestion_provider.suggest(ctx, &peek).await;
                extend_filtered(ctx, candidates, &peek);
            }
        }

        for child in &dynamic_children {
            dynamic_suggest(child.clone(), ctx, input, config).await;
        }
    })
}

/// Completion handling for a single non-LITERAL child (§4.9).
async fn dynamic_suggest<S: Send + Sync>(
    child: Arc<CommandNode<S>>,
    ctx: &mut SuggestionContext<S>,
    input: &mut CommandInput,
    config: &DispatcherConfig,
) {
    let component = child.component.as_ref().expect("dynamic child has a component");
    let parser = component.parser.clone();

    if let Some(aggregate) = parser.as_aggregate() {
        if input.effective_remaining_tokens() <= parser.requested_argument_count() {
            let subs = aggregate.sub_components();
            if !subs.is_empty() {
                for sub in &subs[..subs.len() - 1] {
                    let token = input.read_string();
                    ctx.store_token(&sub.name, &token);
                }
            }
        }
    } else if let Some(flag_parser) = parser.as_flag() {
        match flag_parser.parse_current_flag(ctx, input) {
            Some(flag) => ctx.store_token(FLAG_META_KEY, &flag),
            None => ctx.remove(FLAG_META_KEY),
        }
    } else if input.effective_remaining_tokens() <= parser.requested_argument_count() {
        let n = parser.requested_argument_count();
        for i in 0..n.saturating_sub(1) {
            let token = input.read_string();
            ctx.store_token(&format!("{}_{}", component.name, i), &token);
        }
    }

    let followed_flag_children = component.kind == ComponentKind::Flag
        && !child.children().is_empty()
        && !input.peek_string().starts_with('-')
        && ctx.current_flag().is_none();

    if input.is_empty(true) {
        if followed_flag_children {
            suggest_at(child, ctx, input, config).await;
        }
        return;
    }

    if input.effective_remaining_tokens() == 1 {
        suggest_for(ctx, &child, input.peek_string()).await;
        if followed_flag_children {
            suggest_at(child, ctx, input, config).await;
        }
        return;
    }

    if child.is_leaf() && parser.as_aggregate().is_some() {
        let last = input.last_remaining_token().to_string();
        suggest_for(ctx, &child, &last).await;
        return;
    }

    let snapshot = input.cursor();
    let allowed = {
        let ctx_ref: &SuggestionContext<S> = &*ctx;
        let input_ref: &CommandInput = &*input;
        parser.preprocess(ctx_ref, input_ref).await
    };
    if matches!(allowed, Ok(false)) && input.effective_remaining_tokens() > 1 {
        return;
    }

    let outcome = parser.parse_future(ctx, input).await;
    match outcome {
        crate::component::ParseOutcome::Success(value) => {
            if !input.is_empty(true) {
                ctx.store(&component.name, value);
                suggest_at(child, ctx, input, config).await;
            } else {
                input.set_cursor(snapshot);
                let remaining = input.remaining_input().trim().to_string();
                suggest_for(ctx, &child, &remaining).await;
            }
        }
        crate::component::ParseOutcome::Failure(_) => {
            input.set_cursor(snapshot);
            if input.effective_remaining_tokens() > 1 {
                return;
            }
            suggest_for(ctx, &child, input.peek_string()).await;
        }
    }
}

async fn suggest_for<S: Send + Sync>(ctx: &mut SuggestionContext<S>, node: &Arc<CommandNode<S>>, partial: &str) {
    let Some(component) = &node.component else {
        return;
    };
    let partial = partial.to_string();
    let candidates = component.suggestion_provider.suggest(ctx, &partial).await;
    extend_filtered(ctx, candidates, &partial);
}

fn extend_filtered<S>(ctx: &mut SuggestionContext<S>, candidates: Vec<String>, current_text: &str) {
    ctx.suggestions.extend(
        candidates
            .into_iter()
            .filter(|s| s.starts_with(current_text) && s != current_text),
    );
}
