// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Component Parsers
//!
//! The tree never knows what a component's argument *type* is; it
//! only knows it can hand an input cursor to a [`ComponentParser`]
//! and get either a boxed value back or a failure. `AggregateCommandParser`
//! and `CommandFlagParser` are recognized by capability test (see
//! [`ComponentParser::as_aggregate`] and [`ComponentParser::as_flag`])
//! rather than by downcasting a trait object, since the walker only
//! ever holds `&dyn ComponentParser<S>`.

use std::any::Any;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::ParserContext;
use crate::error::ArgumentError;
use crate::input::CommandInput;
use crate::node::CommandComponent;

/// A successfully parsed argument value, type-erased. Stored in the
/// `ParseContext`'s value map under the owning component's name.
pub type ParsedValue = Arc<dyn Any + Send + Sync>;

/// Helper to box a concrete value as a [`ParsedValue`].
pub fn boxed_value<T: Any + Send + Sync>(value: T) -> ParsedValue {
    Arc::new(value)
}

/// The outcome of a single `parse_future` call.
pub enum ParseOutcome {
    /// The parser consumed a prefix of the input and produced a
    /// value.
    Success(ParsedValue),
    /// The parser could not make progress. During speculative
    /// sibling scanning this is absorbed silently; on a committed
    /// unambiguous branch it is surfaced as `ParseError::ArgumentParseException`.
    Failure(ArgumentError),
}

impl ParseOutcome {
    /// Shorthand for a successful parse of a concrete value.
    pub fn success<T: Any + Send + Sync>(value: T) -> Self {
        ParseOutcome::Success(boxed_value(value))
    }

    /// Shorthand for a failed parse with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        ParseOutcome::Failure(ArgumentError::new(message))
    }
}

/// The capability a tree component needs in order to consume input.
///
/// Implementations are external to the tree; this crate ships a
/// handful of reference parsers (see [`crate::parsers`]) used by its
/// own tests.
pub trait ComponentParser<S>: Send + Sync {
    /// Parse a prefix of `input`, advancing its cursor on success.
    ///
    /// On failure, the parser should either leave the cursor
    /// unchanged or rely on the caller to restore a snapshot taken
    /// before the call — the walker always does the latter.
    fn parse_future<'a>(
        &'a self,
        ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome>;

    /// A cheap gating check, run before `parse_future`. Returning
    /// `Ok(false)` (or an error) skips the parse attempt entirely.
    /// Reused verbatim by the suggester (§4.9), so it is driven by
    /// whichever context — parse or suggestion — is live.
    fn preprocess<'a>(
        &'a self,
        _ctx: &'a dyn ParserContext<S>,
        _input: &'a CommandInput,
    ) -> BoxFuture<'a, Result<bool, ArgumentError>> {
        Box::pin(async { Ok(true) })
    }

    /// How many whitespace tokens this parser will consume. Used by
    /// the suggester to decide when to pre-consume tokens for
    /// contextual suggestion providers. Aggregates override this to
    /// their sub-component count.
    fn requested_argument_count(&self) -> usize {
        1
    }

    /// If this parser is an [`AggregateCommandParser`], return it as
    /// one. Used by the walker/suggester as a capability test.
    fn as_aggregate(&self) -> Option<&dyn AggregateCommandParser<S>> {
        None
    }

    /// If this parser is a [`CommandFlagParser`], return it as one.
    fn as_flag(&self) -> Option<&dyn CommandFlagParser<S>> {
        None
    }
}

/// A parser that decomposes into an ordered list of sub-components,
/// each consuming its own token(s) and recorded under its own name.
pub trait AggregateCommandParser<S>: ComponentParser<S> {
    /// The sub-components making up this aggregate, in parse order.
    fn sub_components(&self) -> &[CommandComponent<S>];
}

/// A parser for `-x value` / `--long value` style flags, which may
/// appear anywhere within their subtree rather than at a fixed
/// position.
pub trait CommandFlagParser<S>: ComponentParser<S> {
    /// Identify the flag currently being typed, if any, for
    /// suggestion purposes (e.g. `"-x"` while the user is mid-token).
    fn parse_current_flag(&self, ctx: &dyn ParserContext<S>, input: &CommandInput) -> Option<String>;
}

/// Produces completion candidates for a component given a partial
/// token.
pub trait SuggestionProvider<S>: Send + Sync {
    /// Candidate completions for `partial`. The walker filters the
    /// result down to candidates that start with (and are not equal
    /// to) `partial`, so implementations may over-generate.
    fn suggest<'a>(&'a self, ctx: &'a crate::context::SuggestionContext<S>, partial: &'a str) -> BoxFuture<'a, Vec<String>>;
}

/// A [`SuggestionProvider`] that always suggests a fixed literal
/// name. Used for LITERAL components.
pub struct LiteralSuggestionProvider {
    pub(crate) names: Vec<String>,
}

impl LiteralSuggestionProvider {
    /// Build a provider that suggests exactly `names`.
    pub fn new(names: Vec<String>) -> Self {
        LiteralSuggestionProvider { names }
    }
}

impl<S> SuggestionProvider<S> for LiteralSuggestionProvider {
    fn suggest<'a>(
        &'a self,
        _ctx: &'a crate::context::SuggestionContext<S>,
        _partial: &'a str,
    ) -> BoxFuture<'a, Vec<String>> {
        let names = self.names.clone();
        Box::pin(async move { names })
    }
}

/// A [`SuggestionProvider`] that never suggests anything, for
/// arguments with no enumerable domain.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSuggestions;

impl<S> SuggestionProvider<S> for NoSuggestions {
    fn suggest<'a>(
        &'a self,
        _ctx: &'a crate::context::SuggestionContext<S>,
        _partial: &'a str,
    ) -> BoxFuture<'a, Vec<String>> {
        Box::pin(async { Vec::new() })
    }
}

/// The placeholder `ComponentParser` assigned to LITERAL components.
/// The walker never invokes it — a LITERAL is matched directly
/// against its aliases (`CommandComponent::matches_literal`) rather
/// than through the generic parser capability — but every component
/// still needs *a* parser to satisfy `CommandComponent`'s layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralPlaceholderParser;

impl<S> ComponentParser<S> for LiteralPlaceholderParser {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        _input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async { ParseOutcome::failure("LITERAL components are matched directly, not parsed") })
    }
}
