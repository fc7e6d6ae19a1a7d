// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Reference Parsers
//!
//! A handful of concrete `ComponentParser` implementations, used by
//! this crate's own tests and doctests. Individual component parsers
//! are otherwise external collaborators; nothing in `insert`,
//! `walker`, or `suggest` depends on these specifically.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::component::{AggregateCommandParser, CommandFlagParser, ComponentParser, NoSuggestions, ParseOutcome, SuggestionProvider};
use crate::context::ParserContext;
use crate::input::CommandInput;
use crate::node::{CommandComponent, ComponentKind};

/// Parses a single whitespace-delimited token as an owned `String`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringParser;

impl<S> ComponentParser<S> for StringParser {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async move {
            if input.is_empty(true) {
                return ParseOutcome::failure("expected a value, found nothing");
            }
            ParseOutcome::success(input.read_string())
        })
    }
}

/// Parses a single token as an `i64` within an inclusive range.
#[derive(Clone, Copy, Debug)]
pub struct BoundedIntParser {
    /// Inclusive lower bound.
    pub min: i64,
    /// Inclusive upper bound.
    pub max: i64,
}

impl BoundedIntParser {
    /// Build a parser accepting any `i64`.
    pub fn unbounded() -> Self {
        BoundedIntParser {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    /// Build a parser accepting `min..=max`.
    pub fn ranged(min: i64, max: i64) -> Self {
        BoundedIntParser { min, max }
    }
}

impl<S> ComponentParser<S> for BoundedIntParser {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async move {
            if input.is_empty(true) {
                return ParseOutcome::failure("expected an integer, found nothing");
            }
            let snapshot = input.cursor();
            let token = input.read_string();
            match token.parse::<i64>() {
                Ok(value) if value >= self.min && value <= self.max => ParseOutcome::success(value),
                Ok(value) => {
                    input.set_cursor(snapshot);
                    ParseOutcome::failure(format!(
                        "{value} is out of range {}..={}",
                        self.min, self.max
                    ))
                }
                Err(_) => {
                    input.set_cursor(snapshot);
                    ParseOutcome::failure(format!("`{token}` is not an integer"))
                }
            }
        })
    }
}

/// Parses a single token as a `bool` (`true`/`false`, case-insensitive).
#[derive(Clone, Copy, Debug, Default)]
pub struct BoolParser;

impl<S> ComponentParser<S> for BoolParser {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async move {
            if input.is_empty(true) {
                return ParseOutcome::failure("expected true/false, found nothing");
            }
            let snapshot = input.cursor();
            let token = input.read_string();
            match token.to_ascii_lowercase().as_str() {
                "true" => ParseOutcome::success(true),
                "false" => ParseOutcome::success(false),
                _ => {
                    input.set_cursor(snapshot);
                    ParseOutcome::failure(format!("`{token}` is not true/false"))
                }
            }
        })
    }
}

/// Parses an optional `-<marker> <value>` style flag. If the next
/// token isn't `marker`, succeeds with `None` without consuming any
/// input — the flag simply wasn't typed, which is how a command with
/// a flag group still resolves when the sender omits it. If it is,
/// consumes the marker and one following string value, succeeding
/// with `Some(value)`.
#[derive(Clone, Debug)]
pub struct StringFlagParser {
    /// The token that introduces this flag, e.g. `"-v"`.
    pub marker: String,
}

impl StringFlagParser {
    /// Build a flag parser recognizing `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        StringFlagParser { marker: marker.into() }
    }
}

impl<S> ComponentParser<S> for StringFlagParser {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async move {
            if input.peek_string() != self.marker {
                return ParseOutcome::success(None::<String>);
            }
            input.read_string();
            if input.is_empty(true) {
                return ParseOutcome::failure(format!("`{}` requires a value", self.marker));
            }
            ParseOutcome::success(Some(input.read_string()))
        })
    }

    fn requested_argument_count(&self) -> usize {
        2
    }

    fn as_flag(&self) -> Option<&dyn CommandFlagParser<S>> {
        Some(self)
    }
}

impl<S> CommandFlagParser<S> for StringFlagParser {
    fn parse_current_flag(&self, _ctx: &dyn ParserContext<S>, input: &CommandInput) -> Option<String> {
        let peek = input.peek_string();
        if !peek.is_empty() && self.marker.starts_with(peek) {
            Some(peek.to_string())
        } else {
            None
        }
    }
}

/// Parses two whitespace-delimited integers in sequence, recording
/// each under its own sub-component name — a minimal reference
/// implementation of `AggregateCommandParser`.
pub struct IntPairAggregateParser<S> {
    sub_components: Vec<CommandComponent<S>>,
}

impl<S: Send + Sync + 'static> IntPairAggregateParser<S> {
    /// Build an aggregate whose two sub-components are named
    /// `first_name`/`second_name`.
    pub fn new(first_name: impl Into<String>, second_name: impl Into<String>) -> Self {
        let build = |name: String| {
            CommandComponent::for_tree(
                name,
                ComponentKind::Argument,
                Vec::new(),
                Arc::new(BoundedIntParser::unbounded()) as Arc<dyn ComponentParser<S>>,
                Arc::new(NoSuggestions) as Arc<dyn SuggestionProvider<S>>,
                true,
                None,
            )
        };
        IntPairAggregateParser {
            sub_components: vec![build(first_name.into()), build(second_name.into())],
        }
    }
}

impl<S: Send + Sync> ComponentParser<S> for IntPairAggregateParser<S> {
    fn parse_future<'a>(
        &'a self,
        _ctx: &'a mut dyn ParserContext<S>,
        input: &'a mut CommandInput,
    ) -> BoxFuture<'a, ParseOutcome> {
        Box::pin(async move {
            let snapshot = input.cursor();
            if input.is_empty(true) {
                return ParseOutcome::failure("expected two integers, found nothing");
            }
            let first_token = input.read_string();
            let first = match first_token.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    input.set_cursor(snapshot);
                    return ParseOutcome::failure(format!("`{first_token}` is not an integer"));
                }
            };
            if input.is_empty(true) {
                input.set_cursor(snapshot);
                return ParseOutcome::failure("expected a second integer, found nothing");
            }
            let second_token = input.read_string();
            let second = match second_token.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    input.set_cursor(snapshot);
                    return ParseOutcome::failure(format!("`{second_token}` is not an integer"));
                }
            };
            ParseOutcome::success((first, second))
        })
    }

    fn requested_argument_count(&self) -> usize {
        2
    }

    fn as_aggregate(&self) -> Option<&dyn AggregateCommandParser<S>> {
        Some(self)
    }
}

impl<S: Send + Sync> AggregateCommandParser<S> for IntPairAggregateParser<S> {
    fn sub_components(&self) -> &[CommandComponent<S>] {
        &self.sub_components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::permission::AllowAll;
    use std::sync::Arc;

    #[tokio::test]
    async fn string_parser_consumes_one_token() {
        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("hello world");
        let outcome = StringParser.parse_future(&mut ctx, &mut input).await;
        match outcome {
            ParseOutcome::Success(v) => assert_eq!(*v.downcast_ref::<String>().unwrap(), "hello"),
            ParseOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
        assert_eq!(input.peek_string(), "world");
    }

    #[tokio::test]
    async fn bounded_int_rejects_out_of_range() {
        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("11");
        let parser = BoundedIntParser::ranged(0, 10);
        let outcome = parser.parse_future(&mut ctx, &mut input).await;
        assert!(matches!(outcome, ParseOutcome::Failure(_)));
        assert_eq!(input.peek_string(), "11");
    }

    #[tokio::test]
    async fn bool_parser_is_case_insensitive() {
        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("TRUE");
        let outcome = BoolParser.parse_future(&mut ctx, &mut input).await;
        match outcome {
            ParseOutcome::Success(v) => assert!(*v.downcast_ref::<bool>().unwrap()),
            ParseOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn string_flag_parser_succeeds_with_none_when_absent() {
        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("");
        let parser = StringFlagParser::new("-v");
        let outcome = parser.parse_future(&mut ctx, &mut input).await;
        match outcome {
            ParseOutcome::Success(v) => assert!(v.downcast_ref::<Option<String>>().unwrap().is_none()),
            ParseOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn string_flag_parser_consumes_marker_and_value() {
        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("-v hello");
        let parser = StringFlagParser::new("-v");
        let outcome = parser.parse_future(&mut ctx, &mut input).await;
        match outcome {
            ParseOutcome::Success(v) => {
                assert_eq!(v.downcast_ref::<Option<String>>().unwrap().as_deref(), Some("hello"));
            }
            ParseOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
        assert!(input.is_empty(true));
    }

    #[tokio::test]
    async fn int_pair_aggregate_parses_both_sub_components() {
        let parser = IntPairAggregateParser::<()>::new("x", "y");
        assert_eq!(parser.sub_components().len(), 2);

        let mut ctx = ParseContext::new((), Arc::new(AllowAll));
        let mut input = CommandInput::new("3 4");
        let outcome = parser.parse_future(&mut ctx, &mut input).await;
        match outcome {
            ParseOutcome::Success(v) => assert_eq!(*v.downcast_ref::<(i64, i64)>().unwrap(), (3, 4)),
            ParseOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
        assert!(input.is_empty(true));
    }
}
