// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios exercising `CommandRegistry` through its
//! public surface: insertion, parsing, and suggestion, against a
//! trivial `()` sender.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use command_dispatch_tree::{
    CommandBuilder, CommandRegistry, ComponentBuilder, DefaultValue, InsertError, ParseError,
};

use command_dispatch_tree::parsers::{BoundedIntParser, StringFlagParser};

#[tokio::test]
async fn literal_only_command_resolves_or_fails() {
    let registry = CommandRegistry::<()>::new();
    let invoked = Arc::new(AtomicBool::new(false));
    let invoked_clone = invoked.clone();
    registry
        .insert_command(
            CommandBuilder::new("foo").handler(move |_| invoked_clone.store(true, Ordering::SeqCst)),
        )
        .expect("insert succeeds");

    let (command, _ctx) = registry.parse("foo", ()).await.expect("foo resolves");
    (command.handler)(&());
    assert!(invoked.load(Ordering::SeqCst));

    assert!(matches!(
        registry.parse("foo bar", ()).await,
        Err(ParseError::InvalidSyntax { .. })
    ));
    assert!(matches!(
        registry.parse("bar", ()).await,
        Err(ParseError::NoSuchCommand { .. })
    ));
}

#[tokio::test]
async fn ranged_integer_argument_enforces_bounds() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .component(
                    ComponentBuilder::argument("n", Arc::new(BoundedIntParser::ranged(0, 10)))
                        .build(),
                )
                .handler(|_| {}),
        )
        .expect("insert succeeds");

    let (_command, ctx) = registry.parse("foo 5", ()).await.expect("foo 5 resolves");
    assert_eq!(*ctx.get_as::<i64>("n").unwrap(), 5);

    assert!(matches!(
        registry.parse("foo 11", ()).await,
        Err(ParseError::ArgumentParseException { .. })
    ));
    assert!(matches!(
        registry.parse("foo", ()).await,
        Err(ParseError::InvalidSyntax { .. })
    ));
}

#[tokio::test]
async fn optional_argument_falls_back_to_constant_default() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .component(
                    ComponentBuilder::argument("n", Arc::new(BoundedIntParser::unbounded()))
                        .default_value(DefaultValue::constant(42i64))
                        .build(),
                )
                .handler(|_| {}),
        )
        .expect("insert succeeds");

    let (_command, ctx) = registry.parse("foo", ()).await.expect("foo resolves");
    assert_eq!(*ctx.get_as::<i64>("n").unwrap(), 42);

    let (_command, ctx) = registry.parse("foo 7", ()).await.expect("foo 7 resolves");
    assert_eq!(*ctx.get_as::<i64>("n").unwrap(), 7);
}

#[tokio::test]
async fn literal_sibling_suggestions_are_filtered() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(CommandBuilder::new("foo").component(ComponentBuilder::literal("bar").build()).handler(|_| {}))
        .expect("insert foo bar");
    registry
        .insert_command(CommandBuilder::new("foo").component(ComponentBuilder::literal("baz").build()).handler(|_| {}))
        .expect("insert foo baz");

    let mut suggestions = registry.suggest("foo ", ()).await;
    suggestions.sort();
    assert_eq!(suggestions, vec!["bar".to_string(), "baz".to_string()]);

    let mut suggestions = registry.suggest("foo b", ()).await;
    suggestions.sort();
    assert_eq!(suggestions, vec!["bar".to_string(), "baz".to_string()]);

    let suggestions = registry.suggest("foo bar", ()).await;
    assert!(suggestions.is_empty());
}

#[tokio::test]
async fn intermediary_nodes_can_own_their_own_command() {
    let registry = CommandRegistry::<()>::new();
    let seen = Arc::new(AtomicI64::new(0));
    let seen_foo = seen.clone();
    let seen_bar = seen.clone();
    registry
        .insert_command(CommandBuilder::new("foo").handler(move |_| seen_foo.store(1, Ordering::SeqCst)))
        .expect("insert foo");
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .component(ComponentBuilder::literal("bar").build())
                .handler(move |_| seen_bar.store(2, Ordering::SeqCst)),
        )
        .expect("insert foo bar");

    let (foo, _) = registry.parse("foo", ()).await.expect("foo resolves");
    (foo.handler)(&());
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let (foo_bar, _) = registry.parse("foo bar", ()).await.expect("foo bar resolves");
    (foo_bar.handler)(&());
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn conflicting_variable_siblings_fail_atomically() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .component(ComponentBuilder::argument("n", Arc::new(BoundedIntParser::unbounded())).build())
                .handler(|_| {}),
        )
        .expect("first insert succeeds");

    let before = registry.named_node("foo").unwrap().children().len();

    let result = registry.insert_command(
        CommandBuilder::new("foo")
            .component(
                ComponentBuilder::argument(
                    "flag_like",
                    Arc::new(command_dispatch_tree::parsers::BoolParser),
                )
                .build(),
            )
            .handler(|_| {}),
    );
    assert!(matches!(result, Err(InsertError::AmbiguousNode { .. })));

    let after = registry.named_node("foo").unwrap().children().len();
    assert_eq!(before, after, "failed insert must not leave a partial child");
}

#[tokio::test]
async fn optional_flag_resolves_both_with_and_without_the_flag() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .flag(
                    ComponentBuilder::flag("verbose", Arc::new(StringFlagParser::new("-v"))).build(),
                )
                .handler(|_| {}),
        )
        .expect("insert succeeds");

    let (_command, ctx) = registry.parse("foo", ()).await.expect("foo resolves without the flag");
    assert_eq!(ctx.get_as::<Option<String>>("verbose"), Some(&None));

    let (_command, ctx) = registry
        .parse("foo -v hello", ())
        .await
        .expect("foo resolves with the flag");
    assert_eq!(
        ctx.get_as::<Option<String>>("verbose"),
        Some(&Some("hello".to_string()))
    );
}

#[tokio::test]
async fn named_node_lookup_is_case_insensitive_but_parsing_is_not() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(CommandBuilder::new("Foo").handler(|_| {}))
        .expect("insert succeeds");

    assert!(registry.named_node("foo").is_some());
    assert!(registry.named_node("FOO").is_some());
    assert!(registry.named_node("Foo").is_some());

    assert!(registry.parse("Foo", ()).await.is_ok());
    assert!(matches!(
        registry.parse("foo", ()).await,
        Err(ParseError::NoSuchCommand { .. })
    ));
}

#[tokio::test]
async fn delete_recursively_notifies_each_owning_command_and_prunes_subtree() {
    let registry = CommandRegistry::<()>::new();
    registry
        .insert_command(CommandBuilder::new("foo").handler(|_| {}))
        .expect("insert foo succeeds");
    registry
        .insert_command(
            CommandBuilder::new("foo")
                .component(ComponentBuilder::literal("bar").build())
                .handler(|_| {}),
        )
        .expect("insert foo bar succeeds");

    let foo_node = registry.named_node("foo").unwrap();
    let deleted = Arc::new(std::sync::Mutex::new(Vec::new()));
    let deleted_clone = deleted.clone();
    registry
        .delete_recursively(&foo_node, false, move |cmd| {
            deleted_clone
                .lock()
                .unwrap()
                .push(cmd.components.first().unwrap().canonical_alias());
        })
        .expect("delete succeeds");

    assert_eq!(deleted.lock().unwrap().len(), 2, "both foo and foo-bar owners notified");
    assert!(registry.named_node("foo").is_none());
}
