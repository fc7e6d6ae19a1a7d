// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Per-Invocation Contexts
//!
//! `ParseContext` and `SuggestionContext` hold the state that is
//! threaded through a single `parse`/`suggest` call: who's asking,
//! what's been parsed so far, and (for suggestions) what's been
//! collected so far. Neither is shared across invocations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::ParsedValue;
use crate::permission::PermissionAuthority;

/// The meta key under which `suggest::dynamic_suggest` records which
/// flag is currently being typed, so downstream suggestion providers
/// (and the flag-following rule) can see it.
pub const FLAG_META_KEY: &str = "__current_flag__";

/// The narrow surface a [`crate::component::ComponentParser`] needs
/// from whichever context is driving it — a real `ParseContext`
/// during `parse`, or a `SuggestionContext` during speculative
/// descent in `suggest`. This is what lets `preprocess` and
/// `parse_future` be reused verbatim by the suggester (§4.9).
pub trait ParserContext<S> {
    /// The sender driving this invocation.
    fn sender(&self) -> &S;
    /// The permission authority consulted by the caller.
    fn authority(&self) -> &dyn PermissionAuthority<S>;
    /// A previously stored value, by name.
    fn get(&self, name: &str) -> Option<&ParsedValue>;
    /// Record a value under `name`.
    fn store(&mut self, name: &str, value: ParsedValue);
}

/// Per-invocation state for a single `parse` call.
pub struct ParseContext<S> {
    /// Who issued this input.
    pub sender: S,
    /// Values parsed so far, by component name.
    values: HashMap<String, ParsedValue>,
    /// The component currently being parsed, for diagnostics.
    pub current_component: Option<String>,
    /// The permission authority consulted by the walker.
    pub authority: Arc<dyn PermissionAuthority<S>>,
}

impl<S> ParseContext<S> {
    /// Start a fresh context for `sender`.
    pub fn new(sender: S, authority: Arc<dyn PermissionAuthority<S>>) -> Self {
        ParseContext {
            sender,
            values: HashMap::new(),
            current_component: None,
            authority,
        }
    }

    /// Record a parsed value under `name`.
    pub fn store(&mut self, name: &str, value: ParsedValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Fetch a previously parsed value by name.
    pub fn get(&self, name: &str) -> Option<&ParsedValue> {
        self.values.get(name)
    }

    /// Fetch a previously parsed value by name, downcast to `T`.
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.values.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// All parsed values, by name.
    pub fn values(&self) -> &HashMap<String, ParsedValue> {
        &self.values
    }
}

impl<S> ParserContext<S> for ParseContext<S> {
    fn sender(&self) -> &S {
        &self.sender
    }

    fn authority(&self) -> &dyn PermissionAuthority<S> {
        &*self.authority
    }

    fn get(&self, name: &str) -> Option<&ParsedValue> {
        ParseContext::get(self, name)
    }

    fn store(&mut self, name: &str, value: ParsedValue) {
        ParseContext::store(self, name, value)
    }
}

/// Per-invocation state for a single `suggest` call.
pub struct SuggestionContext<S> {
    /// Who is asking for suggestions.
    pub sender: S,
    /// Values parsed speculatively so far (including partial-token
    /// placeholders like `"{name}_{i}"`), by name.
    values: HashMap<String, ParsedValue>,
    /// The suggestions accumulated so far, raw and unfiltered; passed
    /// through the registry's injected suggestion processor (see
    /// `CommandRegistry::with_suggestion_processor`) once collection
    /// completes.
    pub suggestions: Vec<String>,
    /// The permission authority consulted by the suggester.
    pub authority: Arc<dyn PermissionAuthority<S>>,
}

impl<S> SuggestionContext<S> {
    /// Start a fresh context for `sender`.
    pub fn new(sender: S, authority: Arc<dyn PermissionAuthority<S>>) -> Self {
        SuggestionContext {
            sender,
            values: HashMap::new(),
            suggestions: Vec::new(),
            authority,
        }
    }

    /// Record a speculative value or placeholder under `name`.
    pub fn store(&mut self, name: &str, value: ParsedValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Store a raw partial-token string under `name` (used for the
    /// `"{name}_{i}"` placeholders of §4.9).
    pub fn store_token(&mut self, name: &str, token: &str) {
        self.values
            .insert(name.to_string(), crate::component::boxed_value(token.to_string()));
    }

    /// Remove a stored value (used to clear `FLAG_META_KEY`).
    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Fetch a previously stored value by name.
    pub fn get(&self, name: &str) -> Option<&ParsedValue> {
        self.values.get(name)
    }

    /// Whether a flag is currently being typed (`FLAG_META_KEY` is
    /// set).
    pub fn current_flag(&self) -> Option<String> {
        self.get(FLAG_META_KEY)
            .and_then(|v| v.downcast_ref::<String>())
            .cloned()
    }
}

impl<S> ParserContext<S> for SuggestionContext<S> {
    fn sender(&self) -> &S {
        &self.sender
    }

    fn authority(&self) -> &dyn PermissionAuthority<S> {
        &*self.authority
    }

    fn get(&self, name: &str) -> Option<&ParsedValue> {
        SuggestionContext::get(self, name)
    }

    fn store(&mut self, name: &str, value: ParsedValue) {
        SuggestionContext::store(self, name, value)
    }
}
