// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Command Dispatch Tree
//!
//! An asynchronous command dispatch tree: insert declarative commands
//! into a prefix trie keyed by command components, resolve tokenized
//! user input to a single executable command (or a structured
//! failure), and compute context-sensitive completion suggestions
//! for partial input.
//!
//! The entry point is [`CommandRegistry`], which owns the trie and
//! exposes [`CommandRegistry::insert_command`],
//! [`CommandRegistry::parse`], and [`CommandRegistry::suggest`].
//! Commands are built with [`CommandBuilder`] and [`ComponentBuilder`].

#![warn(missing_docs)]
#![deny(
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

pub mod command;
pub mod component;
pub mod context;
pub mod error;
mod insert;
pub mod input;
pub mod node;
pub mod parsers;
pub mod permission;
pub mod registry;
mod suggest;
mod walker;

pub use command::{Command, CommandBuilder, ComponentBuilder, ComponentDescriptor};
pub use component::{AggregateCommandParser, CommandFlagParser, ComponentParser, ParseOutcome, ParsedValue, SuggestionProvider};
pub use context::{ParseContext, ParserContext, SuggestionContext};
pub use error::{ArgumentError, InsertError, ParseError};
pub use node::{CommandComponent, CommandNode, ComponentKind, DefaultValue};
pub use permission::{Permission, PermissionAuthority};
pub use registry::{CommandRegistry, DispatcherConfig};
