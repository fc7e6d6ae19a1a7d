// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Errors
//!
//! One error enum per fallible public operation, per §7 of the
//! design: inserting a command and parsing an input fail in
//! different, non-overlapping ways.

use crate::permission::Permission;
use thiserror::Error;

/// A parser-reported failure, wrapped as opaque text. Individual
/// `ComponentParser` implementations are external to this crate; all
/// we can do is carry whatever message they produced.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct ArgumentError(pub String);

impl ArgumentError {
    /// Build an `ArgumentError` from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        ArgumentError(message.into())
    }
}

/// Failures that `CommandRegistry::parse` can produce.
#[derive(Clone, Debug, Error)]
pub enum ParseError {
    /// No child of the root matched the first token.
    #[error("no such command: {token:?}")]
    NoSuchCommand {
        /// The chain walked before failing (just the root, here).
        chain: String,
        /// The token that didn't match anything.
        token: String,
    },

    /// Input remained after the tree was exhausted, or a required
    /// branch was missing.
    #[error("invalid syntax at `{chain}`")]
    InvalidSyntax {
        /// The formatted chain of components parsed so far.
        chain: String,
    },

    /// The sender lacks a permission encountered on the accepted
    /// path.
    #[error("missing permission {missing:?} at `{chain}`")]
    NoPermission {
        /// The permission that blocked the sender.
        missing: Permission,
        /// The chain at which the check failed.
        chain: String,
    },

    /// The command was resolved, but requires a sender kind the
    /// caller does not satisfy.
    #[error("command at `{chain}` requires a different kind of sender")]
    InvalidCommandSender {
        /// The chain of the resolved command.
        chain: String,
    },

    /// A component parser on a committed (unambiguous-child) branch
    /// reported a real failure, rather than "this branch doesn't
    /// match".
    #[error("failed to parse argument at `{chain}`: {source}")]
    ArgumentParseException {
        /// The chain at which the failing component lives.
        chain: String,
        /// The parser's own error.
        #[source]
        source: ArgumentError,
    },

    /// The walker found more than one variable child at a node; this
    /// can only happen if the ambiguity invariant was violated during
    /// insertion.
    #[error("internal error: node at `{chain}` has more than one variable child")]
    AmbiguousChildren {
        /// The chain at which the invariant was violated.
        chain: String,
    },
}

/// Failures that `CommandRegistry::insert_command` can produce.
#[derive(Clone, Debug, Error)]
pub enum InsertError {
    /// The terminal node for this command already owns a different
    /// command.
    #[error("duplicate command chain at `{chain}`")]
    DuplicateCommand {
        /// The chain at which the conflict was found.
        chain: String,
    },

    /// Inserting this command would create two variable siblings, or
    /// two LITERAL siblings with overlapping aliases, under the same
    /// node.
    #[error("ambiguous node at `{chain}`: {detail}")]
    AmbiguousNode {
        /// The chain at which the ambiguity was found.
        chain: String,
        /// A human-readable description of the conflict.
        detail: String,
    },

    /// A leaf was left without an owning command after insertion.
    #[error("leaf at `{chain}` has no owning command")]
    NoCommandInLeaf {
        /// The chain of the offending leaf.
        chain: String,
    },

    /// The command's first component was not a LITERAL.
    #[error("top-level variable component `{name}` is not allowed at the root")]
    TopLevelVariable {
        /// The name of the offending component.
        name: String,
    },
}
