// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Command Input
//!
//! [`CommandInput`] is a cursor-backed view over a single line of
//! user input. It is deliberately dumb: it only knows how to split
//! on whitespace and to snapshot/restore its cursor position so the
//! walker can backtrack after a failed branch.

/// A cursor over a whitespace-tokenized source string.
///
/// Cloning a `CommandInput` (see [`CommandInput::copy`]) produces an
/// independent cursor over the same backing text; advancing one does
/// not affect the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInput {
    text: String,
    cursor: usize,
}

impl CommandInput {
    /// Build a `CommandInput` from a raw line of text.
    pub fn new(text: impl Into<String>) -> Self {
        CommandInput {
            text: text.into(),
            cursor: 0,
        }
    }

    /// The current cursor position, as a byte offset into the
    /// original text.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to an arbitrary position. Used to restore a
    /// snapshot taken with [`CommandInput::cursor`] after a failed
    /// parse attempt.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    /// A detached snapshot of this input at its current position.
    pub fn copy(&self) -> CommandInput {
        self.clone()
    }

    /// The remaining, not yet consumed, raw text.
    pub fn remaining_input(&self) -> &str {
        &self.text[self.cursor.min(self.text.len())..]
    }

    /// Whether any non-whitespace remains. When `ignoring_whitespace`
    /// is `false`, trailing whitespace with no token after it still
    /// counts as non-empty.
    pub fn is_empty(&self, ignoring_whitespace: bool) -> bool {
        if ignoring_whitespace {
            self.remaining_input().trim_start().is_empty()
        } else {
            self.remaining_input().is_empty()
        }
    }

    /// The next whitespace-delimited token, without advancing the
    /// cursor. Returns the empty string if no token remains.
    pub fn peek_string(&self) -> &str {
        self.remaining_input().split_whitespace().next().unwrap_or("")
    }

    /// Read the next token, advancing the cursor past it and a
    /// single trailing whitespace character.
    pub fn read_string(&mut self) -> String {
        let remaining = self.remaining_input();
        let trimmed_start = remaining.len() - remaining.trim_start().len();
        let after_leading_ws = &remaining[trimmed_start..];
        let token_len = after_leading_ws
            .find(char::is_whitespace)
            .unwrap_or(after_leading_ws.len());
        let token = &after_leading_ws[..token_len];
        let consumed = trimmed_start + token_len;
        let mut new_cursor = self.cursor + consumed;
        // Skip a single trailing whitespace character, mirroring the
        // teacher's token-then-separator read semantics.
        if new_cursor < self.text.len() {
            if let Some(c) = self.text[new_cursor..].chars().next() {
                if c.is_whitespace() {
                    new_cursor += c.len_utf8();
                }
            }
        }
        let owned = token.to_string();
        self.cursor = new_cursor;
        owned
    }

    /// The count of whitespace-separated tokens left in the input.
    pub fn remaining_tokens(&self) -> usize {
        self.remaining_input().split_whitespace().count()
    }

    /// Like [`CommandInput::remaining_tokens`], but a trailing
    /// separator with nothing after it counts as one more (empty)
    /// token. This is what lets the suggester tell "foo" (still being
    /// typed) apart from "foo " (finished, now completing the next,
    /// currently-empty, token).
    pub fn effective_remaining_tokens(&self) -> usize {
        let remaining = self.remaining_input();
        let n = remaining.split_whitespace().count();
        if !remaining.trim().is_empty() && remaining.ends_with(char::is_whitespace) {
            n + 1
        } else {
            n
        }
    }

    /// The final token in the remaining buffer, or the empty string
    /// if nothing remains.
    pub fn last_remaining_token(&self) -> &str {
        self.remaining_input()
            .split_whitespace()
            .last()
            .unwrap_or("")
    }

    /// Logically append `s` to the input buffer, used to re-feed a
    /// `Parsed` default value through a parser.
    pub fn append_string(&mut self, s: &str) {
        if !self.remaining_input().trim_end().is_empty() {
            self.text.truncate(self.cursor + self.remaining_input().len());
            self.text.push(' ');
        } else {
            self.text.truncate(self.cursor);
        }
        self.text.push_str(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_advance() {
        let input = CommandInput::new("foo bar");
        assert_eq!(input.peek_string(), "foo");
        assert_eq!(input.peek_string(), "foo");
    }

    #[test]
    fn read_advances_past_token_and_one_space() {
        let mut input = CommandInput::new("foo bar");
        assert_eq!(input.read_string(), "foo");
        assert_eq!(input.peek_string(), "bar");
        assert_eq!(input.read_string(), "bar");
        assert!(input.is_empty(true));
    }

    #[test]
    fn set_cursor_restores_read_behavior() {
        let mut input = CommandInput::new("foo bar baz");
        let snapshot = input.cursor();
        assert_eq!(input.read_string(), "foo");
        input.set_cursor(snapshot);
        assert_eq!(input.read_string(), "foo");
        assert_eq!(input.read_string(), "bar");
    }

    #[test]
    fn remaining_tokens_and_last_token() {
        let input = CommandInput::new("  foo  bar baz ");
        assert_eq!(input.remaining_tokens(), 3);
        assert_eq!(input.last_remaining_token(), "baz");
    }

    #[test]
    fn effective_remaining_tokens_counts_trailing_separator() {
        assert_eq!(CommandInput::new("foo").effective_remaining_tokens(), 1);
        assert_eq!(CommandInput::new("foo ").effective_remaining_tokens(), 2);
        assert_eq!(CommandInput::new("foo bar").effective_remaining_tokens(), 2);
        assert_eq!(CommandInput::new("").effective_remaining_tokens(), 0);
    }

    #[test]
    fn append_string_extends_remaining_input() {
        let mut input = CommandInput::new("foo");
        let _ = input.read_string();
        input.append_string("42");
        assert_eq!(input.peek_string(), "42");
    }

    #[test]
    fn copy_is_independent() {
        let mut input = CommandInput::new("foo bar");
        let snapshot = input.copy();
        let _ = input.read_string();
        assert_eq!(snapshot.peek_string(), "foo");
        assert_eq!(input.peek_string(), "bar");
    }
}
