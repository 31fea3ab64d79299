//! Input streams: an immutable cursor over a sequence of tokens.
//!
//! Grounded on the shape of the teacher crate's `ParseContext` (a shared
//! source buffer plus a byte offset into it), generalized to bytes and
//! arbitrary token sequences the way `combine::Stream` / `winnow::stream`
//! do it for their own core stream abstractions.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::position::Position;

/// A cursor over a sequence of tokens of type `Token`.
///
/// Implementations are cheap to clone ("cheap" meaning "a handful of words,
/// no deep copy of the underlying buffer") and compare equal iff they
/// reference the same underlying sequence at the same offset. Advancing at
/// end-of-input is a no-op that returns an equal stream, never a panic.
pub trait Stream: Clone + PartialEq {
    /// The element type yielded one at a time by [`Stream::current`].
    type Token: Clone;

    /// The current position (offset/line/column) of this cursor.
    fn position(&self) -> &Position;

    /// True if there are no more tokens to read.
    fn is_at_end(&self) -> bool;

    /// The token under the cursor. Unspecified (but must not panic) when
    /// `is_at_end()`; callers must check `is_at_end` first.
    fn current(&self) -> Option<Self::Token>;

    /// Returns a new stream advanced by exactly one token. A no-op
    /// (returns a stream equal to `self`) when already at end.
    #[must_use]
    fn advance(&self) -> Self;

    /// A short, escaped preview of the stream's remaining content, for use
    /// in diagnostics. Truncates at `max_len` tokens and appends an
    /// ellipsis marker when truncated.
    fn context_preview(&self, max_len: usize) -> String;
}

/// A stream over the `char`s of a string slice.
#[derive(Clone)]
pub struct CharStream {
    source: Rc<str>,
    // Byte offset into `source` (not char count) so slicing stays O(1);
    // `position` tracks the logical (char) offset/line/column separately.
    byte_index: usize,
    position: Position,
}

impl CharStream {
    /// Creates a stream over `source`, positioned at its start, with
    /// diagnostics labeled `source_name`.
    pub fn new(source: impl Into<Rc<str>>, source_name: impl Into<Rc<str>>) -> Self {
        CharStream {
            source: source.into(),
            byte_index: 0,
            position: Position::initial(source_name),
        }
    }

    /// The full original source text (not just what remains).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The remaining, unconsumed text.
    pub fn remaining_str(&self) -> &str {
        &self.source[self.byte_index..]
    }
}

impl PartialEq for CharStream {
    fn eq(&self, other: &Self) -> bool {
        self.byte_index == other.byte_index && self.source == other.source
    }
}

impl Stream for CharStream {
    type Token = char;

    fn position(&self) -> &Position {
        &self.position
    }

    fn is_at_end(&self) -> bool {
        self.byte_index >= self.source.len()
    }

    fn current(&self) -> Option<char> {
        self.remaining_str().chars().next()
    }

    fn advance(&self) -> Self {
        match self.current() {
            None => self.clone(),
            Some(ch) => CharStream {
                source: self.source.clone(),
                byte_index: self.byte_index + ch.len_utf8(),
                position: self.position.advance(ch),
            },
        }
    }

    fn context_preview(&self, max_len: usize) -> String {
        escape_preview(self.remaining_str().chars(), max_len)
    }
}

/// Escapes control characters and truncates a `char` preview to `max_len`
/// characters, appending an ellipsis marker if truncated.
fn escape_preview(chars: impl Iterator<Item = char>, max_len: usize) -> String {
    let mut out = String::new();
    let mut truncated = false;
    for (i, ch) in chars.enumerate() {
        if i >= max_len {
            truncated = true;
            break;
        }
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    if truncated {
        out.push('\u{2026}'); // "…"
    }
    out
}

/// A stream over the bytes of a byte buffer. `line`/`column` advance by one
/// per byte but carry no textual meaning (per spec: non-text streams don't
/// promise a meaningful line/column, only a meaningful offset).
#[derive(Clone)]
pub struct ByteStream {
    source: Rc<[u8]>,
    index: usize,
    position: Position,
}

impl ByteStream {
    /// Creates a stream over `source`, positioned at its start.
    pub fn new(source: impl Into<Rc<[u8]>>, source_name: impl Into<Rc<str>>) -> Self {
        ByteStream {
            source: source.into(),
            index: 0,
            position: Position::initial(source_name),
        }
    }

    /// The remaining, unconsumed bytes.
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.source[self.index..]
    }

    /// Advances by `n` bytes at once (bulk advance; a no-op/saturating at
    /// end). Equivalent to calling [`Stream::advance`] `n` times but O(1).
    #[must_use]
    pub fn advance_n(&self, n: usize) -> Self {
        let n = n.min(self.source.len() - self.index);
        ByteStream {
            source: self.source.clone(),
            index: self.index + n,
            position: self.position.advance_bytes(n),
        }
    }

    /// Returns a slice of the next `n` bytes without consuming them.
    /// Shorter than `n` if fewer than `n` bytes remain.
    pub fn slice(&self, n: usize) -> &[u8] {
        let end = (self.index + n).min(self.source.len());
        &self.source[self.index..end]
    }
}

impl PartialEq for ByteStream {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.source == other.source
    }
}

impl Stream for ByteStream {
    type Token = u8;

    fn position(&self) -> &Position {
        &self.position
    }

    fn is_at_end(&self) -> bool {
        self.index >= self.source.len()
    }

    fn current(&self) -> Option<u8> {
        self.source.get(self.index).copied()
    }

    fn advance(&self) -> Self {
        if self.is_at_end() {
            self.clone()
        } else {
            self.advance_n(1)
        }
    }

    fn context_preview(&self, max_len: usize) -> String {
        let bytes = self.remaining_bytes();
        let truncated = bytes.len() > max_len;
        let shown = &bytes[..bytes.len().min(max_len)];
        let mut out = String::with_capacity(shown.len() * 2 + 1);
        for b in shown {
            let _ = write!(out, "{:02x}", b);
        }
        if truncated {
            out.push('\u{2026}');
        }
        out
    }
}

/// A stream over an arbitrary ordered sequence of tokens, with a
/// user-supplied rule for how advancing over one token affects position
/// (e.g. "does this token count as a newline?").
#[derive(Clone)]
pub struct TokenStream<T: Clone> {
    source: Rc<[T]>,
    index: usize,
    position: Position,
    is_line_break: Rc<dyn Fn(&T) -> bool>,
}

impl<T: Clone> TokenStream<T> {
    /// Creates a stream over `source`. `is_line_break` decides, for each
    /// token, whether advancing past it should increment `line` and reset
    /// `column` (as `\n` does for [`CharStream`]) or just increment
    /// `column`.
    pub fn new(
        source: impl Into<Rc<[T]>>,
        source_name: impl Into<Rc<str>>,
        is_line_break: impl Fn(&T) -> bool + 'static,
    ) -> Self {
        TokenStream {
            source: source.into(),
            index: 0,
            position: Position::initial(source_name),
            is_line_break: Rc::new(is_line_break),
        }
    }

    /// The remaining, unconsumed tokens.
    pub fn remaining(&self) -> &[T] {
        &self.source[self.index..]
    }
}

impl<T: Clone> PartialEq for TokenStream<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Rc::ptr_eq(&self.source, &other.source)
    }
}

impl<T: Clone + std::fmt::Debug> Stream for TokenStream<T> {
    type Token = T;

    fn position(&self) -> &Position {
        &self.position
    }

    fn is_at_end(&self) -> bool {
        self.index >= self.source.len()
    }

    fn current(&self) -> Option<T> {
        self.source.get(self.index).cloned()
    }

    fn advance(&self) -> Self {
        match self.current() {
            None => self.clone(),
            Some(tok) => TokenStream {
                source: self.source.clone(),
                index: self.index + 1,
                position: self.position.advance_with((self.is_line_break)(&tok)),
                is_line_break: self.is_line_break.clone(),
            },
        }
    }

    fn context_preview(&self, max_len: usize) -> String {
        let rest = self.remaining();
        let truncated = rest.len() > max_len;
        let shown = &rest[..rest.len().min(max_len)];
        let mut out = format!("{:?}", shown);
        if truncated {
            out.push('\u{2026}');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_stream_advance_idempotent_at_end() {
        let s = CharStream::new("a", "<test>");
        let s = s.advance();
        assert!(s.is_at_end());
        let s2 = s.advance();
        assert_eq!(s, s2);
    }

    #[test]
    fn test_char_stream_equality() {
        let a = CharStream::new("hello", "<test>");
        let b = a.advance();
        let c = a.advance();
        assert_eq!(b, c);
        assert_ne!(a, b);
    }

    #[test]
    fn test_byte_stream_bulk_advance() {
        let s = ByteStream::new(vec![1, 2, 3, 4], "<bytes>");
        assert_eq!(s.slice(2), &[1, 2]);
        let s2 = s.advance_n(2);
        assert_eq!(s2.position().offset(), 2);
        assert_eq!(s2.slice(2), &[3, 4]);
    }

    #[test]
    fn test_token_stream_line_break_rule() {
        let toks = vec!["a", "\n", "b"];
        let s = TokenStream::new(toks, "<toks>", |t: &&str| *t == "\n");
        let s = s.advance();
        assert_eq!(s.position().column(), 2);
        let s = s.advance();
        assert_eq!((s.position().line(), s.position().column()), (2, 1));
    }
}
