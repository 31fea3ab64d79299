//! The error model: messages, the mergeable `ParseError`, and rendering.
//!
//! The merge rule in [`ParseError::merge`] is, per the spec this crate
//! implements, the single most important invariant of the engine: it is
//! what lets `or`/`choice`/`many` report the *furthest* point any
//! alternative reached, instead of whichever alternative merely happened
//! to run last. Grounded on the teacher crate's `ParseContext::report`,
//! which keeps only the error at the "foremost" (furthest-progress)
//! location; this crate generalizes that single-slot bookkeeping into a
//! proper associative `merge` so it composes through arbitrary combinator
//! nesting rather than living in one mutable context field.

use std::fmt;

use smallvec::SmallVec;

use crate::position::Position;

/// One piece of diagnostic information about why a parse failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorMessage {
    /// A specific token/construct was required here.
    Expected(String),
    /// A token was present but the wrong one.
    Unexpected(String),
    /// A free-form diagnostic, e.g. from `fail()` or a `filter` violation.
    Message(String),
    /// Input was exhausted at a point requiring more.
    EndOfInput,
    /// A breadcrumb label, innermost first (see [`ParseError::with_context`]).
    NestedContext(String),
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Expected(s) => write!(f, "expected {s}"),
            ErrorMessage::Unexpected(s) => write!(f, "unexpected {s}"),
            ErrorMessage::Message(s) => write!(f, "{s}"),
            ErrorMessage::EndOfInput => write!(f, "unexpected end of input"),
            ErrorMessage::NestedContext(s) => write!(f, "in {s}"),
        }
    }
}

/// Most alternatives fail with only a handful of distinct messages; inline
/// storage for up to 4 avoids a heap allocation on the common path (see
/// spec's design note on error-accumulation allocation pressure).
type MessageSet = SmallVec<[ErrorMessage; 4]>;
type ContextStack = SmallVec<[String; 4]>;

/// A structured parse failure: the position it occurred at, the set of
/// messages explaining why (deduplicated, first-seen order preserved), and
/// the stack of `with_context` labels active at that point (innermost
/// first).
#[derive(Clone, Debug)]
pub struct ParseError {
    position: Position,
    messages: MessageSet,
    context_stack: ContextStack,
}

impl ParseError {
    /// Creates a new error at `position` with a single message and no
    /// context labels.
    pub fn new(position: Position, message: ErrorMessage) -> Self {
        let mut messages = MessageSet::new();
        messages.push(message);
        ParseError {
            position,
            messages,
            context_stack: ContextStack::new(),
        }
    }

    /// The position this error was reported at.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The deduplicated set of messages, in first-seen order.
    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }

    /// The context-label breadcrumb, innermost label first.
    pub fn context_stack(&self) -> &[String] {
        &self.context_stack
    }

    /// Prepends `label` to the context stack (innermost).
    #[must_use]
    pub fn with_context(mut self, label: impl Into<String>) -> Self {
        self.context_stack.insert(0, label.into());
        self
    }

    /// Replaces the message set with a single `Expected(label)`, preserving
    /// position and context stack. Used by [`crate::parser::Parser::with_expected`].
    #[must_use]
    pub fn with_expected(mut self, label: impl Into<String>) -> Self {
        self.messages = MessageSet::new();
        self.messages.push(ErrorMessage::Expected(label.into()));
        self
    }

    /// The merge rule (spec §3, §7): furthest-progress wins; ties union
    /// their message sets (deduplicated, first-seen order) and context
    /// stacks.
    #[must_use]
    pub fn merge(self, other: ParseError) -> ParseError {
        use std::cmp::Ordering::*;
        match self.position.cmp(&other.position) {
            Greater => self,
            Less => other,
            Equal => {
                let mut messages = self.messages;
                for m in other.messages {
                    if !messages.contains(&m) {
                        messages.push(m);
                    }
                }
                let mut context_stack = self.context_stack;
                for c in other.context_stack {
                    if !context_stack.contains(&c) {
                        context_stack.push(c);
                    }
                }
                ParseError {
                    position: self.position,
                    messages,
                    context_stack,
                }
            }
        }
    }

    /// Merges an `Option<ParseError>` into `self`, treating `None` as the
    /// identity. Convenience for the many call sites that carry an
    /// optional accumulated error (`Success`'s `carried_error`).
    #[must_use]
    pub fn merge_opt(self, other: Option<ParseError>) -> ParseError {
        match other {
            None => self,
            Some(o) => self.merge(o),
        }
    }

    /// Terse rendering: `"parse error at <source>:<line>:<column>: expected
    /// A, B, or C"`. Stable across the crate's lifetime; this exact shape
    /// is relied on by tests.
    pub fn render_terse(&self) -> String {
        let clause = self.expected_clause();
        if clause.is_empty() {
            format!("parse error at {}", self.position)
        } else {
            format!("parse error at {}: {}", self.position, clause)
        }
    }

    /// Detailed rendering: the terse form, plus (when `source_line` is
    /// supplied) the offending source line and a caret aligned to the
    /// failure column.
    pub fn render_detailed(&self, source_line: Option<&str>) -> String {
        let mut out = self.render_terse();
        if let Some(line) = source_line {
            out.push('\n');
            out.push_str(line);
            out.push('\n');
            let col = self.position.column();
            for _ in 1..col {
                out.push(' ');
            }
            out.push('^');
        }
        out
    }

    fn expected_clause(&self) -> String {
        let mut expected = Vec::new();
        let mut unexpected = Vec::new();
        let mut plain = Vec::new();
        let mut saw_eof = false;
        for m in &self.messages {
            match m {
                ErrorMessage::Expected(s) => expected.push(s.clone()),
                ErrorMessage::Unexpected(s) => unexpected.push(s.clone()),
                ErrorMessage::Message(s) => plain.push(s.clone()),
                ErrorMessage::EndOfInput => saw_eof = true,
                ErrorMessage::NestedContext(_) => {}
            }
        }
        let mut clauses = Vec::new();
        if !expected.is_empty() {
            clauses.push(format!("expected {}", natural_join(&expected)));
        }
        if !unexpected.is_empty() {
            clauses.push(format!("unexpected {}", natural_join(&unexpected)));
        }
        if saw_eof {
            clauses.push("unexpected end of input".to_string());
        }
        clauses.extend(plain);
        clauses.join("; ")
    }
}

/// Joins items with commas and a trailing "or", e.g. `["A"]` -> `"A"`,
/// `["A", "B"]` -> `"A or B"`, `["A", "B", "C"]` -> `"A, B, or C"`.
fn natural_join(items: &[String]) -> String {
    match items.len() {
        0 => String::new(),
        1 => items[0].clone(),
        2 => format!("{} or {}", items[0], items[1]),
        _ => {
            let (last, init) = items.split_last().unwrap();
            format!("{}, or {}", init.join(", "), last)
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_terse())
    }
}

impl std::error::Error for ParseError {}

impl PartialEq for ParseError {
    /// Equality ignores context-stack *order* within the same element set
    /// (spec §4.C), and is otherwise structural.
    fn eq(&self, other: &Self) -> bool {
        if self.position != other.position {
            return false;
        }
        if self.messages.len() != other.messages.len()
            || !self.messages.iter().all(|m| other.messages.contains(m))
        {
            return false;
        }
        self.context_stack.len() == other.context_stack.len()
            && self
                .context_stack
                .iter()
                .all(|c| other.context_stack.contains(c))
    }
}

/// A fatal, non-recoverable engine failure — distinct from [`ParseError`],
/// which is a recoverable, mergeable value produced by ordinary combinator
/// failure. The only condition that raises this (spec §7, "what is
/// fatal"): extracting a value from a [`crate::result::ParseResult`] that
/// turned out to be a failure. The `many`/repetition zero-consume-loop
/// guard (spec §4.I/§7/§8 property 1) is deliberately *not* here — the
/// spec classifies it as an ordinary `Message`-kind [`ParseError`]
/// (`src/combinators/repeat.rs`'s `many`), recoverable like any other
/// parse failure rather than a process-fatal condition.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Raised by [`crate::result::ParseResult::unwrap_or_raise`] when the
    /// result was a failure.
    #[error("{0}")]
    Failed(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: usize) -> Position {
        let mut p = Position::initial("<test>");
        for _ in 0..offset {
            p = p.advance('x');
        }
        p
    }

    #[test]
    fn test_merge_furthest_wins() {
        let a = ParseError::new(pos(1), ErrorMessage::Expected("a".into()));
        let b = ParseError::new(pos(3), ErrorMessage::Expected("b".into()));
        let m = a.clone().merge(b.clone());
        assert_eq!(m.position(), &pos(3));
        assert_eq!(m.messages(), &[ErrorMessage::Expected("b".into())]);

        let m2 = b.merge(a);
        assert_eq!(m2.position(), &pos(3));
    }

    #[test]
    fn test_merge_equal_position_unions_messages() {
        let a = ParseError::new(pos(2), ErrorMessage::Expected("cat".into()));
        let b = ParseError::new(pos(2), ErrorMessage::Expected("dog".into()));
        let m = a.merge(b);
        assert_eq!(m.position(), &pos(2));
        assert_eq!(
            m.messages(),
            &[
                ErrorMessage::Expected("cat".into()),
                ErrorMessage::Expected("dog".into())
            ]
        );
        assert!(m.render_terse().contains("cat"));
        assert!(m.render_terse().contains("dog"));
    }

    #[test]
    fn test_merge_dedup_preserves_first_seen_order() {
        let a = ParseError::new(pos(0), ErrorMessage::Expected("x".into()));
        let b = ParseError::new(pos(0), ErrorMessage::Expected("x".into()));
        let m = a.merge(b);
        assert_eq!(m.messages().len(), 1);
    }

    #[test]
    fn test_natural_join() {
        assert_eq!(natural_join(&["a".into()]), "a");
        assert_eq!(natural_join(&["a".into(), "b".into()]), "a or b");
        assert_eq!(
            natural_join(&["a".into(), "b".into(), "c".into()]),
            "a, b, or c"
        );
    }

    #[test]
    fn test_render_detailed_caret_alignment() {
        let err = ParseError::new(
            {
                let mut p = Position::initial("<test>");
                p = p.advance('a');
                p = p.advance('b');
                p
            },
            ErrorMessage::Expected("digit".into()),
        );
        let rendered = err.render_detailed(Some("ab?"));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "ab?");
        assert_eq!(lines[2], "  ^");
    }

    #[test]
    fn test_equality_ignores_context_order() {
        let a = ParseError::new(pos(0), ErrorMessage::Expected("x".into()))
            .with_context("a")
            .with_context("b");
        let b = ParseError::new(pos(0), ErrorMessage::Expected("x".into()))
            .with_context("b")
            .with_context("a");
        // both produce the same two-label set, different insertion order
        assert_eq!(a, b);
    }
}
