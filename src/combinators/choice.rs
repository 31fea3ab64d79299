//! Choice & backtracking (spec §4.H) — the defining Parsec semantics.
//!
//! `or`'s committed-choice discipline is what distinguishes this engine
//! from a naive recursive-descent-with-full-backtracking parser (like the
//! teacher crate's own PEG-style `either`/`alt`, which always tries every
//! alternative regardless of how far the first one got): once an
//! alternative has consumed input, its failure is final. `try_` is the
//! opt-in escape hatch that recovers full backtracking where the grammar
//! author explicitly asks for it.

use crate::context::Context;
use crate::error::ErrorMessage;
use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::Stream;

/// Commits to `a` if it consumes input before failing; otherwise, on a
/// zero-consume failure of `a`, tries `b`. This is the single combinator
/// that makes "LL(∞) with selective backtracking" precise: grammar authors
/// decide commit points by choosing where to wrap `try_`.
#[must_use]
pub fn or<S: Stream + 'static, T: 'static>(a: Parser<S, T>, b: Parser<S, T>) -> Parser<S, T> {
    Parser::new("or", move |stream, context: &Context| {
        match a.parse(stream, context) {
            success @ ParseResult::Success { .. } => success,
            ParseResult::Failure {
                error: err_a,
                remaining: rem_a,
            } => {
                if rem_a != *stream {
                    // `a` consumed input before failing: committed, don't try `b`.
                    return ParseResult::Failure {
                        error: err_a,
                        remaining: rem_a,
                    };
                }
                match b.parse(stream, context) {
                    ParseResult::Success {
                        value,
                        remaining,
                        carried_error,
                    } => ParseResult::Success {
                        value,
                        remaining,
                        carried_error: Some(err_a.merge_opt(carried_error)),
                    },
                    ParseResult::Failure {
                        error: err_b,
                        remaining: rem_b,
                    } => ParseResult::Failure {
                        error: err_a.merge(err_b),
                        remaining: rem_b,
                    },
                }
            }
        }
    })
}

/// Runs `p`; on failure, rewinds `remaining` back to the original input
/// position (success is unchanged). The opt-in backtracking primitive:
/// `try_(a).or(b)` recovers full alternation when `a` and `b` share a
/// prefix that `a` would otherwise commit past.
#[must_use]
pub fn try_<S: Stream + 'static, T: 'static>(p: Parser<S, T>) -> Parser<S, T> {
    Parser::new("try", move |stream, context| match p.parse(stream, context) {
        success @ ParseResult::Success { .. } => success,
        ParseResult::Failure { error, .. } => ParseResult::Failure {
            error,
            remaining: stream.clone(),
        },
    })
}

/// Left-folds [`or`] over `parsers`, in declaration order: the first
/// alternative that matches (or that commits by consuming input before
/// failing) wins.
#[must_use]
pub fn choice<S: Stream + 'static, T: 'static>(parsers: Vec<Parser<S, T>>) -> Parser<S, T> {
    let mut iter = parsers.into_iter();
    let first = iter
        .next()
        .expect("choice() requires at least one alternative");
    iter.fold(first, or)
}

/// Runs `p` but returns the original input as `remaining` on success (a
/// zero-consume observation); failure is unchanged.
#[must_use]
pub fn lookahead<S: Stream + 'static, T: 'static>(p: Parser<S, T>) -> Parser<S, T> {
    Parser::new("lookahead", move |stream, context| {
        match p.parse(stream, context) {
            ParseResult::Success {
                value,
                carried_error,
                ..
            } => ParseResult::Success {
                value,
                remaining: stream.clone(),
                carried_error,
            },
            failure => failure,
        }
    })
}

/// Negative lookahead: fails (with `Unexpected`, at the original position)
/// if `p` succeeds; succeeds with `()` at the original position if `p`
/// fails. Always zero-consume.
#[must_use]
pub fn not_followed_by<S: Stream + 'static, T: 'static>(p: Parser<S, T>) -> Parser<S, ()> {
    let label = p.name().to_string();
    Parser::new("not_followed_by", move |stream, context| {
        match p.parse(stream, context) {
            ParseResult::Success { .. } => ParseResult::Failure {
                error: crate::error::ParseError::new(
                    stream.position().clone(),
                    ErrorMessage::Unexpected(format!("{label} succeeded")),
                ),
                remaining: stream.clone(),
            },
            ParseResult::Failure { .. } => ParseResult::Success {
                value: (),
                remaining: stream.clone(),
                carried_error: None,
            },
        }
    })
}

impl<S: Stream + 'static, T: 'static> Parser<S, T> {
    /// Method form of [`or`].
    #[must_use]
    pub fn or(&self, other: Parser<S, T>) -> Parser<S, T> {
        or(self.clone(), other)
    }

    /// Method form of [`try_`].
    #[must_use]
    pub fn try_(&self) -> Parser<S, T> {
        try_(self.clone())
    }

    /// Method form of [`lookahead`].
    #[must_use]
    pub fn lookahead(&self) -> Parser<S, T> {
        lookahead(self.clone())
    }

    /// Method form of [`not_followed_by`].
    #[must_use]
    pub fn not_followed_by(&self) -> Parser<S, ()> {
        not_followed_by(self.clone())
    }
}
