//! The polymorphic parser value and its compose/run contract (spec §4.E).

use std::rc::Rc;

use crate::context::Context;
use crate::error::ErrorMessage;
use crate::result::ParseResult;
use crate::stream::Stream;

/// An immutable parser value: a function `(stream, context) -> result` plus
/// a human-readable name. Parsers are pure — no ambient mutable state — and
/// re-entrant, so a single value may be shared across threads or called
/// recursively (spec §5).
///
/// Cloning a `Parser` is cheap: it's a name plus an `Rc`'d closure.
pub struct Parser<S, T> {
    name: Rc<str>,
    func: Rc<dyn Fn(&S, &Context) -> ParseResult<S, T>>,
}

impl<S, T> Clone for Parser<S, T> {
    fn clone(&self) -> Self {
        Parser {
            name: self.name.clone(),
            func: self.func.clone(),
        }
    }
}

impl<S: Stream + 'static, T: 'static> Parser<S, T> {
    /// Builds a parser named `name` from its matching function.
    pub fn new(
        name: impl Into<Rc<str>>,
        func: impl Fn(&S, &Context) -> ParseResult<S, T> + 'static,
    ) -> Self {
        Parser {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// This parser's display name (used in traces, not in error text —
    /// `named` and error rendering are deliberately separate concerns).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs this parser on `stream` in `context`. The top-level driver: when
    /// `context` has tracing enabled, records an entry before delegating to
    /// the underlying function and an exit after. The non-tracing path
    /// performs a single branch and otherwise pays nothing for trace
    /// plumbing.
    pub fn parse(&self, stream: &S, context: &Context) -> ParseResult<S, T> {
        let Some(collector) = context.trace() else {
            return (self.func)(stream, context);
        };
        collector.enter(&self.name, stream.position());
        let result = (self.func)(stream, context);
        match &result {
            ParseResult::Success { remaining, .. } => {
                collector.exit(remaining.position(), true, None);
            }
            ParseResult::Failure { error, remaining } => {
                collector.exit(remaining.position(), false, Some(error.render_terse()));
            }
        }
        result
    }

    /// Convenience entry point for running a parser from scratch, with a
    /// fresh non-tracing context.
    pub fn run(&self, stream: &S) -> ParseResult<S, T> {
        self.parse(stream, &Context::new())
    }

    /// Returns a parser identical to `self` but displayed as `name` in
    /// traces. Never affects error text.
    #[must_use]
    pub fn named(&self, name: impl Into<Rc<str>>) -> Self {
        Parser {
            name: name.into(),
            func: self.func.clone(),
        }
    }

    /// On failure only, replaces the error's message set with a single
    /// `Expected(label)`, preserving position and context stack. On success,
    /// a no-op.
    #[must_use]
    pub fn with_expected(&self, label: impl Into<Rc<str>>) -> Self {
        let inner = self.func.clone();
        let label = label.into();
        Parser::new(self.name.clone(), move |stream, context| {
            match inner(stream, context) {
                ParseResult::Failure { error, remaining } => ParseResult::Failure {
                    error: error.with_expected(label.to_string()),
                    remaining,
                },
                success => success,
            }
        })
    }

    /// On failure only, prepends `label` to the error's context stack. On
    /// success, a no-op.
    #[must_use]
    pub fn with_context(&self, label: impl Into<Rc<str>>) -> Self {
        let inner = self.func.clone();
        let label = label.into();
        Parser::new(self.name.clone(), move |stream, context| {
            match inner(stream, context) {
                ParseResult::Failure { error, remaining } => ParseResult::Failure {
                    error: error.with_context(label.to_string()),
                    remaining,
                },
                success => success,
            }
        })
    }

    /// Maps the success value through `f`. Preserves `remaining` and
    /// `carried_error`; a no-op on failure.
    #[must_use]
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Parser<S, U> {
        let inner = self.func.clone();
        Parser::new(format!("map({})", self.name), move |stream, context| {
            match inner(stream, context) {
                ParseResult::Success {
                    value,
                    remaining,
                    carried_error,
                } => ParseResult::Success {
                    value: f(value),
                    remaining,
                    carried_error,
                },
                ParseResult::Failure { error, remaining } => {
                    ParseResult::Failure { error, remaining }
                }
            }
        })
    }

    /// Monadic bind (spec §4.E): runs `self`; on success, runs `k(value)` at
    /// the resulting position and merges errors per the bind contract:
    ///
    /// 1. `self` fails -> that failure, recast to `U`.
    /// 2. `self` succeeds with `(v, rem, err_p?)` -> run `k(v)` at `rem`.
    /// 3. that fails with `err_q` -> fail at `rem_q` with `err_p.merge(err_q)`
    ///    (or just `err_q` if there was no `err_p`).
    /// 4. that succeeds -> succeed at `rem_q` with `k`'s value, carrying the
    ///    merge of `err_p` and `k`'s own carried error.
    #[must_use]
    pub fn bind<U: 'static>(&self, k: impl Fn(T) -> Parser<S, U> + 'static) -> Parser<S, U> {
        let inner = self.func.clone();
        Parser::new(format!("bind({})", self.name), move |stream, context| {
            match inner(stream, context) {
                ParseResult::Failure { error, remaining } => {
                    ParseResult::Failure { error, remaining }
                }
                ParseResult::Success {
                    value,
                    remaining,
                    carried_error: err_p,
                } => {
                    let next = k(value);
                    match next.parse(&remaining, context) {
                        ParseResult::Failure {
                            error: err_q,
                            remaining: rem_q,
                        } => ParseResult::Failure {
                            error: err_q.merge_opt(err_p),
                            remaining: rem_q,
                        },
                        ParseResult::Success {
                            value: v2,
                            remaining: rem_q,
                            carried_error: err_q,
                        } => {
                            let merged = match (err_p, err_q) {
                                (None, None) => None,
                                (Some(a), None) => Some(a),
                                (None, Some(b)) => Some(b),
                                (Some(a), Some(b)) => Some(a.merge(b)),
                            };
                            ParseResult::Success {
                                value: v2,
                                remaining: rem_q,
                                carried_error: merged,
                            }
                        }
                    }
                }
            }
        })
    }

    /// Sequences `self` then `next`, keeping only `self`'s value (spec
    /// §4.I's `then_skip`).
    #[must_use]
    pub fn then_skip<U: 'static>(&self, next: Parser<S, U>) -> Parser<S, T>
    where
        T: Clone,
    {
        self.bind(move |v| {
            let v = v.clone();
            next.map(move |_| v.clone())
        })
    }

    /// Sequences `self` then `next`, keeping only `next`'s value (spec
    /// §4.I's `skip_then`).
    #[must_use]
    pub fn skip_then<U: 'static>(&self, next: Parser<S, U>) -> Parser<S, U> {
        self.bind(move |_| next.clone())
    }

    /// Sequences `self` then `next`, keeping both values as a tuple (spec
    /// §4.I's `then`).
    #[must_use]
    pub fn then<U: 'static>(&self, next: Parser<S, U>) -> Parser<S, (T, U)>
    where
        T: Clone,
    {
        self.bind(move |v| {
            let v = v.clone();
            next.map(move |u| (v.clone(), u))
        })
    }

    /// Succeeds with the same value iff `predicate` accepts it; otherwise
    /// fails (without un-consuming input) with `Expected(label)` if given,
    /// else a generic `Message`.
    #[must_use]
    pub fn filter(
        &self,
        predicate: impl Fn(&T) -> bool + 'static,
        expected_label: Option<&'static str>,
    ) -> Parser<S, T> {
        let inner = self.func.clone();
        Parser::new(format!("filter({})", self.name), move |stream, context| {
            match inner(stream, context) {
                ParseResult::Success {
                    value,
                    remaining,
                    carried_error,
                } => {
                    if predicate(&value) {
                        ParseResult::Success {
                            value,
                            remaining,
                            carried_error,
                        }
                    } else {
                        let message = match expected_label {
                            Some(label) => ErrorMessage::Expected(label.to_string()),
                            None => ErrorMessage::Message(
                                "value rejected by filter predicate".to_string(),
                            ),
                        };
                        ParseResult::Failure {
                            error: crate::error::ParseError::new(
                                remaining.position().clone(),
                                message,
                            ),
                            remaining,
                        }
                    }
                }
                failure => failure,
            }
        })
    }
}
