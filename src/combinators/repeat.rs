//! Repetition & sequencing (spec §4.I).
//!
//! `many`'s zero-consume-loop guard is the one piece of mandatory,
//! non-optional engine behavior in this module (spec §4.I, §7, §8
//! property 1): it replaces implementer intuition ("surely my term parser
//! always consumes something") with an enforced invariant, so a
//! mis-written grammar fails loudly and immediately instead of hanging.

use crate::combinators::primitives::{lazy, return_};
use crate::context::Context;
use crate::error::{ErrorMessage, ParseError};
use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::Stream;

/// Merges two optional errors, treating `None` as the identity on both
/// sides.
fn merge_opt_opt(a: Option<ParseError>, b: Option<ParseError>) -> Option<ParseError> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(a.merge(b)),
    }
}

/// Repeatedly runs `p`, accumulating successes into a `Vec`, until it hits
/// a failure that didn't consume input (normal termination) or one that
/// did (propagated as failure). A success that consumes no input is a
/// fatal infinite-loop guard violation (spec §4.I, §8 property 1).
#[must_use]
pub fn many<S: Stream + 'static, T: 'static>(p: Parser<S, T>) -> Parser<S, Vec<T>> {
    Parser::new("many", move |stream, context: &Context| {
        let mut results = Vec::new();
        let mut current = stream.clone();
        let mut acc_error: Option<ParseError> = None;
        loop {
            match p.parse(&current, context) {
                ParseResult::Success {
                    value,
                    remaining,
                    carried_error,
                } => {
                    if remaining == current {
                        return ParseResult::Failure {
                            error: ParseError::new(
                                current.position().clone(),
                                ErrorMessage::Message(format!(
                                    "`{}` did not consume input; `many` would loop forever",
                                    p.name()
                                )),
                            ),
                            remaining: current,
                        };
                    }
                    results.push(value);
                    acc_error = merge_opt_opt(acc_error, carried_error);
                    current = remaining;
                }
                ParseResult::Failure { error, remaining } => {
                    if remaining != current {
                        return ParseResult::Failure { error, remaining };
                    }
                    return ParseResult::Success {
                        value: results,
                        remaining: current,
                        carried_error: merge_opt_opt(acc_error, Some(error)),
                    };
                }
            }
        }
    })
}

/// `many(p)`, but requires at least one match.
#[must_use]
pub fn many1<S: Stream + 'static, T: Clone + 'static>(p: Parser<S, T>) -> Parser<S, Vec<T>> {
    let rest = p.clone();
    p.bind(move |first| {
        many(rest.clone()).map(move |tail| {
            let mut v = Vec::with_capacity(tail.len() + 1);
            v.push(first.clone());
            v.extend(tail);
            v
        })
    })
}

/// Runs `p` exactly `n` times, failing if any iteration fails.
#[must_use]
pub fn count<S: Stream + 'static, T: 'static>(p: Parser<S, T>, n: usize) -> Parser<S, Vec<T>> {
    Parser::new(format!("count({n})"), move |stream, context: &Context| {
        let mut results = Vec::with_capacity(n);
        let mut current = stream.clone();
        let mut acc_error: Option<ParseError> = None;
        for _ in 0..n {
            match p.parse(&current, context) {
                ParseResult::Success {
                    value,
                    remaining,
                    carried_error,
                } => {
                    results.push(value);
                    acc_error = merge_opt_opt(acc_error, carried_error);
                    current = remaining;
                }
                ParseResult::Failure { error, remaining } => {
                    return ParseResult::Failure { error, remaining };
                }
            }
        }
        ParseResult::Success {
            value: results,
            remaining: current,
            carried_error: acc_error,
        }
    })
}

/// Attempts `p`; on a zero-consume failure, succeeds with `None` (input
/// unchanged); on a consumed failure, propagates it; on success, wraps the
/// value in `Some`.
#[must_use]
pub fn optional<S: Stream + 'static, T: 'static>(p: Parser<S, T>) -> Parser<S, Option<T>> {
    Parser::new("optional", move |stream, context| {
        match p.parse(stream, context) {
            ParseResult::Success {
                value,
                remaining,
                carried_error,
            } => ParseResult::Success {
                value: Some(value),
                remaining,
                carried_error,
            },
            ParseResult::Failure { error, remaining } => {
                if remaining == *stream {
                    ParseResult::Success {
                        value: None,
                        remaining: stream.clone(),
                        carried_error: Some(error),
                    }
                } else {
                    ParseResult::Failure { error, remaining }
                }
            }
        }
    })
}

/// Like [`optional`], but substitutes `default` instead of `None`.
#[must_use]
pub fn optional_or<S: Stream + 'static, T: Clone + 'static>(
    p: Parser<S, T>,
    default: T,
) -> Parser<S, T> {
    optional(p).map(move |opt| opt.unwrap_or_else(|| default.clone()))
}

/// Zero or more `p`, separated by `sep`: either empty, or `p (sep p)*`.
/// Separator values are discarded.
#[must_use]
pub fn sep_by<S: Stream + 'static, T: 'static, U: 'static>(
    p: Parser<S, T>,
    sep: Parser<S, U>,
) -> Parser<S, Vec<T>> {
    sep_by1(p, sep).or(return_(Vec::new()))
}

/// `sep_by`, but requires at least one `p`.
#[must_use]
pub fn sep_by1<S: Stream + 'static, T: 'static, U: 'static>(
    p: Parser<S, T>,
    sep: Parser<S, U>,
) -> Parser<S, Vec<T>> {
    let rest_p = p.clone();
    let rest_sep = sep;
    p.bind(move |first| {
        let tail_p = rest_p.clone();
        many(rest_sep.clone().skip_then(tail_p)).map(move |tail| {
            let mut v = Vec::with_capacity(tail.len() + 1);
            v.push(first);
            v.extend(tail);
            v
        })
    })
}

/// Zero or more `p`, each one terminated by `sep` (`(p sep)*`).
#[must_use]
pub fn end_by<S: Stream + 'static, T: 'static, U: 'static>(
    p: Parser<S, T>,
    sep: Parser<S, U>,
) -> Parser<S, Vec<T>>
where
    T: Clone,
{
    many(p.then_skip(sep))
}

/// `end_by`, but requires at least one `p`.
#[must_use]
pub fn end_by1<S: Stream + 'static, T: 'static, U: 'static>(
    p: Parser<S, T>,
    sep: Parser<S, U>,
) -> Parser<S, Vec<T>>
where
    T: Clone,
{
    many1(p.then_skip(sep))
}

/// Zero or more `p` separated by `sep`, with at most one optional trailing
/// `sep` tolerated. A second consecutive separator is not consumed by this
/// combinator (spec §9's open question: this implementation rejects a
/// second trailing separator rather than silently absorbing it).
#[must_use]
pub fn sep_end_by<S, T, U>(p: Parser<S, T>, sep: Parser<S, U>) -> Parser<S, Vec<T>>
where
    S: Stream + 'static,
    T: Clone + 'static,
    U: Clone + 'static,
{
    sep_end_by1(p, sep).or(return_(Vec::new()))
}

/// `sep_end_by`, but requires at least one `p`.
#[must_use]
pub fn sep_end_by1<S, T, U>(p: Parser<S, T>, sep: Parser<S, U>) -> Parser<S, Vec<T>>
where
    S: Stream + 'static,
    T: Clone + 'static,
    U: Clone + 'static,
{
    let p2 = p.clone();
    let sep2 = sep.clone();
    p.bind(move |x| {
        let p3 = p2.clone();
        let sep3 = sep2.clone();
        let x_for_more = x.clone();
        let more = sep2
            .clone()
            .skip_then(lazy(move || sep_end_by(p3.clone(), sep3.clone())))
            .map(move |xs| {
                let mut v = Vec::with_capacity(xs.len() + 1);
                v.push(x_for_more.clone());
                v.extend(xs);
                v
            });
        more.or(return_(vec![x]))
    })
}

/// Left-associative fold: `term (op term)*`, where `op` yields a binary
/// combiner `Fn(T, T) -> T` applied left-to-right. Encodes left-recursive
/// grammars (e.g. `a - b - c = (a - b) - c`) without actual left recursion.
///
/// Sequences `op` and `term` with `bind` rather than `then` (which would
/// require `F: Clone`, a bound the combiner type has no reason to carry).
#[must_use]
pub fn chain_left<S, T, F>(term: Parser<S, T>, op: Parser<S, F>) -> Parser<S, T>
where
    S: Stream + 'static,
    T: Clone + 'static,
    F: Fn(T, T) -> T + 'static,
{
    let term2 = term.clone();
    term.bind(move |first| {
        let term3 = term2.clone();
        let op2 = op.clone();
        let paired = op2.bind(move |f| term3.map(move |rhs| (f, rhs)));
        many(paired).map(move |rest| {
            rest.into_iter()
                .fold(first.clone(), |acc, (f, rhs)| f(acc, rhs))
        })
    })
}

/// Right-associative fold: `term (op chain_right(term, op))?`.
///
/// See [`chain_left`] on why this sequences with `bind` instead of `then`.
#[must_use]
pub fn chain_right<S, T, F>(term: Parser<S, T>, op: Parser<S, F>) -> Parser<S, T>
where
    S: Stream + 'static,
    T: Clone + 'static,
    F: Fn(T, T) -> T + 'static,
{
    let term2 = term.clone();
    let op2 = op.clone();
    term.bind(move |first| {
        let first2 = first.clone();
        let term3 = term2.clone();
        let op3 = op2.clone();
        let term_recur = term3.clone();
        let op_recur = op3.clone();
        let more = op3.bind(move |f| {
            let first3 = first2.clone();
            let term_recur = term_recur.clone();
            let op_recur = op_recur.clone();
            lazy(move || chain_right(term_recur.clone(), op_recur.clone()))
                .map(move |rest| f(first3.clone(), rest))
        });
        more.or(return_(first))
    })
}

/// Matches `open`, then `inner`, then `close`, returning only `inner`'s
/// value.
#[must_use]
pub fn between<S, O, T, C>(open: Parser<S, O>, close: Parser<S, C>, inner: Parser<S, T>) -> Parser<S, T>
where
    S: Stream + 'static,
    O: 'static,
    T: Clone + 'static,
    C: 'static,
{
    open.skip_then(inner).then_skip(close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::primitives::satisfy;
    use crate::combinators::strings::{char, digit, string};
    use crate::stream::CharStream;

    fn digit_char() -> Parser<CharStream, u32> {
        digit()
    }

    #[test]
    fn test_many_zero_or_more() {
        let p = many(char('a'));
        let s = CharStream::new("aaab", "<t>");
        match p.run(&s) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, vec!['a', 'a', 'a']);
                assert_eq!(remaining.remaining_str(), "b");
            }
            _ => panic!(),
        }
        let s0 = CharStream::new("b", "<t>");
        match p.run(&s0) {
            ParseResult::Success { value, .. } => assert_eq!(value, Vec::<char>::new()),
            _ => panic!(),
        }
    }

    #[test]
    fn test_s5_zero_consume_guard() {
        let p = many(return_::<CharStream, i32>(0));
        let s = CharStream::new("anything", "<t>");
        match p.run(&s) {
            ParseResult::Failure { error, .. } => {
                assert!(error.render_terse().contains("did not consume input"));
            }
            _ => panic!("expected the infinite-loop guard to fire"),
        }
    }

    #[test]
    fn test_many_propagates_consumed_failure() {
        // `p` = "ab" as two chars via string; partial match then mismatch
        // on a later repetition must propagate, not silently stop.
        let p = many(string("ab"));
        let s = CharStream::new("ababa", "<t>");
        match p.run(&s) {
            ParseResult::Failure { remaining, .. } => {
                // matched "ab", "ab", then tried again on "a" and failed,
                // consuming "a" as part of matching "ab" partially? "string"
                // fails atomically without partial consumption, so the
                // third attempt fails with zero consumption and many stops.
                assert_eq!(remaining.remaining_str(), "a");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_many1_requires_one() {
        let p = many1(char('a'));
        assert!(p.run(&CharStream::new("", "<t>")).is_failure());
        match p.run(&CharStream::new("aa", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, vec!['a', 'a']),
            _ => panic!(),
        }
    }

    #[test]
    fn test_count_exact() {
        let p = count(char('a'), 3);
        assert!(p.run(&CharStream::new("aa", "<t>")).is_failure());
        match p.run(&CharStream::new("aaa", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value.len(), 3);
                assert!(remaining.is_at_end());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_s8_sep_by_empty() {
        let p = sep_by(digit_char(), char(','));
        match p.run(&CharStream::new("", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert!(value.is_empty());
                assert!(remaining.is_at_end());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_sep_by_several() {
        let p = sep_by(digit_char(), char(','));
        match p.run(&CharStream::new("1,2,3", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, vec![1, 2, 3]),
            _ => panic!(),
        }
    }

    #[test]
    fn test_end_by_trailing_required() {
        let p = end_by(digit_char(), char(';'));
        match p.run(&CharStream::new("1;2;3;", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, vec![1, 2, 3]);
                assert!(remaining.is_at_end());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_sep_end_by_tolerates_one_trailing() {
        let p = sep_end_by(digit_char(), char(','));
        match p.run(&CharStream::new("1,2,3,", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, vec![1, 2, 3]);
                assert!(remaining.is_at_end());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_sep_end_by_rejects_double_trailing() {
        let p = sep_end_by(digit_char(), char(','));
        match p.run(&CharStream::new("1,2,,", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, vec![1, 2]);
                // second comma left unconsumed
                assert_eq!(remaining.remaining_str(), ",");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_s2_chain_left() {
        let op = char('+')
            .map(|_| (|a: i64, b: i64| a + b) as fn(i64, i64) -> i64)
            .or(char('-').map(|_| (|a: i64, b: i64| a - b) as fn(i64, i64) -> i64));
        let term = digit_char().map(|d| d as i64);
        let p = chain_left(term, op);
        match p.run(&CharStream::new("10-5-2", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 3),
            _ => panic!(),
        }
    }

    #[test]
    fn test_s3_chain_right() {
        let op = char('^').map(|_| (|a: i64, b: i64| a.pow(b as u32)) as fn(i64, i64) -> i64);
        let term = digit_char().map(|d| d as i64);
        let p = chain_right(term, op);
        match p.run(&CharStream::new("2^3^2", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 512),
            _ => panic!(),
        }
    }

    #[test]
    fn test_optional() {
        let p = optional(char('a'));
        match p.run(&CharStream::new("a", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, Some('a')),
            _ => panic!(),
        }
        match p.run(&CharStream::new("b", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, None);
                assert_eq!(remaining.remaining_str(), "b");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_between() {
        let p = between(char('('), char(')'), digit_char());
        match p.run(&CharStream::new("(5)", "<t>")) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, 5);
                assert!(remaining.is_at_end());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_satisfy_used_directly_in_repeat() {
        let p = many1(satisfy::<CharStream, _, _>(
            |c: &char| c.is_ascii_alphabetic(),
            "letter",
            |c: &char| format!("{c:?}"),
        ));
        match p.run(&CharStream::new("abc1", "<t>")) {
            ParseResult::Success { value, .. } => {
                assert_eq!(value.into_iter().collect::<String>(), "abc");
            }
            _ => panic!(),
        }
    }
}
