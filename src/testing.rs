//! Test-only assertion helpers shared by this crate's unit and integration
//! tests. Not gated behind `#[cfg(test)]` so both can import it uniformly
//! (unit tests via `crate::testing`, integration tests via the crate's
//! public name) — the same tradeoff the teacher crate makes for its own
//! `testing.rs`.

use std::fmt::Debug;

use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::Stream;

/// Runs `parser` on `input` and asserts it succeeds with exactly `expected`,
/// having consumed all of `input`.
pub fn assert_parse_eq<S, T>(parser: &Parser<S, T>, input: &S, expected: T)
where
    S: Stream + 'static,
    T: PartialEq + Debug + 'static,
{
    match parser.run(input) {
        ParseResult::Success { value, remaining, .. } => {
            assert_eq!(value, expected, "parsed value mismatch");
            assert!(
                remaining.is_at_end(),
                "parser succeeded but left input unconsumed at {}",
                remaining.position()
            );
        }
        ParseResult::Failure { error, .. } => {
            panic!("expected success, got failure: {}", error.render_terse());
        }
    }
}

/// Runs `parser` on `input` and asserts it succeeds with `expected`,
/// regardless of how much input remains.
pub fn assert_parse_prefix<S, T>(parser: &Parser<S, T>, input: &S, expected: T)
where
    S: Stream + 'static,
    T: PartialEq + Debug + 'static,
{
    match parser.run(input) {
        ParseResult::Success { value, .. } => assert_eq!(value, expected, "parsed value mismatch"),
        ParseResult::Failure { error, .. } => {
            panic!("expected success, got failure: {}", error.render_terse());
        }
    }
}

/// Asserts that `parser` fails on `input`.
pub fn assert_no_parse<S, T>(parser: &Parser<S, T>, input: &S)
where
    S: Stream + 'static,
    T: Debug + 'static,
{
    if let ParseResult::Success { value, .. } = parser.run(input) {
        panic!("expected failure, got success: {value:?}");
    }
}

/// Asserts that `parser` fails on `input` and that the rendered error
/// contains `needle`.
pub fn assert_parse_error<S, T>(parser: &Parser<S, T>, input: &S, needle: &str)
where
    S: Stream + 'static,
    T: Debug + 'static,
{
    match parser.run(input) {
        ParseResult::Success { value, .. } => {
            panic!("expected failure containing {needle:?}, got success: {value:?}");
        }
        ParseResult::Failure { error, .. } => {
            let rendered = error.render_terse();
            assert!(
                rendered.contains(needle),
                "error {rendered:?} does not contain {needle:?}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::strings::digit;
    use crate::stream::CharStream;

    #[test]
    fn test_assert_parse_eq_passes() {
        assert_parse_eq(&digit(), &CharStream::new("5", "<t>"), 5);
    }

    #[test]
    fn test_assert_no_parse_passes() {
        assert_no_parse(&digit(), &CharStream::new("x", "<t>"));
    }

    #[test]
    fn test_assert_parse_error_passes() {
        assert_parse_error(&digit(), &CharStream::new("x", "<t>"), "digit");
    }
}
