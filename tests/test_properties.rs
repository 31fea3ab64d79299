//! Integration-level checks of the two engine-wide properties that unit
//! tests exercise only locally: repeated `many` is idempotent on an
//! exhausted suffix, and source positions track correctly across a
//! composed, multi-combinator parse (not just a single `Position::advance`
//! call).

use parsec_core::prelude::*;

#[test]
fn test_many_idempotent_on_exhausted_suffix() {
    let p = many(char('a'));
    let s = CharStream::new("aaab", "<t>");

    let (first_value, after_first) = match p.run(&s) {
        ParseResult::Success { value, remaining, .. } => (value, remaining),
        ParseResult::Failure { .. } => panic!("expected success"),
    };
    assert_eq!(first_value, vec!['a', 'a', 'a']);

    let (second_value, after_second) = match p.run(&after_first) {
        ParseResult::Success { value, remaining, .. } => (value, remaining),
        ParseResult::Failure { .. } => panic!("expected success"),
    };
    assert!(second_value.is_empty());
    assert_eq!(after_first, after_second);
}

#[test]
fn test_position_tracks_line_and_column_through_many() {
    let text = "ab\ncd";
    let p = many(any_token::<CharStream>());
    let s = CharStream::new(text, "<doc>");
    match p.run(&s) {
        ParseResult::Success { value, remaining, .. } => {
            assert_eq!(value.len(), 5);
            assert!(remaining.is_at_end());
            assert_eq!(remaining.position().line(), 2);
            assert_eq!(remaining.position().column(), 3);
        }
        ParseResult::Failure { error, .. } => panic!("{}", error.render_terse()),
    }
}

#[test]
fn test_position_reported_at_furthest_failure_through_choice() {
    // `or` on a purely zero-consume alternative still reports the position
    // where the failure was observed, not position zero.
    let p = string_ahead();
    match p.run(&CharStream::new("xyz", "<in>")) {
        ParseResult::Failure { error, .. } => {
            assert_eq!(error.position().offset(), 2);
        }
        ParseResult::Success { .. } => panic!("expected failure"),
    }
}

fn string_ahead() -> Parser<CharStream, String> {
    // matches "xy" then requires a 'Z'; committed failure should land right
    // after "xy", not at offset 0.
    string("xy").then_skip(char('Z'))
}
