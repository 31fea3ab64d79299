//! Exact-text and predicate-over-`char` parsers for [`crate::stream::CharStream`].
//!
//! Per spec §1/§6, the engine only needs *some* primitive char parsers to
//! exist and obey the general contract; concrete grammars built from these
//! are out of scope. Grounded on the teacher crate's `parsers/exact.rs`
//! (exact string matching) and `parsers/chars.rs` (character-class
//! predicates), generalized onto the committed-choice `Parser` kernel.

use crate::combinators::primitives::satisfy;
use crate::error::{ErrorMessage, ParseError};
use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::{CharStream, Stream};

/// Matches the literal text `s` exactly, or fails without consuming input.
/// On success, returns the matched text as an owned `String`.
pub fn string(s: &'static str) -> Parser<CharStream, String> {
    Parser::new(format!("string({s:?})"), move |stream: &CharStream, _context| {
        if stream.remaining_str().starts_with(s) {
            let mut remaining = stream.clone();
            for _ in s.chars() {
                remaining = remaining.advance();
            }
            ParseResult::Success {
                value: s.to_string(),
                remaining,
                carried_error: None,
            }
        } else {
            ParseResult::Failure {
                error: ParseError::new(
                    stream.position().clone(),
                    ErrorMessage::Expected(format!("{s:?}")),
                ),
                remaining: stream.clone(),
            }
        }
    })
}

/// Matches a single character equal to `c`.
pub fn char(c: char) -> Parser<CharStream, char> {
    satisfy::<CharStream, _, _>(
        move |ch: &char| *ch == c,
        format!("{c:?}"),
        |ch: &char| format!("{ch:?}"),
    )
}

/// Matches any single ASCII decimal digit, converting it to its numeric
/// value `0`-`9`.
pub fn digit() -> Parser<CharStream, u32> {
    satisfy::<CharStream, _, _>(
        |c: &char| c.is_ascii_digit(),
        "a digit",
        |c: &char| format!("{c:?}"),
    )
    .map(|c| c.to_digit(10).unwrap())
}

/// Matches a single whitespace character (per [`char::is_whitespace`]).
pub fn whitespace() -> Parser<CharStream, char> {
    satisfy::<CharStream, _, _>(
        |c: &char| c.is_whitespace(),
        "whitespace",
        |c: &char| format!("{c:?}"),
    )
}

/// Matches a single alphabetic character.
pub fn letter() -> Parser<CharStream, char> {
    satisfy::<CharStream, _, _>(
        |c: &char| c.is_alphabetic(),
        "a letter",
        |c: &char| format!("{c:?}"),
    )
}
