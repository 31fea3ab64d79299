//! The parse result: success (value + remaining input, maybe a carried
//! non-fatal error) or failure (error + remaining input).

use crate::error::{EngineError, ParseError};
use crate::stream::Stream;

/// The outcome of running a [`crate::parser::Parser`] once.
///
/// `Success` may carry a non-fatal `ParseError` left over from an
/// alternative that was tried and failed without consuming input — this is
/// what lets a parse that ultimately *succeeds* still explain, on request,
/// what almost went wrong (spec §3/§7). `Failure`'s `remaining` always
/// points at the furthest position that attempt reached, which is how
/// callers such as `or` detect whether input was consumed.
#[derive(Clone, Debug)]
pub enum ParseResult<S, T> {
    /// The parser matched. `remaining` is the stream just past the match.
    Success {
        value: T,
        remaining: S,
        carried_error: Option<ParseError>,
    },
    /// The parser didn't match. `remaining` is the stream at the point the
    /// failure was detected (for computing "did this consume input?").
    Failure { error: ParseError, remaining: S },
}

impl<S: Stream, T> ParseResult<S, T> {
    /// True for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success { .. })
    }

    /// True for `Failure`.
    pub fn is_failure(&self) -> bool {
        matches!(self, ParseResult::Failure { .. })
    }

    /// The stream this result leaves behind, whichever variant it is.
    pub fn remaining(&self) -> &S {
        match self {
            ParseResult::Success { remaining, .. } => remaining,
            ParseResult::Failure { remaining, .. } => remaining,
        }
    }

    /// Maps the success value, preserving `remaining` and `carried_error`
    /// unchanged. A no-op on `Failure`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<S, U> {
        match self {
            ParseResult::Success {
                value,
                remaining,
                carried_error,
            } => ParseResult::Success {
                value: f(value),
                remaining,
                carried_error,
            },
            ParseResult::Failure { error, remaining } => ParseResult::Failure { error, remaining },
        }
    }

    /// Recasts a `Failure` to a different value type `U` (the value type is
    /// phantom on failure, so this is always safe). Panics if called on a
    /// `Success` — callers should only reach for this after checking
    /// `is_failure()`, e.g. inside `bind`'s failure branch.
    pub fn cast_failure<U>(self) -> ParseResult<S, U> {
        match self {
            ParseResult::Failure { error, remaining } => ParseResult::Failure { error, remaining },
            ParseResult::Success { .. } => {
                unreachable!("cast_failure called on a Success result")
            }
        }
    }

    /// Extracts the success value, or raises a [`EngineError`] carrying the
    /// full error object. The "value or raise" convenience from spec §4.D.
    pub fn unwrap_or_raise(self) -> Result<T, EngineError> {
        match self {
            ParseResult::Success { value, .. } => Ok(value),
            ParseResult::Failure { error, .. } => Err(EngineError::Failed(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::stream::CharStream;

    #[test]
    fn test_map_preserves_carried_error() {
        let s = CharStream::new("x", "<t>");
        let err = ParseError::new(Position::initial("<t>"), crate::error::ErrorMessage::EndOfInput);
        let r: ParseResult<CharStream, i32> = ParseResult::Success {
            value: 1,
            remaining: s,
            carried_error: Some(err.clone()),
        };
        let r2 = r.map(|v| v + 1);
        match r2 {
            ParseResult::Success {
                value,
                carried_error,
                ..
            } => {
                assert_eq!(value, 2);
                assert_eq!(carried_error, Some(err));
            }
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn test_unwrap_or_raise() {
        let s = CharStream::new("x", "<t>");
        let err = ParseError::new(Position::initial("<t>"), crate::error::ErrorMessage::EndOfInput);
        let r: ParseResult<CharStream, i32> = ParseResult::Failure {
            error: err,
            remaining: s,
        };
        assert!(r.unwrap_or_raise().is_err());
    }
}
