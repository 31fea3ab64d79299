//! A Parsec-style parser combinator engine.
//!
//! This crate gives you a small set of primitive parsers (matching one
//! token, a literal string, end-of-input, ...) and combinators for
//! sequencing, choice, and repetition that build bigger parsers out of
//! smaller ones, plus an operator-precedence expression builder for the
//! specific, recurring shape of parsing arithmetic-like grammars.
//!
//! # Committed choice
//!
//! [`combinators::choice::or`] is *committed*: once its left alternative has
//! consumed any input, a later failure is final — `or` will not backtrack
//! into the right alternative. This is what lets error messages point at
//! the place a grammar actually went wrong, instead of a confusing pile-up
//! of "could have been any of N things" from naive exhaustive backtracking.
//! When a grammar genuinely needs to try several alternatives that share a
//! prefix, wrap the alternative in [`combinators::choice::try_`] to opt
//! back into full backtracking at that one point.
//!
//! # Errors never go silent
//!
//! Every failure — even one absorbed by `or`, `many`, or `optional` on the
//! way to an overall success — is tracked by position and merged via
//! "furthest progress wins" ([`error::ParseError::merge`]). A successful
//! parse can still report, on request, what the furthest failed attempt
//! almost matched.
//!
//! # Streams
//!
//! Parsers are generic over [`stream::Stream`]: [`stream::CharStream`] for
//! text, [`stream::ByteStream`] for binary formats, and
//! [`stream::TokenStream`] for parsing over an already-lexed token
//! sequence.
//!
//! # Example
//!
//! ```
//! use parsec_core::prelude::*;
//!
//! let digits = many1(digit()).map(|ds| {
//!     ds.into_iter().fold(0u64, |acc, d| acc * 10 + d as u64)
//! });
//! let stream = CharStream::new("1234", "<input>");
//! match digits.run(&stream) {
//!     ParseResult::Success { value, .. } => assert_eq!(value, 1234),
//!     ParseResult::Failure { .. } => panic!("expected success"),
//! }
//! ```

pub mod combinators;
pub mod context;
pub mod error;
pub mod expr;
pub mod parser;
pub mod position;
pub mod result;
pub mod stream;
pub mod testing;
pub mod trace;

/// Everything most callers need, in one `use`.
pub mod prelude {
    pub use crate::combinators::choice::{choice, lookahead, not_followed_by, or, try_};
    pub use crate::combinators::primitives::{any_token, eof, fail_, get_position, lazy, return_, satisfy};
    pub use crate::combinators::repeat::{
        between, chain_left, chain_right, count, end_by, end_by1, many, many1, optional,
        optional_or, sep_by, sep_by1, sep_end_by, sep_end_by1,
    };
    pub use crate::combinators::strings::{char, digit, letter, string, whitespace};
    pub use crate::context::Context;
    pub use crate::error::{EngineError, ErrorMessage, ParseError};
    pub use crate::expr::{build_expression_parser, infix, postfix, prefix, Assoc, Level, OperatorTable};
    pub use crate::parser::Parser;
    pub use crate::position::Position;
    pub use crate::result::ParseResult;
    pub use crate::stream::{ByteStream, CharStream, Stream, TokenStream};
    pub use crate::trace::{TraceCollector, TraceEntry};
}
