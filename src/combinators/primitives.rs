//! Core primitives (spec §4.G): `return_`/`fail_`/`satisfy`/`eof`/
//! `any_token`, plus `lazy` for self-referential grammars (spec §9).

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{ErrorMessage, ParseError};
use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::Stream;

/// Always succeeds with `value`, consuming nothing.
pub fn return_<S: Stream + 'static, T: Clone + 'static>(value: T) -> Parser<S, T> {
    Parser::new("return", move |stream, _context| ParseResult::Success {
        value: value.clone(),
        remaining: stream.clone(),
        carried_error: None,
    })
}

/// Always fails with `Message(msg)` at the current position, consuming
/// nothing.
pub fn fail_<S: Stream + 'static, T: 'static>(msg: impl Into<String> + Clone + 'static) -> Parser<S, T> {
    Parser::new("fail", move |stream, _context| ParseResult::Failure {
        error: ParseError::new(stream.position().clone(), ErrorMessage::Message(msg.clone().into())),
        remaining: stream.clone(),
    })
}

/// Succeeds with the current position, consuming nothing.
pub fn get_position<S: Stream + 'static>() -> Parser<S, crate::position::Position> {
    Parser::new("get_position", |stream, _context| ParseResult::Success {
        value: stream.position().clone(),
        remaining: stream.clone(),
        carried_error: None,
    })
}

/// Succeeds with `()` iff at end of input; otherwise fails
/// `Expected("end of input")`, consuming nothing.
pub fn eof<S: Stream + 'static>() -> Parser<S, ()> {
    Parser::new("eof", |stream, _context| {
        if stream.is_at_end() {
            ParseResult::Success {
                value: (),
                remaining: stream.clone(),
                carried_error: None,
            }
        } else {
            ParseResult::Failure {
                error: ParseError::new(
                    stream.position().clone(),
                    ErrorMessage::Expected("end of input".to_string()),
                ),
                remaining: stream.clone(),
            }
        }
    })
}

/// Matches and returns the next token. Fails with `EndOfInput` (consuming
/// nothing) if already at end.
pub fn any_token<S: Stream + 'static>() -> Parser<S, S::Token> {
    Parser::new("any_token", |stream, _context| match stream.current() {
        Some(tok) => ParseResult::Success {
            value: tok,
            remaining: stream.advance(),
            carried_error: None,
        },
        None => ParseResult::Failure {
            error: ParseError::new(stream.position().clone(), ErrorMessage::EndOfInput),
            remaining: stream.clone(),
        },
    })
}

/// Like `any_token`, but only matches a token accepted by `predicate`.
/// Rejecting (predicate returns false, or end-of-input) fails with both
/// `Expected(expected_label)` and — if a token was present —
/// `Unexpected(description(token))`, consuming nothing.
pub fn satisfy<S, F, D>(predicate: F, expected_label: impl Into<String>, describe: D) -> Parser<S, S::Token>
where
    S: Stream + 'static,
    F: Fn(&S::Token) -> bool + 'static,
    D: Fn(&S::Token) -> String + 'static,
{
    let expected_label = expected_label.into();
    Parser::new("satisfy", move |stream, _context| match stream.current() {
        Some(tok) if predicate(&tok) => ParseResult::Success {
            value: tok,
            remaining: stream.advance(),
            carried_error: None,
        },
        Some(tok) => {
            let mut error = ParseError::new(
                stream.position().clone(),
                ErrorMessage::Expected(expected_label.clone()),
            );
            error = error.merge(ParseError::new(
                stream.position().clone(),
                ErrorMessage::Unexpected(describe(&tok)),
            ));
            ParseResult::Failure {
                error,
                remaining: stream.clone(),
            }
        }
        None => ParseResult::Failure {
            error: ParseError::new(
                stream.position().clone(),
                ErrorMessage::Expected(expected_label.clone()),
            )
            .merge(ParseError::new(
                stream.position().clone(),
                ErrorMessage::EndOfInput,
            )),
            remaining: stream.clone(),
        },
    })
}

/// A parser whose body is built lazily, on its first invocation, breaking
/// self-reference cycles at construction time (spec §9). Equivalent in
/// purpose to the teacher's `RuleSetBuilder`/`RuleParser` forward
/// declarations, generalized to a single combinator: a `RefCell`-backed
/// cell holds the inner parser, populated from `factory` the first time
/// `.parse()` runs.
///
/// ```
/// # use parsec_core::combinators::primitives::lazy;
/// # use parsec_core::stream::CharStream;
/// # use parsec_core::parser::Parser;
/// // A grammar that refers to itself, e.g. balanced parens:
/// // paren := '(' paren? ')'
/// fn grammar() -> Parser<CharStream, ()> {
///     lazy(|| {
///         // ... build using `grammar()` recursively ...
///         parsec_core::combinators::primitives::eof()
///     })
/// }
/// ```
pub fn lazy<S, T, F>(factory: F) -> Parser<S, T>
where
    S: Stream + 'static,
    T: 'static,
    F: Fn() -> Parser<S, T> + 'static,
{
    let cell: Rc<RefCell<Option<Parser<S, T>>>> = Rc::new(RefCell::new(None));
    Parser::new("lazy", move |stream, context: &Context| {
        let inner = {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                *slot = Some(factory());
            }
            slot.as_ref().unwrap().clone()
        };
        inner.parse(stream, context)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::CharStream;

    #[test]
    fn test_return_consumes_nothing() {
        let p = return_::<CharStream, i32>(7);
        let s = CharStream::new("abc", "<t>");
        match p.run(&s) {
            ParseResult::Success { value, remaining, .. } => {
                assert_eq!(value, 7);
                assert_eq!(remaining, s);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_fail_consumes_nothing() {
        let p = fail_::<CharStream, ()>("custom message");
        let s = CharStream::new("abc", "<t>");
        match p.run(&s) {
            ParseResult::Failure { error, remaining } => {
                assert_eq!(remaining, s);
                assert!(error.render_terse().contains("custom message"));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_eof() {
        let s = CharStream::new("", "<t>");
        assert!(eof::<CharStream>().run(&s).is_success());
        let s = CharStream::new("x", "<t>");
        assert!(eof::<CharStream>().run(&s).is_failure());
    }

    #[test]
    fn test_any_token_end_of_input() {
        let s = CharStream::new("", "<t>");
        match any_token::<CharStream>().run(&s) {
            ParseResult::Failure { error, remaining } => {
                assert_eq!(remaining, s);
                assert_eq!(error.messages(), &[ErrorMessage::EndOfInput]);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_satisfy_rejects_without_consuming() {
        let p = satisfy::<CharStream, _, _>(
            |c: &char| c.is_ascii_digit(),
            "digit",
            |c: &char| format!("{:?}", c),
        );
        let s = CharStream::new("a", "<t>");
        match p.run(&s) {
            ParseResult::Failure { error, remaining } => {
                assert_eq!(remaining, s);
                assert!(error.messages().contains(&ErrorMessage::Expected("digit".into())));
                assert!(error
                    .messages()
                    .iter()
                    .any(|m| matches!(m, ErrorMessage::Unexpected(_))));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_lazy_breaks_self_reference() {
        // A "parenthesized digit or bare digit" grammar defined recursively.
        fn inner() -> Parser<CharStream, char> {
            lazy(|| {
                let digit = satisfy::<CharStream, _, _>(
                    |c: &char| c.is_ascii_digit(),
                    "digit",
                    |c: &char| format!("{:?}", c),
                );
                digit
            })
        }
        let s = CharStream::new("5", "<t>");
        match inner().run(&s) {
            ParseResult::Success { value, .. } => assert_eq!(value, '5'),
            _ => panic!(),
        }
    }
}
