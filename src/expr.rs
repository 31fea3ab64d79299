//! Operator-precedence expression builder (spec §4.J).
//!
//! Transforms a declarative [`OperatorTable`] (levels, lowest precedence
//! first; each level a set of prefix/infix/postfix operators) into a
//! precedence-climbing parser. Grounded in shape on
//! `other_examples/winnow-rs-winnow`'s `combinator::precedence` module
//! (`Operator`/`UnaryOp`/`BinaryOp`, `Prefix`/`Postfix`/`Infix` newtypes,
//! an `PrecedenceParserExt`-style builder surface) — the teacher crate has
//! no expression builder of its own — adapted onto this crate's
//! committed-choice `Parser` kernel and the spec's exact algorithm
//! (highest-to-lowest level processing; Left-then-Right-then-None
//! per-level tie-break).

use std::cell::RefCell;
use std::rc::Rc;

use crate::combinators::primitives::return_;
use crate::combinators::repeat::many;
use crate::context::Context;
use crate::error::{ErrorMessage, ParseError};
use crate::parser::Parser;
use crate::result::ParseResult;
use crate::stream::Stream;

/// How repeated operators at the same precedence level group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    /// `a ⊕ b ⊕ c = (a ⊕ b) ⊕ c`.
    Left,
    /// `a ⊕ b ⊕ c = a ⊕ (b ⊕ c)`.
    Right,
    /// Two in a row is a static error.
    NonAssoc,
}

type UnaryFn<T> = Rc<dyn Fn(T) -> T>;
type BinaryFn<T> = Rc<dyn Fn(T, T) -> T>;

fn apply1<T>(f: &UnaryFn<T>, v: T) -> T {
    (f.as_ref())(v)
}

fn apply2<T>(f: &BinaryFn<T>, a: T, b: T) -> T {
    (f.as_ref())(a, b)
}

/// A prefix-operator entry: its token parser (already `try`-wrapped so a
/// non-match consumes nothing) and the unary combiner it yields.
pub struct PrefixOp<S, T> {
    parser: Parser<S, UnaryFn<T>>,
}

impl<S, T> Clone for PrefixOp<S, T> {
    fn clone(&self) -> Self {
        PrefixOp {
            parser: self.parser.clone(),
        }
    }
}

/// A postfix-operator entry. See [`PrefixOp`].
pub struct PostfixOp<S, T> {
    parser: Parser<S, UnaryFn<T>>,
}

impl<S, T> Clone for PostfixOp<S, T> {
    fn clone(&self) -> Self {
        PostfixOp {
            parser: self.parser.clone(),
        }
    }
}

/// An infix-operator entry: associativity plus a `try`-wrapped token parser
/// yielding the binary combiner.
pub struct InfixOp<S, T> {
    assoc: Assoc,
    parser: Parser<S, BinaryFn<T>>,
}

impl<S, T> Clone for InfixOp<S, T> {
    fn clone(&self) -> Self {
        InfixOp {
            assoc: self.assoc,
            parser: self.parser.clone(),
        }
    }
}

/// Builds a [`PrefixOp`] from an operator-token parser `op` and a pure
/// `apply: Fn(T) -> T`. `op`'s own value is discarded; only whether it
/// matched matters.
pub fn prefix<S, T, X>(op: Parser<S, X>, apply: impl Fn(T) -> T + 'static) -> PrefixOp<S, T>
where
    S: Stream + 'static,
    T: 'static,
    X: 'static,
{
    let apply: UnaryFn<T> = Rc::new(apply);
    PrefixOp {
        parser: op.try_().map(move |_| apply.clone()),
    }
}

/// Builds a [`PostfixOp`]. See [`prefix`].
pub fn postfix<S, T, X>(op: Parser<S, X>, apply: impl Fn(T) -> T + 'static) -> PostfixOp<S, T>
where
    S: Stream + 'static,
    T: 'static,
    X: 'static,
{
    let apply: UnaryFn<T> = Rc::new(apply);
    PostfixOp {
        parser: op.try_().map(move |_| apply.clone()),
    }
}

/// Builds an [`InfixOp`] of associativity `assoc` from an operator-token
/// parser `op` and a pure `combine: Fn(T, T) -> T`.
pub fn infix<S, T, X>(
    assoc: Assoc,
    op: Parser<S, X>,
    combine: impl Fn(T, T) -> T + 'static,
) -> InfixOp<S, T>
where
    S: Stream + 'static,
    T: 'static,
    X: 'static,
{
    let combine: BinaryFn<T> = Rc::new(combine);
    InfixOp {
        assoc,
        parser: op.try_().map(move |_| combine.clone()),
    }
}

/// One precedence level: a set of prefix, infix, and postfix operators that
/// bind equally tightly.
pub struct Level<S, T> {
    prefix: Vec<PrefixOp<S, T>>,
    infix: Vec<InfixOp<S, T>>,
    postfix: Vec<PostfixOp<S, T>>,
}

impl<S, T> Clone for Level<S, T> {
    fn clone(&self) -> Self {
        Level {
            prefix: self.prefix.clone(),
            infix: self.infix.clone(),
            postfix: self.postfix.clone(),
        }
    }
}

impl<S, T> Level<S, T> {
    /// An empty level; add operators with [`Level::with_prefix`] etc.
    pub fn new() -> Self {
        Level {
            prefix: Vec::new(),
            infix: Vec::new(),
            postfix: Vec::new(),
        }
    }

    /// Adds a prefix operator, in declaration order.
    #[must_use]
    pub fn with_prefix(mut self, op: PrefixOp<S, T>) -> Self {
        self.prefix.push(op);
        self
    }

    /// Adds a postfix operator, in declaration order.
    #[must_use]
    pub fn with_postfix(mut self, op: PostfixOp<S, T>) -> Self {
        self.postfix.push(op);
        self
    }

    /// Adds an infix operator, in declaration order.
    #[must_use]
    pub fn with_infix(mut self, op: InfixOp<S, T>) -> Self {
        self.infix.push(op);
        self
    }
}

/// An ordered list of [`Level`]s, lowest precedence first (spec §3).
pub type OperatorTable<S, T> = Vec<Level<S, T>>;

/// Builds `(prefix_op)* (postfix_op)*`-wrapped unary layer around `term`:
/// collects prefix operators via `try`-backed choice, then `term`, then
/// postfix operators, then composes them (postfix innermost, prefix
/// outermost — `!x++` parses as `!(x++)`, per spec §4.J step 1).
fn build_unary<S, T>(ops: &Level<S, T>, term: Parser<S, T>) -> Parser<S, T>
where
    S: Stream + 'static,
    T: Clone + 'static,
{
    let prefixes: Parser<S, Vec<UnaryFn<T>>> = if ops.prefix.is_empty() {
        return_(Vec::new())
    } else {
        many(choice_ops(ops.prefix.iter().map(|p| p.parser.clone()).collect()))
    };
    let postfixes: Parser<S, Vec<UnaryFn<T>>> = if ops.postfix.is_empty() {
        return_(Vec::new())
    } else {
        many(choice_ops(ops.postfix.iter().map(|p| p.parser.clone()).collect()))
    };

    prefixes.bind(move |pre_ops| {
        let term = term.clone();
        let postfixes = postfixes.clone();
        term.bind(move |value| {
            let pre_ops = pre_ops.clone();
            postfixes.clone().map(move |post_ops| {
                let mut v = value.clone();
                for op in post_ops.iter() {
                    v = apply1(op, v);
                }
                for op in pre_ops.iter().rev() {
                    v = apply1(op, v);
                }
                v
            })
        })
    })
}

/// Left-folds `or` over a set of already-`try`-wrapped operator parsers:
/// declaration order is the tie-break (spec §4.J: "the first that matches
/// wins").
fn choice_ops<S: Stream + 'static, U: 'static>(ops: Vec<Parser<S, U>>) -> Parser<S, U> {
    let mut iter = ops.into_iter();
    let first = iter.next().expect("operator list must be non-empty");
    iter.fold(first, |acc, next| acc.or(next))
}

/// Tries each operator parser in `ops`, in order; returns the first match's
/// value and remaining stream, or `None` if every one failed (all of them
/// are `try`-wrapped, so a non-match never consumes input).
fn try_first<S: Stream + 'static, U: Clone + 'static>(
    ops: &[Parser<S, U>],
    stream: &S,
    context: &Context,
) -> Option<(U, S)> {
    for op in ops {
        if let ParseResult::Success { value, remaining, .. } = op.parse(stream, context) {
            return Some((value, remaining));
        }
    }
    None
}

/// Builds the infix left-fold loop for one level, given its already-built
/// unary-wrapped operand parser. Grounded on spec §4.J step 2: parse one
/// operand, then repeatedly try Left-assoc, then Right-assoc, then
/// Non-assoc operators (in that fixed order, per level, as the spec
/// mandates preserving for test compatibility) until none match.
fn build_infix_level<S, T>(level: Level<S, T>, unary: Parser<S, T>) -> Parser<S, T>
where
    S: Stream + 'static,
    T: Clone + 'static,
{
    if level.infix.is_empty() {
        return unary;
    }

    let lefts: Vec<_> = level
        .infix
        .iter()
        .filter(|o| o.assoc == Assoc::Left)
        .map(|o| o.parser.clone())
        .collect();
    let rights: Vec<_> = level
        .infix
        .iter()
        .filter(|o| o.assoc == Assoc::Right)
        .map(|o| o.parser.clone())
        .collect();
    let nones: Vec<_> = level
        .infix
        .iter()
        .filter(|o| o.assoc == Assoc::NonAssoc)
        .map(|o| o.parser.clone())
        .collect();

    // Forward-declared handle so the Right-assoc branch can recurse into
    // "the same level" (spec §4.J step 2) before the level's own parser
    // value exists. Populated immediately below, before any `.parse()`
    // call can observe it (spec §9's interior-mutability forward
    // declaration technique).
    let self_cell: Rc<RefCell<Option<Parser<S, T>>>> = Rc::new(RefCell::new(None));
    let self_cell_for_closure = self_cell.clone();

    let level_parser = Parser::new("infix_level", move |stream, context: &Context| {
        let (first, mut current, mut acc_error) = match unary.parse(stream, context) {
            ParseResult::Success {
                value,
                remaining,
                carried_error,
            } => (value, remaining, carried_error),
            failure => return failure,
        };
        let mut lhs = first;
        loop {
            if let Some((combine, rhs_start)) = try_first(&lefts, &current, context) {
                match unary.parse(&rhs_start, context) {
                    ParseResult::Success {
                        value: rhs,
                        remaining,
                        carried_error,
                    } => {
                        lhs = apply2(&combine, lhs, rhs);
                        current = remaining;
                        acc_error = merge_opt(acc_error, carried_error);
                        continue;
                    }
                    ParseResult::Failure { error, remaining } => {
                        return ParseResult::Failure { error, remaining };
                    }
                }
            }
            if let Some((combine, rhs_start)) = try_first(&rights, &current, context) {
                let self_parser = self_cell_for_closure
                    .borrow()
                    .clone()
                    .expect("level parser forward-reference not yet populated");
                match self_parser.parse(&rhs_start, context) {
                    ParseResult::Success {
                        value: rhs,
                        remaining,
                        carried_error,
                    } => {
                        lhs = apply2(&combine, lhs, rhs);
                        current = remaining;
                        acc_error = merge_opt(acc_error, carried_error);
                        continue;
                    }
                    ParseResult::Failure { error, remaining } => {
                        return ParseResult::Failure { error, remaining };
                    }
                }
            }
            if let Some((combine, rhs_start)) = try_first(&nones, &current, context) {
                match unary.parse(&rhs_start, context) {
                    ParseResult::Success {
                        value: rhs,
                        remaining,
                        carried_error,
                    } => {
                        lhs = apply2(&combine, lhs, rhs);
                        current = remaining;
                        acc_error = merge_opt(acc_error, carried_error);
                        if try_first(&nones, &current, context).is_some() {
                            return ParseResult::Failure {
                                error: ParseError::new(
                                    current.position().clone(),
                                    ErrorMessage::Message(
                                        "non-associative operator cannot be chained".to_string(),
                                    ),
                                ),
                                remaining: current,
                            };
                        }
                        continue;
                    }
                    ParseResult::Failure { error, remaining } => {
                        return ParseResult::Failure { error, remaining };
                    }
                }
            }
            break;
        }
        ParseResult::Success {
            value: lhs,
            remaining: current,
            carried_error: acc_error,
        }
    });

    *self_cell.borrow_mut() = Some(level_parser.clone());
    level_parser
}

fn merge_opt(a: Option<ParseError>, b: Option<ParseError>) -> Option<ParseError> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(a.merge(b)),
    }
}

/// Builds the full expression parser from an [`OperatorTable`] (lowest
/// precedence first) and a terminal-expression parser. Levels are folded
/// from highest to lowest precedence — i.e. right-to-left over `levels`
/// (spec §4.J) — each producing the next level's operand parser.
pub fn build_expression_parser<S, T>(levels: OperatorTable<S, T>, term: Parser<S, T>) -> Parser<S, T>
where
    S: Stream + 'static,
    T: Clone + 'static,
{
    let mut expr = term;
    for level in levels.into_iter().rev() {
        let unary = build_unary(&level, expr);
        expr = build_infix_level(level, unary);
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::strings::{char, digit};
    use crate::stream::CharStream;

    fn term() -> Parser<CharStream, i64> {
        digit().map(|d| d as i64)
    }

    #[test]
    fn test_s2_left_assoc_arithmetic() {
        let levels = vec![Level::new()
            .with_infix(infix(Assoc::Left, char('+'), |a: i64, b: i64| a + b))
            .with_infix(infix(Assoc::Left, char('-'), |a: i64, b: i64| a - b))];
        let p = build_expression_parser(levels, term());
        match p.run(&CharStream::new("10-5-2", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 3),
            _ => panic!(),
        }
    }

    #[test]
    fn test_s3_right_assoc_exponent() {
        let levels = vec![Level::new().with_infix(infix(
            Assoc::Right,
            char('^'),
            |a: i64, b: i64| a.pow(b as u32),
        ))];
        let p = build_expression_parser(levels, term());
        match p.run(&CharStream::new("2^3^2", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 512),
            _ => panic!(),
        }
    }

    #[test]
    fn test_s4_prefix_and_lower_infix() {
        // level 0 (lowest): '+' left-assoc; level 1 (highest): prefix '-'.
        let levels = vec![
            Level::new().with_infix(infix(Assoc::Left, char('+'), |a: i64, b: i64| a + b)),
            Level::new().with_prefix(prefix(char('-'), |v: i64| -v)),
        ];
        let p = build_expression_parser(levels, term());
        match p.run(&CharStream::new("--5+3", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 8),
            _ => panic!(),
        }
    }

    #[test]
    fn test_prefix_outermost_of_postfix() {
        // `!x++` parses as `!(x++)`.
        let levels = vec![Level::new()
            .with_prefix(prefix(char('!'), |v: i64| -v))
            .with_postfix(postfix(char('+'), |v: i64| v + 100))];
        let p = build_expression_parser(levels, term());
        match p.run(&CharStream::new("!5+", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, -105),
            _ => panic!(),
        }
    }

    #[test]
    fn test_non_assoc_rejects_chaining() {
        let levels = vec![Level::new().with_infix(infix(
            Assoc::NonAssoc,
            char('='),
            |_a: i64, b: i64| b,
        ))];
        let p = build_expression_parser(levels, term());
        assert!(p.run(&CharStream::new("1=2", "<t>")).is_success());
        assert!(p.run(&CharStream::new("1=2=3", "<t>")).is_failure());
    }

    #[test]
    fn test_mixed_precedence_levels() {
        // lower: + -   higher: * /
        let levels = vec![
            Level::new()
                .with_infix(infix(Assoc::Left, char('+'), |a: i64, b: i64| a + b))
                .with_infix(infix(Assoc::Left, char('-'), |a: i64, b: i64| a - b)),
            Level::new()
                .with_infix(infix(Assoc::Left, char('*'), |a: i64, b: i64| a * b))
                .with_infix(infix(Assoc::Left, char('/'), |a: i64, b: i64| a / b)),
        ];
        let p = build_expression_parser(levels, term());
        match p.run(&CharStream::new("2+3*4", "<t>")) {
            ParseResult::Success { value, .. } => assert_eq!(value, 14),
            _ => panic!(),
        }
    }
}
