//! Source positions.

use std::fmt;
use std::rc::Rc;

/// A location within some named input: a byte/token offset plus the
/// line/column a human would use to talk about it.
///
/// Positions are totally ordered by `offset` alone; `line`/`column` are
/// carried for display purposes only (see [`Position::advance`]).
#[derive(Clone, Debug)]
pub struct Position {
    offset: usize,
    line: usize,
    column: usize,
    source_name: Rc<str>,
}

impl Position {
    /// The position at the very start of `source_name`: offset 0, line 1,
    /// column 1.
    pub fn initial(source_name: impl Into<Rc<str>>) -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
            source_name: source_name.into(),
        }
    }

    /// Byte/token offset from the start of input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column number.
    pub fn column(&self) -> usize {
        self.column
    }

    /// The name of the source this position is within (a file name, or
    /// some other caller-chosen label).
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns the position just past a single `char` of input. A newline
    /// resets the column and bumps the line; anything else just bumps the
    /// column. `offset` always advances by exactly one token regardless of
    /// `ch`'s UTF-8 width — offset here counts *tokens* (chars), not bytes.
    #[must_use]
    pub fn advance(&self, ch: char) -> Position {
        if ch == '\n' {
            Position {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
                source_name: self.source_name.clone(),
            }
        } else {
            Position {
                offset: self.offset + 1,
                line: self.line,
                column: self.column + 1,
                source_name: self.source_name.clone(),
            }
        }
    }

    /// Returns the position after advancing over `n` tokens of a stream
    /// that carries no textual meaning (bytes, arbitrary tokens). `line`
    /// stays at 1 and `column` tracks `offset + 1`; callers that render
    /// diagnostics for such streams should prefer `offset` and ignore
    /// `line`/`column` (see [`crate::stream::ByteStream`]).
    #[must_use]
    pub fn advance_bytes(&self, n: usize) -> Position {
        Position {
            offset: self.offset + n,
            line: self.line,
            column: self.column + n,
            source_name: self.source_name.clone(),
        }
    }

    /// Returns the position after advancing over one opaque token using a
    /// caller-supplied rule. Used by [`crate::stream::TokenStream`], whose
    /// element type isn't necessarily `char`.
    #[must_use]
    pub fn advance_with(&self, next_line: bool) -> Position {
        if next_line {
            Position {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
                source_name: self.source_name.clone(),
            }
        } else {
            Position {
                offset: self.offset + 1,
                line: self.line,
                column: self.column + 1,
                source_name: self.source_name.clone(),
            }
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}
impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line, self.column)
    }
}
