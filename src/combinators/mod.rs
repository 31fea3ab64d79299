//! The combinator library built on top of [`crate::parser::Parser`]
//! (spec §4.G-§4.J): primitives, choice/backtracking, char/string
//! primitives, and repetition/sequencing. [`crate::expr`] layers the
//! expression builder on top of these.

pub mod choice;
pub mod primitives;
pub mod repeat;
pub mod strings;
