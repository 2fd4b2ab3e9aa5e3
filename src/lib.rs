//! Ruecklauf is a small library of backtracking parser combinators.
//!
//! Parsers here are ordinary values: a [`Parser<T>`][Parser] wraps an
//! invocation function together with a textual label, and combinators build
//! bigger parsers out of smaller ones. Three pieces make the combination
//! work:
//!
//! * _Backtracking input_: a [`BackedReader`] wraps any `char` stream and
//!   records what was read under each checkpoint, so a speculative branch
//!   (an alternation arm, an optional, a look-ahead, a repetition round) can
//!   rewind exactly what it consumed. Checkpoints nest and compose, and
//!   rewinding is always the speculating combinator's job; parsers
//!   themselves never clean up after a failed match.
//!
//! * _Combinators_: alternation (`p | q`), sequencing (`p >> q`, `p << q`,
//!   [`Parser::seq`]), mapping, [`optional`], [`many`], [`sep_by`],
//!   [`between`], [`peek`], negative look-ahead
//!   ([`that_fails`][Parser::that_fails]), [`take_until`], plus [`lazy`] and
//!   [`recursive`] for cyclic grammars and [`reduce`] for left-recursive
//!   ones. Alternation is ordered and left-biased: there is no longest-match
//!   rule, the first arm that succeeds wins.
//!
//! * _Failure traces_: every invocation records a node in a per-parse trace
//!   with its label, covered input range, and outcome. A failed parse
//!   returns a [`ParseError`] whose `Display` pins the whole trace under the
//!   offending input line, span by span. Combinators can splice structural
//!   noise out of that rendering; see [`Trace`].
//!
//! ```rust
//! use ruecklauf::{between, decimal, literal};
//!
//! let number = between(literal("<"), literal(">"), decimal::<u32>());
//! assert_eq!(number.parse("<100>").unwrap(), 100);
//!
//! let err = number.parse("<100").unwrap_err();
//! assert_eq!(err.expected.as_deref(), Some("\">\""));
//! println!("{err}");
//! ```
//!
//! Parsing is single-threaded and synchronous: one top-level
//! [`parse`][Parser::parse] call owns its input reader and its trace, and
//! parser invocations form an ordinary call stack. `Parser` values
//! themselves are immutable descriptors that can be reused across any number
//! of parses.
//!
//! There is no error recovery and no incremental re-parsing: a parse either
//! yields the root parser's value or a single [`ExpectationFailed`].

#![warn(missing_docs)]

mod backed_reader;
mod combinators;
mod define;
mod error;
mod parser;
mod primitives;
mod trace;

#[cfg(test)]
mod tests;

pub use backed_reader::BackedReader;
pub use combinators::{
    between, choice, count, group, join, lazy, many, many_1, optional, peek, recursive, reduce,
    sep_by, sep_by_1, single, take_until, take_until_with,
};
pub use define::ToLabel;
pub use error::{ExpectationFailed, Failure, ParseError};
pub use parser::{Config, Context, Label, LabelKind, Parser};
pub use primitives::{
    any_char, char_in, char_matching, char_range, decimal, eof, ilit, literal, pure, spaced,
    unparseable, whitespace, whitespace_1, Spacing,
};
pub use trace::{NodeId, Trace, TraceNode};
