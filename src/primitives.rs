//! Leaf parsers: literals, character classes, end-of-input, and the
//! whitespace helpers.

use std::ops::RangeInclusive;

use num_traits::{
    ops::overflowing::{OverflowingAdd, OverflowingMul},
    FromPrimitive, Zero,
};

use crate::combinators::many_1;
use crate::error::Failure;
use crate::parser::{Label, Parser};

/// Matches the exact string `expected`.
///
/// Yields the matched text. On mismatch, fails reporting the quoted string as
/// the expectation and whatever was read as the actual text. The mismatching
/// read is left to the enclosing checkpoint to rewind.
pub fn literal(expected: impl Into<String>) -> Parser<String> {
    let expected = expected.into();
    let label = Label::derived(format!("literal({expected:?})"));
    Parser::from_fn(label, move |ctx| {
        let start = ctx.position();
        let len = expected.chars().count();
        let got = ctx.reader().read(len);
        if got == expected {
            Ok(got)
        } else {
            Err(Failure::at(start)
                .expecting(format!("{expected:?}"))
                .found(got))
        }
    })
}

/// Matches `expected` ignoring character case.
///
/// Yields the text as it appeared in the input.
pub fn ilit(expected: impl Into<String>) -> Parser<String> {
    let expected = expected.into();
    let label = Label::derived(format!("ilit({expected:?})"));
    Parser::from_fn(label, move |ctx| {
        let start = ctx.position();
        let len = expected.chars().count();
        let got = ctx.reader().read(len);
        if got.to_lowercase() == expected.to_lowercase() {
            Ok(got)
        } else {
            Err(Failure::at(start)
                .expecting(format!("{expected:?}"))
                .found(got))
        }
    })
}

/// Matches any single character; fails only at the end of input.
pub fn any_char() -> Parser<char> {
    Parser::from_fn(Label::token("any char"), |ctx| {
        let start = ctx.position();
        ctx.reader()
            .read_char()
            .ok_or_else(|| Failure::at(start).found(""))
    })
}

/// Matches one character contained in `set`.
pub fn char_in(set: impl Into<String>) -> Parser<char> {
    let set = set.into();
    let label = Label::derived(format!("char_in({set:?})"));
    Parser::from_fn(label, move |ctx| {
        let start = ctx.position();
        match ctx.reader().peek_char() {
            Some(c) if set.contains(c) => {
                ctx.reader().read_char();
                Ok(c)
            }
            seen => Err(Failure::at(start)
                .expecting(format!("one of {set:?}"))
                .found(seen.map(String::from).unwrap_or_default())),
        }
    })
}

/// Matches one character within an inclusive range.
pub fn char_range(range: RangeInclusive<char>) -> Parser<char> {
    let label = Label::derived(format!("char_range({range:?})"));
    Parser::from_fn(label, move |ctx| {
        let start = ctx.position();
        match ctx.reader().peek_char() {
            Some(c) if range.contains(&c) => {
                ctx.reader().read_char();
                Ok(c)
            }
            seen => Err(Failure::at(start)
                .expecting(format!("{range:?}"))
                .found(seen.map(String::from).unwrap_or_default())),
        }
    })
}

/// Matches one character satisfying `pred`.
pub fn char_matching(pred: impl Fn(char) -> bool + 'static) -> Parser<char> {
    Parser::from_fn(Label::derived("char_matching(..)"), move |ctx| {
        let start = ctx.position();
        match ctx.reader().peek_char() {
            Some(c) if pred(c) => {
                ctx.reader().read_char();
                Ok(c)
            }
            seen => Err(Failure::at(start)
                .found(seen.map(String::from).unwrap_or_default())),
        }
    })
}

/// Succeeds only at the end of input.
///
/// On failure, reports a peek of the upcoming non-whitespace run as the
/// actual text.
pub fn eof() -> Parser<()> {
    Parser::from_fn(Label::token("eof"), |ctx| {
        if ctx.reader().at_eof() {
            Ok(())
        } else {
            let start = ctx.position();
            let peek = ctx.config().peek;
            let word = ctx.reader().peek_word(peek);
            Err(Failure::at(start).found(word))
        }
    })
}

/// Consumes nothing and yields `value`.
pub fn pure<T: Clone + 'static>(value: T) -> Parser<T> {
    Parser::from_fn(Label::derived("pure(_)"), move |_| Ok(value.clone()))
}

/// Consumes nothing and always fails; the identity of alternation.
pub fn unparseable<T: 'static>() -> Parser<T> {
    Parser::from_fn(Label::token("unparseable"), |ctx| {
        Err(Failure::at(ctx.position()))
    })
}

/// Matches one or more ASCII digits as a decimal number.
///
/// Works for any integer type with overflow-checked arithmetic; overflowing
/// the type is an ordinary parse failure.
pub fn decimal<I>() -> Parser<I>
where
    I: Zero + FromPrimitive + OverflowingAdd + OverflowingMul + 'static,
{
    Parser::from_fn(Label::token("decimal"), |ctx| {
        let start = ctx.position();
        let mut value = I::zero();
        let mut overflow = false;
        let mut digits = String::new();

        while let Some(c) = ctx.reader().peek_char() {
            if !c.is_ascii_digit() {
                break;
            }
            ctx.reader().read_char();
            digits.push(c);

            let (next, overflowed) = value.overflowing_mul(&I::from_u8(10).unwrap());
            overflow |= overflowed;
            let digit = c as u32 - '0' as u32;
            let (next, overflowed) = next.overflowing_add(&I::from_u8(digit as u8).unwrap());
            overflow |= overflowed;
            value = next;
        }

        if digits.is_empty() {
            let peek = ctx.config().peek;
            let word = ctx.reader().peek_word(peek);
            Err(Failure::at(start).found(word))
        } else if overflow {
            Err(Failure::at(start).found(digits))
        } else {
            Ok(value)
        }
    })
}

/// Matches one or more whitespace characters.
pub fn whitespace_1() -> Parser<String> {
    many_1(char_matching(char::is_whitespace))
        .map(|chars| chars.into_iter().collect())
        .with_label(Label::token("whitespace_1"))
}

/// Matches zero or more whitespace characters.
pub fn whitespace() -> Parser<String> {
    Spacing::default().whitespace()
}

/// Runs `inner` with surrounding whitespace consumed.
pub fn spaced<T: 'static>(inner: Parser<T>) -> Parser<T> {
    Spacing::default().spaced(inner)
}

/// A choice of what counts as whitespace.
///
/// The free functions [`whitespace`] and [`spaced`] use plain whitespace
/// characters. A grammar that wants something richer, say comments skipped
/// between tokens, builds a `Spacing` from its own one-or-more parser and
/// uses the same surface on it:
///
/// ```rust
/// use ruecklauf::{join, literal, many_1, take_until, whitespace_1, Spacing};
///
/// let comment = literal("#") + take_until(literal("\n")) + literal("\n");
/// let spacing = Spacing::new(join(many_1(whitespace_1() | comment)));
/// let field = spacing.spaced(literal("x"));
/// assert_eq!(field.parse("  # note\n x").unwrap(), "x");
/// ```
#[derive(Clone)]
pub struct Spacing {
    ws_1: Parser<String>,
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing::new(whitespace_1())
    }
}

impl Spacing {
    /// Creates a spacing from a parser matching one-or-more of whatever
    /// should separate tokens.
    pub fn new(ws_1: Parser<String>) -> Self {
        Spacing { ws_1 }
    }

    /// One or more units of spacing.
    pub fn whitespace_1(&self) -> Parser<String> {
        self.ws_1.clone()
    }

    /// Zero or more units of spacing. Cannot fail.
    pub fn whitespace(&self) -> Parser<String> {
        self.ws_1
            .clone()
            .or(pure(String::new()))
            .with_label(Label::token("whitespace"))
    }

    /// Runs `inner` between two zero-or-more spacing runs.
    pub fn spaced<T: 'static>(&self, inner: Parser<T>) -> Parser<T> {
        let label = Label::call("spaced", &[&inner]);
        Parser::wrapping(label, self.whitespace().then(inner).before(self.whitespace()))
    }
}
