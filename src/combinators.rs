//! Higher-order parsers: alternation, sequencing, repetition, look-ahead,
//! and the recursion operators.

use std::cell::{OnceCell, RefCell};
use std::ops::{Add, BitOr, Rem, Shl, Shr};
use std::rc::Rc;

use crate::define::ToLabel;
use crate::error::Failure;
use crate::parser::{Label, Parser};
use crate::primitives::{any_char, unparseable};

impl<T: 'static> Parser<T> {
    /// Tries `self` under a checkpoint; on failure rewinds and runs `other`.
    ///
    /// Left-biased ordered choice: when `self` succeeds, `other` is never
    /// tried, even if it would have matched more.
    pub fn or(self, other: Parser<T>) -> Parser<T> {
        let label = Label::derived(format!("({} | {})", self.label(), other.label()));
        Parser::from_fn(label, move |ctx| match ctx.attempt(&self) {
            Ok(value) => Ok(value),
            Err(_) => other.apply(ctx),
        })
    }

    /// Runs `self` then `other`, yielding both results.
    ///
    /// No checkpoint is involved: if `other` fails, whatever `self` consumed
    /// stays consumed until an enclosing speculation rewinds it.
    pub fn seq<U: 'static>(self, other: Parser<U>) -> Parser<(T, U)> {
        let label = Label::derived(format!("({} ~ {})", self.label(), other.label()));
        Parser::from_fn(label, move |ctx| {
            let left = self.apply(ctx)?;
            let right = other.apply(ctx)?;
            Ok((left, right))
        })
    }

    /// Runs `self` then `other`, keeping `other`'s result. Also spelled
    /// `self >> other`.
    pub fn then<U: 'static>(self, other: Parser<U>) -> Parser<U> {
        let label = Label::derived(format!("({} > {})", self.label(), other.label()));
        Parser::from_fn(label, move |ctx| {
            self.apply(ctx)?;
            other.apply(ctx)
        })
    }

    /// Runs `self` then `other`, keeping `self`'s result. Also spelled
    /// `self << other`.
    pub fn before<U: 'static>(self, other: Parser<U>) -> Parser<T> {
        let label = Label::derived(format!("({} < {})", self.label(), other.label()));
        Parser::from_fn(label, move |ctx| {
            let value = self.apply(ctx)?;
            other.apply(ctx)?;
            Ok(value)
        })
    }

    /// Succeeds with `self`'s result only where `probe` does not match.
    ///
    /// `probe` is tried under a checkpoint that is always rewound. If it
    /// succeeded, the whole parser fails reporting the probed text;
    /// otherwise `self` runs normally.
    pub fn that_fails<U: 'static>(self, probe: Parser<U>) -> Parser<T> {
        let label = Label::derived(format!("{}.that_fails({})", self.label(), probe.label()));
        let negated = format!("(not {})", probe.label());
        Parser::from_fn(label, move |ctx| {
            let start = ctx.position();
            ctx.reader().begin();
            let probed = probe.apply(ctx);
            let end = ctx.position();
            ctx.reader().abort();
            match probed {
                Ok(_) => Err(Failure::at(start)
                    .expecting(negated.clone())
                    .found(ctx.observed(start, end))),
                Err(_) => self.apply(ctx),
            }
        })
    }
}

/// Alternation; see [`Parser::or`].
impl<T: 'static> BitOr for Parser<T> {
    type Output = Parser<T>;

    fn bitor(self, rhs: Parser<T>) -> Parser<T> {
        self.or(rhs)
    }
}

/// Keep-right sequencing; see [`Parser::then`].
impl<T: 'static, U: 'static> Shr<Parser<U>> for Parser<T> {
    type Output = Parser<U>;

    fn shr(self, rhs: Parser<U>) -> Parser<U> {
        self.then(rhs)
    }
}

/// Keep-left sequencing; see [`Parser::before`].
impl<T: 'static, U: 'static> Shl<Parser<U>> for Parser<T> {
    type Output = Parser<T>;

    fn shl(self, rhs: Parser<U>) -> Parser<T> {
        self.before(rhs)
    }
}

/// Label assignment; `p % "name"` is [`Parser::named`] as an operator.
impl<T: 'static> Rem<&str> for Parser<T> {
    type Output = Parser<T>;

    fn rem(self, name: &str) -> Parser<T> {
        self.named(name)
    }
}

/// Concatenates two string results.
impl Add for Parser<String> {
    type Output = Parser<String>;

    fn add(self, rhs: Parser<String>) -> Parser<String> {
        let label = Label::derived(format!("({} + {})", self.label(), rhs.label()));
        Parser::from_fn(label, move |ctx| {
            let mut left = self.apply(ctx)?;
            left.push_str(&rhs.apply(ctx)?);
            Ok(left)
        })
    }
}

/// Concatenates two sequence results.
impl<T: 'static> Add for Parser<Vec<T>> {
    type Output = Parser<Vec<T>>;

    fn add(self, rhs: Parser<Vec<T>>) -> Parser<Vec<T>> {
        let label = Label::derived(format!("({} + {})", self.label(), rhs.label()));
        Parser::from_fn(label, move |ctx| {
            let mut left = self.apply(ctx)?;
            left.extend(rhs.apply(ctx)?);
            Ok(left)
        })
    }
}

/// Ordered choice over any number of alternatives; an empty list always
/// fails.
///
/// Equivalent to folding the alternatives with `|`, but the chain itself is
/// spliced out of the trace so a failure shows the alternatives directly
/// under the `choice` node.
pub fn choice<T: 'static>(parsers: impl IntoIterator<Item = Parser<T>>) -> Parser<T> {
    let parsers: Vec<Parser<T>> = parsers.into_iter().collect();
    let args: Vec<&dyn ToLabel> = parsers.iter().map(|p| p as &dyn ToLabel).collect();
    let label = Label::call("choice", &args);
    let mut chain = unparseable();
    for parser in parsers {
        chain = chain.or(parser.splice_end());
    }
    Parser::wrapping(label, chain).splice_start()
}

/// Runs every parser in order, yielding all results.
pub fn group<T: 'static>(parsers: impl IntoIterator<Item = Parser<T>>) -> Parser<Vec<T>> {
    let parsers: Vec<Parser<T>> = parsers.into_iter().collect();
    let args: Vec<&dyn ToLabel> = parsers.iter().map(|p| p as &dyn ToLabel).collect();
    let label = Label::call("group", &args);
    Parser::from_fn(label, move |ctx| {
        let mut out = Vec::with_capacity(parsers.len());
        for parser in &parsers {
            out.push(parser.apply(ctx)?);
        }
        Ok(out)
    })
}

/// Concatenates the strings yielded by `inner`.
pub fn join(inner: Parser<Vec<String>>) -> Parser<String> {
    let label = Label::call("join", &[&inner]);
    Parser::wrapping(label, inner.map(|parts| parts.concat()))
}

/// Wraps `inner`'s result in a one-element sequence.
pub fn single<T: 'static>(inner: Parser<T>) -> Parser<Vec<T>> {
    let label = Label::call("single", &[&inner]);
    Parser::wrapping(label, inner.map(|value| vec![value]))
}

/// Tries `inner` under a checkpoint; absence is `None`, never a failure.
pub fn optional<T: 'static>(inner: Parser<T>) -> Parser<Option<T>> {
    let label = Label::call("optional", &[&inner]);
    Parser::from_fn(label, move |ctx| Ok(ctx.attempt(&inner).ok()))
}

/// Applies `inner` as often as it matches, yielding all results. Cannot
/// fail.
///
/// Each round runs under a checkpoint; the first failure is rewound and ends
/// the repetition. A round that succeeds without consuming anything also
/// ends it, since it would otherwise repeat forever.
pub fn many<T: 'static>(inner: Parser<T>) -> Parser<Vec<T>> {
    let label = Label::call("many", &[&inner]);
    Parser::from_fn(label, move |ctx| {
        let mut out = vec![];
        loop {
            let before = ctx.position();
            match ctx.attempt(&inner) {
                Ok(value) => {
                    out.push(value);
                    if ctx.position() == before {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        Ok(out)
    })
}

/// Like [`many`], but the first round must match.
pub fn many_1<T: 'static>(inner: Parser<T>) -> Parser<Vec<T>> {
    let label = Label::call("many_1", &[&inner]);
    Parser::wrapping(label, single(inner.clone()) + many(inner))
}

/// Applies `inner` exactly `n` times.
pub fn count<T: 'static>(inner: Parser<T>, n: usize) -> Parser<Vec<T>> {
    let label = Label::call("count", &[&inner, &n]);
    Parser::from_fn(label, move |ctx| {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(inner.apply(ctx)?);
        }
        Ok(out)
    })
}

/// Zero or more `item`s separated by `sep`; the separator's results are
/// discarded.
pub fn sep_by<S: 'static, T: 'static>(sep: Parser<S>, item: Parser<T>) -> Parser<Vec<T>> {
    let label = Label::call("sep_by", &[&sep, &item]);
    let inner = sep_by_1(sep, item);
    Parser::from_fn(label, move |ctx| {
        Ok(ctx.attempt(&inner).unwrap_or_default())
    })
}

/// One or more `item`s separated by `sep`.
pub fn sep_by_1<S: 'static, T: 'static>(sep: Parser<S>, item: Parser<T>) -> Parser<Vec<T>> {
    let label = Label::call("sep_by_1", &[&sep, &item]);
    Parser::wrapping(label, single(item.clone()) + many(sep.then(item)))
}

/// Runs `inner` bracketed by `left` and `right`, keeping `inner`'s result.
pub fn between<L: 'static, R: 'static, T: 'static>(
    left: Parser<L>,
    right: Parser<R>,
    inner: Parser<T>,
) -> Parser<T> {
    let label = Label::call("between", &[&left, &right, &inner]);
    Parser::wrapping(label, left.then(inner).before(right))
}

/// Runs `inner` under a checkpoint that is always rewound.
///
/// Yields `inner`'s result without consuming anything; fails with `inner`'s
/// failure.
pub fn peek<T: 'static>(inner: Parser<T>) -> Parser<T> {
    let label = Label::call("peek", &[&inner]);
    Parser::from_fn(label, move |ctx| ctx.attempt_peek(&inner))
}

/// Accumulates characters until `stop` would match; `stop` itself is never
/// consumed.
pub fn take_until<S: 'static>(stop: Parser<S>) -> Parser<String> {
    take_until_with(stop, any_char())
}

/// Like [`take_until`], but each accumulated character is read through
/// `with`.
pub fn take_until_with<S: 'static>(stop: Parser<S>, with: Parser<char>) -> Parser<String> {
    let label = Label::call("take_until", &[&stop, &with]);
    Parser::from_fn(label, move |ctx| {
        let mut out = String::new();
        loop {
            if ctx.attempt_peek(&stop).is_ok() {
                return Ok(out);
            }
            out.push(with.apply(ctx)?);
        }
    })
}

/// Defers construction of a parser until it is first invoked, allowing
/// cyclic grammar definitions. The built parser is memoized.
pub fn lazy<T: 'static>(build: impl Fn() -> Parser<T> + 'static) -> Parser<T> {
    let cell: OnceCell<Parser<T>> = OnceCell::new();
    Parser::from_fn(Label::derived("lazy(..)"), move |ctx| {
        cell.get_or_init(&build).apply(ctx)
    })
}

/// Builds the fixpoint of `define`: the parser handed to `define` is a
/// forward reference to the parser `define` returns.
pub fn recursive<T: 'static>(define: impl FnOnce(Parser<T>) -> Parser<T>) -> Parser<T> {
    let slot: Rc<RefCell<Option<Parser<T>>>> = Rc::new(RefCell::new(None));
    let forward = {
        let slot = Rc::clone(&slot);
        Parser::from_fn(Label::derived("recurse"), move |ctx| {
            let parser = slot.borrow().clone();
            match parser {
                Some(parser) => parser.apply(ctx),
                None => undefined_recursion(),
            }
        })
    };
    let built = define(forward);
    *slot.borrow_mut() = Some(built.clone());
    built
}

#[cold]
#[inline(never)]
fn undefined_recursion() -> ! {
    panic!("recursive parser invoked before its definition was completed");
}

/// Left-recursive iteration: parses `seed` once, then repeatedly extends the
/// running result with the parser `step` builds from it.
///
/// Each extension runs under a checkpoint; the first failing one is rewound
/// and the running result is returned. An extension that succeeds without
/// consuming input also ends the loop. Grammars of the shape
/// `expr := expr op operand | operand` become
/// `reduce(operand, |left| ...)`, yielding left-associated results without
/// recursing on the left.
pub fn reduce<T: Clone + 'static>(
    seed: Parser<T>,
    step: impl Fn(T) -> Parser<T> + 'static,
) -> Parser<T> {
    let label = Label::call("reduce", &[&seed]);
    Parser::from_fn(label, move |ctx| {
        let mut acc = seed.apply(ctx)?;
        loop {
            let before = ctx.position();
            let extend = step(acc.clone());
            match ctx.attempt(&extend) {
                Ok(value) => {
                    acc = value;
                    if ctx.position() == before {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        Ok(acc)
    })
}
