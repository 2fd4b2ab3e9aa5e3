//! The parser value, the per-parse context, and the top-level entry points.

use std::fmt;
use std::rc::Rc;

use crate::backed_reader::BackedReader;
use crate::error::{ExpectationFailed, Failure, ParseError};
use crate::trace::{NodeId, Trace, TraceArena};

/// How a [`Label`] came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    /// An opaque token such as `<eof>` or `<decimal>`.
    Token,
    /// A name assigned by the grammar author via [`Parser::named`].
    Named,
    /// Reconstructed from the surface syntax that built the parser, such as
    /// `(p | q)` or `many(p)`.
    Derived,
}

/// A textual identifier attached to a parser for diagnostics.
///
/// Token and named labels are *explicit*: when a failure propagates through a
/// parser carrying one, the failure's "expected" is overwritten with it.
/// Derived labels only show up in the trace.
#[derive(Clone, Debug)]
pub struct Label {
    text: String,
    kind: LabelKind,
}

impl Label {
    /// An opaque token label, rendered in angle brackets.
    pub fn token(name: &str) -> Self {
        Label {
            text: format!("<{name}>"),
            kind: LabelKind::Token,
        }
    }

    /// A user-assigned name.
    pub fn named(name: impl Into<String>) -> Self {
        Label {
            text: name.into(),
            kind: LabelKind::Named,
        }
    }

    /// A label reconstructed from surface syntax.
    pub fn derived(text: impl Into<String>) -> Self {
        Label {
            text: text.into(),
            kind: LabelKind::Derived,
        }
    }

    /// The label text as it appears in traces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How this label came to be.
    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Whether a propagating failure should adopt this label as its
    /// expectation.
    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, LabelKind::Token | LabelKind::Named)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Diagnostics configuration for a parse.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Maximum number of input characters quoted per line in a failure
    /// rendering. (Default: `120`)
    pub window: usize,
    /// Maximum number of characters peeked ahead when reporting what was
    /// found instead of an expectation. (Default: `24`)
    pub peek: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            window: 120,
            peek: 24,
        }
    }
}

impl Config {
    /// Sets the [`window`][Self#structfield.window] field.
    #[inline]
    pub fn window(mut self, value: usize) -> Self {
        self.window = value;
        self
    }

    /// Sets the [`peek`][Self#structfield.peek] field.
    #[inline]
    pub fn peek(mut self, value: usize) -> Self {
        self.peek = value;
        self
    }
}

/// Per-parse state: the input reader plus the parse trace under construction.
///
/// A `Context` is created by the top-level parse call and threaded through
/// every parser invocation. It is owned by exactly one parse and must not be
/// shared.
pub struct Context<'a> {
    pub(crate) reader: BackedReader<'a>,
    arena: TraceArena,
    parent: NodeId,
    root: NodeId,
    config: Config,
}

impl<'a> Context<'a> {
    /// Creates a context over `reader`, with a synthetic root trace node.
    pub fn new(reader: BackedReader<'a>, config: Config) -> Self {
        let mut arena = TraceArena::new();
        let root = arena.root_node("<parse>", reader.position());
        Context {
            reader,
            arena,
            parent: root,
            root,
            config,
        }
    }

    /// The reader's current character offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Mutable access to the input reader.
    #[inline]
    pub fn reader(&mut self) -> &mut BackedReader<'a> {
        &mut self.reader
    }

    /// The diagnostics configuration of this parse.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Invokes `parser` under a checkpoint, rewinding the input if it fails.
    ///
    /// This is the building block of every speculative branch: alternation,
    /// optional, repetition termination, and look-ahead all go through it.
    pub fn attempt<T: 'static>(&mut self, parser: &Parser<T>) -> Result<T, Failure> {
        self.reader.begin();
        match parser.apply(self) {
            Ok(value) => {
                self.reader.commit();
                Ok(value)
            }
            Err(failure) => {
                self.reader.abort();
                Err(failure)
            }
        }
    }

    /// Invokes `parser` under a checkpoint that is always rewound, keeping
    /// the result.
    pub fn attempt_peek<T: 'static>(&mut self, parser: &Parser<T>) -> Result<T, Failure> {
        self.reader.begin();
        let result = parser.apply(self);
        self.reader.abort();
        result
    }

    /// The observed input between two character offsets, for reporting what a
    /// speculative branch consumed.
    pub(crate) fn observed(&self, start: usize, end: usize) -> String {
        self.reader.seen().chars().skip(start).take(end - start).collect()
    }

    fn into_error(mut self, failure: Failure) -> ParseError {
        // Complete the observed prefix to the end of the offending line so
        // the rendering can quote it.
        self.reader.fill_line(self.config.window);

        let seen = self.reader.seen();
        let mut line = 1;
        let mut column = 1;
        for c in seen.chars().take(failure.position) {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        self.arena.close(self.root, failure.position, false);
        let trace = Trace::new(
            self.arena,
            self.root,
            seen.to_owned(),
            failure.position,
            self.config.window,
        );
        Box::new(ExpectationFailed {
            expected: failure.expected,
            actual: failure.actual,
            position: failure.position,
            line,
            column,
            trace,
        })
    }
}

/// A composable parser producing a `T`.
///
/// A `Parser` is an immutable descriptor: a label, an invocation function,
/// and optional splice markers. The same parser may be invoked on many
/// inputs, and cloning one only bumps a reference count. Parsers are built
/// from the primitive constructors in this crate and composed with the
/// combinators and the `|`, `>>`, `<<` and `+` operators.
pub struct Parser<T> {
    pub(crate) label: Label,
    pub(crate) splice_start: bool,
    pub(crate) splice_end: bool,
    pub(crate) run: Rc<dyn Fn(&mut Context<'_>) -> Result<T, Failure>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Parser {
            label: self.label.clone(),
            splice_start: self.splice_start,
            splice_end: self.splice_end,
            run: Rc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser").field("label", &self.label).finish()
    }
}

impl<T: 'static> Parser<T> {
    /// Creates a parser from a label and an invocation function.
    ///
    /// The function receives the parse [`Context`] and either produces a
    /// value or a [`Failure`]. It does not have to rewind the input on
    /// failure; whichever enclosing combinator chose to speculate holds the
    /// checkpoint.
    pub fn from_fn(
        label: Label,
        run: impl Fn(&mut Context<'_>) -> Result<T, Failure> + 'static,
    ) -> Self {
        Parser {
            label,
            splice_start: false,
            splice_end: false,
            run: Rc::new(run),
        }
    }

    /// Wraps `inner` as the body of a fresh parser with its own label.
    ///
    /// Both labels appear in the trace, the new one as the parent node.
    pub fn wrapping(label: Label, inner: Parser<T>) -> Self {
        Parser::from_fn(label, move |ctx| inner.apply(ctx))
    }

    /// Invokes this parser, recording a trace node for the invocation.
    ///
    /// On failure, the failure's expectation is overwritten with this
    /// parser's label if the label is explicit.
    pub fn apply(&self, ctx: &mut Context<'_>) -> Result<T, Failure> {
        let start = ctx.reader.position();
        let id = ctx
            .arena
            .open(ctx.parent, self.label.text(), self.splice_start, self.splice_end, start);
        let saved = std::mem::replace(&mut ctx.parent, id);
        let result = (self.run)(ctx);
        ctx.arena.close(id, ctx.reader.position(), result.is_ok());
        ctx.parent = saved;
        match result {
            Err(failure) if self.label.is_explicit() => {
                Err(failure.expecting(self.label.text()))
            }
            other => other,
        }
    }

    /// This parser's label.
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Replaces the label without introducing a trace node.
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Assigns a name to this parser.
    ///
    /// The name shows up in traces in place of the derived label, and
    /// failures propagating through the parser report it as their
    /// expectation.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_label(Label::named(name))
    }

    /// Marks this parser's trace node as the head of a splice scope: when
    /// rendering, everything between it and its splice-end descendants is
    /// discarded.
    pub fn splice_start(mut self) -> Self {
        self.splice_start = true;
        self
    }

    /// Marks this parser's trace node as a splice end; see
    /// [`splice_start`][Self::splice_start].
    pub fn splice_end(mut self) -> Self {
        self.splice_end = true;
        self
    }

    /// Applies `f` to this parser's result.
    ///
    /// Mapping rewrites the descriptor in place: no extra trace node is
    /// introduced and the label is kept.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Parser<U> {
        let Parser {
            label,
            splice_start,
            splice_end,
            run,
        } = self;
        Parser {
            label,
            splice_start,
            splice_end,
            run: Rc::new(move |ctx| run(ctx).map(&f)),
        }
    }

    /// Parses a string slice from its start.
    pub fn parse(&self, input: &str) -> Result<T, ParseError> {
        self.parse_reader(BackedReader::from_str(input))
    }

    /// Parses from a [`BackedReader`] with default diagnostics settings.
    ///
    /// On success the reader is positioned just past what this parser
    /// consumed.
    pub fn parse_reader(&self, reader: BackedReader<'_>) -> Result<T, ParseError> {
        self.parse_with(reader, Config::default())
    }

    /// Parses from a [`BackedReader`] with the given diagnostics settings.
    pub fn parse_with(&self, reader: BackedReader<'_>, config: Config) -> Result<T, ParseError> {
        let mut ctx = Context::new(reader, config);
        match self.apply(&mut ctx) {
            Ok(value) => Ok(value),
            Err(failure) => Err(ctx.into_error(failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::many;
    use crate::primitives::{eof, literal};

    #[test]
    fn derived_labels_read_like_surface_syntax() {
        let p = literal("foo").or(literal("bar"));
        assert_eq!(p.label().text(), "(literal(\"foo\") | literal(\"bar\"))");
        let q = literal("a").then(eof());
        assert_eq!(q.label().text(), "(literal(\"a\") > <eof>)");
    }

    #[test]
    fn named_parsers_overwrite_the_expectation() {
        let p = literal("a").named("letter a");
        let err = p.parse("b").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("letter a"));
    }

    #[test]
    fn derived_labels_leave_the_expectation_alone() {
        let p = literal("a").or(literal("b"));
        let err = p.parse("c").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("\"b\""));
    }

    #[test]
    fn attempt_rewinds_failed_invocations() {
        let mut ctx = Context::new(BackedReader::from_str("foobar"), Config::default());
        let p = literal("foox");
        assert!(ctx.attempt(&p).is_err());
        assert_eq!(ctx.position(), 0);
        let q = literal("foo");
        assert_eq!(ctx.attempt(&q).unwrap(), "foo");
        assert_eq!(ctx.position(), 3);
    }

    #[test]
    fn failures_report_line_and_column() {
        let p = many(literal("a\n")).then(literal("b"));
        let err = p.parse("a\na\nc").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 1);
        assert_eq!(err.position, 4);
    }

    #[test]
    fn config_builder_sets_fields() {
        let config = Config::default().window(40).peek(8);
        assert_eq!(config.window, 40);
        assert_eq!(config.peek, 8);
    }

    #[test]
    fn mapping_keeps_the_trace_flat() {
        let p = literal("foo").map(|s| s.len());
        assert_eq!(p.label().text(), "literal(\"foo\")");
        assert_eq!(p.parse("foo").unwrap(), 3);
    }
}
