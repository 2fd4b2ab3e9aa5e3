use thiserror::Error;

use crate::trace::Trace;

/// An in-flight parse failure.
///
/// Carries what the failing parser was looking for, what it saw instead, and
/// where. The parse trace is not part of the failure; it lives in the
/// [`Context`][crate::Context] and is attached when the failure surfaces from
/// the top-level call as an [`ExpectationFailed`].
///
/// As a failure propagates upward, each enclosing parser with an explicit
/// label (a token or a user-assigned name) overwrites `expected` with that
/// label, so the report names the outermost region the grammar author chose
/// to name.
#[derive(Debug, Clone)]
pub struct Failure {
    /// Label of the expected input, if any parser claimed one.
    pub expected: Option<String>,
    /// The text actually seen, if the failing parser peeked at it. Empty
    /// means the end of input.
    pub actual: Option<String>,
    /// Character offset at which the failure was raised.
    pub position: usize,
}

impl Failure {
    /// Creates a failure at `position` with no expectation attached yet.
    #[cold]
    pub fn at(position: usize) -> Self {
        Failure {
            expected: None,
            actual: None,
            position,
        }
    }

    /// Attaches the label of the expected input.
    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attaches the text that was actually seen.
    pub fn found(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

/// Error produced when a parse fails.
///
/// The `Display` rendering is a headline followed by the full parse trace
/// pinned under the offending input line; see [`Trace`] for the layout.
#[derive(Error, Debug)]
#[error("{}\n{}", headline(.expected, .actual, .line, .column), .trace)]
pub struct ExpectationFailed {
    /// Label of the expected input, if known.
    pub expected: Option<String>,
    /// The text actually seen, if known. Empty means the end of input.
    pub actual: Option<String>,
    /// Character offset of the failure.
    pub position: usize,
    /// Line of the failure, first line is 1.
    pub line: usize,
    /// Column of the failure in characters, first column is 1.
    pub column: usize,
    /// The parse trace at the moment the failure surfaced, splices already
    /// collapsed.
    pub trace: Trace,
}

/// Boxed version of [`ExpectationFailed`], keeping `Result`s small.
pub type ParseError = Box<ExpectationFailed>;

fn headline(
    expected: &Option<String>,
    actual: &Option<String>,
    line: &usize,
    column: &usize,
) -> String {
    let mut msg = match expected {
        Some(expected) => format!("expected {expected}"),
        None => "parse failed".to_owned(),
    };
    match actual {
        Some(actual) if actual.is_empty() => msg.push_str(", found end of input"),
        Some(actual) => msg.push_str(&format!(", found {actual:?}")),
        None => {}
    }
    format!("{msg} at line {line}, column {column}")
}
