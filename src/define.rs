//! Declaring named combinators whose labels read like the call that built
//! them.

use crate::parser::{Label, Parser};

/// Rendering of a combinator argument inside a reconstructed call label.
///
/// Parsers contribute their own label; plain values contribute a canonical
/// rendering. Labels are cosmetic, so the exact text is not contractual.
pub trait ToLabel {
    /// The text this argument contributes to a call label.
    fn to_label(&self) -> String;
}

impl<T: 'static> ToLabel for Parser<T> {
    fn to_label(&self) -> String {
        self.label().text().to_owned()
    }
}

impl ToLabel for &str {
    fn to_label(&self) -> String {
        format!("{self:?}")
    }
}

impl ToLabel for String {
    fn to_label(&self) -> String {
        format!("{self:?}")
    }
}

impl ToLabel for char {
    fn to_label(&self) -> String {
        format!("{self:?}")
    }
}

impl ToLabel for bool {
    fn to_label(&self) -> String {
        self.to_string()
    }
}

macro_rules! numeric_to_label {
    ($($ty:ty),*) => {
        $(
            impl ToLabel for $ty {
                fn to_label(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

numeric_to_label!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Label {
    /// Reconstructs a call-site-like label: `name(arg₁, arg₂, …)`.
    pub fn call(name: &str, args: &[&dyn ToLabel]) -> Label {
        let rendered: Vec<String> = args.iter().map(|arg| arg.to_label()).collect();
        Label::derived(format!("{}({})", name, rendered.join(", ")))
    }
}

/// Declares a named combinator.
///
/// Wraps an ordinary function returning a [`Parser`] so that the parser it
/// returns is labeled `name(arg₁, arg₂, …)`, with each argument rendered via
/// [`ToLabel`]. By default the body's parser becomes the child of a fresh
/// node carrying the call label, so both show up in the trace:
///
/// ```rust
/// use ruecklauf::{combinator, literal, whitespace, Parser};
///
/// combinator! {
///     /// The word `word`, with trailing spacing consumed.
///     pub fn keyword(word: &str) -> Parser<String> {
///         literal(word) << whitespace()
///     }
/// }
///
/// let p = keyword("let");
/// assert_eq!(p.label().text(), "keyword(\"let\")");
/// assert_eq!(p.parse("let  x").unwrap(), "let");
/// ```
///
/// With the `relabel` marker the body's parser keeps its node and only its
/// label is overwritten:
///
/// ```rust
/// use ruecklauf::{combinator, literal, Parser};
///
/// combinator! {
///     relabel pub fn dash() -> Parser<String> {
///         literal("-")
///     }
/// }
///
/// assert_eq!(dash().label().text(), "dash()");
/// ```
#[macro_export]
macro_rules! combinator {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($arg:ident : $ty:ty),* $(,)?) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        $vis fn $name($($arg: $ty),*) -> $ret {
            let label = $crate::Label::call(
                stringify!($name),
                &[$(&$arg as &dyn $crate::ToLabel),*],
            );
            $crate::Parser::wrapping(label, $body)
        }
    };
    (
        relabel
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($arg:ident : $ty:ty),* $(,)?) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        $vis fn $name($($arg: $ty),*) -> $ret {
            let label = $crate::Label::call(
                stringify!($name),
                &[$(&$arg as &dyn $crate::ToLabel),*],
            );
            $crate::Parser::with_label($body, label)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{literal, whitespace};
    use crate::Parser;

    #[test]
    fn call_labels_render_their_arguments() {
        let p = literal("x");
        let label = Label::call("wrap", &[&p, &"y", &3usize]);
        assert_eq!(label.text(), "wrap(literal(\"x\"), \"y\", 3)");
    }

    combinator! {
        fn keyword(word: &str) -> Parser<String> {
            literal(word) << whitespace()
        }
    }

    combinator! {
        relabel fn dash() -> Parser<String> {
            literal("-")
        }
    }

    #[test]
    fn wrapped_combinators_carry_the_call_label() {
        let p = keyword("let");
        assert_eq!(p.label().text(), "keyword(\"let\")");
        assert_eq!(p.parse("let x").unwrap(), "let");
    }

    #[test]
    fn wrapped_combinators_add_a_trace_node() {
        let err = keyword("let").parse("var").unwrap_err();
        let rendered = err.trace.to_string();
        assert!(rendered.contains("keyword(\"let\")"));
        assert!(rendered.contains("literal(\"let\")"));
    }

    #[test]
    fn relabel_mode_only_renames() {
        let p = dash();
        assert_eq!(p.label().text(), "dash()");
        let err = p.parse("x").unwrap_err();
        let rendered = err.trace.to_string();
        assert!(rendered.contains("dash()"));
        assert!(!rendered.contains("literal(\"-\")"));
    }
}
