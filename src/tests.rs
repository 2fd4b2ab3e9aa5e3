//! End-to-end grammar tests exercising the public surface.

use assert_matches::assert_matches;

use crate::{
    between, choice, decimal, eof, join, lazy, literal, many, many_1, pure, reduce, sep_by,
    spaced, unparseable, Parser,
};

#[test]
fn bracketed_decimal() {
    let number = between(literal("<"), literal(">"), decimal::<u32>());
    assert_eq!(number.parse("<100>").unwrap(), 100);
}

#[test]
fn ordered_choice() {
    let word = choice([literal("foo"), literal("bar")]);
    assert_eq!(word.parse("bar").unwrap(), "bar");
}

#[test]
fn keep_right_sequencing() {
    let p = literal("foo") >> literal("bar");
    assert_eq!(p.parse("foobar").unwrap(), "bar");
}

#[test]
fn joined_separated_list() {
    let p = join(sep_by(literal(","), literal("foo") | literal("bar")));
    assert_eq!(p.parse("foo,bar").unwrap(), "foobar");
}

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    Num(i64),
    Op(Box<Ast>, String, Box<Ast>),
}

#[test]
fn left_associative_arithmetic() {
    let operand = spaced(decimal::<i64>()).map(Ast::Num);
    let expr = reduce(operand.clone(), move |left| {
        pure(left)
            .seq(spaced(literal("-")))
            .seq(operand.clone())
            .map(|((left, op), right)| Ast::Op(Box::new(left), op, Box::new(right)))
    });

    let num = |n| Box::new(Ast::Num(n));
    let expected = Ast::Op(
        Box::new(Ast::Op(num(5), "-".into(), num(4))),
        "-".into(),
        num(3),
    );
    assert_eq!(expr.parse("5 - 4 - 3").unwrap(), expected);
}

#[test]
fn trailing_input_diagnostic() {
    let p = literal("foo") << eof();
    let err = p.parse("foobar").unwrap_err();

    assert_eq!(err.expected.as_deref(), Some("<eof>"));
    assert_eq!(err.actual.as_deref(), Some("bar"));
    assert_eq!(err.position, 3);
    assert_eq!((err.line, err.column), (1, 4));

    let rendered = err.to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert!(lines[0].starts_with("expected <eof>, found \"bar\" at line 1, column 4"));
    assert!(lines[1].contains("foobar"));

    // Skip the headline and the quoted input line; the rest are marker rows.
    let rows = &lines[2..];
    let lit_row = 2 + rows
        .iter()
        .position(|l| l.contains("literal(\"foo\")"))
        .unwrap();
    let eof_row = 2 + rows.iter().position(|l| l.contains("<eof>")).unwrap();
    let outer_row = 2 + rows
        .iter()
        .position(|l| l.contains("(literal(\"foo\") < <eof>)"))
        .unwrap();
    assert!(lit_row < eof_row && eof_row < outer_row);

    // The success span sits under "foo" and the failure marker just past it.
    assert_eq!(lines[lit_row].find("\\-/"), Some(7));
    assert!(lines[lit_row].contains("success"));
    assert_eq!(lines[eof_row].find('V'), Some(7 + 3));
    assert!(lines[eof_row].contains("failure"));
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Word(String),
    List(Vec<Value>),
}

fn value() -> Parser<Value> {
    let word = literal("foo").map(Value::Word);
    let list = between(
        literal("["),
        literal("]"),
        sep_by(spaced(literal(",")), lazy(value)),
    )
    .map(Value::List);
    list | word
}

#[test]
fn recursive_list_grammar() {
    let leaf = |s: &str| Value::Word(s.to_owned());
    let expected = Value::List(vec![Value::List(vec![Value::List(vec![Value::List(
        vec![leaf("foo"), leaf("foo")],
    )])])]);
    assert_eq!(value().parse("[[[[foo, foo]]]]").unwrap(), expected);
}

#[test]
fn alternation_identity() {
    for input in ["foo", "bar", ""] {
        let plain = literal("foo").parse(input);
        let left = (unparseable() | literal("foo")).parse(input);
        let right = (literal("foo") | unparseable()).parse(input);
        assert_eq!(plain.is_ok(), left.is_ok());
        assert_eq!(plain.is_ok(), right.is_ok());
        if let (Ok(a), Ok(b), Ok(c)) = (plain, left, right) {
            assert_eq!(a, b);
            assert_eq!(a, c);
        }
    }
}

#[test]
fn alternation_associativity() {
    let abc = || (literal("aa"), literal("ab"), literal("b"));
    for input in ["aa", "ab", "b", "x", ""] {
        let (a, b, c) = abc();
        let left = ((a | b) | c).parse(input);
        let (a, b, c) = abc();
        let right = (a | (b | c)).parse(input);
        match (left, right) {
            (Ok(l), Ok(r)) => assert_eq!(l, r),
            (Err(l), Err(r)) => assert_eq!(l.position, r.position),
            (l, r) => panic!("associativity mismatch on {input:?}: {l:?} vs {r:?}"),
        }
    }
}

#[test]
fn map_functoriality() {
    for input in ["a", "x"] {
        let mapped = literal("a").map(|s| s).parse(input);
        let plain = literal("a").parse(input);
        assert_eq!(mapped.is_ok(), plain.is_ok());
        if let (Ok(m), Ok(p)) = (mapped, plain) {
            assert_eq!(m, p);
        }

        let composed = literal("a").map(|s| s.len()).map(|n| n + 1).parse(input);
        let fused = literal("a").map(|s| s.len() + 1).parse(input);
        assert_eq!(composed.is_ok(), fused.is_ok());
        if let (Ok(c), Ok(f)) = (composed, fused) {
            assert_eq!(c, f);
        }
    }
}

#[test]
fn pure_laws() {
    assert_eq!(pure(21).map(|n| n * 2).parse("").unwrap(), 42);
    assert_eq!(pure(21).map(|n| n * 2).parse("").unwrap(), pure(42).parse("").unwrap());

    let p = pure(0) >> literal("x");
    assert_eq!(p.parse("x").unwrap(), literal("x").parse("x").unwrap());
    let q = literal("x") << pure(0);
    assert_eq!(q.parse("x").unwrap(), literal("x").parse("x").unwrap());
}

#[test]
fn repetition_cannot_fail() {
    for input in ["", "b", "aaa", "aab"] {
        assert_matches!(many(literal("a")).parse(input), Ok(_));
    }
    let from_many = many(literal("a")).parse("aaa").unwrap();
    let from_many_1 = many_1(literal("a")).parse("aaa").unwrap();
    assert_eq!(from_many, from_many_1);
}

#[test]
fn splice_collapse_hides_the_alternation_chain() {
    let p = choice([literal("foo"), literal("bar")]);
    let err = p.parse("qux").unwrap_err();

    let trace = &err.trace;
    let choice_node = trace.children(trace.root()).next().unwrap();
    assert!(choice_node.label().starts_with("choice("));
    let children: Vec<_> = trace
        .children(choice_node)
        .map(|node| node.label().to_owned())
        .collect();
    assert_eq!(children, ["literal(\"foo\")", "literal(\"bar\")"]);

    let rendered = err.to_string();
    assert!(!rendered.contains("<unparseable>"));
    assert!(!rendered.contains("(("));
}

#[test]
fn failure_rewinds_to_the_furthest_surviving_checkpoint() {
    // The failing arm consumes "foo" before dying; the second arm must see
    // the input from the start again.
    let p = (literal("foo") >> literal("x")) | literal("foobar");
    assert_eq!(p.parse("foobar").unwrap(), "foobar");
}

#[test]
fn errors_quote_the_right_line() {
    let row = join(many_1(literal("ab"))) << literal("\n");
    let p = many_1(row) << eof();
    let err = p.parse("abab\nabx\n").unwrap_err();
    assert_eq!(err.line, 2);
    let rendered = err.to_string();
    assert!(rendered.lines().nth(1).unwrap().contains("abx"));
    assert!(!rendered.lines().nth(1).unwrap().contains("abab\n"));
}
