#![no_main]

//! Builds syntactically plausible expressions from structured input so the
//! evaluator sees deep operator trees rather than mostly lexer rejects.

use arbitrary::Arbitrary;
use bindery_binding::{Context, Expression};
use bindery_core::Value;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Node {
    Int(i64),
    Float(f64),
    Str(String),
    Name(u8),
    Unary(u8, Box<Node>),
    Binary(u8, Box<Node>, Box<Node>),
    Call(u8, Vec<Node>),
    Tuple(Vec<Node>),
    Index(Box<Node>, Box<Node>),
    Conditional(Box<Node>, Box<Node>, Box<Node>),
}

const NAMES: &[&str] = &["a", "b", "s", "t"];
const UNARY: &[&str] = &["-", "+", "not "];
const BINARY: &[&str] = &[
    "+", "-", "*", "/", "//", "%", "**", "==", "!=", "<", "<=", ">", ">=", "and", "or", "in",
    "not in",
];
const FUNCTIONS: &[&str] = &["str", "int", "float", "bool", "len", "abs", "min", "max", "round"];

fn pick<'a>(table: &[&'a str], index: u8) -> &'a str {
    table[usize::from(index) % table.len()]
}

fn render(node: &Node, out: &mut String, depth: usize) {
    if depth > 24 {
        out.push('0');
        return;
    }
    match node {
        Node::Int(v) => out.push_str(&(v & i64::MAX).to_string()),
        Node::Float(v) if v.is_finite() => out.push_str(&format!("{:?}", v.abs())),
        Node::Float(_) => out.push_str("1.5"),
        Node::Str(s) => out.push_str(&format!("{:?}", s.replace(['\\', '"'], ""))),
        Node::Name(i) => out.push_str(pick(NAMES, *i)),
        Node::Unary(op, operand) => {
            out.push_str(pick(UNARY, *op));
            out.push('(');
            render(operand, out, depth + 1);
            out.push(')');
        }
        Node::Binary(op, lhs, rhs) => {
            out.push('(');
            render(lhs, out, depth + 1);
            out.push(' ');
            out.push_str(pick(BINARY, *op));
            out.push(' ');
            render(rhs, out, depth + 1);
            out.push(')');
        }
        Node::Call(f, args) => {
            out.push_str(pick(FUNCTIONS, *f));
            out.push('(');
            render_list(args, out, depth);
            out.push(')');
        }
        Node::Tuple(items) => {
            out.push('(');
            render_list(items, out, depth);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Node::Index(object, index) => {
            out.push('(');
            render(object, out, depth + 1);
            out.push_str(")[");
            render(index, out, depth + 1);
            out.push(']');
        }
        Node::Conditional(then, condition, otherwise) => {
            out.push('(');
            render(then, out, depth + 1);
            out.push_str(" if ");
            render(condition, out, depth + 1);
            out.push_str(" else ");
            render(otherwise, out, depth + 1);
            out.push(')');
        }
    }
}

fn render_list(items: &[Node], out: &mut String, depth: usize) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render(item, out, depth + 1);
    }
}

fuzz_target!(|node: Node| {
    let mut source = String::new();
    render(&node, &mut source, 0);

    let expression = Expression::parse(&source)
        .unwrap_or_else(|err| panic!("rendered source {source:?} failed to parse: {err}"));
    let ctx = Context::new()
        .with("a", 3)
        .with("b", 2.5)
        .with("s", "text")
        .with("t", Value::Tuple(vec![Value::Int(1), Value::from("x")]));
    let _ = expression.eval(&ctx);
});
