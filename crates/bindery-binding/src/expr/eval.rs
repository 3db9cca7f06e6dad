#![forbid(unsafe_code)]

//! Tree-walking evaluator.
//!
//! Arithmetic follows the usual dynamic-language rules: `/` always yields a
//! float, `//` floors, `%` takes the sign of the divisor, integer overflow is
//! an error rather than a wrap. `and`/`or` short-circuit and yield an
//! operand, not a coerced boolean.

use std::cmp::Ordering;

use bindery_core::{Error, Function, Result, Value};

use super::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::context::Context;

/// Evaluate `expr` with names resolved through `ctx`, then builtins.
pub fn eval(expr: &Expr, ctx: &Context) -> Result<Value> {
    match expr {
        Expr::Literal(literal) => Ok(literal_value(literal)),
        Expr::Name(name) => ctx
            .get(name)
            .or_else(|| builtin(name))
            .ok_or_else(|| Error::UndefinedName(name.clone())),
        Expr::Attr { object, name } => match eval(object, ctx)? {
            Value::Object(object) => object.get_attr(name),
            other => Err(Error::type_error(format!(
                "{} has no attribute {name:?}",
                other.type_name()
            ))),
        },
        Expr::Call { func, args } => {
            let callee = eval(func, ctx)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, ctx))
                .collect::<Result<Vec<_>>>()?;
            match callee {
                Value::Function(function) => function.call(&args),
                other => Err(Error::type_error(format!(
                    "{} is not callable",
                    other.type_name()
                ))),
            }
        }
        Expr::Index { object, index } => {
            let object = eval(object, ctx)?;
            let index = eval(index, ctx)?;
            subscript(&object, &index)
        }
        Expr::Unary { op, operand } => unary(*op, eval(operand, ctx)?),
        Expr::Binary { op, left, right } => {
            let left = eval(left, ctx)?;
            match op {
                BinaryOp::And if !left.truthy() => Ok(left),
                BinaryOp::Or if left.truthy() => Ok(left),
                BinaryOp::And | BinaryOp::Or => eval(right, ctx),
                _ => binary(*op, &left, &eval(right, ctx)?),
            }
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, ctx)?.truthy() {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
        Expr::Tuple(items) => items
            .iter()
            .map(|item| eval(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple),
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn overflow() -> Error {
    Error::type_error("integer overflow")
}

fn division_by_zero() -> Error {
    Error::type_error("division by zero")
}

fn unsupported(op: impl std::fmt::Display, left: &Value, right: &Value) -> Error {
    Error::type_error(format!(
        "unsupported operand types for {op}: {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

/// Numeric operand after bool promotion.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(Self::Float(*x)),
            other => other.as_int().map(Self::Int),
        }
    }

    fn float(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(x) => x,
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value> {
    match (op, Num::of(&value)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!value.truthy())),
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Some(Num::Float(x))) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Float(x))) => Ok(Value::Float(x)),
        (_, None) => Err(Error::type_error(format!(
            "bad operand type for unary {op}: {}",
            value.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            let ordering = compare(left, right).ok_or_else(|| unsupported(op, left, right))?;
            Ok(Value::Bool(match op {
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessEq => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::In => contains(right, left).map(Value::Bool),
        BinaryOp::NotIn => contains(right, left).map(|found| Value::Bool(!found)),
        BinaryOp::Add => add(left, right),
        BinaryOp::Mul => multiply(left, right),
        BinaryOp::Sub | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod | BinaryOp::Pow => {
            match (Num::of(left), Num::of(right)) {
                (Some(a), Some(b)) => arithmetic(op, a, b),
                _ => Err(unsupported(op, left, right)),
            }
        }
        // Short-circuit operators are handled by `eval`.
        BinaryOp::And | BinaryOp::Or => Err(unsupported(op, left, right)),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if x != y {
                    return compare(x, y);
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => match (Num::of(left)?, Num::of(right)?) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.float().partial_cmp(&b.float()),
        },
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool> {
    match (container, item) {
        (Value::Tuple(items), _) => Ok(items.contains(item)),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        _ => Err(Error::type_error(format!(
            "cannot test membership of {} in {}",
            item.type_name(),
            container.type_name()
        ))),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        _ => match (Num::of(left), Num::of(right)) {
            (Some(a), Some(b)) => arithmetic(BinaryOp::Add, a, b),
            _ => Err(unsupported("+", left, right)),
        },
    }
}

/// Largest string (in bytes) or tuple a repetition may produce.
const MAX_REPEATED_LEN: usize = 1 << 24;

/// Rough size of a value, counting nested tuple items and string bytes.
fn weight(value: &Value) -> usize {
    match value {
        Value::Str(s) => s.len().max(1),
        Value::Tuple(items) => items.iter().map(weight).fold(1, usize::saturating_add),
        _ => 1,
    }
}

/// How many copies `len * n` asks for; negative counts mean none.
fn repeat_count(len: usize, n: i64) -> Result<usize> {
    let count = usize::try_from(n).unwrap_or(0);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEATED_LEN => Ok(count),
        _ => Err(Error::type_error(format!(
            "repeating {len} items {n} times exceeds {MAX_REPEATED_LEN}"
        ))),
    }
}

fn multiply(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat(repeat_count(s.len(), *n)?)))
        }
        (Value::Tuple(items), Value::Int(n)) | (Value::Int(n), Value::Tuple(items)) => {
            let size = items.iter().map(weight).fold(0, usize::saturating_add);
            let count = repeat_count(size, *n)?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::Tuple(out))
        }
        _ => match (Num::of(left), Num::of(right)) {
            (Some(a), Some(b)) => arithmetic(BinaryOp::Mul, a, b),
            _ => Err(unsupported("*", left, right)),
        },
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> Result<Value> {
    if let (Num::Int(a), Num::Int(b)) = (a, b) {
        return int_arithmetic(op, a, b);
    }
    let (a, b) = (a.float(), b.float());
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => {
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
        }
        BinaryOp::Pow => a.powf(b),
        other => return Err(Error::type_error(format!("{other} is not arithmetic"))),
    };
    Ok(Value::Float(value))
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    let value = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Err(division_by_zero()),
        BinaryOp::Div => return Ok(Value::Float(a as f64 / b as f64)),
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => return Err(division_by_zero()),
        BinaryOp::FloorDiv => a.checked_div(b).map(|q| {
            if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
        }),
        BinaryOp::Mod => a.checked_rem(b).map(|r| {
            if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
        }),
        BinaryOp::Pow if b < 0 => return Ok(Value::Float((a as f64).powf(b as f64))),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        other => return Err(Error::type_error(format!("{other} is not arithmetic"))),
    };
    value.map(Value::Int).ok_or_else(overflow)
}

fn subscript(object: &Value, index: &Value) -> Result<Value> {
    let i = index.expect_int("subscript")?;
    let resolve = |len: usize| {
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let at = if i < 0 { i + len } else { i };
        usize::try_from(at)
            .ok()
            .filter(|_| at < len)
            .ok_or_else(|| Error::type_error(format!("index {i} out of range")))
    };
    match object {
        Value::Tuple(items) => Ok(items[resolve(items.len())?].clone()),
        Value::Str(s) => {
            let at = resolve(s.chars().count())?;
            Ok(s.chars().nth(at).map(String::from).map(Value::Str).unwrap_or_default())
        }
        other => Err(Error::type_error(format!(
            "{} is not subscriptable",
            other.type_name()
        ))),
    }
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::Arity {
            name: name.to_owned(),
            expected,
            got: args.len(),
        })
    }
}

/// Names every expression can call without a context entry.
pub const BUILTINS: &[&str] = &[
    "abs", "bool", "float", "int", "len", "max", "min", "round", "str",
];

/// Look up a builtin function by name.
#[must_use]
pub fn builtin(name: &str) -> Option<Value> {
    let function = match name {
        "str" => Function::new("str", |args| {
            arity("str", args, 1)?;
            Ok(Value::Str(args[0].to_display_string()))
        }),
        "int" => Function::new("int", |args| {
            arity("int", args, 1)?;
            to_int(&args[0]).map(Value::Int)
        }),
        "float" => Function::new("float", |args| {
            arity("float", args, 1)?;
            match &args[0] {
                Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
                    Error::type_error(format!("could not convert {s:?} to float"))
                }),
                other => other.expect_float("float()").map(Value::Float),
            }
        }),
        "bool" => Function::new("bool", |args| {
            arity("bool", args, 1)?;
            Ok(Value::Bool(args[0].truthy()))
        }),
        "len" => Function::new("len", |args| {
            arity("len", args, 1)?;
            let len = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::Tuple(items) => items.len(),
                other => {
                    return Err(Error::type_error(format!(
                        "{} has no len()",
                        other.type_name()
                    )));
                }
            };
            i64::try_from(len).map(Value::Int).map_err(|_| overflow())
        }),
        "abs" => Function::new("abs", |args| {
            arity("abs", args, 1)?;
            match Num::of(&args[0]) {
                Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or_else(overflow),
                Some(Num::Float(x)) => Ok(Value::Float(x.abs())),
                None => Err(Error::type_error(format!(
                    "bad operand type for abs(): {}",
                    args[0].type_name()
                ))),
            }
        }),
        "min" => Function::new("min", |args| extremum("min", args, Ordering::Less)),
        "max" => Function::new("max", |args| extremum("max", args, Ordering::Greater)),
        "round" => Function::new("round", round),
        _ => return None,
    };
    Some(Value::Function(function))
}

fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Float(x) if x.is_finite() => Ok(x.trunc() as i64),
        Value::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::type_error(format!("invalid literal for int(): {s:?}"))),
        other => other.expect_int("int()"),
    }
}

/// `min`/`max` over the arguments, or over a single tuple argument.
fn extremum(name: &str, args: &[Value], keep: Ordering) -> Result<Value> {
    let items = match args {
        [Value::Tuple(items)] => items.as_slice(),
        _ => args,
    };
    let (first, rest) = items
        .split_first()
        .ok_or_else(|| Error::type_error(format!("{name}() of an empty sequence")))?;
    let mut best = first;
    for item in rest {
        let ordering = compare(item, best).ok_or_else(|| unsupported(name, item, best))?;
        if ordering == keep {
            best = item;
        }
    }
    Ok(best.clone())
}

/// `round(x)` rounds half to even and yields an int; `round(x, n)` yields a
/// float with `n` decimal places.
fn round(args: &[Value]) -> Result<Value> {
    match args {
        [x] => {
            let x = x.expect_float("round()")?;
            to_int(&Value::Float(x.round_ties_even())).map(Value::Int)
        }
        [x, digits] => {
            let x = x.expect_float("round()")?;
            let digits = i32::try_from(digits.expect_int("round()")?).map_err(|_| overflow())?;
            let scale = 10f64.powi(digits);
            Ok(Value::Float((x * scale).round_ties_even() / scale))
        }
        _ => Err(Error::Arity {
            name: "round".to_owned(),
            expected: 1,
            got: args.len(),
        }),
    }
}
