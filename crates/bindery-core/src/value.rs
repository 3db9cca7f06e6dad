#![forbid(unsafe_code)]

//! Dynamically typed values exchanged between widgets, proxies and models.
//!
//! # Invariants
//!
//! 1. Objects, widgets and functions compare by identity, everything else
//!    structurally.
//! 2. `Int` and `Float` compare numerically with each other.
//! 3. [`Value::NullVariant`] only ever comes out of a toolkit read; proxies
//!    translate it before handing values to callers.

use std::fmt;
use std::rc::Rc;

use crate::attrs::ObjectRef;
use crate::error::{Error, Result};
use crate::toolkit::WidgetRef;

/// A callable value: slots, builtins and model methods.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    call: Rc<dyn Fn(&[Value]) -> Result<Value>>,
}

impl Function {
    /// Wrap a closure as a named function value.
    pub fn new(name: impl Into<Rc<str>>, call: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            call: Rc::new(call),
        }
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with positional arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.call)(args)
    }

    fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.call), Rc::as_ptr(&other.call))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Fixed-size ordered sequence.
    Tuple(Vec<Value>),
    /// Reactive object (model or proxy).
    Object(ObjectRef),
    /// Live toolkit widget handle.
    Widget(WidgetRef),
    /// Callable.
    Function(Function),
    /// Toolkit null sentinel carrying the type name of the property.
    NullVariant(String),
}

impl Value {
    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
            Self::Object(_) => "object",
            Self::Widget(_) => "widget",
            Self::Function(_) => "function",
            Self::NullVariant(_) => "null",
        }
    }

    /// Whether this is [`Value::None`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Truthiness in boolean contexts.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::None | Self::NullVariant(_) => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(x) => *x != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::Object(_) | Self::Widget(_) | Self::Function(_) => true,
        }
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; booleans count as 0/1.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of any numeric value.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Int(i) => Some(*i as f64),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Boolean view.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow tuple items.
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the object reference.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the widget handle.
    #[must_use]
    pub fn as_widget(&self) -> Option<&WidgetRef> {
        match self {
            Self::Widget(w) => Some(w),
            _ => None,
        }
    }

    /// Expect an integer, with a descriptive error.
    pub fn expect_int(&self, what: &str) -> Result<i64> {
        self.as_int()
            .ok_or_else(|| Error::type_error(format!("{what} expects int, got {}", self.type_name())))
    }

    /// Expect a float, with a descriptive error.
    pub fn expect_float(&self, what: &str) -> Result<f64> {
        self.as_float().ok_or_else(|| {
            Error::type_error(format!("{what} expects a number, got {}", self.type_name()))
        })
    }

    /// Human-readable text, as produced by `str()` in expressions.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Self::Widget(a), Self::Widget(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Self::Function(a), Self::Function(b)) => a.same(b),
            (Self::NullVariant(a), Self::NullVariant(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => write_tuple(f, items),
            Self::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Self::Widget(w) => write!(f, "<widget {}>", w.meta_class().name()),
            Self::Function(func) => write!(f, "{func:?}"),
            Self::NullVariant(t) => write!(f, "<null {t}>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            other => write!(f, "{other:?}"),
        }
    }
}

/// `(a, b)`, with the trailing comma a one-element tuple needs.
fn write_tuple(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item:?}")?;
    }
    if items.len() == 1 {
        f.write_str(",")?;
    }
    f.write_str(")")
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Tuple(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<WidgetRef> for Value {
    fn from(v: WidgetRef) -> Self {
        Self::Widget(v)
    }
}

impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Self::Function(v)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Self::Tuple(vec![a.into(), b.into()])
    }
}
