#![forbid(unsafe_code)]

//! The binding-expression language.
//!
//! Right-hand sides of bindings are small expressions over the binding
//! [`Context`](crate::Context): literals, names, attribute access, calls,
//! indexing, arithmetic, comparisons, boolean operators and the conditional
//! `a if cond else b`. Expressions are parsed once into an [`Expr`] tree and
//! evaluated on every change.
//!
//! | Stage | Module |
//! |-------|--------|
//! | Tokens | [`token`] |
//! | Tree and precedence | [`ast`] |
//! | Pratt parser | [`parser`] |
//! | Evaluation and builtins | [`eval`] |
//! | Dotted-reference extraction | [`refs`] |

pub mod ast;
pub mod eval;
pub mod parser;
pub mod refs;
pub mod token;

use std::fmt;
use std::str::FromStr;

use bindery_core::{Error, Result, Value};

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use eval::{BUILTINS, builtin, eval};
pub use parser::{Parser, parse};
pub use refs::{find_ext_attrs, references};

use crate::context::Context;

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self> {
        let ast = parse(source)?;
        Ok(Self {
            source: source.trim().to_owned(),
            ast,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        eval(&self.ast, ctx)
    }

    /// Dotted references, in order of first occurrence.
    #[must_use]
    pub fn references(&self) -> Vec<String> {
        references(&self.ast)
    }

    /// The path, when the whole expression is a single dotted reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<String> {
        self.ast.dotted_path().filter(|path| path.contains('.'))
    }
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_reference_is_recognized() {
        let expr: Expression = "object.y".parse().unwrap();
        assert_eq!(expr.as_reference().as_deref(), Some("object.y"));
        assert_eq!(expr.references(), ["object.y"]);

        let compound = Expression::parse("object.y + 5").unwrap();
        assert_eq!(compound.as_reference(), None);
        assert_eq!(compound.references(), ["object.y"]);

        assert_eq!(Expression::parse("y").unwrap().as_reference(), None);
    }

    #[test]
    fn keeps_trimmed_source() {
        let expr = Expression::parse("  a.b * 2 ").unwrap();
        assert_eq!(expr.to_string(), "a.b * 2");
    }
}
