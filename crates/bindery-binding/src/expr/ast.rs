#![forbid(unsafe_code)]

//! Expression tree and operator tables.
//!
//! Binding powers, lowest first:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `x if c else y` | right |
//! | 3 | `or` | left |
//! | 5 | `and` | left |
//! | 7 | `not` (prefix) | - |
//! | 9 | `== != < <= > >= in not in` | none |
//! | 11 | `+ -` | left |
//! | 13 | `* / // %` | left |
//! | 15 | `-x +x` (prefix) | - |
//! | 17 | `**` | right |
//! | 19 | `.attr  f(..)  x[i]` | left |

use std::fmt;

use super::token::TokenKind;

/// A constant in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(String),
    /// `object.name`
    Attr { object: Box<Expr>, name: String },
    /// `func(args..)`
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `then if condition else otherwise`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Tuple and list displays both evaluate to a tuple.
    Tuple(Vec<Expr>),
}

impl Expr {
    /// The dotted path this expression spells, if it is nothing but names
    /// joined by attribute access (`a`, `a.b.c`).
    #[must_use]
    pub fn dotted_path(&self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name.clone()),
            Self::Attr { object, name } => {
                let mut path = object.dotted_path()?;
                path.push('.');
                path.push_str(name);
                Some(path)
            }
            _ => None,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

impl UnaryOp {
    /// Right binding power of the operand.
    #[must_use]
    pub const fn binding_power(self) -> u8 {
        match self {
            Self::Not => 7,
            Self::Neg | Self::Pos => 15,
        }
    }

    #[must_use]
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Keyword("not") => Some(Self::Not),
            TokenKind::Minus => Some(Self::Neg),
            TokenKind::Plus => Some(Self::Pos),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Not => "not",
            Self::Neg => "-",
            Self::Pos => "+",
        })
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
    NotIn,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    /// `(left, right)` binding powers.
    #[must_use]
    pub const fn binding_power(self) -> (u8, u8) {
        match self {
            Self::Or => (3, 4),
            Self::And => (5, 6),
            Self::Eq
            | Self::NotEq
            | Self::Less
            | Self::LessEq
            | Self::Greater
            | Self::GreaterEq
            | Self::In
            | Self::NotIn => (9, 10),
            Self::Add | Self::Sub => (11, 12),
            Self::Mul | Self::Div | Self::FloorDiv | Self::Mod => (13, 14),
            Self::Pow => (17, 16),
        }
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        self.binding_power().0 == 9
    }

    /// The operator starting at `kind`. `not in` spans two tokens and is
    /// recognized by the parser.
    #[must_use]
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Keyword("or") => Self::Or,
            TokenKind::Keyword("and") => Self::And,
            TokenKind::Keyword("in") => Self::In,
            TokenKind::EqEq => Self::Eq,
            TokenKind::NotEq => Self::NotEq,
            TokenKind::Less => Self::Less,
            TokenKind::LessEq => Self::LessEq,
            TokenKind::Greater => Self::Greater,
            TokenKind::GreaterEq => Self::GreaterEq,
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Sub,
            TokenKind::Star => Self::Mul,
            TokenKind::Slash => Self::Div,
            TokenKind::SlashSlash => Self::FloorDiv,
            TokenKind::Percent => Self::Mod,
            TokenKind::StarStar => Self::Pow,
            _ => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        })
    }
}

/// Binding power of `.attr`, calls and indexing.
pub const POSTFIX_BINDING_POWER: u8 = 19;

/// Left binding power of the conditional expression.
pub const CONDITIONAL_BINDING_POWER: u8 = 1;
