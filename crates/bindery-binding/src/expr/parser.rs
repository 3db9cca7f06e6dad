#![forbid(unsafe_code)]

//! Pratt parser for binding expressions.
//!
//! [`Parser::parse_expr`] parses a prefix term, then folds in infix and
//! postfix operators while their left binding power is at least the caller's
//! minimum. Binding powers live on the operator enums in [`super::ast`].

use bindery_core::{Error, Result};

use super::ast::{
    BinaryOp, CONDITIONAL_BINDING_POWER, Expr, Literal, POSTFIX_BINDING_POWER, UnaryOp,
};
use super::token::{Token, TokenKind, tokenize};

/// Parser over a token buffer.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            position: 0,
        })
    }

    /// Parse one complete expression; trailing tokens are an error.
    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr(0)?;
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            return Err(self.error_at(token, format!("unexpected {}", token.kind)));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        // The buffer always ends with Eof and `advance` never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let index = (self.position + n).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(self.error_at(token, format!("expected {kind}, found {}", token.kind)))
        }
    }

    fn error_at(&self, token: &Token, message: String) -> Error {
        Error::Parse {
            offset: token.offset,
            message,
        }
    }

    /// The infix operator at the cursor and how many tokens it spans.
    fn peek_binary(&self) -> Option<(BinaryOp, usize)> {
        match (&self.peek().kind, self.peek_nth(1)) {
            (TokenKind::Keyword("not"), TokenKind::Keyword("in")) => Some((BinaryOp::NotIn, 2)),
            (kind, _) => BinaryOp::from_token(kind).map(|op| (op, 1)),
        }
    }

    /// Parse an expression whose operators bind at least as tightly as
    /// `min_bp`.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            match self.peek().kind {
                TokenKind::Dot | TokenKind::LParen | TokenKind::LBracket => {
                    if POSTFIX_BINDING_POWER < min_bp {
                        break;
                    }
                    lhs = self.parse_postfix(lhs)?;
                    continue;
                }
                TokenKind::Keyword("if") => {
                    if CONDITIONAL_BINDING_POWER < min_bp {
                        break;
                    }
                    lhs = self.parse_conditional(lhs)?;
                    continue;
                }
                _ => {}
            }

            let Some((op, width)) = self.peek_binary() else {
                break;
            };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            for _ in 0..width {
                self.advance();
            }
            let rhs = self.parse_expr(r_bp)?;
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };

            let chained = self
                .peek_binary()
                .is_some_and(|(next, _)| next.is_comparison());
            if op.is_comparison() && chained {
                let token = self.peek();
                return Err(self.error_at(
                    token,
                    "chained comparisons are not supported; use `and`".to_owned(),
                ));
            }
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let offset = token.offset;

        if let Some(op) = UnaryOp::from_token(&token.kind) {
            self.advance();
            let operand = self.parse_expr(op.binding_power())?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let literal = match token.kind {
            TokenKind::Int(i) => Literal::Int(i),
            TokenKind::Float(x) => Literal::Float(x),
            TokenKind::Str(s) => {
                self.advance();
                // Adjacent string literals concatenate.
                let mut text = s;
                while let TokenKind::Str(more) = &self.peek().kind {
                    text.push_str(more);
                    self.advance();
                }
                return Ok(Expr::Literal(Literal::Str(text)));
            }
            TokenKind::Keyword("True") => Literal::Bool(true),
            TokenKind::Keyword("False") => Literal::Bool(false),
            TokenKind::Keyword("None") => Literal::None,
            TokenKind::Name(name) => {
                self.advance();
                return Ok(Expr::Name(name));
            }
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_sequence(&TokenKind::RBracket)?.0;
                return Ok(Expr::Tuple(items));
            }
            TokenKind::Keyword(word) => {
                return Err(Error::Parse {
                    offset,
                    message: format!("keyword `{word}` is not supported"),
                });
            }
            other => {
                return Err(Error::Parse {
                    offset,
                    message: format!("expected expression, found {other}"),
                });
            }
        };
        self.advance();
        Ok(Expr::Literal(literal))
    }

    /// `( )`, `(x)` or a tuple display.
    fn parse_parenthesized(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let (mut items, trailing_comma) = self.parse_sequence(&TokenKind::RParen)?;
        if items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Expr::Tuple(items))
    }

    /// Comma-separated expressions up to and including `close`. Also
    /// reports whether the last item was followed by a comma.
    fn parse_sequence(&mut self, close: &TokenKind) -> Result<(Vec<Expr>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while !self.check(close) {
            items.push(self.parse_expr(0)?);
            trailing_comma = self.eat(&TokenKind::Comma);
            if !trailing_comma {
                break;
            }
        }
        self.expect(close)?;
        Ok((items, trailing_comma))
    }

    fn parse_postfix(&mut self, lhs: Expr) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Dot => {
                let member = self.advance();
                match &member.kind {
                    TokenKind::Name(name) => Ok(Expr::Attr {
                        object: Box::new(lhs),
                        name: name.clone(),
                    }),
                    other => Err(self.error_at(
                        &member,
                        format!("expected attribute name after `.`, found {other}"),
                    )),
                }
            }
            TokenKind::LParen => {
                let args = self.parse_sequence(&TokenKind::RParen)?.0;
                Ok(Expr::Call {
                    func: Box::new(lhs),
                    args,
                })
            }
            _ => {
                let index = self.parse_expr(0)?;
                self.expect(&TokenKind::RBracket)?;
                Ok(Expr::Index {
                    object: Box::new(lhs),
                    index: Box::new(index),
                })
            }
        }
    }

    /// `then if condition else otherwise`, with `then` already parsed.
    fn parse_conditional(&mut self, then: Expr) -> Result<Expr> {
        self.expect(&TokenKind::Keyword("if"))?;
        let condition = self.parse_expr(BinaryOp::Or.binding_power().0)?;
        self.expect(&TokenKind::Keyword("else"))?;
        let otherwise = self.parse_expr(CONDITIONAL_BINDING_POWER)?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }
}

/// Parse `source` into an expression tree.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.to_owned()))
    }

    fn int(i: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Int(i)))
    }

    fn binary(op: BinaryOp, left: Box<Expr>, right: Box<Expr>) -> Box<Expr> {
        Box::new(Expr::Binary { op, left, right })
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            *binary(BinaryOp::Add, int(1), binary(BinaryOp::Mul, int(2), int(3)))
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("a - b - c").unwrap();
        assert_eq!(
            expr,
            *binary(
                BinaryOp::Sub,
                binary(BinaryOp::Sub, name("a"), name("b")),
                name("c")
            )
        );
    }

    #[test]
    fn power_is_right_associative_and_beats_negation() {
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            *binary(BinaryOp::Pow, int(2), binary(BinaryOp::Pow, int(3), int(2)))
        );
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: binary(BinaryOp::Pow, int(2), int(2)),
            }
        );
    }

    #[test]
    fn postfix_chains() {
        let expr = parse("handler.func(10).x[0]").unwrap();
        let Expr::Index { object, .. } = expr else {
            panic!("expected index");
        };
        let Expr::Attr { object, name: attr } = *object else {
            panic!("expected attribute");
        };
        assert_eq!(attr, "x");
        assert!(matches!(*object, Expr::Call { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn not_in_is_one_operator() {
        assert_eq!(
            parse("a not in b").unwrap(),
            *binary(BinaryOp::NotIn, name("a"), name("b"))
        );
        assert_eq!(
            parse("not a in b").unwrap(),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: binary(BinaryOp::In, name("a"), name("b")),
            }
        );
    }

    #[test]
    fn conditional_expression() {
        let expr = parse("'on' if a.enabled else 'off'").unwrap();
        let Expr::Conditional { condition, .. } = expr else {
            panic!("expected conditional");
        };
        assert_eq!(condition.dotted_path().as_deref(), Some("a.enabled"));
    }

    #[test]
    fn tuples_and_grouping() {
        assert_eq!(parse("(a)").unwrap(), Expr::Name("a".into()));
        assert_eq!(parse("(a,)").unwrap(), Expr::Tuple(vec![Expr::Name("a".into())]));
        assert_eq!(parse("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(parse("[1, 2,]").unwrap(), Expr::Tuple(vec![*int(1), *int(2)]));
    }

    #[test]
    fn rejects_chained_comparisons() {
        let err = parse("a < b < c").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 6, .. }), "{err}");
        assert!(parse("(a < b) == c").is_ok());
    }

    #[test]
    fn rejects_trailing_tokens_and_statement_keywords() {
        assert!(matches!(parse("a b"), Err(Error::Parse { offset: 2, .. })));
        assert!(matches!(parse("lambda x"), Err(Error::Parse { offset: 0, .. })));
        assert!(matches!(parse("a."), Err(Error::Parse { .. })));
        assert!(matches!(parse(""), Err(Error::Parse { .. })));
    }

    #[test]
    fn attribute_access_needs_a_name() {
        let err = parse("model.'x'").unwrap_err();
        assert!(matches!(err, Error::Parse { offset: 6, .. }), "{err}");
        assert!(err.to_string().contains("attribute name"), "{err}");
    }
}
