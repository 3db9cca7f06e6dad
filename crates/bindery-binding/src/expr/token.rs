#![forbid(unsafe_code)]

//! Tokens and the lexer for binding expressions.
//!
//! The lexer scans the whole source up front into a `Vec<Token>` ending in
//! [`TokenKind::Eof`]. Dispatch is on the first character of each token.

use std::fmt;

use bindery_core::names::is_keyword;
use bindery_core::{Error, Result};

/// Kind of a lexed token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    /// A reserved word (`True`, `and`, `if`, ...).
    Keyword(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Int(i) => return write!(f, "{i}"),
            Self::Float(x) => return write!(f, "{x:?}"),
            Self::Str(s) => return write!(f, "{s:?}"),
            Self::Name(n) => return f.write_str(n),
            Self::Keyword(k) => k,
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::StarStar => "**",
            Self::Slash => "/",
            Self::SlashSlash => "//",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::Eof => "end of expression",
        };
        f.write_str(text)
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn keyword(word: &str) -> Option<&'static str> {
    if !is_keyword(word) {
        return None;
    }
    bindery_core::names::KEYWORDS
        .iter()
        .copied()
        .find(|k| *k == word)
}

fn parse_error(offset: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        offset,
        message: message.into(),
    }
}

/// Lexer over one expression.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self { source, pos: 0 }
    }

    /// Scan the whole source.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let offset = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset,
            });
        };

        let kind = match c {
            '"' | '\'' => self.string(c)?,
            c if c.is_ascii_digit() => self.number()?,
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
            c if is_ident_start(c) => self.identifier(),
            _ => self.operator()?,
        };
        Ok(Token { kind, offset })
    }

    fn identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let word = &self.source[start..self.pos];
        match keyword(word) {
            Some(k) => TokenKind::Keyword(k),
            None => TokenKind::Name(word.to_owned()),
        }
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let mut float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if self.peek() == Some('.') && !self.peek_nth(1).is_some_and(is_ident_start) {
            float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_nth(1), Some('+' | '-')));
            if self.peek_nth(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                float = true;
                for _ in 0..=sign {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let text: String = self.source[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if float {
            text.parse()
                .map(TokenKind::Float)
                .map_err(|_| parse_error(start, format!("invalid number {text:?}")))
        } else {
            text.parse()
                .map(TokenKind::Int)
                .map_err(|_| parse_error(start, format!("integer {text} out of range")))
        }
    }

    fn string(&mut self, quote: char) -> Result<TokenKind> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(parse_error(start, "unterminated string literal")),
                Some(c) if c == quote => return Ok(TokenKind::Str(out)),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| parse_error(start, "unterminated string literal"))?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn operator(&mut self) -> Result<TokenKind> {
        let offset = self.pos;
        let Some(c) = self.bump() else {
            return Ok(TokenKind::Eof);
        };
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '%' => TokenKind::Percent,
            '*' if self.eat('*') => TokenKind::StarStar,
            '*' => TokenKind::Star,
            '/' if self.eat('/') => TokenKind::SlashSlash,
            '/' => TokenKind::Slash,
            '=' if self.eat('=') => TokenKind::EqEq,
            '!' if self.eat('=') => TokenKind::NotEq,
            '<' if self.eat('=') => TokenKind::LessEq,
            '<' => TokenKind::Less,
            '>' if self.eat('=') => TokenKind::GreaterEq,
            '>' => TokenKind::Greater,
            other => return Err(parse_error(offset, format!("unexpected character {other:?}"))),
        };
        Ok(kind)
    }
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
