//! Lexer for SVG path data using logos

use logos::Logos;

use crate::error::{ParseError, Span};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f,]+")]
pub enum Token {
    /// Any command letter; unsupported ones are rejected by the parser
    #[regex(r"[A-Za-z]", |lex| lex.slice().chars().next())]
    Command(char),

    /// Separators may be omitted when unambiguous: `M100-200`, `L1.6.8`
    #[regex(r"[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Command(c) => format!("command '{}'", c),
            Token::Number(n) => format!("number {}", n),
        }
    }
}

/// Tokenize path data, failing on the first character that starts no token
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| match tok {
            Ok(t) => Ok((t, span)),
            Err(()) => Err(ParseError::Syntax {
                message: format!("Unexpected character '{}'", &input[span.clone()]),
                span,
                expected: vec!["path command".to_string(), "number".to_string()],
            }),
        })
        .collect()
}
