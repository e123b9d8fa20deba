use std::fmt;

use crate::span::Span;

/// Token types for the Schemata language
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Root,
    Element,
    Attribute,
    DataType,
    Object,
    Property,
    Array,

    // Literals
    Identifier(&'src str),
    StringLiteral(&'src str),
    PatternLiteral(&'src str),
    IntegerLiteral(i64),
    AnyText, // *any text*

    // Comparison operators
    GreaterEqual, // >=
    LessEqual,    // <=
    Greater,      // >
    Less,         // <
    Equals,       // =

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Colon,        // :
    Semicolon,    // ;
    Comma,        // ,
    Slash,        // /
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Root => write!(f, "root"),
            Token::Element => write!(f, "element"),
            Token::Attribute => write!(f, "attribute"),
            Token::DataType => write!(f, "dataType"),
            Token::Object => write!(f, "object"),
            Token::Property => write!(f, "property"),
            Token::Array => write!(f, "array"),

            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "'{s}'"),
            Token::PatternLiteral(p) => write!(f, "/{p}/"),
            Token::IntegerLiteral(n) => write!(f, "{n}"),
            Token::AnyText => write!(f, "*any text*"),

            Token::GreaterEqual => write!(f, ">="),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::Less => write!(f, "<"),
            Token::Equals => write!(f, "="),

            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Slash => write!(f, "/"),
        }
    }
}
