//! Lexical analyzer for Schemata source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace is dropped. `/* ... */` block comments never reach the parser
//! but are kept aside in [`Lexed::comments`] so that metadata written in them
//! can be attached to declarations later. Block comments do not nest.
//!
//! A `/` directly after `:` opens a pattern literal; anywhere else it is the
//! choice separator [`Token::Slash`].
//!
//! The entry point is [`tokenize`], which performs error-recovering lexical
//! analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{digit1, multispace1},
    combinator::{alt, cut_err, not, opt, peek, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()`; the reported span runs from
/// `start` to the position where lexing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a `/* ... */` block comment, returning its body.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Spanned<&'a str>> {
    let start_pos = input.current_token_start();

    "/*".parse_next(input)?;

    let body_start = input.current_token_start();
    let body = cut_err(terminated(take_until(0.., "*/"), "*/"))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated block comment",
            help: Some("add a closing `*/`"),
            start: start_pos,
        })
        .parse_next(input)?;

    Ok(Spanned::new(body, Span::new(body_start..body_start + body.len())))
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    multispace1.void().parse_next(input)
}

/// Parse a quoted string: `'...'` or `"..."`.
///
/// Content is taken verbatim; backslashes are kept so that regular
/// expressions such as `'\d+'` survive unchanged. Strings cannot span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    let quote = one_of(['\'', '"']).parse_next(input)?;

    cut_err(terminated(
        take_while(0.., move |c: char| c != quote && c != '\n'),
        quote,
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E003,
        message: "unterminated string literal",
        help: Some("close the string with the quote it was opened with"),
        start: start_pos,
    })
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse a `/.../` pattern literal.
fn pattern_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    '/'.parse_next(input)?;

    cut_err(terminated(
        take_while(0.., |c: char| c != '/' && c != '\n'),
        '/',
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E004,
        message: "unterminated pattern literal",
        help: Some("add a closing `/`, or write the pattern as a quoted string"),
        start: start_pos,
    })
    .map(Token::PatternLiteral)
    .parse_next(input)
}

fn slash<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    '/'.value(Token::Slash).parse_next(input)
}

fn any_text<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    literal("*any text*").value(Token::AnyText).parse_next(input)
}

/// Parse comparison operators (longest first)
fn operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal(">=").value(Token::GreaterEqual),
        literal("<=").value(Token::LessEqual),
        '>'.value(Token::Greater),
        '<'.value(Token::Less),
        '='.value(Token::Equals),
    ))
    .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((
            literal("root"),
            literal("element"),
            literal("attribute"),
            literal("dataType"),
            literal("object"),
            literal("property"),
            literal("array"),
        )),
        peek(not(one_of(is_identifier_char))),
    )
    .map(|keyword: &str| match keyword {
        "root" => Token::Root,
        "element" => Token::Element,
        "attribute" => Token::Attribute,
        "dataType" => Token::DataType,
        "object" => Token::Object,
        "property" => Token::Property,
        "array" => Token::Array,
        _ => unreachable!(),
    })
    .parse_next(input)
}

/// Parse a decimal integer with an optional leading minus sign.
fn integer_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    let digits = terminated(
        (opt('-'), digit1).take(),
        peek(not(one_of(is_identifier_char))),
    )
    .parse_next(input)?;

    digits.parse::<i64>().map(Token::IntegerLiteral).map_err(|_| {
        let checkpoint = input.checkpoint();
        ErrMode::Cut(ContextError::new().add_context(
            input,
            &checkpoint,
            LexerDiagnostic {
                code: ErrorCode::E005,
                message: "integer literal out of range",
                help: Some("integers must fit in a signed 64-bit value"),
                start: start_pos,
            },
        ))
    })
}

/// Parse identifiers: a letter or underscore, then letters, digits, `_` or `-`.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., is_identifier_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse single character punctuation
fn punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        ':'.value(Token::Colon),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// One step of the lexer.
enum Lexeme<'a> {
    Token(PositionedToken<'a>),
    Comment(Spanned<&'a str>),
    Whitespace,
}

/// Parse a single token with position tracking.
///
/// `value_position` is set right after a `:`, where `/` opens a pattern.
fn positioned_token<'a>(input: &mut Input<'a>, value_position: bool) -> IResult<'a, Lexeme<'a>> {
    let lexeme = alt((
        block_comment.map(Lexeme::Comment), // Must come before `/`
        whitespace.map(|()| Lexeme::Whitespace),
        alt((
            string_literal,
            |input: &mut Input<'a>| {
                if value_position {
                    pattern_literal(input)
                } else {
                    slash(input)
                }
            },
            any_text,
            operator,
            keyword, // Must come before identifier
            integer_literal,
            identifier,
            punctuation,
        ))
        .with_span()
        .map(|(token, range)| Lexeme::Token(PositionedToken::new(token, Span::new(range)))),
    ))
    .parse_next(input)?;

    Ok(lexeme)
}

/// Tokens and comments of one source file.
#[derive(Debug, Default)]
pub struct Lexed<'a> {
    pub tokens: Vec<PositionedToken<'a>>,
    /// Comment bodies without their `/*` and `*/` delimiters.
    pub comments: Vec<Spanned<&'a str>>,
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    lexed: Lexed<'a>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            lexed: Lexed::default(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn value_position(&self) -> bool {
        self.lexed
            .tokens
            .last()
            .is_some_and(|last| last.token == Token::Colon)
    }

    /// Tokenize the input, collecting tokens and errors.
    ///
    /// On error a single character is skipped and lexing resumes, so one
    /// bad character does not hide later problems.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input, self.value_position()) {
                Ok(Lexeme::Token(token)) => self.lexed.tokens.push(token),
                Ok(Lexeme::Comment(comment)) => self.lexed.comments.push(comment),
                Ok(Lexeme::Whitespace) => {}
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Lexed<'a>, ParseError> {
        self.diagnostics.finish().map(|_| self.lexed)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) when no
    /// [`LexerDiagnostic`] context is attached.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
            .with_help("identifiers may contain letters, digits, `_` and `-`")
    }
}

/// Split schema source into tokens, collecting every lexical error.
///
/// # Returns
///
/// - `Ok(lexed)` - All tokens successfully lexed, plus the comment bodies
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Lexed<'_>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn valid_identifier_strategy() -> impl Strategy<Value = String> {
        "[a-z_][a-zA-Z0-9_-]{0,20}".prop_filter("avoid keywords", |s| {
            !matches!(
                s.as_str(),
                "root" | "element" | "attribute" | "dataType" | "object" | "property" | "array"
            )
        })
    }

    proptest! {
        #[test]
        fn identifiers_lex_as_single_token(id in valid_identifier_strategy()) {
            let tokens = tokenize(&id).unwrap().tokens;
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0].token, &Token::Identifier(id.as_str()));
        }

        #[test]
        fn comments_never_produce_tokens(body in "[a-zA-Z0-9 _;{}\\[\\]]{0,40}") {
            let source = format!("/*{body}*/");
            let lexed = tokenize(&source).unwrap();
            prop_assert!(lexed.tokens.is_empty());
            prop_assert_eq!(lexed.comments.len(), 1);
        }

        #[test]
        fn integers_round_trip(value in any::<i64>()) {
            let source = value.to_string();
            let tokens = tokenize(&source).unwrap().tokens;
            prop_assert_eq!(&tokens[0].token, &Token::IntegerLiteral(value));
        }
    }
}
