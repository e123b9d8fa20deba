//! Parser for Schemata source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the declaration list defined in [`parser_types`](super::parser_types). The
//! public entry point is [`build_schema`].
//!
//! Parsing is all-or-nothing: the first syntax error aborts with a single
//! diagnostic and no partial AST is returned.

use winnow::{
    Parser as _,
    combinator::{alt, eof, opt, repeat},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use schemata_core::{Compositor, StructureKind};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected at the failure point
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) where a committed construct began
    StartOffset(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Run `f` and turn any failure into a cut error.
///
/// Used once a construct is unambiguous, so errors are reported where they
/// happen rather than after every alternative has been tried.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Match one exact token and return its span.
fn exact<'src>(
    expected: Token<'static>,
) -> impl winnow::Parser<Input<'src>, Span, ErrMode<ContextError<Context>>> {
    any.verify_map(move |token: &'src PositionedToken<'src>| {
        (token.token == expected).then_some(token.span)
    })
}

/// Match an identifier with a fixed spelling, such as `optional` or `n`.
fn word<'src>(
    spelling: &'static str,
) -> impl winnow::Parser<Input<'src>, Span, ErrMode<ContextError<Context>>> {
    any.verify_map(move |token: &'src PositionedToken<'src>| match token.token {
        Token::Identifier(name) if name == spelling => Some(token.span),
        _ => None,
    })
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(name, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::StringLiteral(text) => Some(Spanned::new(text, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn pattern_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::PatternLiteral(pattern) => Some(Spanned::new(pattern, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn integer<'src>(input: &mut Input<'src>) -> IResult<Spanned<i64>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::IntegerLiteral(value) => Some(Spanned::new(value, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn any_text<'src>(input: &mut Input<'src>) -> IResult<Span> {
    exact(Token::AnyText).parse_next(input)
}

fn comparison<'src>(input: &mut Input<'src>) -> IResult<types::Comparison> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::GreaterEqual => Some(types::Comparison::GreaterEqual),
        Token::LessEqual => Some(types::Comparison::LessEqual),
        Token::Greater => Some(types::Comparison::Greater),
        Token::Less => Some(types::Comparison::Less),
        Token::Equals => Some(types::Comparison::Equal),
        _ => None,
    })
    .parse_next(input)
}

/// `n OP k`
fn count_bound<'src>(input: &mut Input<'src>) -> IResult<types::Quantifier> {
    (word("n"), comparison, integer)
        .map(|(_, comparison, value)| {
            types::Quantifier::Bounds(vec![types::Bound {
                comparison,
                value: *value.inner(),
            }])
        })
        .parse_next(input)
}

/// `k OP n` with an optional trailing `OP k`, as in `0 < n <= 5`.
fn enclosing_bounds<'src>(input: &mut Input<'src>) -> IResult<types::Quantifier> {
    let (lower, first, _) = (integer, comparison, word("n")).parse_next(input)?;
    let mut bounds = vec![types::Bound {
        comparison: first.flipped(),
        value: *lower.inner(),
    }];

    if let Some((second, upper)) = opt((comparison, integer)).parse_next(input)? {
        bounds.push(types::Bound {
            comparison: second,
            value: *upper.inner(),
        });
    }

    Ok(types::Quantifier::Bounds(bounds))
}

fn quantifier<'src>(input: &mut Input<'src>) -> IResult<types::Quantifier> {
    alt((
        word("optional").value(types::Quantifier::Optional),
        count_bound,
        // Must precede the bare count, which would otherwise claim the `0` of `0 < n`.
        enclosing_bounds,
        integer.map(|count| types::Quantifier::Exact(*count.inner())),
    ))
    .parse_next(input)
}

/// `( quantifier )`
fn quantifier_group<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Quantifier>> {
    let open = exact(Token::LeftParen).parse_next(input)?;

    cut_err(input, |input| {
        let quantifier = quantifier
            .context(Context::Label("quantifier"))
            .parse_next(input)?;
        let close = exact(Token::RightParen)
            .context(Context::Label("`)`"))
            .parse_next(input)?;
        Ok(Spanned::new(quantifier, open.union(close)))
    })
}

fn item<'src>(input: &mut Input<'src>) -> IResult<types::Item<'src>> {
    let name = identifier.parse_next(input)?;
    let quantifier = opt(quantifier_group).parse_next(input)?;

    Ok(types::Item { name, quantifier })
}

fn list_entry<'src>(input: &mut Input<'src>) -> IResult<types::Entry<'src>> {
    alt((
        list.map(types::Entry::List),
        item.map(types::Entry::Item),
        string_literal.map(types::Entry::String),
        integer.map(types::Entry::Integer),
        any_text.map(types::Entry::AnyText),
    ))
    .parse_next(input)
}

/// The separator between list entries; `true` for `/`.
///
/// `[...]` lists take commas only. A `{...}` list takes either commas or
/// slashes, and the first separator fixes which for the rest of the list.
fn separator<'src>(
    ordered: bool,
    chosen: Option<bool>,
) -> impl winnow::Parser<Input<'src>, bool, ErrMode<ContextError<Context>>> {
    any.verify_map(move |token: &'src PositionedToken<'src>| {
        let slash = match token.token {
            Token::Comma => false,
            Token::Slash if !ordered => true,
            _ => return None,
        };
        chosen.is_none_or(|chosen| chosen == slash).then_some(slash)
    })
}

/// `[a, b]`, `{a, b}` or `{a / b}`
///
/// Entries may themselves be lists. A trailing separator is not allowed.
fn list<'src>(input: &mut Input<'src>) -> IResult<types::List<'src>> {
    let (open, ordered) = any
        .verify_map(|token: &'src PositionedToken<'src>| match token.token {
            Token::LeftBracket => Some((token.span, true)),
            Token::LeftBrace => Some((token.span, false)),
            _ => None,
        })
        .parse_next(input)?;

    cut_err(input, |input| {
        let mut entries = Vec::new();
        let mut chosen = None;
        if let Some(first) = opt(list_entry).parse_next(input)? {
            entries.push(first);
            while let Some(slash) = opt(separator(ordered, chosen)).parse_next(input)? {
                chosen = Some(slash);
                let entry = cut_err(input, |input| {
                    list_entry
                        .context(Context::Label("list entry"))
                        .parse_next(input)
                })?;
                entries.push(entry);
            }
        }

        let (closing, label) = match (ordered, chosen) {
            (true, _) => (Token::RightBracket, "`,` or `]`"),
            (false, None) => (Token::RightBrace, "`,`, `/` or `}`"),
            (false, Some(true)) => (Token::RightBrace, "`/` or `}`"),
            (false, Some(false)) => (Token::RightBrace, "`,` or `}`"),
        };
        let close = exact(closing)
            .context(Context::Label(label))
            .parse_next(input)?;

        let compositor = match (ordered, chosen) {
            (true, _) => Compositor::Sequence,
            (false, Some(true)) => Compositor::Choice,
            (false, _) => Compositor::Unordered,
        };
        Ok(types::List {
            compositor,
            entries,
            span: open.union(close),
        })
    })
}

fn property_value<'src>(input: &mut Input<'src>) -> IResult<types::Value<'src>> {
    alt((
        any_text.map(types::Value::AnyText),
        list.map(types::Value::List),
        item.map(types::Value::Item),
        string_literal.map(types::Value::String),
        pattern_literal.map(types::Value::Pattern),
        integer.map(types::Value::Integer),
    ))
    .context(Context::Label("property value"))
    .parse_next(input)
}

/// `name: value;`
fn property<'src>(input: &mut Input<'src>) -> IResult<types::Property<'src>> {
    let name = identifier.parse_next(input)?;

    cut_err(input, |input| {
        exact(Token::Colon)
            .context(Context::Label("`:`"))
            .parse_next(input)?;
        let value = property_value.parse_next(input)?;
        exact(Token::Semicolon)
            .context(Context::Label("`;`"))
            .parse_next(input)?;
        Ok(types::Property { name, value })
    })
}

fn structure_kind<'src>(input: &mut Input<'src>) -> IResult<Spanned<StructureKind>> {
    any.verify_map(|token: &'src PositionedToken<'src>| {
        let kind = match token.token {
            Token::Element => StructureKind::Element,
            Token::Attribute => StructureKind::Attribute,
            Token::DataType => StructureKind::DataType,
            Token::Object => StructureKind::Object,
            Token::Property => StructureKind::Property,
            Token::Array => StructureKind::Array,
            _ => return None,
        };
        Some(Spanned::new(kind, token.span))
    })
    .parse_next(input)
}

/// Kinds that may carry the `root` flag.
fn root_kind<'src>(input: &mut Input<'src>) -> IResult<Spanned<StructureKind>> {
    structure_kind
        .verify(|kind: &Spanned<StructureKind>| {
            matches!(kind.inner(), StructureKind::Element | StructureKind::Object)
        })
        .parse_next(input)
}

/// `[root] kind name { property* }`
fn declaration<'src>(input: &mut Input<'src>) -> IResult<types::Declaration<'src>> {
    let root = opt(exact(Token::Root)).parse_next(input)?;
    let kind = match root {
        Some(_) => cut_err(input, |input| {
            root_kind
                .context(Context::Label("`element` or `object` after `root`"))
                .parse_next(input)
        })?,
        None => structure_kind.parse_next(input)?,
    };

    cut_err(input, |input| {
        let name = identifier
            .context(Context::Label("structure name"))
            .parse_next(input)?;
        let open = exact(Token::LeftBrace)
            .context(Context::Label("`{`"))
            .parse_next(input)?;
        let properties: Vec<types::Property<'src>> = repeat(0.., property).parse_next(input)?;
        let close = exact(Token::RightBrace)
            .context(Context::Label("property or `}`"))
            .parse_next(input)?;

        let start = root.unwrap_or_else(|| kind.span());
        Ok(types::Declaration {
            root,
            kind,
            name,
            open,
            properties,
            span: start.union(close),
        })
    })
}

fn schema_file<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Declaration<'src>>> {
    let declarations: Vec<types::Declaration<'src>> = repeat(0.., declaration).parse_next(input)?;
    eof.context(Context::Label("declaration"))
        .parse_next(input)?;
    Ok(declarations)
}

/// Convert a winnow error into a diagnostic.
///
/// The failing token is found from the remaining token count. A secondary
/// label marks where the enclosing committed construct began.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let offset = tokens.len().saturating_sub(current_remaining);
    let found = tokens.get(offset);

    let (expected, start_remaining) = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => (
            e.context().find_map(|ctx| match ctx {
                Context::Label(label) => Some(*label),
                Context::StartOffset(_) => None,
            }),
            e.context()
                .filter_map(|ctx| match ctx {
                    Context::StartOffset(n) => Some(*n),
                    Context::Label(_) => None,
                })
                .last(),
        ),
        ErrMode::Incomplete(_) => (None, None),
    };
    let expected = expected.unwrap_or("declaration");

    let mut diagnostic = match found {
        Some(token) => Diagnostic::error(format!("expected {expected}, found `{token}`"))
            .with_code(ErrorCode::E100)
            .with_label(token.span, "unexpected token"),
        None => {
            let end = tokens.last().map_or(0, |token| token.span.end());
            Diagnostic::error(format!("expected {expected}, found end of input"))
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end..end), "input ends here")
                .with_help("a declaration is incomplete; check for a missing `;` or `}`")
        }
    };

    if let Some(start) = start_remaining
        .map(|remaining| tokens.len().saturating_sub(remaining))
        .filter(|start| *start < offset)
        .and_then(|start| tokens.get(start))
    {
        diagnostic = diagnostic.with_secondary_label(start.span, "while parsing this");
    }

    diagnostic
}

/// Build the declaration list from tokens.
pub fn build_schema<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<Vec<types::Declaration<'src>>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    match schema_file.parse_next(&mut token_slice) {
        Ok(declarations) => Ok(declarations),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_tokens(input: &str) -> Vec<PositionedToken<'_>> {
        tokenize(input).expect("Failed to tokenize input").tokens
    }

    fn parse_quantifier(input: &str) -> types::Quantifier {
        let tokens = parse_tokens(input);
        let mut slice = TokenSlice::new(&tokens);
        let result = quantifier_group.parse_next(&mut slice);
        assert!(slice.eof_offset() == 0, "quantifier left tokens behind");
        result.expect("quantifier should parse").into_inner()
    }

    #[test]
    fn test_identifier_returns_source_slice() {
        let tokens = parse_tokens("book_list");
        let mut slice = TokenSlice::new(&tokens);
        let name = identifier.parse_next(&mut slice).unwrap();
        assert_eq!(*name.inner(), "book_list");
        assert_eq!(name.span(), Span::new(0..9));
    }

    #[test]
    fn test_optional_quantifier() {
        assert_eq!(parse_quantifier("(optional)"), types::Quantifier::Optional);
    }

    #[test]
    fn test_exact_quantifier() {
        assert_eq!(parse_quantifier("(3)"), types::Quantifier::Exact(3));
    }

    #[test]
    fn test_count_bound_quantifier() {
        assert_eq!(
            parse_quantifier("(n >= 0)"),
            types::Quantifier::Bounds(vec![types::Bound {
                comparison: types::Comparison::GreaterEqual,
                value: 0,
            }])
        );
    }

    #[test]
    fn test_enclosing_bounds_are_flipped() {
        assert_eq!(
            parse_quantifier("(0 < n <= 5)"),
            types::Quantifier::Bounds(vec![
                types::Bound {
                    comparison: types::Comparison::Greater,
                    value: 0,
                },
                types::Bound {
                    comparison: types::Comparison::LessEqual,
                    value: 5,
                },
            ])
        );
    }

    #[test]
    fn test_single_enclosing_bound() {
        assert_eq!(
            parse_quantifier("(2 <= n)"),
            types::Quantifier::Bounds(vec![types::Bound {
                comparison: types::Comparison::GreaterEqual,
                value: 2,
            }])
        );
    }

    #[test]
    fn test_quantifier_group_span() {
        let tokens = parse_tokens("(optional)");
        let mut slice = TokenSlice::new(&tokens);
        let quantifier = quantifier_group.parse_next(&mut slice).unwrap();
        assert_eq!(quantifier.span(), Span::new(0..10));
    }

    #[test]
    fn test_list_keeps_compositor() {
        let tokens = parse_tokens("{ a, b (optional) }");
        let mut slice = TokenSlice::new(&tokens);
        let list = list.parse_next(&mut slice).unwrap();
        assert_eq!(list.compositor, Compositor::Unordered);
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.span, Span::new(0..19));
    }

    #[test]
    fn test_slash_list_is_a_choice() {
        let tokens = parse_tokens("{ image / video / audio }");
        let mut slice = TokenSlice::new(&tokens);
        let list = list.parse_next(&mut slice).unwrap();
        assert_eq!(list.compositor, Compositor::Choice);
        assert_eq!(list.entries.len(), 3);
    }

    #[test]
    fn test_nested_lists() {
        let tokens = parse_tokens("[ {image / video}, caption ]");
        let mut slice = TokenSlice::new(&tokens);
        let list = list.parse_next(&mut slice).unwrap();
        assert_eq!(list.compositor, Compositor::Sequence);
        let types::Entry::List(inner) = &list.entries[0] else {
            panic!("expected a nested list");
        };
        assert_eq!(inner.compositor, Compositor::Choice);
        assert_eq!(inner.span, Span::new(2..17));
    }

    #[test]
    fn test_empty_list() {
        let tokens = parse_tokens("[]");
        let mut slice = TokenSlice::new(&tokens);
        let list = list.parse_next(&mut slice).unwrap();
        assert!(list.entries.is_empty());
    }

    #[test]
    fn test_root_kind_rejects_attribute() {
        let tokens = parse_tokens("attribute");
        let mut slice = TokenSlice::new(&tokens);
        assert!(root_kind.parse_next(&mut slice).is_err());
    }

    #[test]
    fn test_convert_error_at_end_of_input() {
        let tokens = parse_tokens("element a {");
        let diagnostic = build_schema(&tokens).unwrap_err();
        assert_eq!(diagnostic.code(), Some(ErrorCode::E101));
        assert_eq!(
            diagnostic.message(),
            "expected property or `}`, found end of input"
        );
        assert_eq!(diagnostic.primary_span(), Some(Span::new(11..11)));
    }

    #[test]
    fn test_convert_error_names_found_token() {
        let tokens = parse_tokens("element a { tagName 'a'; }");
        let diagnostic = build_schema(&tokens).unwrap_err();
        assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
        assert_eq!(diagnostic.message(), "expected `:`, found `'a'`");
        assert_eq!(diagnostic.primary_span(), Some(Span::new(20..23)));
    }

    #[test]
    fn test_convert_error_marks_enclosing_construct() {
        let tokens = parse_tokens("element a { tagName 'a'; }");
        let diagnostic = build_schema(&tokens).unwrap_err();
        assert!(
            diagnostic
                .labels()
                .iter()
                .any(|label| label.is_secondary() && label.span() == Span::new(8..9))
        );
    }
}
