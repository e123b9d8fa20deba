//! Unit tests for the winnow parser implementation
//!
//! These tests cover every Schemata language construct along with the
//! malformed quantifiers and lists the language rejects.

use schemata_core::{Compositor, StructureKind};

use crate::{
    error::{Diagnostic, ErrorCode},
    lexer, parser,
    parser_types::{Comparison, Entry, Quantifier, Value},
};

/// Helper function to parse a source string and return success/failure
fn parse_source(source: &str) -> Result<(), String> {
    let tokens = lexer::tokenize(source)
        .map_err(|err| format!("Lexer error: {}", err))?
        .tokens;
    let _ast = parser::build_schema(&tokens).map_err(|err| format!("Parser error: {}", err))?;
    Ok(())
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) {
    if let Err(e) = parse_source(source) {
        panic!("Expected parsing to succeed, but got error: {}", e);
    }
}

/// Helper function to parse a source string and assert failure
fn assert_parse_fails(source: &str) {
    if parse_source(source).is_ok() {
        panic!("Expected parsing to fail for {source:?}, but it succeeded");
    }
}

/// Parse a source that must fail in the parser, returning the diagnostic.
fn parse_error(source: &str) -> Diagnostic {
    let tokens = lexer::tokenize(source).expect("Lexer should succeed").tokens;
    match parser::build_schema(&tokens) {
        Ok(_) => panic!("Expected parsing to fail for {source:?}"),
        Err(diagnostic) => diagnostic,
    }
}

/// Wrap a property value in a minimal declaration.
fn content(value: &str) -> String {
    format!("element e {{ allowedContent: {value}; }}")
}

const BOOK_LIST: &str = r#"
/* A list of books. */
root element book_list {
    tagName: 'bookList';
    allowedContent: [ book (n >= 0) ];
}

element book {
    attributes: [ id ];
    allowedContent: [ title, subtitle (optional), author (n >= 1) ];
}

element title { allowedContent: *any text*; }
element subtitle { allowedContent: *any text*; }
element author { allowedContent: *any text*; }

attribute id {
    tagName: 'id';
    valueType: _id;
}

dataType _id {
    baseType: string;
    allowedPattern: /[a-z]+/;
}
"#;

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_empty_file() {
    let tokens = lexer::tokenize("  /* nothing here */ ").unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();
    assert!(declarations.is_empty());
}

#[test]
fn test_book_list_parses() {
    let tokens = lexer::tokenize(BOOK_LIST).unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();

    let names: Vec<&str> = declarations.iter().map(|d| *d.name.inner()).collect();
    assert_eq!(
        names,
        ["book_list", "book", "title", "subtitle", "author", "id", "_id"]
    );
    assert!(declarations[0].is_root());
    assert!(!declarations[1].is_root());
    assert_eq!(*declarations[5].kind.inner(), StructureKind::Attribute);
    assert_eq!(*declarations[6].kind.inner(), StructureKind::DataType);
}

#[test]
fn test_every_kind_keyword() {
    let source = r#"
        element a {}
        attribute b {}
        dataType c {}
        object d {}
        property e {}
        array f {}
    "#;
    let tokens = lexer::tokenize(source).unwrap().tokens;
    let kinds: Vec<StructureKind> = parser::build_schema(&tokens)
        .unwrap()
        .iter()
        .map(|d| *d.kind.inner())
        .collect();
    assert_eq!(
        kinds,
        [
            StructureKind::Element,
            StructureKind::Attribute,
            StructureKind::DataType,
            StructureKind::Object,
            StructureKind::Property,
            StructureKind::Array,
        ]
    );
}

#[test]
fn test_root_object() {
    assert_parses_successfully("root object catalog { properties: [ name ]; }");
}

#[test]
fn test_root_only_before_element_or_object() {
    let diagnostic = parse_error("root attribute id {}");
    assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
    assert!(diagnostic.message().contains("after `root`"));
}

#[test]
fn test_declaration_span_starts_at_root() {
    let source = "root element a {}";
    let tokens = lexer::tokenize(source).unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();
    assert_eq!(declarations[0].span.start(), 0);
    assert_eq!(declarations[0].span.end(), source.len());
}

#[test]
fn test_missing_semicolon() {
    let diagnostic = parse_error("element a { tagName: 'a' }");
    assert_eq!(diagnostic.message(), "expected `;`, found `}`");
}

#[test]
fn test_missing_structure_name() {
    let diagnostic = parse_error("element { }");
    assert_eq!(diagnostic.message(), "expected structure name, found `{`");
}

#[test]
fn test_stray_token_at_top_level() {
    let diagnostic = parse_error("element a {} book");
    assert_eq!(diagnostic.message(), "expected declaration, found `book`");
}

#[test]
fn test_unclosed_declaration_is_incomplete() {
    let diagnostic = parse_error("element a { tagName: 'a';");
    assert_eq!(diagnostic.code(), Some(ErrorCode::E101));
}

// =============================================================================
// Property values
// =============================================================================

fn single_value(source: &str) -> String {
    let tokens = lexer::tokenize(source).unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();
    declarations[0].properties[0].value.shape().to_string()
}

#[test]
fn test_value_shapes() {
    assert_eq!(single_value(&content("*any text*")), "the `*any text*` marker");
    assert_eq!(single_value(&content("[a, b]")), "an ordered list");
    assert_eq!(single_value(&content("{a, b}")), "an unordered list");
    assert_eq!(single_value(&content("{a / b}")), "a choice");
    assert_eq!(single_value(&content("title")), "a reference");
    assert_eq!(single_value("attribute a { tagName: \"a\"; }"), "a string");
    assert_eq!(single_value("dataType d { allowedPattern: /a+/; }"), "a pattern");
    assert_eq!(single_value("dataType d { minimumValue: -4; }"), "an integer");
}

#[test]
fn test_list_entries_of_every_shape() {
    let source = "dataType d { allowedValues: ['red', 7, *any text*, blue (optional)]; }";
    let tokens = lexer::tokenize(source).unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();

    let Value::List(list) = &declarations[0].properties[0].value else {
        panic!("expected a list");
    };
    assert_eq!(list.compositor, Compositor::Sequence);
    assert!(matches!(&list.entries[0], Entry::String(s) if *s.inner() == "red"));
    assert!(matches!(&list.entries[1], Entry::Integer(n) if *n.inner() == 7));
    assert!(matches!(&list.entries[2], Entry::AnyText(_)));
    assert!(matches!(
        &list.entries[3],
        Entry::Item(item) if item.quantifier.as_ref().map(|q| q.inner().clone()) == Some(Quantifier::Optional)
    ));
}

#[test]
fn test_mixed_content_list() {
    assert_parses_successfully(&content("[*any text*, emphasis (n >= 0)]"));
}

#[test]
fn test_empty_lists() {
    assert_parses_successfully(&content("[]"));
    assert_parses_successfully(&content("{}"));
}

#[test]
fn test_property_names_are_not_checked_by_parser() {
    assert_parses_successfully("element a { colour: 'red'; }");
}

// =============================================================================
// Quantifiers
// =============================================================================

fn quantifier_of(source: &str) -> Quantifier {
    let tokens = lexer::tokenize(source).unwrap().tokens;
    let declarations = parser::build_schema(&tokens).unwrap();
    let Value::Item(item) = &declarations[0].properties[0].value else {
        panic!("expected a single item");
    };
    item.quantifier.as_ref().expect("quantifier").inner().clone()
}

#[test]
fn test_quantifier_forms() {
    assert_eq!(quantifier_of(&content("a (optional)")), Quantifier::Optional);
    assert_eq!(quantifier_of(&content("a (4)")), Quantifier::Exact(4));

    let Quantifier::Bounds(bounds) = quantifier_of(&content("a (n = 2)")) else {
        panic!("expected bounds");
    };
    assert_eq!(bounds[0].comparison, Comparison::Equal);
    assert_eq!(bounds[0].value, 2);

    let Quantifier::Bounds(bounds) = quantifier_of(&content("a (1 <= n < 10)")) else {
        panic!("expected bounds");
    };
    assert_eq!(bounds.len(), 2);
    assert_eq!(bounds[0].comparison, Comparison::GreaterEqual);
    assert_eq!(bounds[1].comparison, Comparison::Less);
}

#[test]
fn test_negative_bound_is_syntactically_valid() {
    // Range checks happen during normalization.
    assert_parses_successfully(&content("a (n >= -1)"));
}

#[test]
fn test_malformed_quantifiers() {
    for quantifier in [
        "(optional abc)",
        "(optional, n<=1)",
        "(n >= 0 >= 2)",
        "(n == 3)",
        "(0 << n)",
        "(optional) (optional)",
        "()",
        "(m >= 1)",
        "(n >= 1",
        "(n >= x)",
    ] {
        assert_parse_fails(&content(&format!("[a {quantifier}]")));
        assert_parse_fails(&content(&format!("a {quantifier}")));
    }
}

#[test]
fn test_malformed_quantifier_reports_quantifier_context() {
    let diagnostic = parse_error(&content("a (optional abc)"));
    assert_eq!(diagnostic.message(), "expected `)`, found `abc`");
}

#[test]
fn test_malformed_lists() {
    for list in [
        "[a,, b]",
        "[a, b,]",
        "[,]",
        "[a b]",
        "[a, b}",
        "{a, b]",
        "[a / b]",
        "{a, b / c}",
        "{a / b, c}",
        "{a / / b}",
        "{a /}",
        "[a, [b]",
    ] {
        assert_parse_fails(&content(list));
    }
}

#[test]
fn test_trailing_comma_error_points_at_bracket() {
    let source = content("[a, b,]");
    let diagnostic = parse_error(&source);
    assert_eq!(diagnostic.message(), "expected list entry, found `]`");
    let bracket = source.find(']').unwrap();
    assert_eq!(diagnostic.primary_span().map(|s| s.start()), Some(bracket));
}

#[test]
fn test_nested_lists_parse() {
    assert_parses_successfully(&content("[a, [b]]"));
    assert_parses_successfully(&content("{a, b, {c, [d, e]}}"));
    assert_parses_successfully(&content("[ {image / video / audio}, caption ]"));
    assert_parses_successfully(&content("{ {a, b} / c }"));
}

#[test]
fn test_slash_in_ordered_list_is_rejected() {
    let diagnostic = parse_error(&content("[a / b]"));
    assert_eq!(diagnostic.message(), "expected `,` or `]`, found `/`");
}

#[test]
fn test_mixed_separators_are_rejected() {
    let diagnostic = parse_error(&content("{a, b / c}"));
    assert_eq!(diagnostic.message(), "expected `,` or `}`, found `/`");

    let diagnostic = parse_error(&content("{a / b, c}"));
    assert_eq!(diagnostic.message(), "expected `/` or `}`, found `,`");
}
