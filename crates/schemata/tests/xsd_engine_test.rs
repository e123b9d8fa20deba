//! Generated XSD documents checked by libxml2, a full XML Schema engine.
//!
//! The in-tree validator in `support` only covers what the backend emits;
//! these tests make sure libxml2 compiles every schema and agrees on which
//! instance documents are valid.

#![cfg(unix)]

use libxml::{
    parser::Parser,
    schemas::{SchemaParserContext, SchemaValidationContext},
};

use schemata::SchemaBuilder;

/// A compiled libxml2 schema.
struct Engine {
    context: SchemaValidationContext,
}

impl Engine {
    fn compile(source: &str) -> (Self, SchemaBuilder, schemata::SchemaGraph) {
        let builder = SchemaBuilder::default();
        let graph = builder.parse(source).expect("Failed to parse schema");
        let xsd = builder.render_xsd(&graph).expect("Failed to render XSD");

        let mut parser = SchemaParserContext::from_buffer(xsd.as_bytes());
        let context = SchemaValidationContext::from_parser(&mut parser)
            .unwrap_or_else(|errors| panic!("libxml2 rejected the XSD: {errors:?}\n{xsd}"));
        (Self { context }, builder, graph)
    }

    fn is_valid(&mut self, xml: &str) -> bool {
        let document = Parser::default()
            .parse_string(xml)
            .expect("instance should be well-formed");
        self.context.validate_document(&document).is_ok()
    }
}

const BOOK_LIST: &str = r#"
/* Format Name: Book List */
root element book_list {
    tagName: 'bookList';
    allowedContent: [ book (n >= 0) ];
}

element book {
    /* Description: A single book. */
    attributes: [ id, lang (optional) ];
    allowedContent: [ title, subtitle (optional), author (1 <= n <= 3) ];
}

element title { allowedContent: *any text*; }
element subtitle { allowedContent: *any text*; }
element author { allowedContent: *any text*; }

attribute id { valueType: _id; }
attribute lang { defaultValue: 'en'; }

dataType _id {
    /* Example Value: bk42 */
    allowedPattern: /[a-z]{2}[0-9]+/;
}
"#;

#[test]
fn test_book_list_schema_compiles_and_validates() {
    let (mut engine, builder, graph) = Engine::compile(BOOK_LIST);

    let example = builder.render_example(&graph, None).unwrap();
    assert!(engine.is_valid(&example), "example rejected:\n{example}");

    assert!(engine.is_valid(
        "<bookList><book id=\"ab1\"><title>T</title><author>A</author></book></bookList>"
    ));
    // Pattern facet.
    assert!(!engine.is_valid(
        "<bookList><book id=\"AB1\"><title>T</title><author>A</author></book></bookList>"
    ));
    // Order of children.
    assert!(!engine.is_valid(
        "<bookList><book id=\"ab1\"><author>A</author><title>T</title></book></bookList>"
    ));
    // Upper bound on authors.
    assert!(!engine.is_valid(
        "<bookList><book id=\"ab1\"><title>T</title>\
         <author>A</author><author>B</author><author>C</author><author>D</author>\
         </book></bookList>"
    ));
}

#[test]
fn test_choice_and_nested_groups() {
    let (mut engine, builder, graph) = Engine::compile(
        "root element figure { allowedContent: [ {image / [ video, poster (optional) ]}, caption (optional) ]; }\n\
         element image {}\nelement video {}\nelement poster {}\n\
         element caption { allowedContent: *any text*; }",
    );

    let example = builder.render_example(&graph, None).unwrap();
    assert!(engine.is_valid(&example), "example rejected:\n{example}");

    assert!(engine.is_valid("<figure><video/><poster/><caption>c</caption></figure>"));
    assert!(!engine.is_valid("<figure><image/><video/></figure>"));
    assert!(!engine.is_valid("<figure><caption>c</caption></figure>"));
}

#[test]
fn test_unordered_mixed_and_simple_content() {
    let (mut engine, _, _) = Engine::compile(
        "root element doc { allowedContent: [ meta, para (n >= 0) ]; }\n\
         element meta { allowedContent: { author, date (optional) }; }\n\
         element author { allowedContent: *any text*; }\n\
         element date { allowedContent: *any text*; }\n\
         element para { allowedContent: [ *any text*, price (n >= 0) ]; }\n\
         element price { attributes: [ currency (optional) ]; allowedContent: amount; }\n\
         attribute currency { defaultValue: 'EUR'; }\n\
         dataType amount { baseType: decimal; minimumValue: 0; }",
    );

    assert!(engine.is_valid(
        "<doc><meta><date>today</date><author>me</author></meta>\
         <para>costs <price currency=\"USD\">3.5</price> only</para></doc>"
    ));
    assert!(!engine.is_valid("<doc><meta><author>a</author></meta><para><price>-1</price></para></doc>"));
    assert!(!engine.is_valid("<doc><meta>text<author>a</author></meta></doc>"));
}

#[test]
fn test_data_type_chain_and_enumerations() {
    let (mut engine, builder, graph) = Engine::compile(
        "root element rating { attributes: [ scale ]; allowedContent: stars; }\n\
         attribute scale { valueType: scale_name; }\n\
         dataType scale_name { allowedValues: ['five', 'ten']; }\n\
         dataType count { baseType: integer; minimumValue: 1; }\n\
         dataType stars { baseType: count; maximumValue: 5; }",
    );

    let example = builder.render_example(&graph, None).unwrap();
    assert!(engine.is_valid(&example), "example rejected:\n{example}");

    assert!(engine.is_valid("<rating scale=\"ten\">5</rating>"));
    assert!(!engine.is_valid("<rating scale=\"ten\">0</rating>"));
    assert!(!engine.is_valid("<rating scale=\"ten\">6</rating>"));
    assert!(!engine.is_valid("<rating scale=\"seven\">3</rating>"));
}

#[test]
fn test_recursive_content() {
    let (mut engine, builder, graph) = Engine::compile(
        "root element section { allowedContent: [ heading, section (n >= 0) ]; }\n\
         element heading { allowedContent: *any text*; }",
    );

    let example = builder.render_example(&graph, None).unwrap();
    assert!(engine.is_valid(&example), "example rejected:\n{example}");
    assert!(engine.is_valid(
        "<section><heading>1</heading><section><heading>1.1</heading></section></section>"
    ));
}
