//! End-to-end tests: compile schemas, then validate instance documents
//! against the generated XSD and JSON Schema.

mod support;

use serde_json::json;

use schemata::{SchemaBuilder, export::json_schema::JsonSchemaExporter};
use support::Schema;

const BOOK_LIST: &str = r#"
root element books {
    allowedContent: [ book (n>=0) ];
}

element book {
    attributes: id;
    allowedContent: [ title, subtitle (optional), isbn ];
}

attribute id { valueType: _id; }

dataType _id {
    baseType: string;
    allowedPattern: '[A-Za-z0-9_]+';
}

element title { allowedContent: *any text*; }
element subtitle { allowedContent: *any text*; }
element isbn { allowedContent: *any text*; }
"#;

const ORDERED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<books>
    <book id="pride_and_prejudice">
        <title>Pride and Prejudice</title>
        <subtitle></subtitle>
        <isbn>978-0141439518</isbn>
    </book>
</books>
"#;

const REORDERED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<books>
    <book id="pride_and_prejudice">
        <isbn>978-0141439518</isbn>
        <title>Pride and Prejudice</title>
        <subtitle></subtitle>
    </book>
</books>
"#;

fn compile_xsd(source: &str) -> Schema {
    let builder = SchemaBuilder::default();
    let graph = builder.parse(source).expect("Failed to parse schema");
    let xsd = builder.render_xsd(&graph).expect("Failed to render XSD");
    Schema::parse(&xsd)
}

#[test]
fn test_ordered_document_is_accepted() {
    let schema = compile_xsd(BOOK_LIST);
    assert_eq!(schema.validate(ORDERED), Ok(()));
}

#[test]
fn test_reordered_document_is_rejected() {
    let schema = compile_xsd(BOOK_LIST);
    let err = schema.validate(REORDERED).unwrap_err();
    assert!(err.contains("title"), "unexpected error: {err}");
}

#[test]
fn test_unordered_content_accepts_reordering() {
    let unordered = BOOK_LIST.replace(
        "[ title, subtitle (optional), isbn ]",
        "{ title, subtitle (optional), isbn }",
    );
    let schema = compile_xsd(&unordered);
    assert_eq!(schema.validate(REORDERED), Ok(()));
    assert_eq!(schema.validate(ORDERED), Ok(()));
}

#[test]
fn test_optional_and_repeated_children() {
    let schema = compile_xsd(BOOK_LIST);

    assert_eq!(schema.validate("<books/>"), Ok(()));
    assert_eq!(
        schema.validate(
            "<books><book id=\"a\"><title>A</title><isbn>1</isbn></book>\
             <book id=\"b\"><title>B</title><isbn>2</isbn></book></books>"
        ),
        Ok(())
    );
    assert!(
        schema
            .validate("<books><book id=\"a\"><title>A</title></book></books>")
            .is_err()
    );
}

#[test]
fn test_attribute_pattern_is_enforced() {
    let schema = compile_xsd(BOOK_LIST);

    let bad_id = ORDERED.replace("pride_and_prejudice", "a-b");
    let err = schema.validate(&bad_id).unwrap_err();
    assert!(err.contains("a-b"), "unexpected error: {err}");

    let missing_id = ORDERED.replace(" id=\"pride_and_prejudice\"", "");
    assert!(schema.validate(&missing_id).is_err());
}

#[test]
fn test_restriction_chain_applies_every_pattern() {
    let schema = compile_xsd(
        "root element code { allowedContent: upper; }\n\
         dataType letters { allowedPattern: '[A-Za-z]+'; }\n\
         dataType upper { baseType: letters; allowedPattern: '[A-Z].*'; }",
    );

    assert_eq!(schema.validate("<code>Abc</code>"), Ok(()));
    // Fails the derived pattern only.
    assert!(schema.validate("<code>abc</code>").is_err());
    // Fails the base pattern only.
    assert!(schema.validate("<code>A1</code>").is_err());
}

#[test]
fn test_numeric_bounds_and_enumerations() {
    let schema = compile_xsd(
        "root element rating { attributes: [ scale ]; allowedContent: stars; }\n\
         attribute scale { valueType: scale_name; }\n\
         dataType scale_name { allowedValues: ['five', 'ten']; }\n\
         dataType stars { baseType: integer; minimumValue: 1; maximumValue: 5; }",
    );

    assert_eq!(schema.validate("<rating scale=\"five\">3</rating>"), Ok(()));
    assert!(schema.validate("<rating scale=\"five\">6</rating>").is_err());
    assert!(schema.validate("<rating scale=\"five\">2.5</rating>").is_err());
    assert!(schema.validate("<rating scale=\"seven\">3</rating>").is_err());
}

#[test]
fn test_generated_example_is_valid() {
    let builder = SchemaBuilder::default();
    let graph = builder
        .parse(
            "root element shelf { allowedContent: [ rating (n >= 1) ]; }\n\
             element rating { attributes: [ scale ]; allowedContent: stars; }\n\
             attribute scale { valueType: scale_name; }\n\
             dataType scale_name { allowedValues: ['five', 'ten']; }\n\
             dataType stars { baseType: integer; minimumValue: 1; maximumValue: 5; }",
        )
        .unwrap();
    let schema = Schema::parse(&builder.render_xsd(&graph).unwrap());

    let example = builder.render_example(&graph, None).unwrap();
    assert_eq!(example.matches("<rating scale=\"five\">1</rating>").count(), 3);
    assert_eq!(schema.validate(&example), Ok(()));
}

const MEDIA: &str = r#"
/* Format Name: Media Catalog */
root element catalog { allowedContent: [ entry (n >= 1) ]; }

element entry {
    attributes: [ id ];
    allowedContent: [ {image / video / [ audio, transcript (optional) ]}, caption (optional) ];
}

element image { allowedContent: *any text*; }
element video { allowedContent: *any text*; }
element audio { allowedContent: *any text*; }
element transcript { allowedContent: *any text*; }
element caption { allowedContent: *any text*; }

attribute id { valueType: _id; }

dataType _id {
    /* Example Value: m-001 */
    allowedPattern: /m-[0-9]{3}/;
}
"#;

#[test]
fn test_choice_accepts_exactly_one_option() {
    let schema = compile_xsd(MEDIA);

    for option in [
        "<image>a.png</image>",
        "<video>a.mp4</video>",
        "<audio>a.ogg</audio><transcript>Hi</transcript>",
        "<audio>a.ogg</audio>",
    ] {
        let document = format!("<catalog><entry id=\"m-001\">{option}</entry></catalog>");
        assert_eq!(schema.validate(&document), Ok(()), "{option}");
    }

    let none = "<catalog><entry id=\"m-001\"><caption>c</caption></entry></catalog>";
    assert!(schema.validate(none).is_err());
    let both = "<catalog><entry id=\"m-001\"><image>a</image><video>b</video></entry></catalog>";
    assert!(schema.validate(both).is_err());
}

#[test]
fn test_generated_example_satisfies_patterns_and_choices() {
    let builder = SchemaBuilder::default();
    let graph = builder.parse(MEDIA).expect("Failed to parse schema");
    let schema = Schema::parse(&builder.render_xsd(&graph).expect("Failed to render XSD"));

    let example = builder.render_example(&graph, None).unwrap();
    assert!(example.contains("<entry id=\"m-001\">"));
    assert_eq!(schema.validate(&example), Ok(()));

    // Without the example value no sample satisfies the pattern.
    let without_example = MEDIA.replace("/* Example Value: m-001 */", "");
    let graph = builder.parse(&without_example).unwrap();
    assert!(builder.render_example(&graph, None).is_err());
}

#[test]
fn test_every_backend_sees_the_format_name() {
    let builder = SchemaBuilder::default();
    let graph = builder.parse(MEDIA).unwrap();

    assert!(
        builder
            .render_xsd(&graph)
            .unwrap()
            .contains("<!-- An XSD file for Media Catalog. -->")
    );
    assert!(
        builder
            .render_docs(&graph)
            .unwrap()
            .starts_with("# Media Catalog Specification\n")
    );
}

const BOOK_LIST_JSON: &str = r#"
root object library { properties: [ books ]; }

property books { valueType: book_array; }
array book_array { itemType: book (n >= 0); }

object book { properties: [ id, title, subtitle (optional), isbn ]; }
property id { valueType: _id; }
property title { valueType: string; }
property subtitle { valueType: string; }
property isbn { valueType: string; }

dataType _id {
    baseType: string;
    allowedPattern: '[A-Za-z0-9_]+';
}
"#;

fn compile_json_schema(source: &str) -> serde_json::Value {
    let builder = SchemaBuilder::default();
    let graph = builder.parse(source).expect("Failed to parse schema");
    JsonSchemaExporter::new(builder.config())
        .to_value(&graph)
        .expect("Failed to render JSON Schema")
}

#[test]
fn test_json_book_list() {
    let schema = compile_json_schema(BOOK_LIST_JSON);
    let validator = jsonschema::validator_for(&schema).expect("schema should compile");

    let book = json!({ "id": "pride_and_prejudice", "title": "Pride and Prejudice", "isbn": "978" });
    assert!(validator.is_valid(&json!({ "books": [book] })));
    assert!(validator.is_valid(&json!({ "books": [] })));

    // Missing a required property.
    assert!(!validator.is_valid(&json!({ "books": [{ "id": "a", "title": "A" }] })));
    // Pattern on the id.
    assert!(!validator.is_valid(
        &json!({ "books": [{ "id": "a-b", "title": "A", "isbn": "1" }] })
    ));
    // Unknown property.
    assert!(!validator.is_valid(
        &json!({ "books": [{ "id": "a", "title": "A", "isbn": "1", "year": 1813 }] })
    ));
}

#[test]
fn test_json_restriction_chain_applies_every_pattern() {
    let schema = compile_json_schema(
        "root object entry { properties: [ code ]; }\n\
         property code { valueType: upper; }\n\
         dataType letters { allowedPattern: '[A-Za-z]+'; }\n\
         dataType upper { baseType: letters; allowedPattern: '[A-Z].*'; }",
    );
    let validator = jsonschema::validator_for(&schema).expect("schema should compile");

    assert!(validator.is_valid(&json!({ "code": "Abc" })));
    assert!(!validator.is_valid(&json!({ "code": "abc" })));
    assert!(!validator.is_valid(&json!({ "code": "A1" })));
}

#[test]
fn test_output_is_deterministic() {
    let builder = SchemaBuilder::default();

    let first = builder.parse(BOOK_LIST).unwrap();
    let second = builder.parse(BOOK_LIST).unwrap();

    assert_eq!(
        builder.render_xsd(&first).unwrap(),
        builder.render_xsd(&second).unwrap()
    );
    assert_eq!(
        builder.render_docs(&first).unwrap(),
        builder.render_docs(&second).unwrap()
    );

    let json = builder.parse(BOOK_LIST_JSON).unwrap();
    assert_eq!(
        builder.render_json_schema(&json).unwrap(),
        builder.render_json_schema(&json).unwrap()
    );
}
