//! Markdown reference documentation.
//!
//! One section per structure, listed roots first and then breadth-first in
//! the order the roots reach them.

use std::fmt::{self, Write};

use log::info;

use schemata_core::{
    Compositor, ContentItem, ContentModel, Group, Ordering, Particle, SchemaGraph, Structure,
    StructureBody, StructureId, TypeRef,
};

use super::{Error, Exporter};
use crate::{config::AppConfig, structure::documentation_order};

/// Renders a schema graph as a Markdown reference.
#[derive(Debug)]
pub struct DocsExporter<'a> {
    config: &'a AppConfig,
}

impl<'a> DocsExporter<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    fn write_document(&self, graph: &SchemaGraph, out: &mut String) -> fmt::Result {
        let order = documentation_order(graph, self.config.compile().prune_unreachable());
        let writer = Writer { graph };

        match self.config.metadata().title_for(graph.format_name()) {
            Some(title) => writeln!(out, "# {title} Specification\n")?,
            None => writeln!(out, "# Schema Reference\n")?,
        }

        writeln!(out, "## Table of Contents\n")?;
        for &id in &order {
            let structure = graph.structure(id);
            writeln!(
                out,
                "- [`{}`](#{}) ({})",
                structure.reference(),
                anchor(structure.reference()),
                kind_label(structure)
            )?;
        }

        for &id in &order {
            writer.section(out, graph.structure(id))?;
        }

        info!(sections = order.len(); "Documentation exported");
        Ok(())
    }
}

impl Exporter for DocsExporter<'_> {
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error> {
        let mut out = String::new();
        self.write_document(graph, &mut out)
            .map_err(|err| Error::Serialization(err.to_string()))?;
        Ok(out)
    }
}

/// GitHub-style heading anchor.
fn anchor(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn group_label(compositor: Compositor) -> &'static str {
    match compositor {
        Compositor::Sequence => "In this order",
        Compositor::Unordered => "In any order",
        Compositor::Choice => "One of",
    }
}

fn kind_label(structure: &Structure) -> String {
    if structure.is_root() {
        format!("root {}", structure.kind())
    } else {
        structure.kind().to_string()
    }
}

struct Writer<'a> {
    graph: &'a SchemaGraph,
}

impl Writer<'_> {
    fn section(&self, out: &mut String, structure: &Structure) -> fmt::Result {
        writeln!(out, "\n## {}\n", structure.reference())?;
        if let Some(description) = structure.metadata().description() {
            writeln!(out, "{description}\n")?;
        }
        writeln!(out, "- **Kind:** {}", kind_label(structure))?;
        writeln!(out, "- **Name:** `{}`", structure.tag_name())?;
        if let Some(example) = structure.metadata().example_value() {
            writeln!(out, "- **Example:** `{example}`")?;
        }

        match structure.body() {
            StructureBody::Element(element) => {
                self.attribute_table(out, element.attributes())?;
                self.content(out, element.content())
            }
            StructureBody::Attribute(attribute) => {
                writeln!(out, "- **Value type:** {}", self.type_link(attribute.value_type()))?;
                if let Some(default) = attribute.default_value() {
                    writeln!(out, "- **Default:** `{default}`")?;
                }
                Ok(())
            }
            StructureBody::DataType(data_type) => {
                writeln!(out, "- **Base type:** {}", self.type_link(data_type.base_type()))?;
                let constraints = data_type.constraints();
                if constraints.is_empty() {
                    return Ok(());
                }
                writeln!(out, "\n### Constraints\n")?;
                if let Some(pattern) = constraints.pattern() {
                    writeln!(out, "- pattern: `{pattern}`")?;
                }
                if !constraints.values().is_empty() {
                    let values: Vec<String> = constraints
                        .values()
                        .iter()
                        .map(|value| format!("`{value}`"))
                        .collect();
                    writeln!(out, "- one of: {}", values.join(", "))?;
                }
                if let Some(minimum) = constraints.minimum() {
                    writeln!(out, "- minimum: `{minimum}`")?;
                }
                if let Some(maximum) = constraints.maximum() {
                    writeln!(out, "- maximum: `{maximum}`")?;
                }
                Ok(())
            }
            StructureBody::Object(object) => {
                let ordering = match object.ordering() {
                    Ordering::Ordered => "ordered",
                    Ordering::Unordered => "unordered",
                };
                writeln!(out, "\n### Properties ({ordering})\n")?;
                self.item_list(out, object.properties())
            }
            StructureBody::Property(property) => {
                writeln!(out, "- **Value type:** {}", self.type_link(property.value_type()))
            }
            StructureBody::Array(array) => {
                writeln!(out, "- **Item type:** {}", self.type_link(array.item_type()))?;
                writeln!(out, "- **Items:** `{}`", array.items())
            }
        }
    }

    fn attribute_table(&self, out: &mut String, attributes: &[ContentItem]) -> fmt::Result {
        writeln!(out, "\n### Attributes\n")?;
        if attributes.is_empty() {
            return writeln!(out, "None");
        }

        writeln!(out, "| Name | Use | Type |")?;
        writeln!(out, "|---|---|---|")?;
        for item in attributes {
            let structure = self.graph.structure(item.target());
            let value_type = match structure.body() {
                StructureBody::Attribute(attribute) => self.type_link(attribute.value_type()),
                _ => String::new(),
            };
            let usage = if item.cardinality().is_exactly_one() {
                "required"
            } else {
                "optional"
            };
            writeln!(
                out,
                "| {} | {usage} | {value_type} |",
                self.link(item.target())
            )?;
        }
        Ok(())
    }

    fn content(&self, out: &mut String, content: &ContentModel) -> fmt::Result {
        writeln!(out, "\n### Allowed Content\n")?;
        match content {
            ContentModel::Empty => writeln!(out, "Empty"),
            ContentModel::TextOnly => writeln!(out, "Any text"),
            ContentModel::Value(value) => writeln!(out, "A value of {}", self.type_link(*value)),
            ContentModel::Children(group) => {
                let text = if group.is_mixed() { ", mixed with text" } else { "" };
                writeln!(out, "{}{text}:\n", group_label(group.compositor()))?;
                if group.is_empty() {
                    return writeln!(out, "None");
                }
                self.group_list(out, group, 0)
            }
        }
    }

    /// Nested groups become indented sub-lists.
    fn group_list(&self, out: &mut String, group: &Group, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for particle in group.particles() {
            match particle {
                Particle::Element(item) => writeln!(
                    out,
                    "{indent}- {} `{}`",
                    self.link(item.target()),
                    item.cardinality()
                )?,
                Particle::Group(nested) => {
                    writeln!(out, "{indent}- {}:", group_label(nested.compositor()))?;
                    self.group_list(out, nested, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn item_list(&self, out: &mut String, items: &[ContentItem]) -> fmt::Result {
        if items.is_empty() {
            return writeln!(out, "None");
        }
        for item in items {
            writeln!(out, "- {} `{}`", self.link(item.target()), item.cardinality())?;
        }
        Ok(())
    }

    fn link(&self, id: StructureId) -> String {
        let reference = self.graph.structure(id).reference();
        format!("[`{reference}`](#{})", anchor(reference))
    }

    fn type_link(&self, type_ref: TypeRef) -> String {
        match type_ref {
            TypeRef::Primitive(primitive) => format!("`{primitive}`"),
            TypeRef::Structure(id) => self.link(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompileConfig, JsonSchemaConfig, MetadataConfig, XsdConfig};

    fn docs(source: &str) -> String {
        let graph = schemata_parser::parse(source).expect("schema should parse");
        DocsExporter::new(&AppConfig::default()).export(&graph).unwrap()
    }

    const BOOKS: &str = r#"
        element title { allowedContent: *any text*; }
        root element book { attributes: [ id, lang (optional) ]; allowedContent: [ title, author (n >= 1) ]; }
        element author { allowedContent: *any text*; }
        attribute id { valueType: _id; }
        attribute lang {}
        dataType _id { allowedPattern: /[a-z]+/; allowedValues: ['ab', 'cd']; }
    "#;

    #[test]
    fn test_roots_come_first() {
        let text = docs(BOOKS);
        let book = text.find("\n## book\n").unwrap();
        let title = text.find("\n## title\n").unwrap();
        assert!(book < title);
        assert!(text.starts_with("# Schema Reference\n"));
    }

    #[test]
    fn test_table_of_contents() {
        let text = docs(BOOKS);
        assert!(text.contains("- [`book`](#book) (root element)\n"));
        assert!(text.contains("- [`_id`](#_id) (dataType)\n"));
    }

    #[test]
    fn test_attribute_table() {
        let text = docs(BOOKS);
        assert!(text.contains("| [`id`](#id) | required | [`_id`](#_id) |"));
        assert!(text.contains("| [`lang`](#lang) | optional | `string` |"));
    }

    #[test]
    fn test_content_and_constraints() {
        let text = docs(BOOKS);
        assert!(text.contains("In this order:\n\n- [`title`](#title) `1..1`\n- [`author`](#author) `1..*`\n"));
        assert!(text.contains("- pattern: `[a-z]+`\n- one of: `ab`, `cd`\n"));
        assert!(text.contains("### Allowed Content\n\nAny text\n"));
    }

    #[test]
    fn test_unreachable_sections() {
        let source = "root element a {}\nelement stray {}";
        assert!(!docs(source).contains("## stray"));

        let config = AppConfig::new(
            CompileConfig::new(false),
            MetadataConfig::new(Some("Demo".to_string()), None),
            XsdConfig::default(),
            JsonSchemaConfig::default(),
        );
        let graph = schemata_parser::parse(source).unwrap();
        let text = DocsExporter::new(&config).export(&graph).unwrap();
        assert!(text.starts_with("# Demo Specification\n"));
        assert!(text.contains("\n## stray\n"));
    }

    #[test]
    fn test_choice_and_nested_groups() {
        let text = docs(
            "root element figure { allowedContent: [ {image / video}, caption (optional) ]; }\n\
             element image {}\nelement video {}\nelement caption {}",
        );
        assert!(text.contains(
            "In this order:\n\n\
             - One of:\n  \
             - [`image`](#image) `1..1`\n  \
             - [`video`](#video) `1..1`\n\
             - [`caption`](#caption) `0..1`\n"
        ));
    }

    #[test]
    fn test_top_level_choice_label() {
        let text = docs("root element media { allowedContent: {a / b}; }\nelement a {}\nelement b {}");
        assert!(text.contains("### Allowed Content\n\nOne of:\n\n- [`a`](#a)"));
    }

    #[test]
    fn test_metadata_comments() {
        let text = docs(
            "/* Format Name: Library */\n\
             root element book { /* Description: One printed book. */ attributes: [ isbn ]; }\n\
             attribute isbn { /* Example Value: 978-3-16 */ }",
        );
        assert!(text.starts_with("# Library Specification\n"));
        assert!(text.contains("\n## book\n\nOne printed book.\n\n- **Kind:** root element\n"));
        assert!(text.contains("- **Example:** `978-3-16`\n"));
    }

    #[test]
    fn test_anchor() {
        assert_eq!(anchor("Book_List"), "book_list");
        assert_eq!(anchor("a.b"), "ab");
    }
}
