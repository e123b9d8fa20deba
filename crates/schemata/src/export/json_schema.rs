//! JSON Schema backend (draft 2020-12).
//!
//! Data types, objects and arrays become named entries under `$defs` and
//! are referenced with `$ref` wherever they are used. Properties are inlined
//! into their owning object, keyed by tag name.
//!
//! JSON has no notion of child order, so ordered and unordered property
//! lists export the same way. Only presence is enforced, through
//! `required`.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::{Map, Number, Value, json};

use schemata_core::{
    Array, ContentItem, DataType, Object, Primitive, SchemaGraph, Structure, StructureBody,
    StructureId, StructureKind, TypeRef,
};

use super::{Error, Exporter};
use crate::{config::AppConfig, structure::Reach};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Exports a schema graph as a JSON Schema document.
#[derive(Debug)]
pub struct JsonSchemaExporter<'a> {
    config: &'a AppConfig,
}

impl<'a> JsonSchemaExporter<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Builds the schema document as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameCollision`] if two properties of one object share
    /// a name, or [`Error::UnsupportedContentModel`] if a type reference
    /// names a structure that has no JSON representation.
    pub fn to_value(&self, graph: &SchemaGraph) -> Result<Value, Error> {
        let roots: Vec<StructureId> = graph.root_objects().collect();
        let reach = Reach::compute(graph, &roots, self.config.compile().prune_unreachable());
        let builder = Builder {
            graph,
            additional_properties: self.config.json_schema().additional_properties(),
        };

        let mut defs = Map::new();
        for (id, structure) in graph.iter() {
            if !reach.contains(id) {
                continue;
            }
            let definition = match structure.body() {
                StructureBody::DataType(data_type) => builder.data_type(id, structure, data_type)?,
                StructureBody::Object(object) => builder.object(structure, object)?,
                StructureBody::Array(array) => builder.array(structure, array)?,
                _ => continue,
            };
            defs.insert(definition_key(structure), definition);
        }

        let mut document = Map::new();
        document.insert("$schema".to_string(), json!(DRAFT));
        if let Some(id) = self.config.json_schema().id() {
            document.insert("$id".to_string(), json!(id));
        }
        if let Some(title) = self.config.metadata().title_for(graph.format_name()) {
            document.insert("title".to_string(), json!(title));
        }
        match roots.as_slice() {
            [] => {}
            [root] => {
                document.insert("$ref".to_string(), json!(reference(graph.structure(*root))));
            }
            roots => {
                let choices: Vec<Value> = roots
                    .iter()
                    .map(|root| json!({ "$ref": reference(graph.structure(*root)) }))
                    .collect();
                document.insert("oneOf".to_string(), Value::Array(choices));
            }
        }
        document.insert("$defs".to_string(), Value::Object(defs));

        info!(roots = roots.len(); "JSON Schema exported");
        Ok(Value::Object(document))
    }
}

impl Exporter for JsonSchemaExporter<'_> {
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error> {
        let value = self.to_value(graph)?;
        let mut text = serde_json::to_string_pretty(&value)
            .map_err(|err| Error::Serialization(err.to_string()))?;
        text.push('\n');
        Ok(text)
    }
}

/// `dataType.<ref>`, `object.<ref>` or `array.<ref>`.
fn definition_key(structure: &Structure) -> String {
    format!("{}.{}", structure.kind().keyword(), structure.reference())
}

fn reference(structure: &Structure) -> String {
    format!("#/$defs/{}", definition_key(structure))
}

fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "string",
        Primitive::Integer => "integer",
        Primitive::Decimal => "number",
        Primitive::Boolean => "boolean",
    }
}

/// Converts an enumeration literal to a JSON value of the chain's primitive.
///
/// Literals are checked against their primitive during resolution; a literal
/// that still fails to convert stays a string.
fn typed_literal(primitive: Primitive, literal: &str) -> Value {
    let converted = match primitive {
        Primitive::String => None,
        Primitive::Integer => literal.parse::<i64>().ok().map(Value::from),
        Primitive::Decimal => literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Primitive::Boolean => match literal {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
    };
    converted.unwrap_or_else(|| Value::String(literal.to_string()))
}

struct Builder<'a> {
    graph: &'a SchemaGraph,
    additional_properties: bool,
}

impl Builder<'_> {
    fn data_type(
        &self,
        id: StructureId,
        structure: &Structure,
        data_type: &DataType,
    ) -> Result<Value, Error> {
        let mut schema = Map::new();
        match data_type.base_type() {
            TypeRef::Primitive(primitive) => {
                schema.insert("type".to_string(), json!(primitive_type(primitive)));
            }
            TypeRef::Structure(base) => {
                schema.insert("$ref".to_string(), json!(reference(self.graph.structure(base))));
            }
        }

        let constraints = data_type.constraints();
        if let Some(pattern) = constraints.pattern() {
            // XSD patterns match the whole value; JSON Schema patterns do not.
            schema.insert("pattern".to_string(), json!(format!("^(?:{pattern})$")));
        }
        if !constraints.values().is_empty() {
            let primitive = self
                .graph
                .base_primitive(TypeRef::Structure(id))
                .unwrap_or(Primitive::String);
            let values: Vec<Value> = constraints
                .values()
                .iter()
                .map(|value| typed_literal(primitive, value))
                .collect();
            schema.insert("enum".to_string(), Value::Array(values));
        }
        if let Some(minimum) = constraints.minimum() {
            schema.insert("minimum".to_string(), json!(minimum));
        }
        if let Some(maximum) = constraints.maximum() {
            schema.insert("maximum".to_string(), json!(maximum));
        }
        self.describe(&mut schema, structure, Some(TypeRef::Structure(id)));
        Ok(Value::Object(schema))
    }

    fn object(&self, structure: &Structure, object: &Object) -> Result<Value, Error> {
        debug!(object = structure.reference(); "Exporting object");

        let mut properties = Map::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut required = Vec::new();
        for item in object.properties() {
            let (name, schema) = self.property(structure, item)?;
            let reference = self.graph.structure(item.target()).reference();
            if let Some(first) = owners.insert(name, reference) {
                return Err(Error::NameCollision {
                    first: first.to_string(),
                    second: reference.to_string(),
                    name: name.to_string(),
                    scope: format!("the properties of `{}`", structure.reference()),
                });
            }
            if item.cardinality().min() >= 1 {
                required.push(json!(name));
            }
            properties.insert(name.to_string(), schema);
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema.insert(
            "additionalProperties".to_string(),
            json!(self.additional_properties),
        );
        self.describe(&mut schema, structure, None);
        Ok(Value::Object(schema))
    }

    fn property<'g>(
        &'g self,
        owner: &Structure,
        item: &ContentItem,
    ) -> Result<(&'g str, Value), Error> {
        let structure = self.graph.structure(item.target());
        let StructureBody::Property(property) = structure.body() else {
            return Err(self.not_representable(owner, structure));
        };
        if item.cardinality().is_repeatable() {
            warn!(
                object = owner.reference(),
                property = structure.reference();
                "Property may repeat, but JSON objects hold each key once"
            );
        }
        let mut schema = self.value_schema(structure, property.value_type())?;
        if let Value::Object(map) = &mut schema {
            self.describe(map, structure, Some(property.value_type()));
        }
        Ok((structure.tag_name(), schema))
    }

    fn array(&self, structure: &Structure, array: &Array) -> Result<Value, Error> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("array"));
        schema.insert(
            "items".to_string(),
            self.value_schema(structure, array.item_type())?,
        );
        let items = array.items();
        if items.min() > 0 {
            schema.insert("minItems".to_string(), json!(items.min()));
        }
        if let Some(max) = items.max() {
            schema.insert("maxItems".to_string(), json!(max));
        }
        self.describe(&mut schema, structure, None);
        Ok(Value::Object(schema))
    }

    /// Adds `description`, and `examples` for values of `value_type`.
    fn describe(
        &self,
        schema: &mut Map<String, Value>,
        structure: &Structure,
        value_type: Option<TypeRef>,
    ) {
        let metadata = structure.metadata();
        if let Some(description) = metadata.description() {
            schema.insert("description".to_string(), json!(description));
        }
        if let (Some(example), Some(value_type)) = (metadata.example_value(), value_type) {
            let primitive = self
                .graph
                .base_primitive(value_type)
                .unwrap_or(Primitive::String);
            schema.insert(
                "examples".to_string(),
                json!([typed_literal(primitive, example)]),
            );
        }
    }

    /// Schema of a property value or array item.
    fn value_schema(&self, owner: &Structure, type_ref: TypeRef) -> Result<Value, Error> {
        match type_ref {
            TypeRef::Primitive(primitive) => Ok(json!({ "type": primitive_type(primitive) })),
            TypeRef::Structure(id) => {
                let target = self.graph.structure(id);
                match target.kind() {
                    StructureKind::DataType | StructureKind::Object | StructureKind::Array => {
                        Ok(json!({ "$ref": reference(target) }))
                    }
                    _ => Err(self.not_representable(owner, target)),
                }
            }
        }
    }

    fn not_representable(&self, owner: &Structure, target: &Structure) -> Error {
        Error::UnsupportedContentModel {
            structure: owner.reference().to_string(),
            reason: format!(
                "`{}` is {} {}, which has no JSON Schema form here",
                target.reference(),
                match target.kind() {
                    StructureKind::Element | StructureKind::Attribute => "an",
                    _ => "a",
                },
                target.kind()
            ),
        }
    }
}
