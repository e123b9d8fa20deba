//! Sample XML instance generation.
//!
//! Builds one document for a root element, filling in every attribute and
//! enough children to satisfy each cardinality. Repeatable children are
//! shown a few times so the output reads like real data, and a choice shows
//! its first option.
//!
//! Values come from `Example Value:` metadata when present, then from
//! allowed values, bounds and defaults. A value that a pattern along the
//! data type chain rejects is an error rather than an invalid sample.

use log::{debug, info};
use regex::Regex;

use schemata_core::{
    Compositor, ContentItem, ContentModel, Group, Particle, Primitive, SchemaGraph, Structure,
    StructureBody, StructureId, StructureKind, TypeRef,
};

use super::{Error, Exporter, xml::XmlWriter};
use crate::config::AppConfig;

/// How many times a repeatable child is shown when its maximum allows it.
const REPEAT: u32 = 3;

/// Placeholder for text and string values.
const PLACEHOLDER: &str = "...";

/// Generates a sample XML document for a root element.
#[derive(Debug)]
pub struct ExampleExporter<'a> {
    config: &'a AppConfig,
    root: Option<&'a str>,
}

impl<'a> ExampleExporter<'a> {
    /// Creates an exporter for the first root element.
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config, root: None }
    }

    /// Selects the root element by reference name.
    pub fn with_root(mut self, root: &'a str) -> Self {
        self.root = Some(root);
        self
    }

    fn root(&self, graph: &SchemaGraph) -> Result<StructureId, Error> {
        match self.root {
            None => graph.root_elements().next().ok_or(Error::NoRootElement),
            Some(name) => graph
                .find(name)
                .filter(|id| {
                    let structure = graph.structure(*id);
                    structure.kind() == StructureKind::Element && structure.is_root()
                })
                .ok_or_else(|| Error::UnknownRoot(name.to_string())),
        }
    }
}

impl Exporter for ExampleExporter<'_> {
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error> {
        let root = self.root(graph)?;

        let mut generator = Generator {
            graph,
            out: XmlWriter::new(self.config.xsd().indent()),
            path: Vec::new(),
        };
        generator.out.declaration()?;
        generator.element(root)?;

        info!(root = graph.structure(root).reference(); "Example exported");
        generator.out.finish()
    }
}

/// Number of copies of a child in the sample.
///
/// Optional children appear once, repeatable ones up to [`REPEAT`] times,
/// and never fewer than the minimum.
fn repeat_count(min: u32, max: Option<u32>) -> u32 {
    max.map_or(REPEAT, |max| max.min(REPEAT)).max(min)
}

/// Returns `true` if `pattern` matches all of `value`, as XSD patterns do.
fn matches_whole(pattern: &str, value: &str) -> Result<bool, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$")).map(|regex| regex.is_match(value))
}

struct Generator<'a> {
    graph: &'a SchemaGraph,
    out: XmlWriter,
    /// Elements currently open, to stop recursive content.
    path: Vec<StructureId>,
}

impl<'a> Generator<'a> {
    fn element(&mut self, id: StructureId) -> Result<(), Error> {
        let graph = self.graph;
        let structure = graph.structure(id);
        let StructureBody::Element(element) = structure.body() else {
            return Ok(());
        };

        let mut values: Vec<(&str, String)> = Vec::with_capacity(element.attributes().len());
        for item in element.attributes() {
            let attribute = graph.structure(item.target());
            values.push((attribute.tag_name(), self.attribute_value(attribute)?));
        }
        let attributes: Vec<(&str, &str)> = values
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        let tag = structure.tag_name();

        let group = match element.content() {
            ContentModel::Empty => return self.out.empty(tag, &attributes),
            ContentModel::TextOnly => {
                let text = structure.metadata().example_value().unwrap_or(PLACEHOLDER);
                self.out.start(tag, &attributes)?;
                self.out.text(text)?;
                return self.out.end(tag);
            }
            ContentModel::Value(value) => {
                let text = self.sample_value(structure, *value)?;
                self.out.start(tag, &attributes)?;
                self.out.text(&text)?;
                return self.out.end(tag);
            }
            ContentModel::Children(group) => group,
        };

        self.out.start(tag, &attributes)?;
        self.path.push(id);
        self.group(structure, group)?;
        self.path.pop();
        self.out.end(tag)
    }

    fn group(&mut self, owner: &Structure, group: &'a Group) -> Result<(), Error> {
        let particles: Vec<&Particle> = match group.compositor() {
            // The first option that does not recurse into an open element.
            Compositor::Choice => group
                .particles()
                .iter()
                .find(|particle| match particle {
                    Particle::Element(item) => !self.path.contains(&item.target()),
                    Particle::Group(_) => true,
                })
                .into_iter()
                .collect(),
            Compositor::Sequence | Compositor::Unordered => group.particles().iter().collect(),
        };

        for particle in particles {
            match particle {
                Particle::Element(item) => self.child(owner, item)?,
                Particle::Group(nested) => self.group(owner, nested)?,
            }
        }
        Ok(())
    }

    fn child(&mut self, owner: &Structure, item: &ContentItem) -> Result<(), Error> {
        if self.path.contains(&item.target()) {
            debug!(element = owner.reference(); "Skipping recursive child in example");
            return Ok(());
        }
        let cardinality = item.cardinality();
        for _ in 0..repeat_count(cardinality.min(), cardinality.max()) {
            self.element(item.target())?;
        }
        Ok(())
    }

    /// The attribute's example value, else its default, else a sample of
    /// its value type.
    fn attribute_value(&self, structure: &Structure) -> Result<String, Error> {
        let StructureBody::Attribute(attribute) = structure.body() else {
            return Ok(PLACEHOLDER.to_string());
        };
        match attribute.default_value() {
            Some(default) if structure.metadata().example_value().is_none() => {
                Ok(default.to_string())
            }
            _ => self.sample_value(structure, attribute.value_type()),
        }
    }

    /// A value of `type_ref` for `owner`.
    ///
    /// The owner's example value comes first. Along the data type chain the
    /// nearest example value or allowed value wins, then the nearest bound,
    /// then a placeholder for the primitive. The result must satisfy every
    /// pattern on the chain.
    fn sample_value(&self, owner: &Structure, type_ref: TypeRef) -> Result<String, Error> {
        let mut candidate = owner.metadata().example_value().map(str::to_string);
        let mut bound = None;
        let mut patterns: Vec<(&Structure, &str)> = Vec::new();

        let mut current = type_ref;
        let primitive = loop {
            match current {
                TypeRef::Primitive(primitive) => break primitive,
                TypeRef::Structure(id) => {
                    let structure = self.graph.structure(id);
                    let StructureBody::DataType(data_type) = structure.body() else {
                        return Ok(PLACEHOLDER.to_string());
                    };
                    let constraints = data_type.constraints();
                    if candidate.is_none() {
                        candidate = structure
                            .metadata()
                            .example_value()
                            .map(str::to_string)
                            .or_else(|| constraints.values().first().cloned());
                    }
                    if bound.is_none() {
                        bound = constraints
                            .minimum()
                            .or(constraints.maximum())
                            .map(|value| value.to_string());
                    }
                    if let Some(pattern) = constraints.pattern() {
                        patterns.push((structure, pattern));
                    }
                    current = data_type.base_type();
                }
            }
        };

        let value = candidate
            .or(bound)
            .unwrap_or_else(|| placeholder(primitive).to_string());
        for (structure, pattern) in patterns {
            let no_sample = |reason: String| Error::NoSampleValue {
                structure: structure.reference().to_string(),
                reason,
            };
            match matches_whole(pattern, &value) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(no_sample(format!(
                        "`{value}` does not match the pattern `{pattern}`; \
                         give an `Example Value:` that does"
                    )));
                }
                Err(err) => return Err(no_sample(err.to_string())),
            }
        }
        Ok(value)
    }
}

fn placeholder(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => PLACEHOLDER,
        Primitive::Integer => "0",
        Primitive::Decimal => "0.0",
        Primitive::Boolean => "true",
    }
}
