//! XML Schema backend.
//!
//! Every emitted element and data type becomes a named global type, and
//! local element declarations refer to those types by name. Recursive
//! content models therefore need no special handling: a type that contains
//! itself simply names itself.
//!
//! Output order is fixed: the optional header comment, data types in
//! declaration order, element types in declaration order, and finally one
//! global `xs:element` per root element.

use std::collections::HashMap;

use log::{debug, info, warn};

use schemata_core::{
    Attribute, Compositor, ContentItem, ContentModel, DataType, Element, Group, Particle,
    Primitive, SchemaGraph, Structure, StructureBody, StructureId, StructureKind, TypeRef,
};

use super::{Error, Exporter, is_ncname, xml::XmlWriter};
use crate::{
    config::{AppConfig, XsdConfig},
    structure::Reach,
};

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Exports a schema graph as an XML Schema document.
#[derive(Debug)]
pub struct XsdExporter<'a> {
    config: &'a AppConfig,
}

impl<'a> XsdExporter<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }
}

impl Exporter for XsdExporter<'_> {
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error> {
        let roots: Vec<StructureId> = graph.root_elements().collect();
        if roots.is_empty() {
            warn!("Schema declares no root element; the XSD will only define types");
        }
        let reach = Reach::compute(graph, &roots, self.config.compile().prune_unreachable());

        let mut emitter = Emitter {
            graph,
            config: self.config.xsd(),
            out: XmlWriter::new(self.config.xsd().indent()),
        };
        let title = self.config.metadata().title_for(graph.format_name());
        emitter.document(&reach, &roots, title)?;

        info!(roots = roots.len(); "XSD exported");
        emitter.out.finish()
    }
}

struct Emitter<'a> {
    graph: &'a SchemaGraph,
    config: &'a XsdConfig,
    out: XmlWriter,
}

impl Emitter<'_> {
    fn document(
        &mut self,
        reach: &Reach,
        roots: &[StructureId],
        title: Option<String>,
    ) -> Result<(), Error> {
        // Global element declarations share one symbol space.
        self.check_distinct_tags("root elements", roots)?;

        self.out.declaration()?;
        if let Some(title) = title {
            self.out.comment(&format!("An XSD file for {title}."))?;
        }
        self.out.start(
            "xs:schema",
            &[
                ("xmlns:xs", XS_NAMESPACE),
                ("elementFormDefault", "qualified"),
            ],
        )?;

        let graph = self.graph;
        for (id, structure) in graph.of_kind(StructureKind::DataType) {
            if let (true, StructureBody::DataType(data_type)) = (reach.contains(id), structure.body())
            {
                self.data_type(structure, data_type)?;
            }
        }
        for (id, structure) in graph.of_kind(StructureKind::Element) {
            if let (true, StructureBody::Element(element)) = (reach.contains(id), structure.body()) {
                self.element(structure, element)?;
            }
        }
        for &root in roots {
            let structure = graph.structure(root);
            let tag = self.tag_name(structure)?;
            let type_name = self.type_name(root)?;
            self.out
                .empty("xs:element", &[("name", tag), ("type", type_name.as_str())])?;
        }

        self.out.end("xs:schema")
    }

    fn data_type(&mut self, structure: &Structure, data_type: &DataType) -> Result<(), Error> {
        debug!(data_type = structure.reference(); "Exporting data type");

        let name = self.mangle(structure)?;
        let base = self.type_ref_name(data_type.base_type())?;
        let constraints = data_type.constraints();

        self.open("xs:simpleType", &[("name", name.as_str())], structure)?;
        if constraints.is_empty() {
            self.out.empty("xs:restriction", &[("base", base.as_str())])?;
        } else {
            self.out.start("xs:restriction", &[("base", base.as_str())])?;
            if let Some(pattern) = constraints.pattern() {
                self.out.empty("xs:pattern", &[("value", pattern)])?;
            }
            for value in constraints.values() {
                self.out.empty("xs:enumeration", &[("value", value.as_str())])?;
            }
            if let Some(minimum) = constraints.minimum() {
                let minimum = minimum.to_string();
                self.out.empty("xs:minInclusive", &[("value", minimum.as_str())])?;
            }
            if let Some(maximum) = constraints.maximum() {
                let maximum = maximum.to_string();
                self.out.empty("xs:maxInclusive", &[("value", maximum.as_str())])?;
            }
            self.out.end("xs:restriction")?;
        }
        self.out.end("xs:simpleType")
    }

    fn element(&mut self, structure: &Structure, element: &Element) -> Result<(), Error> {
        debug!(element = structure.reference(); "Exporting element");

        let name = self.mangle(structure)?;
        // Validate the tag up front so a bad name fails regardless of use.
        self.tag_name(structure)?;
        let attribute_ids: Vec<StructureId> =
            element.attributes().iter().map(ContentItem::target).collect();
        self.check_distinct_tags(
            &format!("the attributes of `{}`", structure.reference()),
            &attribute_ids,
        )?;

        match element.content() {
            ContentModel::TextOnly => {
                self.simple_content(&name, structure, element, TypeRef::default())
            }
            ContentModel::Value(value) => self.simple_content(&name, structure, element, *value),
            ContentModel::Empty if element.attributes().is_empty() => {
                self.leaf("xs:complexType", &[("name", name.as_str())], structure)
            }
            ContentModel::Empty => {
                self.open("xs:complexType", &[("name", name.as_str())], structure)?;
                self.attributes(element.attributes())?;
                self.out.end("xs:complexType")
            }
            ContentModel::Children(group) => self.complex_content(&name, structure, element, group),
        }
    }

    /// Text or a typed value, with attributes if the element has any.
    fn simple_content(
        &mut self,
        name: &str,
        structure: &Structure,
        element: &Element,
        value: TypeRef,
    ) -> Result<(), Error> {
        let base = self.type_ref_name(value)?;

        if element.attributes().is_empty() {
            self.open("xs:simpleType", &[("name", name)], structure)?;
            self.out.empty("xs:restriction", &[("base", base.as_str())])?;
            return self.out.end("xs:simpleType");
        }

        self.open("xs:complexType", &[("name", name)], structure)?;
        self.out.start("xs:simpleContent", &[])?;
        self.out.start("xs:extension", &[("base", base.as_str())])?;
        self.attributes(element.attributes())?;
        self.out.end("xs:extension")?;
        self.out.end("xs:simpleContent")?;
        self.out.end("xs:complexType")
    }

    fn complex_content(
        &mut self,
        name: &str,
        structure: &Structure,
        element: &Element,
        group: &Group,
    ) -> Result<(), Error> {
        if group.compositor() == Compositor::Unordered {
            self.check_all_group(structure, group)?;
        }
        // Children sharing a tag must share a type within one content model.
        let child_ids: Vec<StructureId> = group.items().iter().map(ContentItem::target).collect();
        self.check_distinct_tags(
            &format!("the children of `{}`", structure.reference()),
            &child_ids,
        )?;

        if group.is_mixed() {
            self.open(
                "xs:complexType",
                &[("name", name), ("mixed", "true")],
                structure,
            )?;
        } else {
            self.open("xs:complexType", &[("name", name)], structure)?;
        }

        if !group.is_empty() {
            self.group(structure, group)?;
        }
        self.attributes(element.attributes())?;
        self.out.end("xs:complexType")
    }

    fn group(&mut self, structure: &Structure, group: &Group) -> Result<(), Error> {
        let compositor = match group.compositor() {
            Compositor::Sequence => "xs:sequence",
            Compositor::Choice => "xs:choice",
            Compositor::Unordered => "xs:all",
        };

        self.out.start(compositor, &[])?;
        for particle in group.particles() {
            match particle {
                Particle::Element(item) => self.child(item)?,
                Particle::Group(nested) if nested.compositor() == Compositor::Unordered => {
                    return Err(Error::UnsupportedContentModel {
                        structure: structure.reference().to_string(),
                        reason: "XSD only allows unordered content as a whole content model"
                            .to_string(),
                    });
                }
                Particle::Group(nested) => self.group(structure, nested)?,
            }
        }
        self.out.end(compositor)
    }

    /// `xs:all` only admits element children that occur at most once.
    fn check_all_group(&self, structure: &Structure, group: &Group) -> Result<(), Error> {
        let unsupported = |reason: String| Error::UnsupportedContentModel {
            structure: structure.reference().to_string(),
            reason,
        };

        if group.is_nested() {
            return Err(unsupported(
                "XSD unordered content cannot hold nested groups".to_string(),
            ));
        }
        match group
            .items()
            .iter()
            .find(|item| item.cardinality().is_repeatable())
        {
            Some(item) => Err(unsupported(format!(
                "`{}` may occur {} times, but XSD unordered content allows each child at most once",
                self.graph.structure(item.target()).reference(),
                item.cardinality()
            ))),
            None => Ok(()),
        }
    }

    /// Rejects two structures that would be declared with the same tag.
    fn check_distinct_tags(&self, scope: &str, ids: &[StructureId]) -> Result<(), Error> {
        let mut seen: HashMap<&str, StructureId> = HashMap::with_capacity(ids.len());
        for &id in ids {
            let structure = self.graph.structure(id);
            match seen.insert(structure.tag_name(), id) {
                Some(other) if other != id => {
                    return Err(Error::NameCollision {
                        first: self.graph.structure(other).reference().to_string(),
                        second: structure.reference().to_string(),
                        name: structure.tag_name().to_string(),
                        scope: scope.to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn child(&mut self, item: &ContentItem) -> Result<(), Error> {
        let child = self.graph.structure(item.target());
        let tag = self.tag_name(child)?;
        let type_name = self.type_name(item.target())?;

        let cardinality = item.cardinality();
        let min = cardinality.min().to_string();
        let max = cardinality
            .max()
            .map_or_else(|| "unbounded".to_string(), |max| max.to_string());

        let mut attributes = vec![("name", tag), ("type", type_name.as_str())];
        if cardinality.min() != 1 {
            attributes.push(("minOccurs", min.as_str()));
        }
        if cardinality.max() != Some(1) {
            attributes.push(("maxOccurs", max.as_str()));
        }
        self.out.empty("xs:element", &attributes)
    }

    fn attributes(&mut self, items: &[ContentItem]) -> Result<(), Error> {
        for item in items {
            let structure = self.graph.structure(item.target());
            let StructureBody::Attribute(attribute) = structure.body() else {
                continue;
            };
            self.attribute(structure, attribute, item)?;
        }
        Ok(())
    }

    fn attribute(
        &mut self,
        structure: &Structure,
        attribute: &Attribute,
        item: &ContentItem,
    ) -> Result<(), Error> {
        let name = self.tag_name(structure)?;
        let value_type = self.type_ref_name(attribute.value_type())?;
        let required = item.cardinality().is_exactly_one();

        let mut attributes = vec![
            ("name", name),
            ("type", value_type.as_str()),
            ("use", if required { "required" } else { "optional" }),
        ];
        // The resolver already warned about defaults on required attributes.
        match attribute.default_value() {
            Some(default) if !required => attributes.push(("default", default)),
            Some(_) => debug!(
                attribute = structure.reference();
                "Omitting default of a required attribute"
            ),
            None => {}
        }

        self.leaf("xs:attribute", &attributes, structure)
    }

    /// An empty `tag`, holding only the annotation when there is one.
    fn leaf(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        structure: &Structure,
    ) -> Result<(), Error> {
        if structure.metadata().description().is_none() {
            return self.out.empty(tag, attributes);
        }
        self.open(tag, attributes, structure)?;
        self.out.end(tag)
    }

    /// Starts `tag` and writes the structure's description as its annotation.
    fn open(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        structure: &Structure,
    ) -> Result<(), Error> {
        let Some(description) = structure.metadata().description() else {
            return self.out.start(tag, attributes);
        };
        self.out.start(tag, attributes)?;
        self.out.start("xs:annotation", &[])?;
        self.out.start("xs:documentation", &[])?;
        self.out.text(description)?;
        self.out.end("xs:documentation")?;
        self.out.end("xs:annotation")
    }

/// The XSD type name of a primitive or declared structure.
    fn type_ref_name(&self, type_ref: TypeRef) -> Result<String, Error> {
        match type_ref {
            TypeRef::Primitive(primitive) => Ok(primitive_name(primitive).to_string()),
            TypeRef::Structure(id) => self.type_name(id),
        }
    }

    fn type_name(&self, id: StructureId) -> Result<String, Error> {
        self.mangle(self.graph.structure(id))
    }

    /// `{prefix}d__{reference}` for data types, `{prefix}e__{reference}`
    /// for elements.
    fn mangle(&self, structure: &Structure) -> Result<String, Error> {
        let marker = match structure.kind() {
            StructureKind::DataType => 'd',
            StructureKind::Element => 'e',
            kind => {
                return Err(Error::UnsupportedContentModel {
                    structure: structure.reference().to_string(),
                    reason: format!("{kind} structures have no XSD type"),
                });
            }
        };
        let name = format!(
            "{}{marker}__{}",
            self.config.type_prefix(),
            structure.reference()
        );
        if !is_ncname(&name) {
            return Err(Error::InvalidName {
                structure: structure.reference().to_string(),
                name,
            });
        }
        Ok(name)
    }

    fn tag_name<'s>(&self, structure: &'s Structure) -> Result<&'s str, Error> {
        let tag = structure.tag_name();
        if is_ncname(tag) {
            Ok(tag)
        } else {
            Err(Error::InvalidName {
                structure: structure.reference().to_string(),
                name: tag.to_string(),
            })
        }
    }
}

fn primitive_name(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "xs:string",
        Primitive::Integer => "xs:integer",
        Primitive::Decimal => "xs:decimal",
        Primitive::Boolean => "xs:boolean",
    }
}
