//! Structure records.
//!
//! Every declaration in a schema becomes one [`Structure`]. The kind-specific
//! fields live in a closed [`StructureBody`] so that, for example, only data
//! types can carry a pattern and only arrays can carry an item type.

use std::fmt;

use serde::Serialize;

use crate::{
    content::{Cardinality, ContentItem, ContentModel, Ordering},
    primitive::Primitive,
};

/// Index of a structure inside its [`SchemaGraph`](crate::SchemaGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StructureId(usize);

impl StructureId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type of a value: either built in or a declared structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(Primitive),
    Structure(StructureId),
}

impl TypeRef {
    /// The referenced structure, if this is not a primitive.
    pub fn structure(self) -> Option<StructureId> {
        match self {
            TypeRef::Primitive(_) => None,
            TypeRef::Structure(id) => Some(id),
        }
    }
}

impl Default for TypeRef {
    fn default() -> Self {
        TypeRef::Primitive(Primitive::String)
    }
}

/// The kind a structure was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureKind {
    Element,
    Attribute,
    DataType,
    Object,
    Property,
    Array,
}

impl StructureKind {
    /// The keyword that declares this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            StructureKind::Element => "element",
            StructureKind::Attribute => "attribute",
            StructureKind::DataType => "dataType",
            StructureKind::Object => "object",
            StructureKind::Property => "property",
            StructureKind::Array => "array",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Value constraints carried by a data type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum: Option<i64>,
}

impl Constraints {
    pub fn new(
        pattern: Option<String>,
        values: Vec<String>,
        minimum: Option<i64>,
        maximum: Option<i64>,
    ) -> Self {
        Self {
            pattern,
            values,
            minimum,
            maximum,
        }
    }

    /// Regular expression every value must match in full.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Enumerated values; empty when any value is allowed.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Inclusive lower bound.
    pub fn minimum(&self) -> Option<i64> {
        self.minimum
    }

    /// Inclusive upper bound.
    pub fn maximum(&self) -> Option<i64> {
        self.maximum
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.values.is_empty()
            && self.minimum.is_none()
            && self.maximum.is_none()
    }
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    root: bool,
    attributes: Vec<ContentItem>,
    content: ContentModel,
}

impl Element {
    pub fn new(root: bool, attributes: Vec<ContentItem>, content: ContentModel) -> Self {
        Self {
            root,
            attributes,
            content,
        }
    }

    /// Returns `true` when this element may be a document root.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Attribute slots; each target is an [`Attribute`] structure.
    pub fn attributes(&self) -> &[ContentItem] {
        &self.attributes
    }

    pub fn content(&self) -> &ContentModel {
        &self.content
    }
}

/// An XML attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    value_type: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<String>,
}

impl Attribute {
    pub fn new(value_type: TypeRef, default_value: Option<String>) -> Self {
        Self {
            value_type,
            default_value,
        }
    }

    pub fn value_type(&self) -> TypeRef {
        self.value_type
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

/// A named restriction of a primitive or of another data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataType {
    base_type: TypeRef,
    constraints: Constraints,
}

impl DataType {
    pub fn new(base_type: TypeRef, constraints: Constraints) -> Self {
        Self {
            base_type,
            constraints,
        }
    }

    pub fn base_type(&self) -> TypeRef {
        self.base_type
    }

    /// Constraints added by this layer only; base layers keep their own.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}

/// A JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Object {
    root: bool,
    properties: Vec<ContentItem>,
    ordering: Ordering,
}

impl Object {
    pub fn new(root: bool, properties: Vec<ContentItem>, ordering: Ordering) -> Self {
        Self {
            root,
            properties,
            ordering,
        }
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Property slots; each target is a [`Property`] structure.
    pub fn properties(&self) -> &[ContentItem] {
        &self.properties
    }

    /// How the properties were listed in source.
    pub fn ordering(&self) -> Ordering {
        self.ordering
    }
}

/// A member of a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    value_type: TypeRef,
}

impl Property {
    pub fn new(value_type: TypeRef) -> Self {
        Self { value_type }
    }

    pub fn value_type(&self) -> TypeRef {
        self.value_type
    }
}

/// A JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Array {
    item_type: TypeRef,
    items: Cardinality,
}

impl Array {
    pub fn new(item_type: TypeRef, items: Cardinality) -> Self {
        Self { item_type, items }
    }

    pub fn item_type(&self) -> TypeRef {
        self.item_type
    }

    /// Allowed number of items.
    pub fn items(&self) -> Cardinality {
        self.items
    }
}

/// Kind-specific fields of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructureBody {
    Element(Element),
    Attribute(Attribute),
    DataType(DataType),
    Object(Object),
    Property(Property),
    Array(Array),
}

impl StructureBody {
    pub fn kind(&self) -> StructureKind {
        match self {
            StructureBody::Element(_) => StructureKind::Element,
            StructureBody::Attribute(_) => StructureKind::Attribute,
            StructureBody::DataType(_) => StructureKind::DataType,
            StructureBody::Object(_) => StructureKind::Object,
            StructureBody::Property(_) => StructureKind::Property,
            StructureBody::Array(_) => StructureKind::Array,
        }
    }
}

/// Free-form notes taken from a structure's leading comment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    example_value: Option<String>,
}

impl Metadata {
    pub fn new(description: Option<String>, example_value: Option<String>) -> Self {
        Self {
            description,
            example_value,
        }
    }

    /// Prose shown in documentation and schema annotations.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// A literal value used when generating example documents.
    pub fn example_value(&self) -> Option<&str> {
        self.example_value.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.example_value.is_none()
    }
}

/// A declared structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Structure {
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_name: Option<String>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
    #[serde(flatten)]
    body: StructureBody,
}

impl Structure {
    pub fn new(reference: impl Into<String>, tag_name: Option<String>, body: StructureBody) -> Self {
        Self {
            reference: reference.into(),
            tag_name,
            metadata: Metadata::default(),
            body,
        }
    }

    /// Attaches comment metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The unique name used to refer to this structure in source.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The name emitted in generated artifacts.
    ///
    /// Falls back to the reference when no `tagName` was given.
    pub fn tag_name(&self) -> &str {
        self.tag_name.as_deref().unwrap_or(&self.reference)
    }

    pub fn body(&self) -> &StructureBody {
        &self.body
    }

    pub fn kind(&self) -> StructureKind {
        self.body.kind()
    }

    /// Returns `true` for root elements and root objects.
    pub fn is_root(&self) -> bool {
        match &self.body {
            StructureBody::Element(element) => element.is_root(),
            StructureBody::Object(object) => object.is_root(),
            _ => false,
        }
    }

    /// Every structure this one links to, in declaration order.
    ///
    /// Used for reachability; primitives are skipped.
    pub fn links(&self) -> Vec<StructureId> {
        match &self.body {
            StructureBody::Element(element) => {
                let mut links: Vec<StructureId> =
                    element.attributes().iter().map(ContentItem::target).collect();
                match element.content() {
                    ContentModel::Value(value) => links.extend(value.structure()),
                    content => links.extend(content.items().iter().map(ContentItem::target)),
                }
                links
            }
            StructureBody::Attribute(attribute) => {
                attribute.value_type().structure().into_iter().collect()
            }
            StructureBody::DataType(data_type) => {
                data_type.base_type().structure().into_iter().collect()
            }
            StructureBody::Object(object) => {
                object.properties().iter().map(ContentItem::target).collect()
            }
            StructureBody::Property(property) => {
                property.value_type().structure().into_iter().collect()
            }
            StructureBody::Array(array) => array.item_type().structure().into_iter().collect(),
        }
    }
}
