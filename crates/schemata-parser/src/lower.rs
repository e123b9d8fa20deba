//! Lowering of parsed declarations into kind-specific records.
//!
//! The parser accepts any `name: value;` pair in a declaration body. This
//! phase checks each pair against the closed property set of the declared
//! kind, checks the shape of every value, normalizes quantifiers and fills
//! in defaults. Names are still unresolved afterwards.

use indexmap::IndexMap;
use log::debug;

use schemata_core::{Compositor, Metadata, Ordering, StructureKind};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    metadata,
    normalize::{self, Occurrence},
    parser_types::{Declaration, Entry, Item, List, Property, Value},
    span::{Span, Spanned},
};

/// A declaration whose properties have been checked and normalized.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lowered<'src> {
    pub name: Spanned<&'src str>,
    pub tag_name: Option<Spanned<&'src str>>,
    pub span: Span,
    pub metadata: Metadata,
    pub body: Body<'src>,
}

impl Lowered<'_> {
    pub fn kind(&self) -> StructureKind {
        match self.body {
            Body::Element { .. } => StructureKind::Element,
            Body::Attribute { .. } => StructureKind::Attribute,
            Body::DataType { .. } => StructureKind::DataType,
            Body::Object { .. } => StructureKind::Object,
            Body::Property { .. } => StructureKind::Property,
            Body::Array { .. } => StructureKind::Array,
        }
    }
}

/// Kind-specific properties with names left unresolved.
///
/// A `None` type reference means the `string` default.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body<'src> {
    Element {
        root: bool,
        attributes: Vec<Occurrence<'src>>,
        content: Content<'src>,
    },
    Attribute {
        value_type: Option<Spanned<&'src str>>,
        default_value: Option<Spanned<String>>,
    },
    DataType {
        base_type: Option<Spanned<&'src str>>,
        pattern: Option<Spanned<&'src str>>,
        values: Vec<Spanned<String>>,
        minimum: Option<Spanned<i64>>,
        maximum: Option<Spanned<i64>>,
    },
    Object {
        root: bool,
        properties: Vec<Occurrence<'src>>,
        ordering: Ordering,
    },
    Property {
        value_type: Option<Spanned<&'src str>>,
    },
    Array {
        item_type: Occurrence<'src>,
    },
}

/// An element's `allowedContent` before resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content<'src> {
    Empty,
    TextOnly,
    /// A single reference. Whether it is a child element or a value type
    /// is only known after resolution.
    Single {
        target: Occurrence<'src>,
        quantifier: Option<Span>,
    },
    /// A list of children. `mixed` is set by `*any text*` at any depth.
    Group { group: ListGroup<'src>, mixed: bool },
}

/// A possibly nested content list before resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListGroup<'src> {
    pub compositor: Compositor,
    pub members: Vec<Member<'src>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Member<'src> {
    Element(Occurrence<'src>),
    Group(ListGroup<'src>),
}

const ELEMENT_PROPERTIES: &[&str] = &["tagName", "attributes", "allowedContent"];
const ATTRIBUTE_PROPERTIES: &[&str] = &["tagName", "valueType", "defaultValue"];
const DATA_TYPE_PROPERTIES: &[&str] = &[
    "baseType",
    "allowedPattern",
    "allowedValues",
    "minimumValue",
    "maximumValue",
];
const OBJECT_PROPERTIES: &[&str] = &["properties"];
const PROPERTY_PROPERTIES: &[&str] = &["tagName", "valueType"];
const ARRAY_PROPERTIES: &[&str] = &["itemType"];

fn known_properties(kind: StructureKind) -> &'static [&'static str] {
    match kind {
        StructureKind::Element => ELEMENT_PROPERTIES,
        StructureKind::Attribute => ATTRIBUTE_PROPERTIES,
        StructureKind::DataType => DATA_TYPE_PROPERTIES,
        StructureKind::Object => OBJECT_PROPERTIES,
        StructureKind::Property => PROPERTY_PROPERTIES,
        StructureKind::Array => ARRAY_PROPERTIES,
    }
}

/// Lower every declaration, reporting problems to `collector`.
///
/// Declarations with errors are left out of the result; callers must check
/// the collector before using it.
pub(crate) fn lower<'src>(
    declarations: &[Declaration<'src>],
    comments: &[Spanned<&'src str>],
    collector: &mut DiagnosticCollector,
) -> Vec<Lowered<'src>> {
    let lowered: Vec<Lowered<'src>> = declarations
        .iter()
        .filter_map(|declaration| {
            let metadata = metadata::structure(declaration, comments);
            Lowerer::new(declaration, collector).lower(metadata)
        })
        .collect();

    debug!(declarations = declarations.len(), lowered = lowered.len(); "Declarations lowered");
    lowered
}

/// Lowers one declaration.
struct Lowerer<'a, 'src> {
    declaration: &'a Declaration<'src>,
    properties: IndexMap<&'src str, &'a Property<'src>>,
    collector: &'a mut DiagnosticCollector,
    failed: bool,
}

impl<'a, 'src> Lowerer<'a, 'src> {
    fn new(declaration: &'a Declaration<'src>, collector: &'a mut DiagnosticCollector) -> Self {
        Self {
            declaration,
            properties: IndexMap::new(),
            collector,
            failed: false,
        }
    }

    fn owner(&self) -> &'src str {
        *self.declaration.name.inner()
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.failed = true;
        self.collector.emit(diagnostic);
    }

    /// Unwrap a result, reporting the diagnostic on failure.
    fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                self.report(diagnostic);
                None
            }
        }
    }

    fn lower(mut self, metadata: Metadata) -> Option<Lowered<'src>> {
        self.collect_properties();

        let kind = *self.declaration.kind.inner();
        let root = self.declaration.is_root();
        let body = match kind {
            StructureKind::Element => self.element(root),
            StructureKind::Attribute => self.attribute(),
            StructureKind::DataType => self.data_type(),
            StructureKind::Object => self.object(root),
            StructureKind::Property => Body::Property {
                value_type: self.type_name("valueType"),
            },
            StructureKind::Array => self.array(),
        };
        let tag_name = self.text("tagName");

        (!self.failed).then(|| Lowered {
            name: self.declaration.name.clone(),
            tag_name,
            span: self.declaration.span,
            metadata,
            body,
        })
    }

    /// Index properties by name, rejecting unknown and repeated ones.
    fn collect_properties(&mut self) {
        let declaration = self.declaration;
        let kind = *declaration.kind.inner();
        let known = known_properties(kind);

        for property in &declaration.properties {
            let name = *property.name.inner();
            if !known.contains(&name) {
                let diagnostic = Diagnostic::error(format!(
                    "unknown property `{name}` on {kind} `{}`",
                    self.owner()
                ))
                .with_code(ErrorCode::E102)
                .with_label(property.name.span(), "unknown property")
                .with_help(format!("{kind} properties are: {}", known.join(", ")));
                self.report(diagnostic);
                continue;
            }

            if let Some(first) = self.properties.get(name) {
                let diagnostic = Diagnostic::error(format!(
                    "property `{name}` is given more than once in `{}`",
                    self.owner()
                ))
                .with_code(ErrorCode::E104)
                .with_label(property.span(), "repeated property")
                .with_secondary_label(first.span(), "first given here");
                self.report(diagnostic);
                continue;
            }

            self.properties.insert(name, property);
        }
    }

    fn value(&self, property: &str) -> Option<&'a Value<'src>> {
        self.properties.get(property).copied().map(|p| &p.value)
    }

    fn wrong_shape(&self, property: &str, value: &Value<'_>, expected: &str) -> Diagnostic {
        Diagnostic::error(format!(
            "`{property}` of `{}` expects {expected}, found {}",
            self.owner(),
            value.shape()
        ))
        .with_code(ErrorCode::E103)
        .with_label(value.span(), format!("expected {expected}"))
    }

    /// A string, or a bare identifier.
    fn text(&mut self, property: &str) -> Option<Spanned<&'src str>> {
        let value = self.value(property)?;
        let result = match value {
            Value::String(text) => Ok(text.clone()),
            Value::Item(Item {
                name,
                quantifier: None,
            }) => Ok(name.clone()),
            _ => Err(self.wrong_shape(property, value, "a string")),
        };
        self.check(result)
    }

    /// A reference without a quantifier.
    fn type_name(&mut self, property: &str) -> Option<Spanned<&'src str>> {
        let value = self.value(property)?;
        let result = match value {
            Value::Item(Item {
                name,
                quantifier: None,
            }) => Ok(name.clone()),
            _ => Err(self.wrong_shape(property, value, "a type name without a quantifier")),
        };
        self.check(result)
    }

    /// A string or integer literal, as text.
    fn literal(&mut self, property: &str) -> Option<Spanned<String>> {
        let value = self.value(property)?;
        let result = match value {
            Value::String(text) => Ok(text.clone().map(str::to_string)),
            Value::Integer(number) => Ok(number.clone().map(|n| n.to_string())),
            _ => Err(self.wrong_shape(property, value, "a string or integer")),
        };
        self.check(result)
    }

    fn integer(&mut self, property: &str) -> Option<Spanned<i64>> {
        let value = self.value(property)?;
        let result = match value {
            Value::Integer(number) => Ok(number.clone()),
            _ => Err(self.wrong_shape(property, value, "an integer")),
        };
        self.check(result)
    }

    fn pattern(&mut self, property: &str) -> Option<Spanned<&'src str>> {
        let value = self.value(property)?;
        let result = match value {
            Value::Pattern(pattern) | Value::String(pattern) => Ok(pattern.clone()),
            _ => Err(self.wrong_shape(property, value, "a pattern")),
        };
        self.check(result)
    }

    /// A literal or a list of literals.
    fn literals(&mut self, property: &str) -> Vec<Spanned<String>> {
        let Some(value) = self.value(property) else {
            return Vec::new();
        };

        match value {
            Value::String(_) | Value::Integer(_) => self.literal(property).into_iter().collect(),
            Value::List(list) => {
                let mut values = Vec::with_capacity(list.entries.len());
                for entry in &list.entries {
                    match entry {
                        Entry::String(text) => values.push(text.clone().map(str::to_string)),
                        Entry::Integer(number) => values.push(number.clone().map(|n| n.to_string())),
                        Entry::Item(_) | Entry::AnyText(_) | Entry::List(_) => {
                            let diagnostic = Diagnostic::error(format!(
                                "`{property}` of `{}` lists only strings and integers",
                                self.owner()
                            ))
                            .with_code(ErrorCode::E103)
                            .with_label(entry.span(), "not a literal")
                            .with_help("quote the value");
                            self.report(diagnostic);
                        }
                    }
                }
                values
            }
            _ => {
                let diagnostic = self.wrong_shape(property, value, "a list of values");
                self.report(diagnostic);
                Vec::new()
            }
        }
    }

    fn occurrence(&mut self, item: &Item<'src>) -> Option<Occurrence<'src>> {
        let cardinality = self.check(normalize::cardinality(item.quantifier.as_ref()))?;
        Some(Occurrence {
            name: item.name.clone(),
            cardinality,
        })
    }

    /// A single reference or a list of references.
    fn references(&mut self, property: &str) -> (Ordering, Vec<Occurrence<'src>>) {
        let Some(value) = self.value(property) else {
            return (Ordering::Ordered, Vec::new());
        };

        match value {
            Value::Item(item) => (Ordering::Ordered, self.occurrence(item).into_iter().collect()),
            Value::List(list) => {
                let mut items = Vec::with_capacity(list.entries.len());
                for entry in &list.entries {
                    match entry {
                        Entry::Item(item) => items.extend(self.occurrence(item)),
                        _ => {
                            let diagnostic = Diagnostic::error(format!(
                                "`{property}` of `{}` lists only references",
                                self.owner()
                            ))
                            .with_code(ErrorCode::E103)
                            .with_label(entry.span(), "not a reference");
                            self.report(diagnostic);
                        }
                    }
                }
                let ordering = match list.compositor {
                    Compositor::Sequence => Ordering::Ordered,
                    Compositor::Unordered => Ordering::Unordered,
                    Compositor::Choice => {
                        let diagnostic = self.wrong_shape(property, value, "`[...]` or `{...}` with commas");
                        self.report(diagnostic);
                        Ordering::Unordered
                    }
                };
                (ordering, items)
            }
            _ => {
                let diagnostic = self.wrong_shape(property, value, "a reference or a list");
                self.report(diagnostic);
                (Ordering::Ordered, Vec::new())
            }
        }
    }

    fn attributes(&mut self) -> Vec<Occurrence<'src>> {
        let (_, attributes) = self.references("attributes");

        for attribute in &attributes {
            if attribute.cardinality.is_repeatable() {
                let diagnostic = Diagnostic::error(format!(
                    "attribute `{}` of `{}` may occur at most once",
                    attribute.name.inner(),
                    self.owner()
                ))
                .with_code(ErrorCode::E200)
                .with_label(attribute.span(), format!("cardinality {}", attribute.cardinality))
                .with_help("use `(optional)` or no quantifier");
                self.report(diagnostic);
            }
        }

        // Attribute order carries no meaning.
        let owner = self.owner();
        normalize::collapse_unordered(owner, attributes, self.collector)
    }

    fn content(&mut self) -> Content<'src> {
        let Some(value) = self.value("allowedContent") else {
            return Content::Empty;
        };

        match value {
            Value::AnyText(_) => Content::TextOnly,
            Value::Item(item) => match self.occurrence(item) {
                Some(target) => Content::Single {
                    target,
                    quantifier: item.quantifier.as_ref().map(Spanned::span),
                },
                None => Content::Empty,
            },
            Value::List(list) => {
                let mut mixed = false;
                let group = self.content_group(list, &mut mixed);

                if group.members.is_empty() {
                    return if mixed {
                        Content::TextOnly
                    } else {
                        Content::Empty
                    };
                }

                Content::Group { group, mixed }
            }
            _ => {
                let diagnostic = self.wrong_shape(
                    "allowedContent",
                    value,
                    "a reference, a list or `*any text*`",
                );
                self.report(diagnostic);
                Content::Empty
            }
        }
    }

    /// Lower one content list, recursing into nested lists.
    ///
    /// Empty nested lists are dropped. `*any text*` anywhere makes the whole
    /// content mixed.
    fn content_group(&mut self, list: &List<'src>, mixed: &mut bool) -> ListGroup<'src> {
        let mut elements = Vec::with_capacity(list.entries.len());
        let mut groups = Vec::new();
        let mut members = Vec::with_capacity(list.entries.len());
        for entry in &list.entries {
            match entry {
                Entry::Item(item) => {
                    if let Some(occurrence) = self.occurrence(item) {
                        elements.push(occurrence.clone());
                        members.push(Member::Element(occurrence));
                    }
                }
                Entry::List(inner) => {
                    let group = self.content_group(inner, mixed);
                    if !group.members.is_empty() {
                        groups.push(group.clone());
                        members.push(Member::Group(group));
                    }
                }
                Entry::AnyText(_) => *mixed = true,
                Entry::String(_) | Entry::Integer(_) => {
                    let diagnostic = Diagnostic::error(format!(
                        "`allowedContent` of `{}` lists only element references and `*any text*`",
                        self.owner()
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(entry.span(), "not allowed in content");
                    self.report(diagnostic);
                }
            }
        }

        // Order inside `{...}` carries no meaning, so repeated references merge.
        if list.compositor == Compositor::Unordered {
            let owner = self.owner();
            members = normalize::collapse_unordered(owner, elements, self.collector)
                .into_iter()
                .map(Member::Element)
                .chain(groups.into_iter().map(Member::Group))
                .collect();
        }

        ListGroup {
            compositor: list.compositor,
            members,
        }
    }

    fn element(&mut self, root: bool) -> Body<'src> {
        let attributes = self.attributes();
        let content = self.content();
        Body::Element {
            root,
            attributes,
            content,
        }
    }

    fn attribute(&mut self) -> Body<'src> {
        Body::Attribute {
            value_type: self.type_name("valueType"),
            default_value: self.literal("defaultValue"),
        }
    }

    fn data_type(&mut self) -> Body<'src> {
        Body::DataType {
            base_type: self.type_name("baseType"),
            pattern: self.pattern("allowedPattern"),
            values: self.literals("allowedValues"),
            minimum: self.integer("minimumValue"),
            maximum: self.integer("maximumValue"),
        }
    }

    fn object(&mut self, root: bool) -> Body<'src> {
        let (ordering, mut properties) = self.references("properties");
        if ordering == Ordering::Unordered {
            let owner = self.owner();
            properties = normalize::collapse_unordered(owner, properties, self.collector);
        }
        Body::Object {
            root,
            properties,
            ordering,
        }
    }

    fn array(&mut self) -> Body<'src> {
        let item_type = match self.value("itemType") {
            Some(Value::Item(item)) => self.occurrence(item),
            Some(value) => {
                let diagnostic = self.wrong_shape("itemType", value, "a reference");
                self.report(diagnostic);
                None
            }
            None => {
                let diagnostic = Diagnostic::error(format!(
                    "array `{}` has no `itemType`",
                    self.owner()
                ))
                .with_code(ErrorCode::E105)
                .with_label(self.declaration.name.span(), "missing `itemType`")
                .with_help("add `itemType: <type>;`");
                self.report(diagnostic);
                None
            }
        };

        // A failed item type is already reported; the placeholder is never used.
        Body::Array {
            item_type: item_type.unwrap_or(Occurrence {
                name: self.declaration.name.clone(),
                cardinality: Default::default(),
            }),
        }
    }
}
