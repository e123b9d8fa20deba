//! Name resolution.
//!
//! Resolution turns lowered declarations into the frozen [`SchemaGraph`] in
//! three passes:
//!
//! 1. Build the symbol table, rejecting duplicate and reserved names.
//! 2. Replace every name with a [`StructureId`] or a primitive, checking that
//!    the target's kind fits the place it is used in.
//! 3. Check data types: acyclic base chains, valid patterns and consistent
//!    constraints. A pattern must compile and must also keep its meaning
//!    when emitted as an XML Schema `xs:pattern`.
//!
//! Every problem is reported; a graph is only produced when none were found.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info};
use string_interner::{DefaultStringInterner, DefaultSymbol};

use schemata_core::{
    Array, Attribute, Compositor, Constraints, ContentItem, ContentModel, DataType, Element,
    Group, Object, Particle, Primitive, Property, SchemaGraph, Structure, StructureBody,
    StructureId, StructureKind, TypeRef,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    lower::{Body, Content, ListGroup, Lowered, Member},
    normalize::Occurrence,
    span::{Span, Spanned},
};

/// A declared name.
#[derive(Debug, Clone, Copy)]
struct Symbol {
    id: StructureId,
    kind: StructureKind,
    span: Span,
}

/// Name to structure index for one resolution session.
#[derive(Debug, Default)]
struct SymbolTable {
    interner: DefaultStringInterner,
    symbols: IndexMap<DefaultSymbol, Symbol>,
}

impl SymbolTable {
    /// Declare `name`, returning the earlier declaration if there is one.
    fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), Symbol> {
        let key = self.interner.get_or_intern(name);
        match self.symbols.get(&key) {
            Some(existing) => Err(*existing),
            None => {
                self.symbols.insert(key, symbol);
                Ok(())
            }
        }
    }

    fn get(&self, name: &str) -> Option<Symbol> {
        let key = self.interner.get(name)?;
        self.symbols.get(&key).copied()
    }
}

/// Where a reference is used, and so which kinds it may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    /// An entry of `attributes`.
    Attribute,
    /// An entry of an `allowedContent` list.
    ChildElement,
    /// A lone `allowedContent` reference.
    Content,
    /// `valueType` of an attribute, or `baseType`.
    SimpleType,
    /// An entry of `properties`.
    Property,
    /// `valueType` of a property, or `itemType`.
    JsonValue,
}

impl Usage {
    fn accepts(self, kind: StructureKind) -> bool {
        match self {
            Usage::Attribute => kind == StructureKind::Attribute,
            Usage::ChildElement => kind == StructureKind::Element,
            Usage::Content => matches!(kind, StructureKind::Element | StructureKind::DataType),
            Usage::SimpleType => kind == StructureKind::DataType,
            Usage::Property => kind == StructureKind::Property,
            Usage::JsonValue => matches!(
                kind,
                StructureKind::DataType | StructureKind::Object | StructureKind::Array
            ),
        }
    }

    fn accepts_primitive(self) -> bool {
        matches!(self, Usage::Content | Usage::SimpleType | Usage::JsonValue)
    }

    fn expected(self) -> &'static str {
        match self {
            Usage::Attribute => "an attribute",
            Usage::ChildElement => "an element",
            Usage::Content => "an element, a data type or a built-in type",
            Usage::SimpleType => "a data type or a built-in type",
            Usage::Property => "a property",
            Usage::JsonValue => "a data type, object, array or built-in type",
        }
    }
}

/// Resolve lowered declarations into a graph.
///
/// Returns `None` when any error was reported to `collector`.
pub(crate) fn resolve(
    declarations: &[Lowered<'_>],
    collector: &mut DiagnosticCollector,
) -> Option<SchemaGraph> {
    let mut resolver = Resolver {
        declarations,
        symbols: SymbolTable::default(),
        collector,
        failed: false,
    };

    resolver.declare_all();
    let structures: Vec<Structure> = declarations
        .iter()
        .map(|declaration| resolver.resolve_declaration(declaration))
        .collect();
    if resolver.failed {
        return None;
    }

    let graph = SchemaGraph::new(structures);
    resolver.check_data_types(&graph);
    if resolver.failed {
        return None;
    }

    info!(structures = graph.len(), roots = graph.roots().len(); "Schema resolved");
    Some(graph)
}

struct Resolver<'a, 'src> {
    declarations: &'a [Lowered<'src>],
    symbols: SymbolTable,
    collector: &'a mut DiagnosticCollector,
    failed: bool,
}

impl<'a, 'src> Resolver<'a, 'src> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.failed = true;
        self.collector.emit(diagnostic);
    }

    // Pass 1

    fn declare_all(&mut self) {
        let declarations = self.declarations;
        for (index, declaration) in declarations.iter().enumerate() {
            let name = *declaration.name.inner();
            let span = declaration.name.span();

            if name.parse::<Primitive>().is_ok() {
                self.report(
                    Diagnostic::error(format!("`{name}` is a built-in type and cannot be redeclared"))
                        .with_code(ErrorCode::E301)
                        .with_label(span, "reserved name")
                        .with_help("choose another reference name"),
                );
                continue;
            }

            let symbol = Symbol {
                id: StructureId::new(index),
                kind: declaration.kind(),
                span,
            };
            if let Err(first) = self.symbols.declare(name, symbol) {
                self.report(
                    Diagnostic::error(format!("structure `{name}` is declared more than once"))
                        .with_code(ErrorCode::E301)
                        .with_label(span, "duplicate declaration")
                        .with_secondary_label(first.span, "first declared here")
                        .with_help("reference names are shared by all structure kinds"),
                );
            }
        }

        debug!(symbols = self.symbols.symbols.len(); "Symbol table built");
    }

    // Pass 2

    fn lookup(&mut self, name: &Spanned<&str>, owner: &str, usage: Usage) -> Option<TypeRef> {
        let text = *name.inner();

        if let Ok(primitive) = text.parse::<Primitive>() {
            if usage.accepts_primitive() {
                return Some(TypeRef::Primitive(primitive));
            }
            self.report(
                Diagnostic::error(format!(
                    "`{text}` used in `{owner}` is a built-in type, expected {}",
                    usage.expected()
                ))
                .with_code(ErrorCode::E302)
                .with_label(name.span(), format!("expected {}", usage.expected())),
            );
            return None;
        }

        let Some(symbol) = self.symbols.get(text) else {
            self.report(
                Diagnostic::error(format!("undefined reference `{text}` in `{owner}`"))
                    .with_code(ErrorCode::E300)
                    .with_label(name.span(), "not declared")
                    .with_help(format!("declare `{text}` or fix the spelling")),
            );
            return None;
        };

        if !usage.accepts(symbol.kind) {
            self.report(
                Diagnostic::error(format!(
                    "`{text}` used in `{owner}` is {} {}, expected {}",
                    article(symbol.kind),
                    symbol.kind,
                    usage.expected()
                ))
                .with_code(ErrorCode::E302)
                .with_label(name.span(), format!("expected {}", usage.expected()))
                .with_secondary_label(symbol.span, format!("declared as {} here", symbol.kind)),
            );
            return None;
        }

        Some(TypeRef::Structure(symbol.id))
    }

    /// Resolve a type reference, defaulting to `string`.
    fn type_ref(
        &mut self,
        name: Option<&Spanned<&str>>,
        owner: &str,
        usage: Usage,
    ) -> TypeRef {
        name.and_then(|name| self.lookup(name, owner, usage))
            .unwrap_or_default()
    }

    fn item(&mut self, occurrence: &Occurrence<'_>, owner: &str, usage: Usage) -> Option<ContentItem> {
        // Items never accept primitives, so every hit is a structure.
        let target = self.lookup(&occurrence.name, owner, usage)?.structure()?;
        Some(ContentItem::new(target, occurrence.cardinality))
    }

    fn items(&mut self, occurrences: &[Occurrence<'_>], owner: &str, usage: Usage) -> Vec<ContentItem> {
        occurrences
            .iter()
            .filter_map(|occurrence| self.item(occurrence, owner, usage))
            .collect()
    }

    fn group(&mut self, group: &ListGroup<'_>, mixed: bool, owner: &str) -> Group {
        let mut particles = Vec::with_capacity(group.members.len());
        for member in &group.members {
            match member {
                Member::Element(occurrence) => particles.extend(
                    self.item(occurrence, owner, Usage::ChildElement)
                        .map(Particle::Element),
                ),
                Member::Group(inner) => particles.push(Particle::Group(self.group(inner, false, owner))),
            }
        }
        Group::new(group.compositor, particles, mixed)
    }

    /// Warn about required attributes whose default can never apply.
    fn check_attribute_defaults(&mut self, attributes: &[Occurrence<'_>], owner: &str) {
        let declarations = self.declarations;
        for occurrence in attributes.iter().filter(|o| o.cardinality.is_required()) {
            let name = *occurrence.name.inner();
            let Some(symbol) = self.symbols.get(name) else {
                continue;
            };
            let Body::Attribute {
                default_value: Some(default),
                ..
            } = &declarations[symbol.id.index()].body
            else {
                continue;
            };

            self.collector.emit(
                Diagnostic::warning(format!(
                    "required attribute `{name}` of `{owner}` never uses its default `{}`",
                    default.inner()
                ))
                .with_label(occurrence.span(), "required here")
                .with_secondary_label(default.span(), "default given here")
                .with_help("mark the attribute `(optional)` so the default can apply"),
            );
        }
    }

    fn content(&mut self, content: &Content<'_>, owner: &str) -> ContentModel {
        match content {
            Content::Empty => ContentModel::Empty,
            Content::TextOnly => ContentModel::TextOnly,
            Content::Single { target, quantifier } => {
                let Some(type_ref) = self.lookup(&target.name, owner, Usage::Content) else {
                    return ContentModel::Empty;
                };
                match type_ref {
                    TypeRef::Structure(id)
                        if self.declarations[id.index()].kind() == StructureKind::Element =>
                    {
                        let item = ContentItem::new(id, target.cardinality);
                        ContentModel::Children(Group::of_items(Compositor::Sequence, vec![item], false))
                    }
                    value => {
                        if let Some(span) = quantifier {
                            self.report(
                                Diagnostic::error(format!(
                                    "the value content of `{owner}` cannot take a quantifier"
                                ))
                                .with_code(ErrorCode::E103)
                                .with_label(*span, "quantifier on a value type")
                                .with_help("quantifiers apply to element references only"),
                            );
                        }
                        ContentModel::Value(value)
                    }
                }
            }
            Content::Group { group, mixed } => {
                ContentModel::Children(self.group(group, *mixed, owner))
            }
        }
    }

    fn resolve_declaration(&mut self, declaration: &Lowered<'_>) -> Structure {
        let owner = *declaration.name.inner();

        let body = match &declaration.body {
            Body::Element {
                root,
                attributes,
                content,
            } => {
                self.check_attribute_defaults(attributes, owner);
                let attributes = self.items(attributes, owner, Usage::Attribute);
                let content = self.content(content, owner);
                StructureBody::Element(Element::new(*root, attributes, content))
            }
            Body::Attribute {
                value_type,
                default_value,
            } => StructureBody::Attribute(Attribute::new(
                self.type_ref(value_type.as_ref(), owner, Usage::SimpleType),
                default_value.as_ref().map(|value| value.inner().clone()),
            )),
            Body::DataType {
                base_type,
                pattern,
                values,
                minimum,
                maximum,
            } => StructureBody::DataType(DataType::new(
                self.type_ref(base_type.as_ref(), owner, Usage::SimpleType),
                Constraints::new(
                    pattern.as_ref().map(|pattern| pattern.inner().to_string()),
                    values.iter().map(|value| value.inner().clone()).collect(),
                    minimum.as_ref().map(|minimum| *minimum.inner()),
                    maximum.as_ref().map(|maximum| *maximum.inner()),
                ),
            )),
            Body::Object {
                root,
                properties,
                ordering,
            } => StructureBody::Object(Object::new(
                *root,
                self.items(properties, owner, Usage::Property),
                *ordering,
            )),
            Body::Property { value_type } => StructureBody::Property(Property::new(
                self.type_ref(value_type.as_ref(), owner, Usage::JsonValue),
            )),
            Body::Array { item_type } => StructureBody::Array(Array::new(
                self.type_ref(Some(&item_type.name), owner, Usage::JsonValue),
                item_type.cardinality,
            )),
        };

        let tag_name = declaration
            .tag_name
            .as_ref()
            .map(|tag_name| tag_name.inner().to_string());
        Structure::new(owner, tag_name, body).with_metadata(declaration.metadata.clone())
    }

    // Pass 3

    fn check_data_types(&mut self, graph: &SchemaGraph) {
        let mut cyclic = HashSet::new();
        for (id, _) in graph.of_kind(StructureKind::DataType) {
            if let Some(cycle) = base_cycle(graph, id) {
                cyclic.extend(cycle.iter().copied());
                // Report each cycle once, from its first declared member.
                if cycle.iter().min() == Some(&id) {
                    self.report_cycle(graph, &cycle);
                }
            }
        }

        let declarations = self.declarations;
        for (index, declaration) in declarations.iter().enumerate() {
            let Body::DataType {
                pattern,
                values,
                minimum,
                maximum,
                ..
            } = &declaration.body
            else {
                continue;
            };
            let owner = *declaration.name.inner();

            if let Some(pattern) = pattern {
                self.check_pattern(owner, pattern);
            }

            let id = StructureId::new(index);
            if cyclic.contains(&id) {
                continue;
            }
            let Some(primitive) = graph.base_primitive(TypeRef::Structure(id)) else {
                continue;
            };
            self.check_constraints(owner, primitive, values, minimum.as_ref(), maximum.as_ref());
        }
    }

    fn report_cycle(&mut self, graph: &SchemaGraph, cycle: &[StructureId]) {
        let chain: Vec<&str> = cycle
            .iter()
            .chain(cycle.first())
            .map(|id| graph.structure(*id).reference())
            .collect();
        let first = cycle[0];
        let mut diagnostic = Diagnostic::error(format!(
            "cyclic base type `{}`",
            chain.join(" -> ")
        ))
        .with_code(ErrorCode::E303)
        .with_label(
            self.declarations[first.index()].name.span(),
            "base type chain returns here",
        );
        for id in &cycle[1..] {
            diagnostic = diagnostic
                .with_secondary_label(self.declarations[id.index()].name.span(), "part of the cycle");
        }
        self.report(diagnostic.with_help("a base type chain must end at a built-in type"));
    }

    fn check_pattern(&mut self, owner: &str, pattern: &Spanned<&str>) {
        // Patterns are matched against the whole value, as in XML Schema.
        let anchored = format!("^(?:{})$", pattern.inner());
        if let Err(err) = regex::Regex::new(&anchored) {
            self.report(
                Diagnostic::error(format!("invalid pattern in `{owner}`"))
                    .with_code(ErrorCode::E304)
                    .with_label(pattern.span(), "not a valid regular expression")
                    .with_help(err.to_string()),
            );
            return;
        }

        if let Some(issue) = xsd_dialect_issue(pattern.inner()) {
            // Quotes and slashes both open the literal with one character.
            let start = pattern.span().start() + 1 + issue.offset;
            self.report(
                Diagnostic::error(format!("pattern in `{owner}` cannot be written as an XML Schema pattern"))
                    .with_code(ErrorCode::E304)
                    .with_label(Span::new(start..start + issue.len), issue.label)
                    .with_help(issue.help),
            );
        }
    }

    fn check_constraints(
        &mut self,
        owner: &str,
        primitive: Primitive,
        values: &[Spanned<String>],
        minimum: Option<&Spanned<i64>>,
        maximum: Option<&Spanned<i64>>,
    ) {
        if let (Some(minimum), Some(maximum)) = (minimum, maximum) {
            if minimum.inner() > maximum.inner() {
                self.report(
                    Diagnostic::error(format!(
                        "`{owner}` has minimum {} above maximum {}",
                        minimum.inner(),
                        maximum.inner()
                    ))
                    .with_code(ErrorCode::E305)
                    .with_label(minimum.span(), "minimum")
                    .with_secondary_label(maximum.span(), "maximum"),
                );
            }
        }

        if !primitive.is_numeric() {
            for bound in minimum.into_iter().chain(maximum) {
                self.report(
                    Diagnostic::error(format!(
                        "`{owner}` has numeric bounds but its values are {primitive}s"
                    ))
                    .with_code(ErrorCode::E305)
                    .with_label(bound.span(), "bound on a non-numeric type")
                    .with_help("use an `integer` or `decimal` base type"),
                );
            }
        }

        for value in values {
            if !primitive.accepts(value.inner()) {
                self.report(
                    Diagnostic::error(format!(
                        "allowed value `{}` of `{owner}` is not a valid {primitive}",
                        value.inner()
                    ))
                    .with_code(ErrorCode::E305)
                    .with_label(value.span(), format!("not a {primitive}")),
                );
            }
        }
    }
}

/// Escapes that XML Schema and the `regex` crate read the same way.
const PORTABLE_ESCAPES: &str = "nrt\\|.?*+(){}-[]^sSdDwWpP";

/// A construct that compiles as a Rust regex but not as an `xs:pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DialectIssue {
    offset: usize,
    len: usize,
    label: &'static str,
    help: &'static str,
}

impl DialectIssue {
    fn new(offset: usize, len: usize, label: &'static str, help: &'static str) -> Self {
        Self {
            offset,
            len,
            label,
            help,
        }
    }
}

/// Find the first construct XML Schema regular expressions lack or read
/// differently. Expects a pattern that already compiled.
fn xsd_dialect_issue(pattern: &str) -> Option<DialectIssue> {
    let chars: Vec<(usize, char)> = pattern.char_indices().collect();
    let mut in_class = false;
    let mut index = 0;

    while let Some(&(offset, c)) = chars.get(index) {
        let next = chars.get(index + 1).map(|(_, next)| *next);
        match c {
            '\\' => {
                let escaped = next?;
                let braced = chars.get(index + 2).map(|(_, c)| *c) == Some('{');
                if !PORTABLE_ESCAPES.contains(escaped) || (matches!(escaped, 'p' | 'P') && !braced) {
                    return Some(DialectIssue::new(
                        offset,
                        1 + escaped.len_utf8(),
                        "escape not supported by XML Schema",
                        "use a character class or a `\\p{...}` category instead",
                    ));
                }
                index += 2;
                continue;
            }
            '[' if in_class => {
                return Some(DialectIssue::new(
                    offset,
                    1,
                    "nested character class",
                    "escape a literal bracket as `\\[`",
                ));
            }
            '[' => {
                in_class = true;
                if next == Some('^') {
                    index += 1;
                }
            }
            ']' if in_class => in_class = false,
            ']' => {
                return Some(DialectIssue::new(
                    offset,
                    1,
                    "unescaped `]`",
                    "escape a literal bracket as `\\]`",
                ));
            }
            '&' | '~' | '-' if in_class && next == Some(c) => {
                return Some(DialectIssue::new(
                    offset,
                    2,
                    "character class set operation",
                    "list the allowed characters explicitly",
                ));
            }
            '^' if !in_class => {
                return Some(DialectIssue::new(
                    offset,
                    1,
                    "anchor",
                    "patterns always match the whole value; drop the anchor or write a literal `^` as `\\^`",
                ));
            }
            '$' if !in_class => {
                return Some(DialectIssue::new(
                    offset,
                    1,
                    "anchor",
                    "patterns always match the whole value; drop the anchor or write a literal `$` as `[$]`",
                ));
            }
            '(' if !in_class && next == Some('?') => {
                return Some(DialectIssue::new(
                    offset,
                    2,
                    "group flags and non-capturing groups",
                    "use a plain `(...)` group",
                ));
            }
            '*' | '+' | '?' | '}' if !in_class && next == Some('?') => {
                return Some(DialectIssue::new(
                    offset,
                    2,
                    "lazy quantifier",
                    "patterns match the whole value, so drop the trailing `?`",
                ));
            }
            _ => {}
        }
        index += 1;
    }

    None
}

/// Follow the base chain from `start`; returns the cycle if `start` is on one.
fn base_cycle(graph: &SchemaGraph, start: StructureId) -> Option<Vec<StructureId>> {
    let mut chain = vec![start];
    let mut current = start;

    loop {
        let StructureBody::DataType(data_type) = graph.structure(current).body() else {
            return None;
        };
        let next = data_type.base_type().structure()?;
        if next == start {
            return Some(chain);
        }
        if chain.contains(&next) {
            // A cycle further down that does not include `start`.
            return None;
        }
        chain.push(next);
        current = next;
    }
}

fn article(kind: StructureKind) -> &'static str {
    match kind {
        StructureKind::Element | StructureKind::Attribute | StructureKind::Object
        | StructureKind::Array => "an",
        StructureKind::DataType | StructureKind::Property => "a",
    }
}
