//! A small XML Schema validator covering the constructs the XSD backend
//! emits: global elements, named simple and complex types, `xs:sequence`,
//! `xs:choice` and `xs:all` groups, simple content, attributes and
//! restriction facets.
//!
//! Groups are matched greedily; a choice takes its first option that
//! consumes anything.

use std::collections::HashMap;

use quick_xml::{Reader, events::Event};
use regex::Regex;

/// A parsed XML element.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub text: String,
}

impl Node {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children_named(name).next()
    }
}

/// Parses an XML document into its root element.
pub fn parse_xml(text: &str) -> Node {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    loop {
        match reader.read_event().expect("document should be well-formed") {
            Event::Start(start) => stack.push(node_from(&start)),
            Event::Empty(start) => {
                let node = node_from(&start);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return node,
                }
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().expect("text should unescape"));
                }
            }
            Event::End(_) => {
                let node = stack.pop().expect("end tag should match a start tag");
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return node,
                }
            }
            Event::Eof => panic!("document has no root element"),
            _ => {}
        }
    }
}

fn node_from(start: &quick_xml::events::BytesStart<'_>) -> Node {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let attributes = start
        .attributes()
        .map(|attribute| {
            let attribute = attribute.expect("attribute should be well-formed");
            (
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                attribute
                    .unescape_value()
                    .expect("attribute value should unescape")
                    .into_owned(),
            )
        })
        .collect();
    Node {
        name,
        attributes,
        ..Node::default()
    }
}

struct Particle<'a> {
    name: &'a str,
    type_name: &'a str,
    min: u32,
    max: Option<u32>,
}

enum Term<'a> {
    Element(Particle<'a>),
    Sequence(Vec<Term<'a>>),
    Choice(Vec<Term<'a>>),
}

/// A compiled XML Schema document.
pub struct Schema {
    elements: HashMap<String, String>,
    complex_types: HashMap<String, Node>,
    simple_types: HashMap<String, Node>,
}

impl Schema {
    pub fn parse(xsd: &str) -> Self {
        let root = parse_xml(xsd);
        assert_eq!(root.name, "xs:schema");

        let mut schema = Schema {
            elements: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
        };
        for child in &root.children {
            let name = child.attribute("name").expect("top-level items are named");
            match child.name.as_str() {
                "xs:element" => {
                    let type_name = child.attribute("type").expect("element has a type");
                    schema.elements.insert(name.to_string(), type_name.to_string());
                }
                "xs:complexType" => {
                    schema.complex_types.insert(name.to_string(), child.clone());
                }
                "xs:simpleType" => {
                    schema.simple_types.insert(name.to_string(), child.clone());
                }
                other => panic!("unexpected top-level item `{other}`"),
            }
        }
        schema
    }

    /// Validates an instance document.
    pub fn validate(&self, xml: &str) -> Result<(), String> {
        let root = parse_xml(xml);
        let type_name = self
            .elements
            .get(&root.name)
            .ok_or_else(|| format!("`{}` is not a global element", root.name))?;
        self.element(&root, type_name)
    }

    fn element(&self, node: &Node, type_name: &str) -> Result<(), String> {
        if let Some(complex) = self.complex_types.get(type_name) {
            return self.complex(node, complex);
        }
        if !node.children.is_empty() || !node.attributes.is_empty() {
            return Err(format!("`{}` must hold text only", node.name));
        }
        self.simple_value(&node.text, type_name)
            .map_err(|err| format!("`{}`: {err}", node.name))
    }

    fn complex(&self, node: &Node, complex: &Node) -> Result<(), String> {
        if let Some(simple_content) = complex.child("xs:simpleContent") {
            let extension = simple_content
                .child("xs:extension")
                .ok_or("simple content without extension")?;
            self.attributes(node, extension)?;
            if !node.children.is_empty() {
                return Err(format!("`{}` must not have child elements", node.name));
            }
            let base = extension.attribute("base").ok_or("extension without base")?;
            return self
                .simple_value(&node.text, base)
                .map_err(|err| format!("`{}`: {err}", node.name));
        }

        self.attributes(node, complex)?;
        let mixed = complex.attribute("mixed") == Some("true");
        if !mixed && !node.text.is_empty() {
            return Err(format!("`{}` must not contain text", node.name));
        }

        if let Some(group) = complex
            .children
            .iter()
            .find(|child| matches!(child.name.as_str(), "xs:sequence" | "xs:choice"))
        {
            self.ordered(node, &term(group))
        } else if let Some(all) = complex.child("xs:all") {
            self.all(node, &particles(all))
        } else if node.children.is_empty() {
            Ok(())
        } else {
            Err(format!("`{}` must be empty", node.name))
        }
    }

    fn attributes(&self, node: &Node, owner: &Node) -> Result<(), String> {
        let declared: Vec<&Node> = owner.children_named("xs:attribute").collect();
        for (key, _) in &node.attributes {
            if !declared.iter().any(|decl| decl.attribute("name") == Some(key)) {
                return Err(format!("undeclared attribute `{key}` on `{}`", node.name));
            }
        }
        for decl in declared {
            let name = decl.attribute("name").ok_or("attribute without name")?;
            let type_name = decl.attribute("type").unwrap_or("xs:string");
            match node.attribute(name) {
                Some(value) => self
                    .simple_value(value, type_name)
                    .map_err(|err| format!("attribute `{name}`: {err}"))?,
                None if decl.attribute("use") == Some("required") => {
                    return Err(format!("missing attribute `{name}` on `{}`", node.name));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn ordered(&self, node: &Node, content: &Term<'_>) -> Result<(), String> {
        let mut matched = Vec::new();
        let end = consume(content, node, 0, &mut matched)?;
        if let Some(extra) = node.children.get(end) {
            return Err(format!("unexpected `{}` in `{}`", extra.name, node.name));
        }
        for (index, type_name) in matched {
            self.element(&node.children[index], type_name)?;
        }
        Ok(())
    }

    fn all(&self, node: &Node, particles: &[Particle<'_>]) -> Result<(), String> {
        let mut counts = vec![0u32; particles.len()];
        for child in &node.children {
            let position = particles
                .iter()
                .position(|particle| particle.name == child.name)
                .ok_or_else(|| format!("unexpected `{}` in `{}`", child.name, node.name))?;
            self.element(child, particles[position].type_name)?;
            counts[position] += 1;
        }
        for (particle, count) in particles.iter().zip(counts) {
            if count < particle.min || particle.max.is_some_and(|max| count > max) {
                return Err(format!(
                    "`{}` occurs {count} times in `{}`",
                    particle.name, node.name
                ));
            }
        }
        Ok(())
    }

    /// Checks a value against a simple type, walking the restriction chain
    /// so every level's facets apply.
    fn simple_value(&self, value: &str, type_name: &str) -> Result<(), String> {
        if type_name.starts_with("xs:") {
            return builtin(value, type_name);
        }
        let simple = self
            .simple_types
            .get(type_name)
            .ok_or_else(|| format!("unknown type `{type_name}`"))?;
        let restriction = simple
            .child("xs:restriction")
            .ok_or("simple type without restriction")?;

        if let Some(pattern) = restriction.child("xs:pattern") {
            let pattern = pattern.attribute("value").unwrap_or_default();
            let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| err.to_string())?;
            if !regex.is_match(value) {
                return Err(format!("`{value}` does not match `{pattern}`"));
            }
        }
        let allowed: Vec<&str> = restriction
            .children_named("xs:enumeration")
            .filter_map(|facet| facet.attribute("value"))
            .collect();
        if !allowed.is_empty() && !allowed.contains(&value) {
            return Err(format!("`{value}` is not one of {allowed:?}"));
        }
        for (facet, below) in [("xs:minInclusive", true), ("xs:maxInclusive", false)] {
            let Some(bound) = restriction.child(facet).and_then(|f| f.attribute("value")) else {
                continue;
            };
            let number: f64 = value.parse().map_err(|_| format!("`{value}` is not a number"))?;
            let bound: f64 = bound.parse().map_err(|_| format!("bad bound `{bound}`"))?;
            if (below && number < bound) || (!below && number > bound) {
                return Err(format!("`{value}` is out of range"));
            }
        }

        let base = restriction.attribute("base").ok_or("restriction without base")?;
        self.simple_value(value, base)
    }
}

fn particle(element: &Node) -> Particle<'_> {
    Particle {
        name: element.attribute("name").unwrap_or_default(),
        type_name: element.attribute("type").unwrap_or("xs:string"),
        min: element
            .attribute("minOccurs")
            .map_or(1, |min| min.parse().expect("minOccurs is a number")),
        max: match element.attribute("maxOccurs") {
            None => Some(1),
            Some("unbounded") => None,
            Some(max) => Some(max.parse().expect("maxOccurs is a number")),
        },
    }
}

fn particles(group: &Node) -> Vec<Particle<'_>> {
    group.children_named("xs:element").map(particle).collect()
}

fn term(node: &Node) -> Term<'_> {
    let members = || {
        node.children
            .iter()
            .filter(|child| child.name != "xs:annotation")
            .map(term)
            .collect()
    };
    match node.name.as_str() {
        "xs:element" => Term::Element(particle(node)),
        "xs:choice" => Term::Choice(members()),
        "xs:sequence" => Term::Sequence(members()),
        other => panic!("unexpected group member `{other}`"),
    }
}

/// Matches `term` against the children of `node` from `index` on, by name.
///
/// Returns the index after the match and records which declared type each
/// matched child must satisfy.
fn consume<'a>(
    term: &Term<'a>,
    node: &Node,
    index: usize,
    matched: &mut Vec<(usize, &'a str)>,
) -> Result<usize, String> {
    let children = &node.children;
    match term {
        Term::Element(particle) => {
            let mut index = index;
            let mut count = 0;
            while index < children.len()
                && children[index].name == particle.name
                && particle.max.is_none_or(|max| count < max)
            {
                matched.push((index, particle.type_name));
                index += 1;
                count += 1;
            }
            if count < particle.min {
                return Err(format!(
                    "expected `{}` in `{}` at position {index}",
                    particle.name, node.name
                ));
            }
            Ok(index)
        }
        Term::Sequence(terms) => terms
            .iter()
            .try_fold(index, |index, term| consume(term, node, index, matched)),
        Term::Choice(options) => {
            let mut first_error = None;
            let mut empty_match = None;
            for option in options {
                let mut attempt = Vec::new();
                match consume(option, node, index, &mut attempt) {
                    Ok(next) if next > index => {
                        matched.extend(attempt);
                        return Ok(next);
                    }
                    Ok(next) => empty_match = empty_match.or(Some(next)),
                    Err(err) => first_error = first_error.or(Some(err)),
                }
            }
            match (empty_match, first_error) {
                (Some(next), _) => Ok(next),
                (None, Some(err)) => Err(err),
                (None, None) => Err(format!("empty choice in `{}`", node.name)),
            }
        }
    }
}

fn builtin(value: &str, type_name: &str) -> Result<(), String> {
    let valid = match type_name {
        "xs:string" => true,
        "xs:integer" => value.parse::<i64>().is_ok(),
        "xs:decimal" => value.parse::<f64>().is_ok(),
        "xs:boolean" => matches!(value, "true" | "false" | "1" | "0"),
        other => return Err(format!("unsupported built-in type `{other}`")),
    };
    if valid {
        Ok(())
    } else {
        Err(format!("`{value}` is not a valid {type_name}"))
    }
}
