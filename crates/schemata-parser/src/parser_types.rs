//! Parser AST types
//!
//! This module defines the unresolved declarations produced by the parser.
//! Names are kept as raw source slices; linking them to structures is the
//! resolver's job.
//!
//! ## Source Location Tracking
//!
//! Leaf values are wrapped in [`Spanned<T>`] so every later phase can point
//! diagnostics at the exact source text. Composite types compute their spans
//! from their contents.

use std::fmt;

use schemata_core::{Compositor, StructureKind};

use crate::span::{Span, Spanned};

/// A single `[root] kind name { ... }` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration<'src> {
    /// Span of the `root` keyword, when present.
    pub root: Option<Span>,
    pub kind: Spanned<StructureKind>,
    pub name: Spanned<&'src str>,
    /// Span of the opening `{` of the body.
    pub open: Span,
    pub properties: Vec<Property<'src>>,
    pub span: Span,
}

impl Declaration<'_> {
    pub fn is_root(&self) -> bool {
        self.root.is_some()
    }
}

/// A `name: value;` line inside a declaration body.
#[derive(Debug, Clone, PartialEq)]
pub struct Property<'src> {
    pub name: Spanned<&'src str>,
    pub value: Value<'src>,
}

impl Property<'_> {
    pub fn span(&self) -> Span {
        self.name.span().union(self.value.span())
    }
}

/// The right-hand side of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'src> {
    /// The `*any text*` marker.
    AnyText(Span),
    List(List<'src>),
    Item(Item<'src>),
    String(Spanned<&'src str>),
    Pattern(Spanned<&'src str>),
    Integer(Spanned<i64>),
}

impl Value<'_> {
    pub fn span(&self) -> Span {
        match self {
            Value::AnyText(span) => *span,
            Value::List(list) => list.span,
            Value::Item(item) => item.span(),
            Value::String(s) | Value::Pattern(s) => s.span(),
            Value::Integer(n) => n.span(),
        }
    }

    /// A short description of the value's shape for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::AnyText(_) => "the `*any text*` marker",
            Value::List(list) => list.shape(),
            Value::Item(_) => "a reference",
            Value::String(_) => "a string",
            Value::Pattern(_) => "a pattern",
            Value::Integer(_) => "an integer",
        }
    }
}

/// `[a, b]`, `{a, b}` or `{a / b}`.
#[derive(Debug, Clone, PartialEq)]
pub struct List<'src> {
    pub compositor: Compositor,
    pub entries: Vec<Entry<'src>>,
    pub span: Span,
}

impl List<'_> {
    pub fn shape(&self) -> &'static str {
        match self.compositor {
            Compositor::Sequence => "an ordered list",
            Compositor::Unordered => "an unordered list",
            Compositor::Choice => "a choice",
        }
    }
}

/// One member of a [`List`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'src> {
    Item(Item<'src>),
    String(Spanned<&'src str>),
    Integer(Spanned<i64>),
    AnyText(Span),
    List(List<'src>),
}

impl Entry<'_> {
    pub fn span(&self) -> Span {
        match self {
            Entry::Item(item) => item.span(),
            Entry::String(s) => s.span(),
            Entry::Integer(n) => n.span(),
            Entry::AnyText(span) => *span,
            Entry::List(list) => list.span,
        }
    }
}

/// A reference with an optional parenthesised quantifier: `book (n >= 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<'src> {
    pub name: Spanned<&'src str>,
    pub quantifier: Option<Spanned<Quantifier>>,
}

impl Item<'_> {
    pub fn span(&self) -> Span {
        match &self.quantifier {
            Some(quantifier) => self.name.span().union(quantifier.span()),
            None => self.name.span(),
        }
    }
}

/// A quantifier as written, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantifier {
    /// `optional`
    Optional,
    /// A bare count: `(3)`.
    Exact(i64),
    /// One or two comparisons against the occurrence count `n`.
    ///
    /// Comparisons written with the count on the right (`0 < n`) are stored
    /// flipped, so every bound reads `n OP value`.
    Bounds(Vec<Bound>),
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Optional => f.write_str("optional"),
            Quantifier::Exact(count) => write!(f, "{count}"),
            Quantifier::Bounds(bounds) => {
                for (i, bound) in bounds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
        }
    }
}

/// `n OP value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub comparison: Comparison,
    pub value: i64,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n {} {}", self.comparison, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterEqual,
    LessEqual,
    Greater,
    Less,
    Equal,
}

impl Comparison {
    /// The comparison with its operands swapped: `k < n` is `n > k`.
    pub fn flipped(self) -> Self {
        match self {
            Comparison::GreaterEqual => Comparison::LessEqual,
            Comparison::LessEqual => Comparison::GreaterEqual,
            Comparison::Greater => Comparison::Less,
            Comparison::Less => Comparison::Greater,
            Comparison::Equal => Comparison::Equal,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::GreaterEqual => ">=",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "=",
        })
    }
}
