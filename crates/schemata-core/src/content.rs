//! Content models and cardinalities.
//!
//! A content model describes which children a structure may hold. Children
//! are [`ContentItem`]s: a link to another structure plus a [`Cardinality`].

use std::fmt;

use serde::Serialize;

use crate::structure::{StructureId, TypeRef};

/// An occurrence range `(min, max)`; `max` is `None` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cardinality {
    min: u32,
    max: Option<u32>,
}

impl Cardinality {
    /// Exactly one occurrence, the cardinality of a bare reference.
    pub const ONE: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };

    /// Zero or one occurrence.
    pub const OPTIONAL: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };

    /// Creates a cardinality, returning `None` when `min > max`.
    pub fn new(min: u32, max: Option<u32>) -> Option<Self> {
        match max {
            Some(max) if min > max => None,
            _ => Some(Self { min, max }),
        }
    }

    /// Exactly `count` occurrences.
    pub fn exactly(count: u32) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    /// At least `min` occurrences, with no upper bound.
    pub fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    /// Returns `true` when at least one occurrence is required.
    pub fn is_required(&self) -> bool {
        self.min >= 1
    }

    /// Returns `true` when more than one occurrence is allowed.
    pub fn is_repeatable(&self) -> bool {
        self.max.is_none_or(|max| max > 1)
    }

    /// Returns `true` for the `(1, 1)` cardinality.
    pub fn is_exactly_one(&self) -> bool {
        *self == Self::ONE
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// A child slot in a content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    target: StructureId,
    cardinality: Cardinality,
}

impl ContentItem {
    pub fn new(target: StructureId, cardinality: Cardinality) -> Self {
        Self {
            target,
            cardinality,
        }
    }

    /// The structure this slot refers to.
    pub fn target(&self) -> StructureId {
        self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
}

/// Whether the order of items in a group is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    /// Written with `[...]`; children must appear in the listed order.
    Ordered,
    /// Written with `{...}`; children may appear in any order.
    Unordered,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordering::Ordered => f.write_str("ordered"),
            Ordering::Unordered => f.write_str("unordered"),
        }
    }
}

/// How the members of a [`Group`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compositor {
    /// `[a, b]`: every member, in the listed order.
    Sequence,
    /// `{a, b}`: every member, in any order.
    Unordered,
    /// `{a / b}`: exactly one of the members.
    Choice,
}

impl fmt::Display for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compositor::Sequence => f.write_str("sequence"),
            Compositor::Unordered => f.write_str("unordered"),
            Compositor::Choice => f.write_str("choice"),
        }
    }
}

/// A member of a group: an element slot or a nested group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Particle {
    Element(ContentItem),
    Group(Group),
}

/// Element slots and nested groups, optionally interleaved with free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    compositor: Compositor,
    particles: Vec<Particle>,
    mixed: bool,
}

impl Group {
    pub fn new(compositor: Compositor, particles: Vec<Particle>, mixed: bool) -> Self {
        Self {
            compositor,
            particles,
            mixed,
        }
    }

    /// A group holding element slots only.
    pub fn of_items(compositor: Compositor, items: Vec<ContentItem>, mixed: bool) -> Self {
        Self::new(
            compositor,
            items.into_iter().map(Particle::Element).collect(),
            mixed,
        )
    }

    pub fn compositor(&self) -> Compositor {
        self.compositor
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Returns `true` when text may appear between the child elements.
    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Returns `true` when a member is itself a group.
    pub fn is_nested(&self) -> bool {
        self.particles
            .iter()
            .any(|particle| matches!(particle, Particle::Group(_)))
    }

    /// Every element slot, depth first in listing order.
    pub fn items(&self) -> Vec<ContentItem> {
        let mut items = Vec::new();
        self.collect_items(&mut items);
        items
    }

    fn collect_items(&self, items: &mut Vec<ContentItem>) {
        for particle in &self.particles {
            match particle {
                Particle::Element(item) => items.push(*item),
                Particle::Group(group) => group.collect_items(items),
            }
        }
    }
}

/// The permitted children of an element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "model", content = "content", rename_all = "snake_case")]
pub enum ContentModel {
    /// No children and no text.
    #[default]
    Empty,
    /// Free text and no child elements (`*any text*`).
    TextOnly,
    /// A single value of a primitive or data type.
    Value(TypeRef),
    /// Child elements arranged by a group.
    Children(Group),
}

impl ContentModel {
    /// The element group, if this model has one.
    pub fn group(&self) -> Option<&Group> {
        match self {
            ContentModel::Children(group) => Some(group),
            ContentModel::Empty | ContentModel::TextOnly | ContentModel::Value(_) => None,
        }
    }

    /// The compositor of the outermost group, if this model has one.
    pub fn compositor(&self) -> Option<Compositor> {
        self.group().map(Group::compositor)
    }

    /// Every child element slot; empty for models without a group.
    pub fn items(&self) -> Vec<ContentItem> {
        self.group().map_or_else(Vec::new, Group::items)
    }
}
