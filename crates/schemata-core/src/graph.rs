//! The resolved structure graph.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::{
    primitive::Primitive,
    structure::{Structure, StructureBody, StructureId, StructureKind, TypeRef},
};

/// A frozen set of structures linked by [`StructureId`].
///
/// The graph owns every structure of one compilation. Links between
/// structures are indices into the same collection, so recursive content
/// models need no shared ownership. Nothing can mutate the graph after
/// construction, which makes it safe to hand to several backends at once.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaGraph {
    #[serde(skip_serializing_if = "Option::is_none")]
    format_name: Option<String>,
    structures: Vec<Structure>,
    roots: Vec<StructureId>,
    #[serde(skip)]
    by_reference: HashMap<String, StructureId>,
}

impl SchemaGraph {
    /// Builds a graph from structures in declaration order.
    ///
    /// Callers guarantee that every [`StructureId`] inside `structures` is a
    /// valid index and that reference names are unique.
    pub fn new(structures: Vec<Structure>) -> Self {
        let roots: Vec<StructureId> = structures
            .iter()
            .enumerate()
            .filter(|(_, structure)| structure.is_root())
            .map(|(index, _)| StructureId::new(index))
            .collect();
        let by_reference = structures
            .iter()
            .enumerate()
            .map(|(index, structure)| (structure.reference().to_string(), StructureId::new(index)))
            .collect();

        debug!(structures = structures.len(), roots = roots.len(); "Schema graph frozen");

        Self {
            format_name: None,
            structures,
            roots,
            by_reference,
        }
    }

    /// Records the format name declared in the source header comment.
    pub fn with_format_name(mut self, format_name: impl Into<String>) -> Self {
        self.format_name = Some(format_name.into());
        self
    }

    /// The `Format Name:` from the source header, if any.
    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Returns the structure at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    pub fn structure(&self, id: StructureId) -> &Structure {
        &self.structures[id.index()]
    }

    /// Looks a structure up by its reference name.
    pub fn find(&self, reference: &str) -> Option<StructureId> {
        self.by_reference.get(reference).copied()
    }

    /// All structures in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures
            .iter()
            .enumerate()
            .map(|(index, structure)| (StructureId::new(index), structure))
    }

    /// Structures of one kind in declaration order.
    pub fn of_kind(&self, kind: StructureKind) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.iter().filter(move |(_, structure)| structure.kind() == kind)
    }

    /// Every root element and root object in declaration order.
    pub fn roots(&self) -> &[StructureId] {
        &self.roots
    }

    /// Roots declared with the `element` kind.
    pub fn root_elements(&self) -> impl Iterator<Item = StructureId> + '_ {
        self.roots_of_kind(StructureKind::Element)
    }

    /// Roots declared with the `object` kind.
    pub fn root_objects(&self) -> impl Iterator<Item = StructureId> + '_ {
        self.roots_of_kind(StructureKind::Object)
    }

    /// Walks a data type's base chain down to its primitive.
    ///
    /// Returns `None` if `type_ref` names a structure that is not a data type.
    pub fn base_primitive(&self, type_ref: TypeRef) -> Option<Primitive> {
        let mut current = type_ref;
        // The resolver rejects cyclic chains; the bound only guards misuse.
        for _ in 0..=self.structures.len() {
            match current {
                TypeRef::Primitive(primitive) => return Some(primitive),
                TypeRef::Structure(id) => match self.structure(id).body() {
                    StructureBody::DataType(data_type) => current = data_type.base_type(),
                    _ => return None,
                },
            }
        }
        None
    }

    fn roots_of_kind(&self, kind: StructureKind) -> impl Iterator<Item = StructureId> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(move |id| self.structure(*id).kind() == kind)
    }
}
