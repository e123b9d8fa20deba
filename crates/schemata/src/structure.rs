//! Reachability over the resolved schema graph.
//!
//! [`SchemaGraph`] stores links as indices inside each structure. This module
//! mirrors those links into a petgraph [`DiGraph`] so backends can ask which
//! structures a set of roots reaches, and in what breadth-first order.
//!
//! Node `i` of the link graph always holds [`StructureId`] `i`.

use indexmap::IndexSet;
use log::trace;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{Bfs, VisitMap},
};

use schemata_core::{SchemaGraph, StructureId};

/// Directed graph of structure links, one node per structure.
#[derive(Debug)]
pub(crate) struct LinkGraph {
    graph: DiGraph<StructureId, ()>,
}

impl LinkGraph {
    pub fn new(schema: &SchemaGraph) -> Self {
        let mut graph = DiGraph::with_capacity(schema.len(), schema.len());
        for (id, _) in schema.iter() {
            graph.add_node(id);
        }
        for (id, structure) in schema.iter() {
            // petgraph walks the most recently added edge first.
            for target in structure.links().into_iter().rev() {
                graph.add_edge(node(id), node(target), ());
            }
        }
        Self { graph }
    }

    /// Breadth-first order of everything reachable from `roots`.
    ///
    /// Roots are visited in the given order. A structure reachable from
    /// several roots appears once, at its first discovery.
    pub fn bfs_order(&self, roots: &[StructureId]) -> Vec<StructureId> {
        let Some((&first, rest)) = roots.split_first() else {
            return Vec::new();
        };

        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut bfs = Bfs::new(&self.graph, node(first));
        self.drain(&mut bfs, &mut order);

        for &root in rest {
            if bfs.discovered.visit(node(root)) {
                bfs.stack.push_back(node(root));
                self.drain(&mut bfs, &mut order);
            }
        }

        trace!(roots = roots.len(), reached = order.len(); "Reachability computed");
        order
    }

    fn drain<M>(&self, bfs: &mut Bfs<NodeIndex, M>, order: &mut Vec<StructureId>)
    where
        M: VisitMap<NodeIndex>,
    {
        while let Some(index) = bfs.next(&self.graph) {
            order.push(self.graph[index]);
        }
    }
}

fn node(id: StructureId) -> NodeIndex {
    NodeIndex::new(id.index())
}

/// The set of structures a backend emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reach {
    /// Every structure is emitted.
    All,
    /// Only these structures, in breadth-first order from the roots.
    Only(IndexSet<StructureId>),
}

impl Reach {
    /// Decides what to emit for the given roots.
    ///
    /// Pruning applies only when it is enabled and at least one root exists;
    /// otherwise every structure is emitted.
    pub fn compute(schema: &SchemaGraph, roots: &[StructureId], prune: bool) -> Self {
        if !prune || roots.is_empty() {
            return Reach::All;
        }
        let links = LinkGraph::new(schema);
        Reach::Only(links.bfs_order(roots).into_iter().collect())
    }

    pub fn contains(&self, id: StructureId) -> bool {
        match self {
            Reach::All => true,
            Reach::Only(reached) => reached.contains(&id),
        }
    }
}

/// Order in which documentation lists structures.
///
/// Roots come first, followed breadth-first by what they reach. Without
/// roots the declaration order is used. When `prune` is off, structures no
/// root reaches are appended in declaration order.
pub(crate) fn documentation_order(schema: &SchemaGraph, prune: bool) -> Vec<StructureId> {
    let declared = || schema.iter().map(|(id, _)| id);
    if schema.roots().is_empty() {
        return declared().collect();
    }

    let mut order: IndexSet<StructureId> = LinkGraph::new(schema)
        .bfs_order(schema.roots())
        .into_iter()
        .collect();
    if !prune {
        order.extend(declared());
    }
    order.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(source: &str) -> SchemaGraph {
        schemata_parser::parse(source).expect("schema should parse")
    }

    fn names(schema: &SchemaGraph, ids: &[StructureId]) -> Vec<String> {
        ids.iter()
            .map(|id| schema.structure(*id).reference().to_string())
            .collect()
    }

    const LIBRARY: &str = r#"
        root element library { allowedContent: [ shelf (n >= 0), note (optional) ]; }
        element shelf { attributes: [ label ]; allowedContent: [ book (n >= 1) ]; }
        element book { allowedContent: [ book (optional) ]; }
        element note { allowedContent: *any text*; }
        attribute label { valueType: _label; }
        dataType _label { baseType: string; }
        element orphan {}
    "#;

    #[test]
    fn test_bfs_follows_listing_order() {
        let schema = schema(LIBRARY);
        let links = LinkGraph::new(&schema);

        let order = links.bfs_order(schema.roots());

        assert_eq!(
            names(&schema, &order),
            ["library", "shelf", "note", "label", "book", "_label"]
        );
    }

    #[test]
    fn test_recursive_content_terminates() {
        let schema = schema("root element node { allowedContent: [ node (n >= 0) ]; }");
        let order = LinkGraph::new(&schema).bfs_order(schema.roots());
        assert_eq!(names(&schema, &order), ["node"]);
    }

    #[test]
    fn test_shared_descendants_listed_once() {
        let schema = schema(
            "root element a { allowedContent: [ c ]; }\n\
             root element b { allowedContent: [ c ]; }\n\
             element c {}",
        );
        let order = LinkGraph::new(&schema).bfs_order(schema.roots());
        assert_eq!(names(&schema, &order), ["a", "c", "b"]);
    }

    #[test]
    fn test_reach_prunes_only_with_roots() {
        let schema = schema(LIBRARY);
        let orphan = schema.find("orphan").unwrap();

        let pruned = Reach::compute(&schema, schema.roots(), true);
        assert!(!pruned.contains(orphan));
        assert!(pruned.contains(schema.find("_label").unwrap()));

        assert_eq!(Reach::compute(&schema, schema.roots(), false), Reach::All);
        assert_eq!(Reach::compute(&schema, &[], true), Reach::All);
    }

    #[test]
    fn test_documentation_order() {
        let schema = schema(LIBRARY);

        let pruned = documentation_order(&schema, true);
        assert_eq!(pruned.len(), 6);
        assert_eq!(pruned[0], schema.find("library").unwrap());

        let full = documentation_order(&schema, false);
        assert_eq!(full.len(), 7);
        assert_eq!(full[6], schema.find("orphan").unwrap());
    }

    #[test]
    fn test_documentation_order_without_roots() {
        let schema = schema("element b {}\nelement a { allowedContent: [ b ]; }");
        let order = documentation_order(&schema, true);
        assert_eq!(names(&schema, &order), ["b", "a"]);
    }
}
