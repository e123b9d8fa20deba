//! JSON dump of the resolved graph, for debugging and external tooling.

use log::info;

use schemata_core::SchemaGraph;

use super::{Error, Exporter};

/// Serializes the resolved graph as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct GraphExporter;

impl Exporter for GraphExporter {
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error> {
        let mut text = serde_json::to_string_pretty(graph)
            .map_err(|err| Error::Serialization(err.to_string()))?;
        text.push('\n');
        info!(structures = graph.len(); "Graph dump exported");
        Ok(text)
    }
}
