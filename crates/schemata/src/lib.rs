//! Schemata - a schema language that compiles to XML Schema and JSON Schema.
//!
//! Parsing, resolution and code generation for the Schemata language. One
//! source file describes an XML format, a JSON format, or both; the resolved
//! graph feeds every backend.

pub mod config;
pub mod export;

mod error;
mod structure;

pub use schemata_core::{SchemaGraph, content, primitive};
pub use schemata_parser::{ParseError, error::Diagnostic};

pub use error::SchemataError;
pub use export::Backend;

use std::thread;

use log::{debug, info, trace};

use config::AppConfig;
use export::{
    Exporter, docs::DocsExporter, example::ExampleExporter, graph::GraphExporter,
    json_schema::JsonSchemaExporter, xsd::XsdExporter,
};

/// Builder for compiling Schemata schemas.
///
/// This provides an API for processing schemas through parsing, resolution,
/// and rendering stages.
///
/// # Examples
///
/// ```rust,no_run
/// use schemata::{SchemaBuilder, config::AppConfig};
///
/// let source = "root element note { allowedContent: *any text*; }";
///
/// // With custom config
/// let config = AppConfig::default();
/// let builder = SchemaBuilder::new(config);
///
/// // Parse source to a resolved graph
/// let graph = builder.parse(source)
///     .expect("Failed to parse");
///
/// // Render the graph as XML Schema
/// let xsd = builder.render_xsd(&graph)
///     .expect("Failed to render");
///
/// // Or use default config
/// let builder = SchemaBuilder::default();
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    config: AppConfig,
}

impl SchemaBuilder {
    /// Create a new schema builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including backend settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source code into a resolved schema graph.
    ///
    /// This performs lexing, parsing, lowering, and resolution to produce a
    /// frozen graph that every backend can read.
    ///
    /// # Arguments
    ///
    /// * `source` - Schemata source code as a string
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Parse`] holding every diagnostic of the
    /// failing phase, together with the source for rendering.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use schemata::{SchemaBuilder, config::AppConfig};
    ///
    /// let source = "root element note {}";
    /// let builder = SchemaBuilder::new(AppConfig::default());
    /// let graph = builder.parse(source)
    ///     .expect("Failed to parse schema");
    /// ```
    pub fn parse(&self, source: &str) -> Result<SchemaGraph, SchemataError> {
        self.parse_with_warnings(source).map(|(graph, _)| graph)
    }

    /// Like [`parse`](Self::parse), but also returns the warnings of a
    /// successful compilation, such as a default value that can never apply.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Parse`] exactly as [`parse`](Self::parse)
    /// does.
    pub fn parse_with_warnings(
        &self,
        source: &str,
    ) -> Result<(SchemaGraph, Vec<Diagnostic>), SchemataError> {
        info!("Parsing schema");

        let (graph, warnings) = schemata_parser::parse_with_warnings(source)
            .map_err(|err| SchemataError::new_parse_error(err, source))?;

        debug!(structures = graph.len(), warnings = warnings.len(); "Schema parsed successfully");
        trace!(graph:?; "Resolved graph");

        Ok((graph, warnings))
    }

    /// Render the graph as an XML Schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Export`] if the graph uses a content model
    /// XSD cannot express, or a tag name that is not a valid XML name.
    pub fn render_xsd(&self, graph: &SchemaGraph) -> Result<String, SchemataError> {
        Ok(XsdExporter::new(&self.config).export(graph)?)
    }

    /// Render the graph as a JSON Schema (draft 2020-12) document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Export`] if an object has two properties
    /// with the same name.
    pub fn render_json_schema(&self, graph: &SchemaGraph) -> Result<String, SchemataError> {
        Ok(JsonSchemaExporter::new(&self.config).export(graph)?)
    }

    /// Render the graph as Markdown reference documentation.
    pub fn render_docs(&self, graph: &SchemaGraph) -> Result<String, SchemataError> {
        Ok(DocsExporter::new(&self.config).export(graph)?)
    }

    /// Render a sample XML document.
    ///
    /// Uses the root element named `root`, or the first root element when
    /// `root` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemataError::Export`] if the schema has no root element,
    /// or if `root` does not name one.
    pub fn render_example(
        &self,
        graph: &SchemaGraph,
        root: Option<&str>,
    ) -> Result<String, SchemataError> {
        let exporter = ExampleExporter::new(&self.config);
        let exporter = match root {
            Some(root) => exporter.with_root(root),
            None => exporter,
        };
        Ok(exporter.export(graph)?)
    }

    /// Render the resolved graph as JSON.
    pub fn render_graph(&self, graph: &SchemaGraph) -> Result<String, SchemataError> {
        Ok(GraphExporter.export(graph)?)
    }

    /// Render one backend's artifact.
    pub fn render(&self, backend: Backend, graph: &SchemaGraph) -> Result<String, SchemataError> {
        match backend {
            Backend::Xsd => self.render_xsd(graph),
            Backend::JsonSchema => self.render_json_schema(graph),
            Backend::Docs => self.render_docs(graph),
            Backend::Example => self.render_example(graph, None),
            Backend::Graph => self.render_graph(graph),
        }
    }

    /// Render several backends in parallel.
    ///
    /// Every backend runs on its own scoped thread over the shared graph.
    /// Results come back in the order of `backends`; a failing backend does
    /// not affect the others.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use schemata::{Backend, SchemaBuilder};
    ///
    /// let builder = SchemaBuilder::default();
    /// let graph = builder.parse("root element note {}").expect("Failed to parse");
    ///
    /// for (backend, result) in builder.render_all(&graph, &[Backend::Xsd, Backend::JsonSchema]) {
    ///     println!("{backend}: {}", result.is_ok());
    /// }
    /// ```
    pub fn render_all(
        &self,
        graph: &SchemaGraph,
        backends: &[Backend],
    ) -> Vec<(Backend, Result<String, SchemataError>)> {
        info!(backends = backends.len(); "Rendering backends");

        thread::scope(|scope| {
            let handles: Vec<_> = backends
                .iter()
                .map(|&backend| (backend, scope.spawn(move || self.render(backend, graph))))
                .collect();

            handles
                .into_iter()
                .map(|(backend, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    (backend, result)
                })
                .collect()
        })
    }
}
