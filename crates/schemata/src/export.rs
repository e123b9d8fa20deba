//! Export functionality for Schemata schemas.
//!
//! This module provides the [`Exporter`] trait that every backend
//! implements. It is the final stage in the Schemata processing pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parse
//! Declarations
//!     ↓ lower + resolve
//! SchemaGraph
//!     ↓ export (this module)
//! Output Artifact
//! ```
//!
//! # Available Backends
//!
//! - [`xsd`] - XML Schema via [`xsd::XsdExporter`]
//! - [`json_schema`] - JSON Schema draft 2020-12 via [`json_schema::JsonSchemaExporter`]
//! - [`docs`] - Markdown reference via [`docs::DocsExporter`]
//! - [`example`] - Sample XML instance via [`example::ExampleExporter`]
//! - [`graph`] - JSON dump of the resolved graph via [`graph::GraphExporter`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`]. A failing backend never affects the
//! others; [`Error`] converts into [`SchemataError::Export`] at the crate
//! boundary.
//!
//! [`SchemataError::Export`]: crate::SchemataError::Export

pub mod docs;
pub mod example;
pub mod graph;
pub mod json_schema;
pub mod xsd;
mod xml;

use std::fmt;

use thiserror::Error;

use schemata_core::SchemaGraph;

/// Abstraction for schema export backends.
///
/// Implementors turn a resolved [`SchemaGraph`] into the text of one output
/// artifact. Exporters only read the graph, so several can run at once.
pub trait Exporter {
    /// Renders the artifact for `graph`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the graph uses a construct the target format
    /// cannot express, or if serialization fails.
    fn export(&self, graph: &SchemaGraph) -> Result<String, Error>;
}

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum Error {
    /// The target format cannot express a content model of `structure`.
    #[error("cannot export `{structure}`: {reason}")]
    UnsupportedContentModel { structure: String, reason: String },

    /// A name emitted for `structure` is not valid in the target format.
    #[error("`{name}` used by `{structure}` is not a valid XML name")]
    InvalidName { structure: String, name: String },

    /// Two structures would be declared under the same name in one scope.
    #[error("`{first}` and `{second}` both use the name `{name}` among {scope}")]
    NameCollision {
        first: String,
        second: String,
        name: String,
        scope: String,
    },

    /// No sample value can be derived for `structure`.
    #[error("cannot write a sample value for `{structure}`: {reason}")]
    NoSampleValue { structure: String, reason: String },

    /// The backend needs a root element and the schema declares none.
    #[error("the schema declares no root element")]
    NoRootElement,

    /// A root element was requested by a name that is not a root element.
    #[error("`{0}` is not a root element")]
    UnknownRoot(String),

    /// Writing the output document failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// The output artifacts Schemata can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Xsd,
    JsonSchema,
    Docs,
    Example,
    Graph,
}

impl Backend {
    /// Every backend, in a stable order.
    pub const ALL: [Backend; 5] = [
        Backend::Xsd,
        Backend::JsonSchema,
        Backend::Docs,
        Backend::Example,
        Backend::Graph,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Xsd => "xsd",
            Backend::JsonSchema => "json-schema",
            Backend::Docs => "docs",
            Backend::Example => "example",
            Backend::Graph => "graph",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` if `name` is an XML NCName (a name without a colon).
pub(crate) fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
