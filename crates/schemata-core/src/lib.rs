//! Schemata Core Types
//!
//! This crate holds the resolved structure model shared by the Schemata
//! parser and its backends:
//!
//! - **Primitives**: built-in value types ([`primitive::Primitive`])
//! - **Content**: cardinalities and content models ([`content`] module)
//! - **Structures**: kind-specific structure records ([`structure`] module)
//! - **Graph**: the frozen, index-based structure graph ([`graph::SchemaGraph`])
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ lexer
//! Tokens
//!     ↓ parser
//! Declarations (parser_types) - raw names with spans
//!     ↓ lower + normalize + resolve
//! SchemaGraph (these types) - linked by index, read-only
//!     ↓ export
//! XSD / JSON Schema / Markdown
//! ```

pub mod content;
pub mod graph;
pub mod primitive;
pub mod structure;

pub use content::{Cardinality, Compositor, ContentItem, ContentModel, Group, Ordering, Particle};
pub use graph::SchemaGraph;
pub use primitive::Primitive;
pub use structure::{
    Array, Attribute, Constraints, DataType, Element, Metadata, Object, Property, Structure,
    StructureBody, StructureId, StructureKind, TypeRef,
};
