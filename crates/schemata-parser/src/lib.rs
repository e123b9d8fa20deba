//! # Schemata Parser
//!
//! Front end for the Schemata schema language. This crate turns source text
//! into a resolved [`SchemaGraph`] ready for code generation.
//!
//! ## Usage
//!
//! ```
//! # use schemata_parser::{parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         root element note { allowedContent: [ body ]; }
//!         element body { allowedContent: *any text*; }
//!     "#;
//!
//!     let graph = parse(source)?;
//!     assert_eq!(graph.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod error;
mod lexer;
mod lower;
mod metadata;
mod normalize;
mod parser;
#[cfg(test)]
mod parser_tests;
mod parser_types;
mod resolve;
mod span;
mod tokens;

pub use error::{Diagnostic, ParseError};
pub use span::Span;

use log::debug;

use schemata_core::SchemaGraph;

use error::DiagnosticCollector;

/// Parse source text into a resolved schema graph.
///
/// This is the main entry point of the front end. It runs the complete
/// pipeline:
///
/// 1. **Tokenize** - Convert source text to tokens, keeping comments aside
/// 2. **Parse** - Build declarations from tokens
/// 3. **Lower** - Check properties, normalize quantifiers, attach comment metadata
/// 4. **Resolve** - Link names and check data types
///
/// Each phase reports every problem it finds. A phase that reports an error
/// stops the pipeline, so later phases never see broken input.
///
/// # Errors
///
/// Returns a [`ParseError`] holding the diagnostics of the failing phase.
/// Warnings from a successful run are dropped; use [`parse_with_warnings`]
/// to keep them.
pub fn parse(source: &str) -> Result<SchemaGraph, ParseError> {
    parse_with_warnings(source).map(|(graph, _)| graph)
}

/// Like [`parse`], but also returns the warnings of a successful run.
///
/// # Errors
///
/// Returns a [`ParseError`] holding the diagnostics of the failing phase.
pub fn parse_with_warnings(source: &str) -> Result<(SchemaGraph, Vec<Diagnostic>), ParseError> {
    // Step 1: Tokenize
    let lexed = lexer::tokenize(source)?;
    debug!(tokens = lexed.tokens.len(), comments = lexed.comments.len(); "Source tokenized");

    // Step 2: Parse
    let declarations = parser::build_schema(&lexed.tokens)?;

    // Step 3: Lower
    let mut collector = DiagnosticCollector::new();
    let lowered = lower::lower(&declarations, &lexed.comments, &mut collector);

    // Step 4: Resolve
    let graph = (!collector.has_errors())
        .then(|| resolve::resolve(&lowered, &mut collector))
        .flatten();
    let warnings = collector.finish()?;

    // Resolution only withholds the graph after reporting an error.
    let graph = graph.ok_or_else(|| ParseError::new(Vec::new()))?;
    let graph = match metadata::format_name(&lexed.comments, &declarations) {
        Some(format_name) => graph.with_format_name(format_name),
        None => graph,
    };
    Ok((graph, warnings))
}
