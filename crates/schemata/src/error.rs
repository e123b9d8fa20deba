//! Error types for Schemata operations.
//!
//! This module provides the main error type [`SchemataError`] which wraps
//! the failures of each compilation phase.

use std::io;

use thiserror::Error;

use schemata_parser::ParseError;

use crate::export;

/// The main error type for Schemata operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so that
/// callers can render snippets without reading the file again.
#[derive(Debug, Error)]
pub enum SchemataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Export error: {0}")]
    Export(#[from] export::Error),
}

impl SchemataError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
