//! The ParseError type for wrapping front-end diagnostics.

use std::fmt::{self, Write as _};

use crate::error::{Diagnostic, ErrorCode};

/// A type alias for `Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Error returned when a schema fails to lex, parse or resolve.
///
/// Holds every diagnostic the failing phase produced, in source order of
/// discovery.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if any diagnostic carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.code() == Some(code))
    }

    /// Render every diagnostic on its own line, with line and column
    /// positions computed against `source`.
    ///
    /// This is a plain-text fallback for callers that do not use a
    /// graphical diagnostic renderer.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            let _ = write!(out, "{diagnostic}");
            if let Some(span) = diagnostic.primary_span() {
                let (line, column) = span.line_column(source);
                let _ = write!(out, " (line {line}, column {column})");
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}
