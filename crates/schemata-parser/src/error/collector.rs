//! Collector for accumulating diagnostics during a processing phase.

use log::debug;

use crate::error::{Diagnostic, ParseError};

/// Accumulates diagnostics so a phase can report every problem it finds
/// instead of stopping at the first.
///
/// # Example
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::error("undefined reference `isbn` in `book`")
///         .with_code(ErrorCode::E300)
///         .with_label(span, "not declared"),
/// );
///
/// let warnings = collector.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic; errors mark the collector as failed.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection.
    ///
    /// - With at least one error, returns `Err(ParseError)` holding every
    ///   diagnostic, warnings included.
    /// - Otherwise returns the warnings for the caller to report.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            return Err(ParseError::new(self.diagnostics));
        }
        for diagnostic in &self.diagnostics {
            debug!(diagnostic:% = diagnostic; "Schema warning");
        }
        Ok(self.diagnostics)
    }
}
