//! Error and diagnostic system for the Schemata front end.
//!
//! Every phase before code generation (lexing, parsing, lowering,
//! normalization and resolution) reports problems as [`Diagnostic`]s. A
//! diagnostic carries a stable [`ErrorCode`], one or more labeled source
//! spans and optional help text. The phases collect as many diagnostics as
//! they can before stopping, and hand them back wrapped in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use schemata_parser::error::{Diagnostic, ErrorCode};
//! # use schemata_parser::Span;
//!
//! let span = Span::new(64..68);
//! let first = Span::new(8..12);
//!
//! let diag = Diagnostic::error("structure `book` is declared more than once")
//!     .with_code(ErrorCode::E301)
//!     .with_label(span, "duplicate declaration")
//!     .with_secondary_label(first, "first declared here")
//!     .with_help("rename one of the declarations");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
