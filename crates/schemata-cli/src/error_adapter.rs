//! Conversion of Schemata errors and warnings into miette reports.
//!
//! Front-end diagnostics keep their code, help and labels, and point into
//! the input file by name. Errors without a source position (I/O and
//! backend failures) become plain reports with a stable code and, where
//! there is one, a hint.

use miette::{GraphicalReportHandler, LabeledSpan, MietteDiagnostic, NamedSource, Report, Severity};

use schemata::{SchemataError, export};
use schemata_parser::{Diagnostic, Span};

/// One report per problem in `err`.
///
/// A parse error yields one report per diagnostic. `name` labels source
/// snippets, usually the input path.
pub fn to_reports(err: &SchemataError, name: &str) -> Vec<Report> {
    match err {
        SchemataError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic_report(diagnostic, src, name))
            .collect(),
        SchemataError::Io(_) => {
            vec![Report::new(
                MietteDiagnostic::new(err.to_string()).with_code("schemata::io"),
            )]
        }
        SchemataError::Export(export_err) => {
            let (code, help) = export_code(export_err);
            let diagnostic = MietteDiagnostic::new(err.to_string())
                .with_code(format!("schemata::export::{code}"));
            vec![Report::new(match help {
                Some(help) => diagnostic.with_help(help),
                None => diagnostic,
            })]
        }
    }
}

/// Reports for the warnings of a successful compilation of `src`.
pub fn warning_reports(warnings: &[Diagnostic], src: &str, name: &str) -> Vec<Report> {
    warnings
        .iter()
        .map(|warning| diagnostic_report(warning, src, name))
        .collect()
}

/// Renders a report with source snippets for the terminal.
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    match GraphicalReportHandler::new().render_report(&mut out, &**report) {
        Ok(()) => out,
        Err(_) => report.to_string(),
    }
}

fn diagnostic_report(diagnostic: &Diagnostic, src: &str, name: &str) -> Report {
    let severity = if diagnostic.severity().is_warning() {
        Severity::Warning
    } else {
        Severity::Error
    };
    let labels = diagnostic.labels().iter().map(|label| {
        let message = Some(label.message().to_string());
        let span = source_span(label.span());
        if label.is_primary() {
            LabeledSpan::new_primary_with_span(message, span)
        } else {
            LabeledSpan::new_with_span(message, span)
        }
    });

    let mut report = MietteDiagnostic::new(diagnostic.message())
        .with_severity(severity)
        .with_labels(labels);
    if let Some(code) = diagnostic.code() {
        report = report.with_code(code.to_string());
    }
    if let Some(help) = diagnostic.help() {
        report = report.with_help(help);
    }
    Report::new(report).with_source_code(NamedSource::new(name, src.to_string()))
}

fn source_span(span: Span) -> miette::SourceSpan {
    (span.start(), span.len()).into()
}

/// Code suffix and hint for a backend failure.
fn export_code(err: &export::Error) -> (&'static str, Option<&'static str>) {
    match err {
        export::Error::UnsupportedContentModel { .. } => (
            "unsupported_content",
            Some("the other backends are unaffected; restructure the content to export it here"),
        ),
        export::Error::InvalidName { .. } => (
            "invalid_name",
            Some("XML names start with a letter or `_` and hold no spaces or colons"),
        ),
        export::Error::NameCollision { .. } => (
            "name_collision",
            Some("give one of the structures a distinct `tagName`"),
        ),
        export::Error::NoSampleValue { .. } => (
            "no_sample_value",
            Some("add an `Example Value:` line to the comment at the start of the declaration"),
        ),
        export::Error::NoRootElement => {
            ("no_root", Some("mark the document element with `root element`"))
        }
        export::Error::UnknownRoot(_) => ("unknown_root", None),
        export::Error::Serialization(_) => ("serialization", None),
    }
}
