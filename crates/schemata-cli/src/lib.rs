//! CLI logic for the Schemata schema compiler.
//!
//! This module contains the core CLI logic: load the configuration, compile
//! one source file, and write every selected backend's output.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::{info, warn};

use schemata::{Backend, SchemaBuilder, SchemataError};

use error_adapter::{render, warning_reports};

/// Run the Schemata CLI application
///
/// This function compiles the input file and writes one output per selected
/// backend. The backends render in parallel. A failing backend does not stop
/// the others; its output is not written. Warnings of the compilation are
/// logged and do not fail the run.
///
/// # Errors
///
/// Returns every error that occurred:
/// - a single configuration, I/O or parse error when compilation cannot start
/// - one error per failed backend otherwise
pub fn run(args: &Args) -> Result<(), Vec<SchemataError>> {
    let outputs = args.outputs();
    info!(
        input_path = args.input,
        outputs = outputs.len();
        "Processing schema"
    );

    let (builder, graph) = compile(args).map_err(|err| vec![err])?;

    let backends: Vec<Backend> = outputs.iter().map(|(backend, _)| *backend).collect();
    let results = builder.render_all(&graph, &backends);

    let mut errors = Vec::new();
    for ((backend, result), (_, path)) in results.into_iter().zip(&outputs) {
        match result.and_then(|text| Ok(fs::write(path, text)?)) {
            Ok(()) => info!(backend = backend.name(), output_file = path; "Output written"),
            Err(err) => {
                warn!(backend = backend.name(), output_file = path; "Output not written");
                errors.push(err);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn compile(args: &Args) -> Result<(SchemaBuilder, schemata::SchemaGraph), SchemataError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    let builder = SchemaBuilder::new(app_config);
    let (graph, warnings) = builder.parse_with_warnings(&source)?;
    for report in warning_reports(&warnings, &source, &args.input) {
        warn!("{}", render(&report));
    }
    Ok((builder, graph))
}
