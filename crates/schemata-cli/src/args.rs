//! Command-line argument definitions for the Schemata CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input file, which backends run and
//! where their outputs go, configuration file selection, and logging
//! verbosity.

use clap::Parser;

use schemata::Backend;

/// Output written when no backend is selected.
const DEFAULT_OUTPUT: &str = "out.xsd";

/// Command-line arguments for the Schemata schema compiler
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Schemata file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Write an XML Schema to this path
    #[arg(long, value_name = "PATH")]
    pub xsd: Option<String>,

    /// Write a JSON Schema to this path
    #[arg(long, value_name = "PATH")]
    pub json_schema: Option<String>,

    /// Write Markdown documentation to this path
    #[arg(long, value_name = "PATH")]
    pub docs: Option<String>,

    /// Write a sample XML document to this path
    #[arg(long, value_name = "PATH")]
    pub example: Option<String>,

    /// Write the resolved graph as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub graph: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The selected backends with their output paths.
    ///
    /// Falls back to an XSD at `out.xsd` when no output flag is given.
    pub fn outputs(&self) -> Vec<(Backend, &str)> {
        let outputs: Vec<(Backend, &str)> = [
            (Backend::Xsd, &self.xsd),
            (Backend::JsonSchema, &self.json_schema),
            (Backend::Docs, &self.docs),
            (Backend::Example, &self.example),
            (Backend::Graph, &self.graph),
        ]
        .into_iter()
        .filter_map(|(backend, path)| path.as_deref().map(|path| (backend, path)))
        .collect();

        if outputs.is_empty() {
            vec![(Backend::Xsd, DEFAULT_OUTPUT)]
        } else {
            outputs
        }
    }
}
