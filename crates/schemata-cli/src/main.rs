//! Schemata CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use schemata_cli::{
    Args,
    error_adapter::{render, to_reports},
};

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    // RUST_LOG, when set, refines the command-line level
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_env(env_logger::Env::default())
        .init();

    info!(log_level:?; "Starting Schemata");
    debug!(args:?; "Parsed arguments");

    if let Err(errors) = schemata_cli::run(&args) {
        for err in &errors {
            for report in to_reports(err, &args.input) {
                error!("{}", render(&report));
            }
        }

        process::exit(1);
    }

    info!("Completed successfully");
}
