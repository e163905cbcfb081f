//! Inset CLI entry point.

use std::process;

use clap::Parser;
use log::{debug, error, info};

use inset_cli::{Args, error_adapter::render_reports};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    inset_cli::init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    if let Err(err) = inset_cli::run(&args) {
        for report in render_reports(&err) {
            error!("{report}");
        }
        process::exit(1);
    }

    info!("Composite written");
}
