//! CLI logic for the Inset composite projection tool.
//!
//! This module loads a territory list (or a previously exported composite),
//! builds the composite projection for the configured map size, routes any
//! probe points through it and writes the exported composite.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{LevelFilter, debug, info, warn};

use inset::{CompositeMapBuilder, InsetError, projection::Projection};

/// Environment variable with `env_logger` filter directives.
pub const LOG_ENV: &str = "INSET_LOG";

/// Installs the logger at `level`.
///
/// Directives in `INSET_LOG` are applied after `level`, so
/// `INSET_LOG=inset::invert=trace` narrows or widens single modules.
pub fn init_logging(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::new().filter(LOG_ENV))
        .init();
}

/// Run the Inset CLI application
///
/// # Errors
///
/// Returns `InsetError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid territory lists or snapshots
/// - Composite validation failures
pub fn run(args: &Args) -> Result<(), InsetError> {
    let working_dir = env::current_dir()?;
    let input = resolve_input(args, &working_dir)?;
    info!(
        input_path:? = input,
        output_path = args.output,
        snapshot = args.snapshot;
        "Processing territory list"
    );

    let source = config::locate_config(
        args.config.as_deref().map(Path::new),
        env::var_os(config::CONFIG_ENV).map(PathBuf::from),
        &working_dir,
    );
    let app_config = config::load_config(&source)?;
    let width = args.width.unwrap_or(app_config.map().width());
    let height = args.height.unwrap_or(app_config.map().height());

    let builder = CompositeMapBuilder::new(app_config);
    let mut set = if args.snapshot {
        let source = fs::read_to_string(&input)?;
        builder.restore(&source)?
    } else {
        builder.load(&input)?
    };

    let composite = set.build(width, height, false)?;
    info!(
        entries_count = composite.entries().len(),
        width,
        height;
        "Composite projection built"
    );

    for &probe in &args.probes {
        match composite.project_with_entry(probe) {
            Some((entry_id, screen)) => {
                let round_trip = composite.invert(screen).ok();
                info!(
                    probe:% = probe,
                    entry_id:% = entry_id,
                    x = screen.x(),
                    y = screen.y(),
                    round_trip:? = round_trip;
                    "Probe routed"
                );
            }
            None => warn!(probe:% = probe; "Probe is outside every territory"),
        }
    }

    for border in set.composition_borders(width, height) {
        let rect = border.screen_bounds();
        debug!(
            territory_id:% = border.territory_id(),
            display_name = border.display_name(),
            min_x = rect.min_x(),
            min_y = rect.min_y(),
            max_x = rect.max_x(),
            max_y = rect.max_y();
            "Composition border"
        );
    }

    let exported = set.export_config().to_toml()?;
    fs::write(&args.output, exported)?;

    info!(output_file = args.output; "Composite exported successfully");

    Ok(())
}

/// A snapshot run re-reads the output file unless told otherwise.
fn resolve_input(args: &Args, working_dir: &Path) -> Result<PathBuf, InsetError> {
    match (&args.input, args.snapshot) {
        (Some(input), _) => Ok(PathBuf::from(input)),
        (None, true) => Ok(PathBuf::from(&args.output)),
        (None, false) => config::locate_territories(None, working_dir),
    }
}
