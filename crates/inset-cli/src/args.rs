//! Command-line argument definitions for the Inset CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, map size, probe points and logging verbosity.

use clap::Parser;

use inset::geometry::GeoPoint;

/// Command-line arguments for the Inset composite projection tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input territory list (TOML)
    ///
    /// Defaults to `territories.toml` or `inset/territories.toml` in the
    /// working directory. With `--snapshot`, defaults to the output path.
    #[arg(help = "Path to the input file")]
    pub input: Option<String>,

    /// Path to the exported composite (TOML)
    #[arg(short, long, default_value = "composite.toml")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Treat the input as a previously exported composite
    #[arg(long)]
    pub snapshot: bool,

    /// Map width in pixels, overriding the configuration
    #[arg(long)]
    pub width: Option<f64>,

    /// Map height in pixels, overriding the configuration
    #[arg(long)]
    pub height: Option<f64>,

    /// Geographic point to route through the composite, as LON,LAT
    #[arg(long = "probe", value_parser = parse_geo_point, allow_hyphen_values = true)]
    pub probes: Vec<GeoPoint>,

    /// Log level (off, error, warn, info, debug, trace); `INSET_LOG`
    /// directives take precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_geo_point(value: &str) -> Result<GeoPoint, String> {
    let (lon, lat) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LON,LAT, got `{value}`"))?;
    let lon: f64 = lon.trim().parse().map_err(|err| format!("invalid longitude `{lon}`: {err}"))?;
    let lat: f64 = lat.trim().parse().map_err(|err| format!("invalid latitude `{lat}`: {err}"))?;
    Ok(GeoPoint::new(lon, lat))
}
