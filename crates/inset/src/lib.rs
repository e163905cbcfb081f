//! Inset - Composite geographic projections.
//!
//! One map, many independently projected territories. Each territory gets its
//! own projection, scale, screen position and clip rectangle; the composite
//! routes points, geometry streams and inverse lookups to the right one.

pub mod clip_extent;
pub mod composite;
pub mod config;
pub mod export;
pub mod invert;
pub mod multiplex;
pub mod territory;

mod error;

pub use inset_core::{geometry, identifier, projection, stream};

pub use error::InsetError;

use std::{fs, path::Path};

use log::{debug, info};

use config::{AppConfig, TerritorySetConfig};
use export::ExportedComposite;
use territory::TerritoryProjectionSet;

/// Builder for loading territory sets with a shared configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use inset::{CompositeMapBuilder, config::AppConfig};
///
/// let builder = CompositeMapBuilder::new(AppConfig::default());
/// let mut set = builder.load("territories.toml").expect("Failed to load");
///
/// let map = builder.config().map();
/// let composite = set.build(map.width(), map.height(), false).expect("Failed to build");
/// ```
#[derive(Debug, Default)]
pub struct CompositeMapBuilder {
    config: AppConfig,
}

impl CompositeMapBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a territory list and initialize a set at the configured
    /// reference scale.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or an invalid territory list.
    pub fn parse(&self, source: &str) -> Result<TerritoryProjectionSet, InsetError> {
        let territories = TerritorySetConfig::from_toml(source)?;
        debug!(territories_count = territories.territories().len(); "Parsed territory list");

        let set = TerritoryProjectionSet::initialize(territories.territories(), self.config.map().reference_scale())?
            .with_engine(self.config.engine().clone());
        Ok(set)
    }

    /// Read a territory list from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::Io`] if the file cannot be read, otherwise the
    /// errors of [`parse`](Self::parse).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<TerritoryProjectionSet, InsetError> {
        let path = path.as_ref();
        info!(path:? = path; "Loading territory list");
        let source = fs::read_to_string(path)?;
        self.parse(&source)
    }

    /// Restore a set from an exported snapshot in TOML.
    ///
    /// The snapshot's own reference scale is kept.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or an invalid snapshot.
    pub fn restore(&self, source: &str) -> Result<TerritoryProjectionSet, InsetError> {
        let exported = ExportedComposite::from_toml(source)?;
        let set = TerritoryProjectionSet::from_export(&exported)?.with_engine(self.config.engine().clone());
        Ok(set)
    }
}
