//! Configuration types for Inset composite maps.
//!
//! This module provides the configuration structures that control how a
//! composite projection is built and validated, and the plain-data territory
//! records it is built from. All types implement [`serde::Deserialize`] for
//! loading from TOML.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining engine and map settings.
//! - [`EngineConfig`] - Invert tolerance, clip inset, validation and debug logging.
//! - [`MapConfig`] - Map size and the reference scale shared by all territories.
//! - [`TerritoryConfig`] - One territory: center, bounds, family and placement.
//! - [`TerritorySetConfig`] - The ordered list of territories of one map.
//!
//! # Example
//!
//! ```
//! # use inset::config::{AppConfig, ValidationPolicy};
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [engine]
//!     validation = "reject"
//!
//!     [map]
//!     width = 1200
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.engine().validation(), ValidationPolicy::Reject);
//! assert_eq!(config.engine().invert_tolerance(), 0.01);
//! assert_eq!(config.map().width(), 1200.0);
//! assert_eq!(config.map().height(), 500.0);
//! ```

use serde::{Deserialize, Serialize};

use inset_core::{
    geometry::{GeoBounds, GeoPoint},
    identifier::Id,
    projection::FamilyKind,
};

use crate::{InsetError, clip_extent, invert};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine configuration section.
    #[serde(default)]
    engine: EngineConfig,

    /// Map configuration section.
    #[serde(default)]
    map: MapConfig,
}

impl AppConfig {
    pub fn new(engine: EngineConfig, map: MapConfig) -> Self {
        Self { engine, map }
    }

    /// Returns the engine configuration.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the map configuration.
    pub fn map(&self) -> &MapConfig {
        &self.map
    }
}

/// What to do when a composite configuration is ambiguous.
///
/// A configuration is ambiguous when entry ids repeat, when more than one
/// entry has no bounds, or when bounded entries overlap. Routing stays
/// first-match in declaration order regardless of the policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Accept silently.
    Off,
    /// Accept and log a warning per finding.
    #[default]
    Warn,
    /// Refuse to build.
    Reject,
}

/// Settings of the composite projection engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Emit per-point routing traces.
    debug_logging: bool,

    /// Tolerance in degrees used to validate inverted points against bounds.
    invert_tolerance: f64,

    /// Inset applied to clip extent corners, in degrees or pixels.
    clip_epsilon: f64,

    validation: ValidationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            invert_tolerance: invert::DEFAULT_TOLERANCE,
            clip_epsilon: clip_extent::DEFAULT_EPSILON,
            validation: ValidationPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_debug_logging(mut self, debug_logging: bool) -> Self {
        self.debug_logging = debug_logging;
        self
    }

    pub fn with_invert_tolerance(mut self, invert_tolerance: f64) -> Self {
        self.invert_tolerance = invert_tolerance;
        self
    }

    pub fn with_clip_epsilon(mut self, clip_epsilon: f64) -> Self {
        self.clip_epsilon = clip_epsilon;
        self
    }

    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn invert_tolerance(&self) -> f64 {
        self.invert_tolerance
    }

    pub fn clip_epsilon(&self) -> f64 {
        self.clip_epsilon
    }

    pub fn validation(&self) -> ValidationPolicy {
        self.validation
    }
}

/// Size of the composite map and its reference scale.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    width: f64,
    height: f64,

    /// Scale of the primary territory; other territories scale relative to it.
    reference_scale: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            reference_scale: 2700.0,
        }
    }
}

impl MapConfig {
    pub fn new(width: f64, height: f64, reference_scale: f64) -> Self {
        Self {
            width,
            height,
            reference_scale,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }
}

fn default_scale_multiplier() -> f64 {
    1.0
}

/// A territory as supplied by the surrounding application.
///
/// ```toml
/// [[territories]]
/// id = "martinique"
/// display_name = "Martinique"
/// center = [-61.0, 14.6]
/// bounds = [[-61.3, 14.3], [-60.8, 14.9]]
/// family = "conic_conformal"
/// scale_multiplier = 1.5
/// translate_offset = [-300.0, 180.0]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TerritoryConfig {
    id: Id,

    #[serde(default)]
    display_name: Option<String>,

    center: GeoPoint,

    #[serde(default)]
    bounds: Option<GeoBounds>,

    #[serde(default)]
    family: FamilyKind,

    /// Standard parallels for conic families.
    #[serde(default)]
    parallels: Option<[f64; 2]>,

    #[serde(default = "default_scale_multiplier")]
    scale_multiplier: f64,

    /// Pixel offset from the map center.
    #[serde(default)]
    translate_offset: [f64; 2],

    /// Clip rectangle as pixel offsets `[x1, y1, x2, y2]` around the
    /// territory's screen position. Overrides the bounds-derived clip.
    #[serde(default)]
    pixel_clip_extent: Option<[f64; 4]>,
}

impl TerritoryConfig {
    /// Creates an unbounded Mercator territory centred on `center`.
    pub fn new(id: impl Into<Id>, center: GeoPoint) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            center,
            bounds: None,
            family: FamilyKind::default(),
            parallels: None,
            scale_multiplier: default_scale_multiplier(),
            translate_offset: [0.0, 0.0],
            pixel_clip_extent: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_family(mut self, family: FamilyKind) -> Self {
        self.family = family;
        self
    }

    pub fn with_parallels(mut self, parallels: [f64; 2]) -> Self {
        self.parallels = Some(parallels);
        self
    }

    pub fn with_scale_multiplier(mut self, scale_multiplier: f64) -> Self {
        self.scale_multiplier = scale_multiplier;
        self
    }

    pub fn with_translate_offset(mut self, translate_offset: [f64; 2]) -> Self {
        self.translate_offset = translate_offset;
        self
    }

    pub fn with_pixel_clip_extent(mut self, pixel_clip_extent: [f64; 4]) -> Self {
        self.pixel_clip_extent = Some(pixel_clip_extent);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the display name, falling back to the id.
    pub fn display_name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    pub fn family(&self) -> FamilyKind {
        self.family
    }

    pub fn parallels(&self) -> Option<[f64; 2]> {
        self.parallels
    }

    pub fn scale_multiplier(&self) -> f64 {
        self.scale_multiplier
    }

    pub fn translate_offset(&self) -> [f64; 2] {
        self.translate_offset
    }

    pub fn pixel_clip_extent(&self) -> Option<[f64; 4]> {
        self.pixel_clip_extent
    }
}

/// The ordered territories of one composite map. The first is the primary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerritorySetConfig {
    #[serde(default)]
    territories: Vec<TerritoryConfig>,
}

impl TerritorySetConfig {
    pub fn new(territories: Vec<TerritoryConfig>) -> Self {
        Self { territories }
    }

    /// Parses a territory set from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::Config`] for malformed TOML, unknown family
    /// names or invalid bounds.
    pub fn from_toml(source: &str) -> Result<Self, InsetError> {
        Ok(toml::from_str(source)?)
    }

    pub fn territories(&self) -> &[TerritoryConfig] {
        &self.territories
    }
}
