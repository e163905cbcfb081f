//! Serializable snapshots of a territory set.

use serde::{Deserialize, Serialize};

use inset_core::{
    geometry::{GeoBounds, GeoPoint},
    identifier::Id,
    projection::{FamilyKind, Rotation},
};

use crate::InsetError;

/// Snapshot of every territory's projection and placement.
///
/// Produced by [`TerritoryProjectionSet::export_config`] and accepted by
/// [`TerritoryProjectionSet::from_export`].
///
/// [`TerritoryProjectionSet::export_config`]: crate::territory::TerritoryProjectionSet::export_config
/// [`TerritoryProjectionSet::from_export`]: crate::territory::TerritoryProjectionSet::from_export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedComposite {
    reference_scale: f64,
    territories: Vec<ExportedTerritory>,
}

impl ExportedComposite {
    pub fn new(reference_scale: f64, territories: Vec<ExportedTerritory>) -> Self {
        Self {
            reference_scale,
            territories,
        }
    }

    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }

    pub fn territories(&self) -> &[ExportedTerritory] {
        &self.territories
    }

    /// Serializes the snapshot as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::Config`] if a value cannot be represented.
    pub fn to_toml(&self) -> Result<String, InsetError> {
        Ok(toml::to_string(self)?)
    }

    /// Parses a snapshot from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::Config`] for malformed input.
    pub fn from_toml(source: &str) -> Result<Self, InsetError> {
        Ok(toml::from_str(source)?)
    }
}

/// One territory of an [`ExportedComposite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTerritory {
    id: Id,
    display_name: String,
    family: FamilyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parallels: Option<[f64; 2]>,
    center: GeoPoint,
    rotation: Rotation,
    /// Effective scale at the time of export.
    scale: f64,
    scale_multiplier: f64,
    translate_offset: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pixel_clip_extent: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bounds: Option<GeoBounds>,
}

impl ExportedTerritory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Id,
        display_name: String,
        family: FamilyKind,
        parallels: Option<[f64; 2]>,
        center: GeoPoint,
        rotation: Rotation,
        scale: f64,
        scale_multiplier: f64,
        translate_offset: [f64; 2],
        pixel_clip_extent: Option<[f64; 4]>,
        bounds: Option<GeoBounds>,
    ) -> Self {
        Self {
            id,
            display_name,
            family,
            parallels,
            center,
            rotation,
            scale,
            scale_multiplier,
            translate_offset,
            pixel_clip_extent,
            bounds,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn family(&self) -> FamilyKind {
        self.family
    }

    pub fn parallels(&self) -> Option<[f64; 2]> {
        self.parallels
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
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

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }
}
