//! The projection capability contract and the built-in projection families.
//!
//! This module provides the [`Projection`] trait that every sub-projection of
//! a composite map implements, and [`ConfiguredProjection`], a ready-made
//! implementation over the closed set of [`ProjectionFamily`] variants.
//!
//! A projection maps geographic degrees to screen pixels. The required part
//! of the contract is small: forward projection, a geometry stream, and
//! scale/translate. Everything else (inverse projection, center, rotation,
//! parallels, clip extent, precision) is an optional capability. Callers must
//! check for it instead of assuming it: getters return `None` and setters
//! return [`ProjectionError::Unsupported`] when a projection lacks it.

mod configured;
mod family;
mod raw;
mod rotation;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    geometry::{ClipExtent, GeoPoint, ScreenPoint},
    stream::GeometrySink,
};

pub use configured::ConfiguredProjection;
pub use family::{FamilyKind, ProjectionFamily, UnknownFamily};

/// Errors reported by projection implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("projection does not support `{0}`")]
    Unsupported(&'static str),

    #[error("point {0} is outside the projection's domain")]
    OutOfDomain(String),

    #[error("invalid projection parameter: {0}")]
    InvalidParameter(String),

    #[error("point is not covered by any entry")]
    Uncovered,
}

/// Three-axis spherical rotation in degrees: `[lambda, phi, gamma]`.
///
/// `lambda` rotates around the polar axis, `phi` tilts the globe north/south
/// and `gamma` rolls it around the view axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rotation {
    lambda: f64,
    phi: f64,
    gamma: f64,
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self { lambda, phi, gamma }
    }

    pub fn lambda(self) -> f64 {
        self.lambda
    }

    pub fn phi(self) -> f64 {
        self.phi
    }

    pub fn gamma(self) -> f64 {
        self.gamma
    }
}

impl From<[f64; 3]> for Rotation {
    fn from([lambda, phi, gamma]: [f64; 3]) -> Self {
        Self { lambda, phi, gamma }
    }
}

impl From<Rotation> for [f64; 3] {
    fn from(rotation: Rotation) -> Self {
        [rotation.lambda, rotation.phi, rotation.gamma]
    }
}

/// A map projection: geographic degrees in, screen pixels out.
pub trait Projection: fmt::Debug {
    /// Projects a geographic point, or returns `None` if the point cannot be
    /// projected. No clipping is applied.
    fn project(&self, point: GeoPoint) -> Option<ScreenPoint>;

    /// Wraps `output` in a stream that projects, resamples and clips every
    /// incoming geographic coordinate before forwarding it.
    fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink>;

    /// Returns the scale factor.
    fn scale(&self) -> f64;

    /// Sets the scale factor.
    fn set_scale(&mut self, scale: f64);

    /// Returns the pixel position of the projection's center.
    fn translate(&self) -> ScreenPoint;

    /// Sets the pixel position of the projection's center.
    fn set_translate(&mut self, translate: ScreenPoint);

    /// Returns true if [`invert`](Projection::invert) is implemented.
    fn supports_invert(&self) -> bool {
        false
    }

    /// Maps a screen point back to geographic degrees.
    fn invert(&self, _point: ScreenPoint) -> Result<GeoPoint, ProjectionError> {
        Err(ProjectionError::Unsupported("invert"))
    }

    /// Returns the geographic point drawn at [`translate`](Projection::translate).
    fn center(&self) -> Option<GeoPoint> {
        None
    }

    fn set_center(&mut self, _center: GeoPoint) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported("center"))
    }

    fn rotation(&self) -> Option<Rotation> {
        None
    }

    fn set_rotation(&mut self, _rotation: Rotation) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported("rotation"))
    }

    /// Returns the standard parallels of a conic projection.
    fn parallels(&self) -> Option<[f64; 2]> {
        None
    }

    fn set_parallels(&mut self, _parallels: [f64; 2]) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported("parallels"))
    }

    /// Returns the screen rectangle outside of which the stream drops geometry.
    fn clip_extent(&self) -> Option<ClipExtent> {
        None
    }

    fn set_clip_extent(&mut self, _extent: Option<ClipExtent>) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported("clip_extent"))
    }

    /// Returns the resampling threshold in pixels.
    fn precision(&self) -> Option<f64> {
        None
    }

    fn set_precision(&mut self, _precision: f64) -> Result<(), ProjectionError> {
        Err(ProjectionError::Unsupported("precision"))
    }
}
