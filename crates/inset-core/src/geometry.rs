//! Geographic and screen-space primitives for composite map layout.
//!
//! This module provides the coordinate and rectangle types used throughout
//! Inset to describe where a territory lives on the globe and where it is
//! drawn on screen.
//!
//! # Overview
//!
//! - [`GeoPoint`] - A longitude/latitude pair in degrees
//! - [`ScreenPoint`] - A pixel coordinate
//! - [`GeoBounds`] - A geographic bounding box with a point-in-box test
//! - [`ClipExtent`] - Two screen corners as produced by a projection
//! - [`ScreenRect`] - A normalised screen rectangle
//!
//! # Coordinate System
//!
//! Screen coordinates follow the SVG convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Geographic coordinates are degrees with longitude increasing eastward and
//! latitude increasing northward, so north maps to smaller `y`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
}

impl GeoPoint {
    /// Creates a new geographic point from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns the longitude in degrees.
    pub fn lon(self) -> f64 {
        self.lon
    }

    /// Returns the latitude in degrees.
    pub fn lat(self) -> f64 {
        self.lat
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lon, point.lat]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.lon, self.lat)
    }
}

/// A position in screen (pixel) space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ScreenPoint {
    x: f64,
    y: f64,
}

impl ScreenPoint {
    /// Creates a new screen point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate
    pub fn x(self) -> f64 {
        self.x
    }

    /// Returns the y-coordinate
    pub fn y(self) -> f64 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: ScreenPoint) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: ScreenPoint) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Linear interpolation towards `other` at parameter `t`.
    pub fn lerp(self, other: ScreenPoint, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for ScreenPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<ScreenPoint> for [f64; 2] {
    fn from(point: ScreenPoint) -> Self {
        [point.x, point.y]
    }
}

/// Errors raised when constructing a [`GeoBounds`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("bounds coordinates must be finite")]
    NotFinite,

    #[error("min longitude {min} is greater than max longitude {max}")]
    InvertedLongitude { min: f64, max: f64 },

    #[error("min latitude {min} is greater than max latitude {max}")]
    InvertedLatitude { min: f64, max: f64 },
}

/// A geographic bounding box in degrees.
///
/// The constructor guarantees `min_lon <= max_lon` and `min_lat <= max_lat`.
/// Bounds may be written either as an object or as nested pairs
/// `[[min_lon, min_lat], [max_lon, max_lat]]`; both deserialize to the same
/// value.
///
/// # Examples
///
/// ```
/// # use inset_core::geometry::{GeoBounds, GeoPoint};
/// let bounds = GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap();
/// assert!(bounds.contains(GeoPoint::new(2.0, 47.0), 0.0));
/// assert!(!bounds.contains(GeoPoint::new(-61.0, 14.5), 0.0));
///
/// let pairs = bounds.to_pairs();
/// assert_eq!(GeoBounds::from_pairs(pairs).unwrap(), bounds);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsRepr", into = "BoundsRepr")]
pub struct GeoBounds {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl GeoBounds {
    /// Creates bounds from their four edges.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if any edge is not finite or a minimum exceeds
    /// its maximum.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, BoundsError> {
        if ![min_lon, min_lat, max_lon, max_lat]
            .iter()
            .all(|value| value.is_finite())
        {
            return Err(BoundsError::NotFinite);
        }
        if min_lon > max_lon {
            return Err(BoundsError::InvertedLongitude {
                min: min_lon,
                max: max_lon,
            });
        }
        if min_lat > max_lat {
            return Err(BoundsError::InvertedLatitude {
                min: min_lat,
                max: max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Creates bounds from the nested-pair form `[[min_lon, min_lat], [max_lon, max_lat]]`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GeoBounds::new`].
    pub fn from_pairs([[min_lon, min_lat], [max_lon, max_lat]]: [[f64; 2]; 2]) -> Result<Self, BoundsError> {
        Self::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Returns the nested-pair form `[[min_lon, min_lat], [max_lon, max_lat]]`.
    pub fn to_pairs(self) -> [[f64; 2]; 2] {
        [[self.min_lon, self.min_lat], [self.max_lon, self.max_lat]]
    }

    pub fn min_lon(self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(self) -> f64 {
        self.max_lat
    }

    /// Returns true if `point` lies within the bounds widened by `tolerance`
    /// degrees on every side.
    ///
    /// Forward routing uses a tolerance of zero. Inverse validation uses a
    /// small positive tolerance to absorb numerical error near shared edges.
    pub fn contains(self, point: GeoPoint, tolerance: f64) -> bool {
        point.lon >= self.min_lon - tolerance
            && point.lon <= self.max_lon + tolerance
            && point.lat >= self.min_lat - tolerance
            && point.lat <= self.max_lat + tolerance
    }

    /// Returns true if the two boxes share interior area.
    ///
    /// Boxes that only touch along an edge or at a corner do not overlap, so
    /// a gapless partition of the globe is not reported.
    pub fn overlaps(self, other: GeoBounds) -> bool {
        self.min_lon < other.max_lon
            && other.min_lon < self.max_lon
            && self.min_lat < other.max_lat
            && other.min_lat < self.max_lat
    }

    /// North-west corner inset by `epsilon` degrees towards the interior.
    pub fn north_west(self, epsilon: f64) -> GeoPoint {
        GeoPoint::new(self.min_lon + epsilon, self.max_lat - epsilon)
    }

    /// South-east corner inset by `epsilon` degrees towards the interior.
    pub fn south_east(self, epsilon: f64) -> GeoPoint {
        GeoPoint::new(self.max_lon - epsilon, self.min_lat + epsilon)
    }

    /// Returns the geographic midpoint of the box.
    pub fn center(self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Serialized forms accepted for [`GeoBounds`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundsRepr {
    /// `[[min_lon, min_lat], [max_lon, max_lat]]`
    Pairs([[f64; 2]; 2]),
    /// `{ min_lon, min_lat, max_lon, max_lat }`
    Object {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },
}

impl TryFrom<BoundsRepr> for GeoBounds {
    type Error = BoundsError;

    fn try_from(repr: BoundsRepr) -> Result<Self, Self::Error> {
        match repr {
            BoundsRepr::Pairs(pairs) => Self::from_pairs(pairs),
            BoundsRepr::Object {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            } => Self::new(min_lon, min_lat, max_lon, max_lat),
        }
    }
}

impl From<GeoBounds> for BoundsRepr {
    fn from(bounds: GeoBounds) -> Self {
        BoundsRepr::Object {
            min_lon: bounds.min_lon,
            min_lat: bounds.min_lat,
            max_lon: bounds.max_lon,
            max_lat: bounds.max_lat,
        }
    }
}

/// A screen rectangle with ordered minimum and maximum coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl ScreenRect {
    /// Creates the smallest rectangle containing both corners.
    pub fn from_corners(a: ScreenPoint, b: ScreenPoint) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn min_x(self) -> f64 {
        self.min_x
    }

    pub fn min_y(self) -> f64 {
        self.min_y
    }

    pub fn max_x(self) -> f64 {
        self.max_x
    }

    pub fn max_y(self) -> f64 {
        self.max_y
    }

    /// Returns the width of the rectangle
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the rectangle
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns true if `point` lies inside or on the edge of the rectangle.
    pub fn contains(self, point: ScreenPoint) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    /// Returns the smallest rectangle containing `self` and `point`.
    pub fn union_point(self, point: ScreenPoint) -> Self {
        Self {
            min_x: self.min_x.min(point.x),
            min_y: self.min_y.min(point.y),
            max_x: self.max_x.max(point.x),
            max_y: self.max_y.max(point.y),
        }
    }

    /// Corners in clockwise screen order starting at the top-left.
    pub fn corners(self) -> [ScreenPoint; 4] {
        [
            ScreenPoint::new(self.min_x, self.min_y),
            ScreenPoint::new(self.max_x, self.min_y),
            ScreenPoint::new(self.max_x, self.max_y),
            ScreenPoint::new(self.min_x, self.max_y),
        ]
    }
}

/// Two screen corners bounding the region a projection may draw into.
///
/// The corners are kept in the order they were produced; a projection with
/// a flipped axis may yield a "max" corner before the "min" one. Use
/// [`ClipExtent::normalized`] before testing containment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct ClipExtent {
    first: ScreenPoint,
    second: ScreenPoint,
}

impl ClipExtent {
    /// Creates a clip extent from two corners.
    pub fn new(first: ScreenPoint, second: ScreenPoint) -> Self {
        Self { first, second }
    }

    /// Returns the first corner.
    pub fn first(self) -> ScreenPoint {
        self.first
    }

    /// Returns the second corner.
    pub fn second(self) -> ScreenPoint {
        self.second
    }

    /// Returns the ordered rectangle spanned by the two corners.
    pub fn normalized(self) -> ScreenRect {
        ScreenRect::from_corners(self.first, self.second)
    }

    /// Returns the `[[x0, y0], [x1, y1]]` form.
    pub fn to_pairs(self) -> [[f64; 2]; 2] {
        [self.first.into(), self.second.into()]
    }
}

impl From<[[f64; 2]; 2]> for ClipExtent {
    fn from([first, second]: [[f64; 2]; 2]) -> Self {
        Self::new(first.into(), second.into())
    }
}

impl From<ClipExtent> for [[f64; 2]; 2] {
    fn from(extent: ClipExtent) -> Self {
        extent.to_pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_new_rejects_inverted_edges() {
        assert_eq!(
            GeoBounds::new(10.0, 0.0, -10.0, 5.0),
            Err(BoundsError::InvertedLongitude {
                min: 10.0,
                max: -10.0
            })
        );
        assert_eq!(
            GeoBounds::new(0.0, 5.0, 1.0, 4.0),
            Err(BoundsError::InvertedLatitude { min: 5.0, max: 4.0 })
        );
        assert_eq!(
            GeoBounds::new(f64::NAN, 0.0, 1.0, 1.0),
            Err(BoundsError::NotFinite)
        );
    }

    #[test]
    fn test_bounds_degenerate_box_is_valid() {
        let bounds = GeoBounds::new(3.0, 4.0, 3.0, 4.0).unwrap();
        assert!(bounds.contains(GeoPoint::new(3.0, 4.0), 0.0));
    }

    #[test]
    fn test_bounds_contains_edges_and_tolerance() {
        let bounds = GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap();

        assert!(bounds.contains(GeoPoint::new(-5.0, 41.0), 0.0));
        assert!(bounds.contains(GeoPoint::new(10.0, 51.0), 0.0));
        assert!(!bounds.contains(GeoPoint::new(10.005, 47.0), 0.0));
        assert!(bounds.contains(GeoPoint::new(10.005, 47.0), 0.01));
        assert!(!bounds.contains(GeoPoint::new(10.02, 47.0), 0.01));
        assert!(!bounds.contains(GeoPoint::new(2.0, 40.98), 0.01));
    }

    #[test]
    fn test_bounds_pairs_round_trip() {
        let bounds = GeoBounds::new(-62.0, 14.0, -60.0, 15.0).unwrap();
        let pairs = bounds.to_pairs();
        assert_eq!(pairs, [[-62.0, 14.0], [-60.0, 15.0]]);
        assert_eq!(GeoBounds::from_pairs(pairs).unwrap(), bounds);
    }

    #[test]
    fn test_bounds_deserializes_both_forms() {
        #[derive(Deserialize)]
        struct Holder {
            a: GeoBounds,
            b: GeoBounds,
        }

        let holder: Holder = toml::from_str(
            r#"
            a = [[-62.0, 14.0], [-60.0, 15.0]]
            b = { min_lon = -62.0, min_lat = 14.0, max_lon = -60.0, max_lat = 15.0 }
            "#,
        )
        .expect("valid bounds");
        assert_eq!(holder.a, holder.b);
    }

    #[test]
    fn test_bounds_deserialize_rejects_inverted() {
        #[derive(Debug, Deserialize)]
        struct Holder {
            #[allow(dead_code)]
            a: GeoBounds,
        }

        let result: Result<Holder, _> = toml::from_str("a = [[10.0, 0.0], [-10.0, 5.0]]");
        assert!(result.is_err());
    }

    #[test]
    fn test_bounds_overlaps() {
        let a = GeoBounds::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = GeoBounds::new(5.0, 5.0, 15.0, 15.0).unwrap();
        let c = GeoBounds::new(20.0, 20.0, 30.0, 30.0).unwrap();

        assert!(a.overlaps(b));
        assert!(b.overlaps(a));
        assert!(!a.overlaps(c));
    }

    #[test]
    fn test_adjacent_bounds_do_not_overlap() {
        let west = GeoBounds::new(-180.0, -80.0, 0.0, 80.0).unwrap();
        let east = GeoBounds::new(0.0, -80.0, 180.0, 80.0).unwrap();
        let north = GeoBounds::new(-180.0, 80.0, 180.0, 90.0).unwrap();
        let corner = GeoBounds::new(180.0, 80.0, 180.0, 90.0).unwrap();

        assert!(!west.overlaps(east));
        assert!(!east.overlaps(west));
        assert!(!north.overlaps(west));
        assert!(!east.overlaps(corner));
    }

    #[test]
    fn test_bounds_corners_are_inset() {
        let bounds = GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap();
        assert_eq!(bounds.north_west(0.5), GeoPoint::new(-4.5, 50.5));
        assert_eq!(bounds.south_east(0.5), GeoPoint::new(9.5, 41.5));
        assert_eq!(bounds.center(), GeoPoint::new(2.5, 46.0));
    }

    #[test]
    fn test_screen_rect_from_unordered_corners() {
        let rect = ScreenRect::from_corners(ScreenPoint::new(10.0, 2.0), ScreenPoint::new(4.0, 8.0));
        assert_eq!(rect.min_x(), 4.0);
        assert_eq!(rect.min_y(), 2.0);
        assert_eq!(rect.max_x(), 10.0);
        assert_eq!(rect.max_y(), 8.0);
        assert_eq!(rect.width(), 6.0);
        assert_eq!(rect.height(), 6.0);
        assert!(rect.contains(ScreenPoint::new(5.0, 5.0)));
        assert!(!rect.contains(ScreenPoint::new(11.0, 5.0)));
    }

    #[test]
    fn test_clip_extent_normalized() {
        let extent = ClipExtent::new(ScreenPoint::new(500.0, 100.0), ScreenPoint::new(300.0, 400.0));
        let rect = extent.normalized();
        assert_eq!(rect.min_x(), 300.0);
        assert_eq!(rect.max_y(), 400.0);
        assert_eq!(extent.to_pairs(), [[500.0, 100.0], [300.0, 400.0]]);
    }

    #[test]
    fn test_screen_point_arithmetic() {
        let a = ScreenPoint::new(1.0, 2.0);
        let b = ScreenPoint::new(3.0, 6.0);
        assert_eq!(a.add_point(b), ScreenPoint::new(4.0, 8.0));
        assert_eq!(b.sub_point(a), ScreenPoint::new(2.0, 4.0));
        assert_eq!(a.lerp(b, 0.5), ScreenPoint::new(2.0, 4.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn bounds_strategy() -> impl Strategy<Value = GeoBounds> {
        (-180.0f64..170.0, -90.0f64..80.0, 0.0f64..10.0, 0.0f64..10.0).prop_map(
            |(lon, lat, w, h)| {
                GeoBounds::new(lon, lat, lon + w, lat + h).expect("strategy yields ordered bounds")
            },
        )
    }

    fn unit_strategy() -> impl Strategy<Value = (f64, f64)> {
        (0.0f64..=1.0, 0.0f64..=1.0)
    }

    fn tolerance_strategy() -> impl Strategy<Value = f64> {
        0.0f64..0.5
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every point between the edges is contained with zero tolerance.
    fn check_interior_points_contained(bounds: GeoBounds, (u, v): (f64, f64)) -> Result<(), TestCaseError> {
        let lon = (bounds.min_lon() + (bounds.max_lon() - bounds.min_lon()) * u).min(bounds.max_lon());
        let lat = (bounds.min_lat() + (bounds.max_lat() - bounds.min_lat()) * v).min(bounds.max_lat());
        prop_assert!(bounds.contains(GeoPoint::new(lon, lat), 0.0));
        Ok(())
    }

    /// A point just beyond `tolerance` on any side is rejected.
    fn check_points_beyond_tolerance_rejected(bounds: GeoBounds, tolerance: f64) -> Result<(), TestCaseError> {
        let outside = tolerance + 1e-6;
        let center = bounds.center();
        let probes = [
            GeoPoint::new(bounds.min_lon() - outside, center.lat()),
            GeoPoint::new(bounds.max_lon() + outside, center.lat()),
            GeoPoint::new(center.lon(), bounds.min_lat() - outside),
            GeoPoint::new(center.lon(), bounds.max_lat() + outside),
        ];
        for probe in probes {
            prop_assert!(!bounds.contains(probe, tolerance), "{probe} accepted");
        }
        Ok(())
    }

    /// Converting to nested pairs and back yields the same bounds.
    fn check_pairs_round_trip(bounds: GeoBounds) -> Result<(), TestCaseError> {
        let restored = GeoBounds::from_pairs(bounds.to_pairs()).expect("valid pairs");
        prop_assert!(approx_eq!(f64, restored.min_lon(), bounds.min_lon()));
        prop_assert!(approx_eq!(f64, restored.min_lat(), bounds.min_lat()));
        prop_assert!(approx_eq!(f64, restored.max_lon(), bounds.max_lon()));
        prop_assert!(approx_eq!(f64, restored.max_lat(), bounds.max_lat()));
        Ok(())
    }

    /// Converting through the object representation is lossless.
    fn check_object_round_trip(bounds: GeoBounds) -> Result<(), TestCaseError> {
        let repr = BoundsRepr::from(bounds);
        let restored = GeoBounds::try_from(repr).expect("valid repr");
        prop_assert_eq!(restored, bounds);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn interior_points_contained(bounds in bounds_strategy(), uv in unit_strategy()) {
            check_interior_points_contained(bounds, uv)?;
        }

        #[test]
        fn points_beyond_tolerance_rejected(bounds in bounds_strategy(), tolerance in tolerance_strategy()) {
            check_points_beyond_tolerance_rejected(bounds, tolerance)?;
        }

        #[test]
        fn pairs_round_trip(bounds in bounds_strategy()) {
            check_pairs_round_trip(bounds)?;
        }

        #[test]
        fn object_round_trip(bounds in bounds_strategy()) {
            check_object_round_trip(bounds)?;
        }
    }
}
