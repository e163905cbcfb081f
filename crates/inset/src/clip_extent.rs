//! Screen-space clip extents for sub-projections.
//!
//! A territory's clip extent is the rectangle its projection may draw into.
//! It is derived either from the territory's geographic bounds, projected
//! through the already-placed projection, or from pixel offsets around a
//! screen center when the placement is already known in screen space.

use inset_core::{
    geometry::{ClipExtent, GeoBounds, ScreenPoint},
    projection::Projection,
};

/// Default inset, in degrees or pixels, applied to clip extent corners.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Projects the north-west and south-east corners of `bounds`.
///
/// Corners are moved `epsilon` degrees towards the interior so a corner on a
/// projection singularity (a pole, the antimeridian) still projects. The
/// projection must already carry its final scale and translate.
///
/// Returns `None` if either corner cannot be projected. The corners are
/// returned in projection order; call [`ClipExtent::normalized`] for an
/// ordered rectangle.
pub fn from_geo_bounds(projection: &dyn Projection, bounds: GeoBounds, epsilon: f64) -> Option<ClipExtent> {
    let north_west = projection.project(bounds.north_west(epsilon))?;
    let south_east = projection.project(bounds.south_east(epsilon))?;
    Some(ClipExtent::new(north_west, south_east))
}

/// Builds a clip extent from pixel offsets `[x1, y1, x2, y2]` around `center`.
///
/// The first corner is pushed `epsilon` pixels right and down and the second
/// `epsilon` pixels left and up.
///
/// # Examples
///
/// ```
/// # use inset::clip_extent::{from_pixel_offsets, DEFAULT_EPSILON};
/// # use inset_core::geometry::ScreenPoint;
/// let extent = from_pixel_offsets(
///     ScreenPoint::new(400.0, 300.0),
///     [-100.0, -80.0, 100.0, 80.0],
///     DEFAULT_EPSILON,
/// );
/// assert_eq!(extent.first(), ScreenPoint::new(300.0 + 1e-6, 220.0 + 1e-6));
/// ```
pub fn from_pixel_offsets(center: ScreenPoint, [x1, y1, x2, y2]: [f64; 4], epsilon: f64) -> ClipExtent {
    ClipExtent::new(
        ScreenPoint::new(center.x() + x1 + epsilon, center.y() + y1 + epsilon),
        ScreenPoint::new(center.x() + x2 - epsilon, center.y() + y2 - epsilon),
    )
}
