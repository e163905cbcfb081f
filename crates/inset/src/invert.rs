//! Inverse projection across sub-projections.
//!
//! A screen point may invert to a plausible coordinate through several
//! sub-projections, since every projection covers the whole plane. The
//! resolver keeps the first candidate that lands inside the bounds its
//! sub-projection is declared for.

use std::panic::{self, AssertUnwindSafe};

use log::debug;

use inset_core::{
    geometry::{GeoPoint, ScreenPoint},
    identifier::Id,
};

use crate::composite::SubProjectionEntry;

/// Default bounds tolerance, in degrees, for inverted points.
///
/// Wider than forward routing's zero tolerance to absorb the numerical error
/// of inverse projection near shared edges.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// A successfully inverted point and the entry that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvertHit {
    point: GeoPoint,
    entry_id: Id,
}

impl InvertHit {
    pub fn point(&self) -> GeoPoint {
        self.point
    }

    pub fn entry_id(&self) -> Id {
        self.entry_id
    }
}

/// Resolves screen points back to geographic coordinates.
#[derive(Debug, Clone, Copy)]
pub struct InvertResolver<'a> {
    entries: &'a [SubProjectionEntry],
    tolerance: f64,
}

impl<'a> InvertResolver<'a> {
    pub fn new(entries: &'a [SubProjectionEntry], tolerance: f64) -> Self {
        Self { entries, tolerance }
    }

    /// Inverts `point` through each entry in declaration order.
    ///
    /// Entries without invert support are skipped. A bounded entry's result
    /// is accepted only inside its bounds widened by the tolerance; an
    /// unbounded entry's result is accepted as is. Errors and panics raised
    /// by a sub-projection count as a miss for that entry alone.
    pub fn resolve(&self, point: ScreenPoint) -> Option<InvertHit> {
        self.entries.iter().find_map(|entry| self.try_entry(entry, point))
    }

    fn try_entry(&self, entry: &SubProjectionEntry, point: ScreenPoint) -> Option<InvertHit> {
        let projection = entry.projection();
        if !projection.supports_invert() {
            return None;
        }

        let candidate = match panic::catch_unwind(AssertUnwindSafe(|| projection.invert(point))) {
            Ok(Ok(candidate)) => candidate,
            Ok(Err(err)) => {
                debug!(entry_id:% = entry.id(), err:% = err; "Sub-projection failed to invert");
                return None;
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                debug!(entry_id:% = entry.id(), message; "Sub-projection panicked while inverting");
                return None;
            }
        };

        if !candidate.is_finite() {
            return None;
        }

        match entry.bounds() {
            Some(bounds) if !bounds.contains(candidate, self.tolerance) => None,
            _ => Some(InvertHit {
                point: candidate,
                entry_id: entry.id(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use inset_core::{
        geometry::GeoBounds,
        projection::{ConfiguredProjection, Projection, ProjectionError, ProjectionFamily, Rotation},
        stream::GeometrySink,
    };

    use super::*;

    /// Inverts every screen point to the same coordinate.
    #[derive(Debug)]
    struct Fixed(GeoPoint);

    impl Projection for Fixed {
        fn project(&self, _point: GeoPoint) -> Option<ScreenPoint> {
            None
        }

        fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink> {
            output
        }

        fn scale(&self) -> f64 {
            1.0
        }

        fn set_scale(&mut self, _scale: f64) {}

        fn translate(&self) -> ScreenPoint {
            ScreenPoint::default()
        }

        fn set_translate(&mut self, _translate: ScreenPoint) {}

        fn supports_invert(&self) -> bool {
            true
        }

        fn invert(&self, _point: ScreenPoint) -> Result<GeoPoint, ProjectionError> {
            Ok(self.0)
        }
    }

    /// Panics whenever it is asked to invert.
    #[derive(Debug)]
    struct Panicking;

    impl Projection for Panicking {
        fn project(&self, _point: GeoPoint) -> Option<ScreenPoint> {
            None
        }

        fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink> {
            output
        }

        fn scale(&self) -> f64 {
            1.0
        }

        fn set_scale(&mut self, _scale: f64) {}

        fn translate(&self) -> ScreenPoint {
            ScreenPoint::default()
        }

        fn set_translate(&mut self, _translate: ScreenPoint) {}

        fn supports_invert(&self) -> bool {
            true
        }

        fn invert(&self, _point: ScreenPoint) -> Result<GeoPoint, ProjectionError> {
            panic!("invert exploded");
        }
    }

    /// Has no invert capability at all.
    #[derive(Debug)]
    struct ForwardOnly;

    impl Projection for ForwardOnly {
        fn project(&self, _point: GeoPoint) -> Option<ScreenPoint> {
            None
        }

        fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink> {
            output
        }

        fn scale(&self) -> f64 {
            1.0
        }

        fn set_scale(&mut self, _scale: f64) {}

        fn translate(&self) -> ScreenPoint {
            ScreenPoint::default()
        }

        fn set_translate(&mut self, _translate: ScreenPoint) {}
    }

    fn entry(id: &str, projection: impl Projection + 'static, bounds: Option<GeoBounds>) -> SubProjectionEntry {
        let entry = SubProjectionEntry::new(id, id, Rc::new(projection));
        match bounds {
            Some(bounds) => entry.with_bounds(bounds),
            None => entry,
        }
    }

    fn unit_box() -> GeoBounds {
        GeoBounds::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_first_validated_entry_wins() {
        let entries = vec![
            entry("outside", Fixed(GeoPoint::new(5.0, 5.0)), Some(unit_box())),
            entry("inside", Fixed(GeoPoint::new(0.5, 0.5)), Some(unit_box())),
            entry("also_inside", Fixed(GeoPoint::new(0.6, 0.6)), Some(unit_box())),
        ];
        let hit = InvertResolver::new(&entries, DEFAULT_TOLERANCE)
            .resolve(ScreenPoint::default())
            .expect("second entry validates");
        assert_eq!(hit.entry_id(), "inside");
        assert_eq!(hit.point(), GeoPoint::new(0.5, 0.5));
    }

    #[test]
    fn test_tolerance_widens_bounds() {
        let entries = vec![entry("edge", Fixed(GeoPoint::new(1.005, 0.5)), Some(unit_box()))];
        assert!(InvertResolver::new(&entries, DEFAULT_TOLERANCE)
            .resolve(ScreenPoint::default())
            .is_some());
        assert!(InvertResolver::new(&entries, 0.0)
            .resolve(ScreenPoint::default())
            .is_none());
    }

    #[test]
    fn test_unbounded_entry_accepts_anything() {
        let entries = vec![
            entry("bounded", Fixed(GeoPoint::new(50.0, 50.0)), Some(unit_box())),
            entry("catch_all", Fixed(GeoPoint::new(50.0, 50.0)), None),
        ];
        let hit = InvertResolver::new(&entries, DEFAULT_TOLERANCE)
            .resolve(ScreenPoint::default())
            .unwrap();
        assert_eq!(hit.entry_id(), "catch_all");
    }

    #[test]
    fn test_non_finite_results_are_skipped() {
        let entries = vec![entry("nan", Fixed(GeoPoint::new(f64::NAN, 0.0)), None)];
        assert!(InvertResolver::new(&entries, DEFAULT_TOLERANCE)
            .resolve(ScreenPoint::default())
            .is_none());
    }

    #[test]
    fn test_panicking_entry_is_a_local_miss() {
        let entries = vec![
            entry("broken", Panicking, None),
            entry("no_invert", ForwardOnly, None),
            entry("healthy", Fixed(GeoPoint::new(0.5, 0.5)), Some(unit_box())),
        ];
        let hit = InvertResolver::new(&entries, DEFAULT_TOLERANCE)
            .resolve(ScreenPoint::default())
            .expect("healthy entry still resolves");
        assert_eq!(hit.entry_id(), "healthy");
    }

    #[test]
    fn test_no_match_is_none() {
        let entries = vec![entry("outside", Fixed(GeoPoint::new(5.0, 5.0)), Some(unit_box()))];
        assert_eq!(InvertResolver::new(&entries, DEFAULT_TOLERANCE).resolve(ScreenPoint::default()), None);
    }

    #[test]
    fn test_out_of_domain_error_is_a_miss() {
        let projection = ConfiguredProjection::new(ProjectionFamily::AzimuthalEqualArea)
            .with_rotation(Rotation::new(0.0, 0.0, 0.0))
            .unwrap()
            .with_scale(1.0);
        let entries = vec![entry("azimuthal", projection, None)];
        let far = ScreenPoint::new(480.0 + 10.0, 250.0);
        assert!(InvertResolver::new(&entries, DEFAULT_TOLERANCE).resolve(far).is_none());
    }
}
