//! Integration tests for the composite projection API
//!
//! These tests drive a two-territory map through the public API: routing,
//! inverse lookups, stream fan-out, interactive edits and export.

use std::{cell::RefCell, rc::Rc};

use float_cmp::approx_eq;
use proptest::prelude::*;

use inset::{
    CompositeMapBuilder, InsetError,
    composite::{CompositeProjection, CompositeProjectionBuilder, CompositeProjectionConfig, SubProjectionEntry},
    config::{EngineConfig, TerritoryConfig, ValidationPolicy},
    geometry::{GeoBounds, GeoPoint, ScreenPoint},
    identifier::Id,
    projection::{ConfiguredProjection, FamilyKind, Projection, ProjectionFamily},
    stream::{GeometrySink, RecordingSink, StreamEvent},
    territory::TerritoryProjectionSet,
};

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 500.0;

fn mainland_bounds() -> GeoBounds {
    GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap()
}

fn remote_bounds() -> GeoBounds {
    GeoBounds::new(-62.0, 14.0, -60.0, 15.0).unwrap()
}

fn territories() -> Vec<TerritoryConfig> {
    vec![
        TerritoryConfig::new("mainland", GeoPoint::new(2.5, 46.0)).with_bounds(mainland_bounds()),
        TerritoryConfig::new("remote", GeoPoint::new(-61.0, 14.5))
            .with_bounds(remote_bounds())
            .with_translate_offset([-420.0, 200.0]),
    ]
}

fn territory_set() -> TerritoryProjectionSet {
    TerritoryProjectionSet::initialize(&territories(), 2700.0).unwrap()
}

#[test]
fn test_points_route_to_their_territory() {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();

    let (id, _) = composite.project_with_entry(GeoPoint::new(2.0, 47.0)).unwrap();
    assert_eq!(id, "mainland");

    let (id, screen) = composite.project_with_entry(GeoPoint::new(-61.0, 14.5)).unwrap();
    assert_eq!(id, "remote");
    assert!(approx_eq!(f64, screen.x(), 60.0, epsilon = 1e-6));
    assert!(approx_eq!(f64, screen.y(), 450.0, epsilon = 1e-6));

    assert_eq!(composite.project(GeoPoint::new(100.0, 0.0)), None);
}

#[test]
fn test_invert_resolves_territory() {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();

    let hit = composite.invert_with_entry(ScreenPoint::new(60.0, 450.0)).unwrap();
    assert_eq!(hit.entry_id(), "remote");
    assert!(approx_eq!(f64, hit.point().lon(), -61.0, epsilon = 1e-6));
    assert!(approx_eq!(f64, hit.point().lat(), 14.5, epsilon = 1e-6));

    assert!(composite.invert(ScreenPoint::new(950.0, 20.0)).is_err());
}

#[test]
fn test_stream_fans_out_through_every_territory() {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();

    let output = Rc::new(RefCell::new(RecordingSink::with_sphere()));
    let mut stream = composite.stream(Box::new(Rc::clone(&output)));

    // Each point lands inside exactly one territory's clip extent.
    stream.point(2.0, 47.0);
    stream.point(-61.0, 14.5);
    assert_eq!(output.borrow().points().len(), 2);

    output.borrow_mut().clear();
    stream.sphere();
    let polygons = output
        .borrow()
        .events()
        .iter()
        .filter(|event| **event == StreamEvent::PolygonStart)
        .count();
    assert_eq!(polygons, 2);
}

#[test]
fn test_rejecting_overlapping_territories() {
    let mut overlapping = territories();
    overlapping.push(TerritoryConfig::new("overlap", GeoPoint::new(0.0, 45.0)).with_bounds(mainland_bounds()));

    let mut set = TerritoryProjectionSet::initialize(&overlapping, 2700.0)
        .unwrap()
        .with_engine(EngineConfig::default().with_validation(ValidationPolicy::Reject));
    let err = set.build(WIDTH, HEIGHT, false).unwrap_err();
    assert!(matches!(err, InsetError::AmbiguousConfiguration(_)));
}

#[test]
fn test_edits_rebuild_composite() {
    let mut set = territory_set();
    let remote = Id::new("remote");
    set.build(WIDTH, HEIGHT, false).unwrap();

    set.set_translation_offset(remote, [-300.0, 100.0]).unwrap();
    set.set_scale_multiplier(remote, 2.0).unwrap();
    set.change_projection_family(remote, FamilyKind::AzimuthalEqualArea)
        .unwrap();

    let composite = set.build(WIDTH, HEIGHT, false).unwrap();
    let (id, screen) = composite.project_with_entry(GeoPoint::new(-61.0, 14.5)).unwrap();
    assert_eq!(id, "remote");
    assert!(approx_eq!(f64, screen.x(), 180.0, epsilon = 1e-6));
    assert!(approx_eq!(f64, screen.y(), 350.0, epsilon = 1e-6));
    assert_eq!(composite.entry(remote).unwrap().projection().scale(), 5400.0);
}

#[test]
fn test_export_and_restore_through_builder() {
    let builder = CompositeMapBuilder::default();
    let mut set = territory_set();
    set.set_scale_multiplier(Id::new("remote"), 1.25).unwrap();

    let text = set.export_config().to_toml().unwrap();
    let mut restored = builder.restore(&text).unwrap();
    assert_eq!(restored.export_config(), set.export_config());

    let original = set.build(WIDTH, HEIGHT, false).unwrap().project(GeoPoint::new(-60.5, 14.2));
    let again = restored.build(WIDTH, HEIGHT, false).unwrap().project(GeoPoint::new(-60.5, 14.2));
    assert_eq!(original, again);
}

/// Four quadrants meeting at the equator and the prime meridian.
const QUADRANTS: [(&str, [f64; 4]); 4] = [
    ("north_west", [-180.0, 0.0, 0.0, 90.0]),
    ("north_east", [0.0, 0.0, 180.0, 90.0]),
    ("south_west", [-180.0, -90.0, 0.0, 0.0]),
    ("south_east", [0.0, -90.0, 180.0, 0.0]),
];

fn quadrant_bounds([min_lon, min_lat, max_lon, max_lat]: [f64; 4]) -> GeoBounds {
    GeoBounds::new(min_lon, min_lat, max_lon, max_lat).unwrap()
}

/// Builds a composite whose entries cover the globe without gaps, rejecting
/// any ambiguity finding.
fn partitioned_composite() -> CompositeProjection {
    let entries = QUADRANTS
        .iter()
        .enumerate()
        .map(|(index, (id, bounds))| {
            let projection = ConfiguredProjection::new(ProjectionFamily::Equirectangular)
                .with_scale(100.0)
                .with_translate(ScreenPoint::new(400.0 + 1000.0 * index as f64, 300.0));
            SubProjectionEntry::new(*id, *id, Rc::new(projection)).with_bounds(quadrant_bounds(*bounds))
        })
        .collect();
    CompositeProjectionBuilder::new(
        CompositeProjectionConfig::new(entries).with_validation(ValidationPolicy::Reject),
    )
    .build()
    .unwrap()
}

#[test]
fn test_shared_edges_route_to_first_declared() {
    let composite = partitioned_composite();
    let cases = [
        (GeoPoint::new(0.0, 45.0), "north_west"),
        (GeoPoint::new(90.0, 0.0), "north_east"),
        (GeoPoint::new(0.0, -45.0), "south_west"),
        (GeoPoint::new(0.0, 0.0), "north_west"),
        (GeoPoint::new(180.0, -90.0), "south_east"),
    ];
    for (point, expected) in cases {
        let (id, _) = composite.project_with_entry(point).unwrap();
        assert_eq!(id, expected, "{point}");
    }
}

// ===================
// Strategies
// ===================

/// Any point on the globe, with extra weight on the shared edges.
fn globe_point() -> impl Strategy<Value = GeoPoint> {
    let lon = prop_oneof![
        3 => -180.0f64..=180.0,
        1 => prop::sample::select(vec![-180.0, 0.0, 180.0]),
    ];
    let lat = prop_oneof![
        3 => -90.0f64..=90.0,
        1 => prop::sample::select(vec![-90.0, 0.0, 90.0]),
    ];
    (lon, lat).prop_map(|(lon, lat)| GeoPoint::new(lon, lat))
}

fn point_in(bounds: GeoBounds, margin: f64) -> impl Strategy<Value = GeoPoint> {
    (
        bounds.min_lon() + margin..bounds.max_lon() - margin,
        bounds.min_lat() + margin..bounds.max_lat() - margin,
    )
        .prop_map(|(lon, lat)| GeoPoint::new(lon, lat))
}

// ===================
// Property Test Functions
// ===================

/// A point inside a territory's bounds is routed to that territory.
fn check_routing_is_total(point: GeoPoint, expected: &str) -> Result<(), TestCaseError> {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();
    let routed = composite.project_with_entry(point);
    prop_assert!(routed.is_some(), "{point} was not routed");
    let (id, _) = routed.unwrap();
    prop_assert_eq!(id, Id::new(expected));
    Ok(())
}

/// With gapless coverage every point is routed, to the first entry whose
/// bounds contain it.
fn check_partition_routes_every_point(point: GeoPoint) -> Result<(), TestCaseError> {
    let composite = partitioned_composite();
    let expected = QUADRANTS
        .iter()
        .find(|(_, bounds)| quadrant_bounds(*bounds).contains(point, 0.0))
        .map(|(id, _)| Id::new(id));
    prop_assert!(expected.is_some(), "{point} is outside every quadrant");

    let routed = composite.project_with_entry(point);
    prop_assert!(routed.is_some(), "{point} was not routed");
    let (id, _) = routed.unwrap();
    prop_assert_eq!(Some(id), expected);
    Ok(())
}

/// Routing the same point twice gives the same territory and pixel.
fn check_routing_is_deterministic(point: GeoPoint) -> Result<(), TestCaseError> {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();
    prop_assert_eq!(composite.project_with_entry(point), composite.project_with_entry(point));
    Ok(())
}

/// Inverting a projected point lands back on the point, in the same territory.
fn check_invert_matches_forward(point: GeoPoint) -> Result<(), TestCaseError> {
    let mut set = territory_set();
    let composite = set.build(WIDTH, HEIGHT, false).unwrap();
    let (id, screen) = composite.project_with_entry(point).unwrap();
    let hit = composite.invert_with_entry(screen);
    prop_assert!(hit.is_some(), "{screen:?} did not invert");
    let hit = hit.unwrap();
    prop_assert_eq!(hit.entry_id(), id);
    prop_assert!(approx_eq!(f64, hit.point().lon(), point.lon(), epsilon = 1e-6));
    prop_assert!(approx_eq!(f64, hit.point().lat(), point.lat(), epsilon = 1e-6));
    Ok(())
}

/// Repeating an edit and rebuilding yields the same projection every time.
fn check_edits_do_not_accumulate(multiplier: f64, dx: f64, dy: f64, repeats: usize) -> Result<(), TestCaseError> {
    let mut set = territory_set();
    let remote = Id::new("remote");
    for _ in 0..repeats {
        set.set_scale_multiplier(remote, multiplier).unwrap();
        set.set_translation_offset(remote, [dx, dy]).unwrap();
        set.build(WIDTH, HEIGHT, true).unwrap();
    }
    let projection = set.projection(remote).unwrap();
    prop_assert!(approx_eq!(f64, projection.scale(), 2700.0 * multiplier, ulps = 2));
    prop_assert_eq!(
        projection.translate(),
        ScreenPoint::new(WIDTH / 2.0 + dx, HEIGHT / 2.0 + dy)
    );
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn routing_is_total_in_mainland(point in point_in(mainland_bounds(), 0.01)) {
        check_routing_is_total(point, "mainland")?;
    }

    #[test]
    fn routing_is_total_in_remote(point in point_in(remote_bounds(), 0.01)) {
        check_routing_is_total(point, "remote")?;
    }

    #[test]
    fn partition_routes_every_point(point in globe_point()) {
        check_partition_routes_every_point(point)?;
    }

    #[test]
    fn routing_is_deterministic(lon in -180.0f64..180.0, lat in -90.0f64..90.0) {
        check_routing_is_deterministic(GeoPoint::new(lon, lat))?;
    }

    #[test]
    fn invert_matches_forward_in_mainland(point in point_in(mainland_bounds(), 0.05)) {
        check_invert_matches_forward(point)?;
    }

    #[test]
    fn invert_matches_forward_in_remote(point in point_in(remote_bounds(), 0.05)) {
        check_invert_matches_forward(point)?;
    }

    #[test]
    fn edits_do_not_accumulate(
        multiplier in 0.25f64..4.0,
        dx in -400.0f64..400.0,
        dy in -200.0f64..200.0,
        repeats in 1usize..5,
    ) {
        check_edits_do_not_accumulate(multiplier, dx, dy, repeats)?;
    }
}
