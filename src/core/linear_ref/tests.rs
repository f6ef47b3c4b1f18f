use super::{nearest_point_on_any_of, Degenerate, LinearTrack, TrackShape};
use crate::core::{Entity, EntityId, Geometry, ObjectType, TrackRange, LENGTH_KEY};
use approx::assert_relative_eq;
use glam::DVec2;
use proptest::prelude::*;
use serde_json::{json, Map};

fn linear(points: Vec<DVec2>, declared_length: f64) -> LinearTrack {
    match LinearTrack::resolve(EntityId::from("track"), points, declared_length) {
        TrackShape::Linear(track) => track,
        TrackShape::Degenerate(reason) => panic!("Gleis degeneriert: {reason:?}"),
    }
}

/// L-förmiges Gleis mit G = 97.3 bei deklarierter Länge 100.
fn drifting_track() -> LinearTrack {
    linear(
        vec![DVec2::ZERO, DVec2::new(50.0, 0.0), DVec2::new(50.0, 47.3)],
        100.0,
    )
}

// ── Extremwerte und Reskalierung ──

#[test]
fn test_extremes_map_exactly_to_end_vertices() {
    let track = drifting_track();
    assert_eq!(track.point_at_distance(0.0), DVec2::ZERO);
    assert_eq!(track.point_at_distance(-12.5), DVec2::ZERO);
    assert_eq!(track.point_at_distance(100.0), DVec2::new(50.0, 47.3));
    assert_eq!(track.point_at_distance(140.0), DVec2::new(50.0, 47.3));
}

#[test]
fn test_point_at_distance_rescales_declared_to_geometric() {
    let track = drifting_track();
    assert_relative_eq!(track.geometric_length(), 97.3, epsilon = 1e-9);

    // 40 deklariert → 38.92 geometrisch, liegt auf dem ersten Schenkel
    let p = track.point_at_distance(40.0);
    assert_relative_eq!(p.x, 38.92, epsilon = 1e-9);
    assert_relative_eq!(p.y, 0.0);
}

#[test]
fn test_drift_ratio_uses_unit_scale() {
    let track = drifting_track();
    assert_relative_eq!(track.drift_ratio(1.0), 0.027, epsilon = 1e-9);
    assert_relative_eq!(track.drift_ratio(100.0 / 97.3), 0.0, epsilon = 1e-9);
}

// ── Schnitte ──

#[test]
fn test_full_range_slice_returns_path_unchanged() {
    let track = drifting_track();
    assert_eq!(track.slice_by_declared_range(0.0, 100.0), track.points());
    // Über die Länge hinaus und vertauscht: ebenfalls volle Abdeckung
    assert_eq!(track.slice_by_declared_range(130.0, -1.0), track.points());
}

#[test]
fn test_equal_bounds_slice_is_two_identical_points() {
    let track = drifting_track();
    for x in [0.0, 12.5, 51.4, 77.0, 100.0] {
        let slice = track.slice_by_declared_range(x, x);
        let expected = track.point_at_distance(x);
        assert_eq!(slice, vec![expected, expected], "x = {x}");
    }
}

#[test]
fn test_slice_near_end_with_drift_ends_on_last_vertex() {
    let track = drifting_track();
    let slice = track.slice_by_declared_range(90.0, 100.0);

    assert!(slice.len() >= 2);
    assert_eq!(*slice.last().expect("Endpunkt erwartet"), track.last());
    assert_relative_eq!(slice[0].x, 50.0, epsilon = 1e-9);
    assert_relative_eq!(slice[0].y, 0.9 * 97.3 - 50.0, epsilon = 1e-9);
}

#[test]
fn test_reversed_bounds_are_canonicalized() {
    let track = drifting_track();
    assert_eq!(
        track.slice_by_declared_range(70.0, 20.0),
        track.slice_by_declared_range(20.0, 70.0)
    );
}

#[test]
fn test_slice_crossing_vertex_keeps_it() {
    let track = drifting_track();
    let slice = track.range_geometry(&TrackRange {
        track: EntityId::from("track"),
        begin: 25.0,
        end: 75.0,
        applicable_directions: Default::default(),
    });
    assert_eq!(slice.len(), 3);
    assert_eq!(slice[1], DVec2::new(50.0, 0.0));
}

// ── Inverse Abbildung ──

#[test]
fn test_declared_distance_from_point_inverts_within_tolerance() {
    let track = drifting_track();
    let tolerance = 1e-6 * track.geometric_length();
    for step in 0..=20 {
        let d = step as f64 * 5.0;
        let back = track.declared_distance_from_point(track.point_at_distance(d));
        assert!((back - d).abs() <= tolerance, "d = {d}, zurück = {back}");
    }
}

#[test]
fn test_projection_reports_offset_and_tangent() {
    let track = drifting_track();
    let proj = track.project(DVec2::new(53.0, 20.0));
    assert_relative_eq!(proj.coordinate.x, 50.0);
    assert_relative_eq!(proj.offset, 3.0);
    assert_relative_eq!(proj.tangent_angle, std::f64::consts::FRAC_PI_2);
    assert_relative_eq!(proj.declared_distance, 70.0 / 97.3 * 100.0, epsilon = 1e-9);
}

// ── Degenerierte Gleise ──

#[test]
fn test_degenerate_tracks_resolve_without_error() {
    assert_eq!(
        LinearTrack::resolve("a".into(), vec![DVec2::ONE], 10.0),
        TrackShape::Degenerate(Degenerate::TooFewVertices(1))
    );
    assert_eq!(
        LinearTrack::resolve("a".into(), vec![DVec2::ONE, DVec2::ONE], 10.0),
        TrackShape::Degenerate(Degenerate::ZeroGeometricLength)
    );
    assert!(matches!(
        LinearTrack::resolve("a".into(), vec![DVec2::ZERO, DVec2::ONE], 0.0),
        TrackShape::Degenerate(Degenerate::InvalidDeclaredLength(_))
    ));
}

#[test]
fn test_from_entity_distinguishes_degenerate_and_structural() {
    let mut properties = Map::new();
    properties.insert(LENGTH_KEY.into(), json!(10.0));
    let single = Entity::persisted(
        "t",
        ObjectType::TrackSegment,
        Geometry::LineString(vec![DVec2::ZERO]),
        properties,
    );
    let shape = LinearTrack::from_entity(&single).expect("kein Strukturfehler erwartet");
    assert!(shape.as_linear().is_none());

    let without_length = Entity::persisted(
        "t",
        ObjectType::TrackSegment,
        Geometry::LineString(vec![DVec2::ZERO, DVec2::X]),
        Map::new(),
    );
    assert!(LinearTrack::from_entity(&without_length).is_err());
}

#[test]
fn test_snapping_on_track_entities() {
    let mut properties = Map::new();
    properties.insert(LENGTH_KEY.into(), json!(100.0));
    let tracks = vec![Entity::persisted(
        "t",
        ObjectType::TrackSegment,
        Geometry::LineString(vec![DVec2::ZERO, DVec2::new(0.0, 100.0)]),
        properties,
    )];
    let hit = nearest_point_on_any_of(&tracks, DVec2::new(-4.0, 30.0)).expect("Treffer");
    assert_relative_eq!(hit.coordinate.y, 30.0);
    assert_relative_eq!(hit.distance, 4.0);
}

// ── Eigenschaften ──

/// Polyline mit streng wachsendem x (keine Selbstüberschneidung).
fn monotone_polyline() -> impl Strategy<Value = Vec<DVec2>> {
    prop::collection::vec((0.5..20.0f64, -10.0..10.0f64), 1..12).prop_map(|steps| {
        let mut x = 0.0;
        let mut points = vec![DVec2::ZERO];
        for (dx, y) in steps {
            x += dx;
            points.push(DVec2::new(x, y));
        }
        points
    })
}

proptest! {
    #[test]
    fn prop_point_at_distance_is_monotonic(
        points in monotone_polyline(),
        declared_length in 1.0..500.0f64,
        a in 0.0..1.0f64,
        b in 0.0..1.0f64,
    ) {
        let track = linear(points, declared_length);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = track.point_at_distance(lo * declared_length);
        let p_hi = track.point_at_distance(hi * declared_length);
        prop_assert!(p_lo.x <= p_hi.x + 1e-9, "{p_lo:?} liegt hinter {p_hi:?}");
    }

    #[test]
    fn prop_slices_are_valid_paths(
        points in monotone_polyline(),
        declared_length in 1.0..500.0f64,
        a in -0.2..1.2f64,
        b in -0.2..1.2f64,
    ) {
        let track = linear(points, declared_length);
        let slice = track.slice_by_declared_range(a * declared_length, b * declared_length);
        prop_assert!(slice.len() >= 2);
        prop_assert!(slice.iter().all(|p| p.is_finite()));
        if a.max(b) >= 1.0 {
            prop_assert_eq!(slice[slice.len() - 1], track.last());
        }
        if a.min(b) <= 0.0 {
            prop_assert_eq!(slice[0], track.first());
        }
    }
}
