//! Picking-Hilfen für Stützpunkte und Gleise in Cursornähe.

use glam::DVec2;

use crate::core::{nearest_point_on_any_of, Entity, EntityId, ObjectType};

/// Index des nächsten Punkts innerhalb `radius`.
pub fn nearest_vertex_within(points: &[DVec2], pos: DVec2, radius: f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(pos)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Einrast-Kandidat auf einem Gleis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnap {
    /// Gleis-ID
    pub track: EntityId,
    /// Nächster Punkt auf dem Gleis
    pub coordinate: DVec2,
    /// Richtungswinkel des Gleises an dieser Stelle (Radiant)
    pub tangent_angle: f64,
    /// Abstand Cursor → `coordinate`
    pub distance: f64,
}

/// Nächstes Gleis unter den vom Host gelieferten Features, höchstens `radius` entfernt.
///
/// Nur `TrackSegment`s zählen; bei Gleichstand gewinnt das frühere Feature.
pub fn nearest_track_among(nearby: &[Entity], pos: DVec2, radius: f64) -> Option<TrackSnap> {
    let mut best: Option<TrackSnap> = None;
    for feature in nearby
        .iter()
        .filter(|e| e.object_type == ObjectType::TrackSegment)
    {
        let Some(hit) = nearest_point_on_any_of(std::slice::from_ref(feature), pos) else {
            continue;
        };
        if hit.distance > radius {
            continue;
        }
        if best.as_ref().map_or(true, |b| hit.distance < b.distance) {
            best = Some(TrackSnap {
                track: feature.id.clone(),
                coordinate: hit.coordinate,
                tangent_angle: hit.tangent_angle,
                distance: hit.distance,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tools::testing::straight_track;
    use crate::core::Geometry;
    use approx::assert_relative_eq;
    use serde_json::Map;

    #[test]
    fn nearest_vertex_respects_radius() {
        let points = [DVec2::ZERO, DVec2::new(10.0, 0.0), DVec2::new(11.0, 0.0)];
        assert_eq!(nearest_vertex_within(&points, DVec2::new(10.8, 0.2), 1.0), Some(2));
        assert_eq!(nearest_vertex_within(&points, DVec2::new(5.0, 0.0), 1.0), None);
    }

    #[test]
    fn nearest_track_ignores_other_object_types() {
        let signal = Entity::persisted(
            "s",
            ObjectType::Signal,
            Geometry::Point(DVec2::new(3.0, 0.1)),
            Map::new(),
        );
        let mut upper = straight_track("upper", 10.0);
        upper.geometry = Geometry::LineString(vec![DVec2::new(0.0, 4.0), DVec2::new(10.0, 4.0)]);
        let nearby = vec![signal, upper, straight_track("lower", 10.0)];

        let snap = nearest_track_among(&nearby, DVec2::new(3.0, 1.0), 5.0).expect("Treffer");
        assert_eq!(snap.track.as_str(), "lower");
        assert_relative_eq!(snap.coordinate.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(snap.coordinate.y, 0.0, epsilon = 1e-9);

        assert!(nearest_track_among(&nearby, DVec2::new(3.0, 20.0), 5.0).is_none());
    }
}
