//! Snapping eines Cursors auf die nächste Stelle einer Kandidaten-Menge.

use glam::DVec2;

use super::polyline;
use crate::core::{Entity, Geometry};

/// Global nächster Punkt über alle Kandidaten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint<'a> {
    /// Getroffenes Feature
    pub feature: &'a Entity,
    /// Index des Features in der Kandidatenliste
    pub candidate_index: usize,
    /// Nächster Punkt auf dem Feature
    pub coordinate: DVec2,
    /// Richtungswinkel an dieser Stelle (Radiant, 0 für Punkte)
    pub tangent_angle: f64,
    /// Abstand Cursor → `coordinate`
    pub distance: f64,
}

/// Sucht den global nächsten Punkt zu `cursor` auf einem der Kandidaten.
///
/// Linien und Multi-Linien werden projiziert, Punkte direkt verglichen, Features
/// ohne Geometrie übersprungen. Bei Gleichstand gewinnt der frühere Kandidat.
pub fn nearest_point_on_any_of(candidates: &[Entity], cursor: DVec2) -> Option<NearestPoint<'_>> {
    let mut best: Option<NearestPoint<'_>> = None;

    for (candidate_index, feature) in candidates.iter().enumerate() {
        let hit = match &feature.geometry {
            Geometry::Null => None,
            Geometry::Point(p) => Some((*p, 0.0)),
            geometry => geometry
                .lines()
                .into_iter()
                .filter(|line| !line.is_empty())
                .map(|line| polyline::project(line, cursor))
                .min_by(|a, b| a.offset.total_cmp(&b.offset))
                .map(|proj| (proj.point, proj.tangent_angle)),
        };

        let Some((coordinate, tangent_angle)) = hit else {
            continue;
        };
        let distance = coordinate.distance(cursor);
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(NearestPoint {
                feature,
                candidate_index,
                coordinate,
                tangent_angle,
                distance,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectType;
    use approx::assert_relative_eq;
    use serde_json::Map;
    use std::f64::consts::FRAC_PI_2;

    fn line(id: &str, points: Vec<DVec2>) -> Entity {
        Entity::persisted(
            id,
            ObjectType::TrackSegment,
            Geometry::LineString(points),
            Map::new(),
        )
    }

    #[test]
    fn picks_globally_nearest_candidate() {
        let candidates = vec![
            line("a", vec![DVec2::new(0.0, 10.0), DVec2::new(10.0, 10.0)]),
            line("b", vec![DVec2::new(5.0, -5.0), DVec2::new(5.0, 5.0)]),
        ];
        let hit = nearest_point_on_any_of(&candidates, DVec2::new(6.0, 1.0)).expect("Treffer");
        assert_eq!(hit.candidate_index, 1);
        assert_eq!(hit.feature.id.as_str(), "b");
        assert_relative_eq!(hit.coordinate.x, 5.0);
        assert_relative_eq!(hit.coordinate.y, 1.0);
        assert_relative_eq!(hit.tangent_angle, FRAC_PI_2);
        assert_relative_eq!(hit.distance, 1.0);
    }

    #[test]
    fn skips_features_without_geometry() {
        let empty = Entity::new(ObjectType::TrackSegment, Map::new());
        assert!(nearest_point_on_any_of(std::slice::from_ref(&empty), DVec2::ZERO).is_none());
        assert!(nearest_point_on_any_of(&[], DVec2::ZERO).is_none());
    }

    #[test]
    fn points_and_multilines_are_candidates() {
        let mut signal = Entity::new(ObjectType::Signal, Map::new());
        signal.geometry = Geometry::Point(DVec2::new(2.0, 2.0));
        let mut range = Entity::new(ObjectType::Electrification, Map::new());
        range.geometry = Geometry::MultiLineString(vec![
            vec![DVec2::new(20.0, 0.0), DVec2::new(30.0, 0.0)],
            vec![DVec2::new(0.0, -1.0), DVec2::new(10.0, -1.0)],
        ]);

        let candidates = vec![signal, range];
        let hit = nearest_point_on_any_of(&candidates, DVec2::new(3.0, 0.0)).expect("Treffer");
        assert_eq!(hit.candidate_index, 1);
        assert_relative_eq!(hit.coordinate.y, -1.0);

        let hit = nearest_point_on_any_of(&candidates, DVec2::new(2.0, 1.8)).expect("Treffer");
        assert_eq!(hit.candidate_index, 0);
        assert_eq!(hit.tangent_angle, 0.0);
    }
}
