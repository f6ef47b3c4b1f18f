//! Spatial-Index (KD-Tree) über Gleis-Endpunkten für das Weichen-Snapping.

use glam::DVec2;
use kiddo::{KdTree, SquaredEuclidean};
use serde::{Deserialize, Serialize};

use crate::core::{Entity, EntityId, Geometry, ObjectType};

/// Welches Ende eines Gleises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEndpoint {
    /// Erster Stützpunkt
    Begin,
    /// Letzter Stützpunkt
    End,
}

/// Ergebnis einer Distanzabfrage gegen den Endpunkt-Index.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointMatch {
    /// Gleis, zu dem der Endpunkt gehört
    pub track: EntityId,
    /// Welches Ende
    pub endpoint: TrackEndpoint,
    /// Position des Endpunkts
    pub position: DVec2,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct IndexedEndpoint {
    track: EntityId,
    endpoint: TrackEndpoint,
    position: DVec2,
}

/// Read-only Index über Anfangs- und Endpunkte einer Menge von Gleisen.
#[derive(Debug, Clone)]
pub struct EndpointIndex {
    tree: KdTree<f64, 2>,
    endpoints: Vec<IndexedEndpoint>,
}

impl EndpointIndex {
    /// Erstellt einen leeren Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            endpoints: Vec::new(),
        }
    }

    /// Baut den Index aus Gleis-Entities.
    ///
    /// Nur `TrackSegment`s mit LineString-Geometrie tragen Endpunkte bei.
    pub fn from_tracks(tracks: &[Entity]) -> Self {
        let mut endpoints = Vec::with_capacity(tracks.len() * 2);
        for track in tracks {
            if track.object_type != ObjectType::TrackSegment {
                continue;
            }
            let Geometry::LineString(points) = &track.geometry else {
                continue;
            };
            let (Some(first), Some(last)) = (points.first(), points.last()) else {
                continue;
            };
            endpoints.push(IndexedEndpoint {
                track: track.id.clone(),
                endpoint: TrackEndpoint::Begin,
                position: *first,
            });
            endpoints.push(IndexedEndpoint {
                track: track.id.clone(),
                endpoint: TrackEndpoint::End,
                position: *last,
            });
        }

        let entries: Vec<[f64; 2]> = endpoints
            .iter()
            .map(|e| [e.position.x, e.position.y])
            .collect();
        let tree: KdTree<f64, 2> = (&entries).into();

        Self { tree, endpoints }
    }

    /// Anzahl indexierter Endpunkte.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// `true` wenn keine Endpunkte im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    fn to_match(&self, item: u64, squared_distance: f64) -> Option<EndpointMatch> {
        let entry = self.endpoints.get(item as usize)?;
        Some(EndpointMatch {
            track: entry.track.clone(),
            endpoint: entry.endpoint,
            position: entry.position,
            distance: squared_distance.sqrt(),
        })
    }

    /// Findet den nächsten Endpunkt zur gegebenen Position.
    pub fn nearest(&self, query: DVec2) -> Option<EndpointMatch> {
        if self.is_empty() {
            return None;
        }
        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y]);
        self.to_match(result.item, result.distance)
    }

    /// Alle Endpunkte innerhalb `radius`, aufsteigend nach Distanz sortiert.
    pub fn within_radius(&self, query: DVec2, radius: f64) -> Vec<EndpointMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .tree
            .within::<SquaredEuclidean>(&[query.x, query.y], radius * radius)
            .into_iter()
            .filter_map(|entry| self.to_match(entry.item, entry.distance))
            .collect::<Vec<_>>();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }

    /// Nächster Endpunkt, aber nur wenn er höchstens `radius` entfernt ist.
    pub fn nearest_within(&self, query: DVec2, radius: f64) -> Option<EndpointMatch> {
        self.nearest(query).filter(|m| m.distance <= radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn track(id: &str, points: Vec<DVec2>) -> Entity {
        Entity::persisted(
            id,
            ObjectType::TrackSegment,
            Geometry::LineString(points),
            Map::new(),
        )
    }

    fn sample_tracks() -> Vec<Entity> {
        vec![
            track("a", vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)]),
            track(
                "b",
                vec![DVec2::new(10.5, 0.0), DVec2::new(15.0, 5.0), DVec2::new(20.0, 5.0)],
            ),
        ]
    }

    #[test]
    fn nearest_returns_expected_endpoint() {
        let index = EndpointIndex::from_tracks(&sample_tracks());
        assert_eq!(index.len(), 4);

        let nearest = index
            .nearest(DVec2::new(19.0, 5.5))
            .expect("Treffer erwartet");
        assert_eq!(nearest.track.as_str(), "b");
        assert_eq!(nearest.endpoint, TrackEndpoint::End);
        assert!(nearest.distance < 1.2);
    }

    #[test]
    fn radius_query_returns_sorted_matches() {
        let index = EndpointIndex::from_tracks(&sample_tracks());
        let matches = index.within_radius(DVec2::new(10.1, 0.0), 1.0);

        let hits: Vec<(&str, TrackEndpoint)> = matches
            .iter()
            .map(|m| (m.track.as_str(), m.endpoint))
            .collect();
        assert_eq!(
            hits,
            vec![("a", TrackEndpoint::End), ("b", TrackEndpoint::Begin)]
        );
    }

    #[test]
    fn nearest_within_respects_radius() {
        let index = EndpointIndex::from_tracks(&sample_tracks());
        assert!(index.nearest_within(DVec2::new(5.0, 3.0), 2.0).is_none());
        assert!(index.nearest_within(DVec2::new(0.5, 0.5), 2.0).is_some());
    }

    #[test]
    fn non_tracks_and_empty_index_are_ignored() {
        let mut signal = Entity::new(ObjectType::Signal, Map::new());
        signal.geometry = Geometry::Point(DVec2::ZERO);
        let index = EndpointIndex::from_tracks(&[signal]);

        assert!(index.is_empty());
        assert!(index.nearest(DVec2::ZERO).is_none());
        assert!(EndpointIndex::empty().within_radius(DVec2::ZERO, 5.0).is_empty());
    }
}
