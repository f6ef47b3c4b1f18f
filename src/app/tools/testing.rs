//! Test-Hilfen: aufzeichnender Host und Beispiel-Entities.

use glam::DVec2;
use serde_json::{json, Map, Value};

use super::route::RouteRequest;
use super::{CommitRequest, HostEffects, ToolSwitch, TrackRequest};
use crate::core::{Entity, Geometry, ObjectType, LENGTH_KEY};

/// Host, der alle Anfragen nur aufzeichnet.
#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub track_requests: Vec<TrackRequest>,
    pub commits: Vec<CommitRequest>,
    pub route_requests: Vec<RouteRequest>,
    pub switches: Vec<ToolSwitch>,
    pub polygon_queries: Vec<Vec<DVec2>>,
    /// Antwort auf Polygon-Abfragen
    pub polygon_result: Vec<Entity>,
}

impl HostEffects for RecordingHost {
    fn request_tracks(&mut self, request: TrackRequest) {
        self.track_requests.push(request);
    }

    fn submit_commit(&mut self, request: CommitRequest) {
        self.commits.push(request);
    }

    fn request_routes(&mut self, request: RouteRequest) {
        self.route_requests.push(request);
    }

    fn entities_in_polygon(&mut self, polygon: &[DVec2]) -> Vec<Entity> {
        self.polygon_queries.push(polygon.to_vec());
        self.polygon_result.clone()
    }

    fn switch_tool(&mut self, switch: ToolSwitch) {
        self.switches.push(switch);
    }
}

pub(crate) fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Objekt erwartet, erhalten: {other}"),
    }
}

/// Gleis mit Polyline und deklarierter Länge.
pub(crate) fn track(id: &str, points: Vec<DVec2>, length: f64) -> Entity {
    Entity::persisted(
        id,
        ObjectType::TrackSegment,
        Geometry::LineString(points),
        props(json!({ LENGTH_KEY: length })),
    )
}

/// Gerades Gleis entlang der X-Achse, geometrisch so lang wie deklariert.
pub(crate) fn straight_track(id: &str, length: f64) -> Entity {
    track(id, vec![DVec2::ZERO, DVec2::new(length, 0.0)], length)
}
