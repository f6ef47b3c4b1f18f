//! Gemeinsame Hilfen der Integrationstests: aufzeichnender Host und Beispiel-Entities.

#![allow(dead_code)]

use glam::DVec2;
use infra_editor::app::tools::{CommitRequest, HostEffects, ToolSwitch, TrackRequest};
use infra_editor::app::tools::RouteRequest;
use infra_editor::{Entity, Geometry, ObjectType};
use serde_json::{json, Map, Value};

/// Host, der alle Anfragen aufzeichnet, statt sie auszuführen.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub track_requests: Vec<TrackRequest>,
    pub commits: Vec<CommitRequest>,
    pub route_requests: Vec<RouteRequest>,
    pub switches: Vec<ToolSwitch>,
}

impl HostEffects for FakeBackend {
    fn request_tracks(&mut self, request: TrackRequest) {
        self.track_requests.push(request);
    }

    fn submit_commit(&mut self, request: CommitRequest) {
        self.commits.push(request);
    }

    fn request_routes(&mut self, request: RouteRequest) {
        self.route_requests.push(request);
    }

    fn switch_tool(&mut self, switch: ToolSwitch) {
        self.switches.push(switch);
    }
}

pub fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Objekt erwartet, erhalten: {other}"),
    }
}

/// Gleis mit Polyline und deklarierter Länge.
pub fn track(id: &str, points: Vec<DVec2>, length: f64) -> Entity {
    Entity::persisted(
        id,
        ObjectType::TrackSegment,
        Geometry::LineString(points),
        props(json!({ "length": length })),
    )
}

/// Gleis entlang der Y-Achse: geometrisch 97.3 lang, deklariert 100.
pub fn drifting_track(id: &str) -> Entity {
    track(id, vec![DVec2::ZERO, DVec2::new(0.0, 97.3)], 100.0)
}
