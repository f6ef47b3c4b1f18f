//! State-Definitionen und Konstruktor für das Linien-Tool.

use glam::DVec2;
use serde_json::json;

use crate::app::tools::common::{EditsEntity, EntityEditState};
use crate::core::linear_ref::polyline_length;
use crate::core::{Entity, Geometry, ObjectType, LENGTH_KEY};

/// Linien-Tool
#[derive(Debug, Clone, Default)]
pub struct LineDrawTool;

impl LineDrawTool {
    /// Erstellt das Linien-Tool.
    pub fn new() -> Self {
        Self
    }
}

/// Bearbeitungsmodus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineMode {
    /// Klick hängt einen Stützpunkt an
    #[default]
    AddPoints,
    /// Klick greift bzw. setzt einen Stützpunkt ab
    MovePoints,
    /// Klick entfernt einen Stützpunkt
    DeletePoints,
}

/// Gegriffener Stützpunkt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabbedVertex {
    /// Index in der Polyline
    pub index: usize,
    /// Position vor dem Greifen (für Escape)
    pub origin: DVec2,
}

/// Zustand des Linien-Tools.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDrawState {
    /// Bearbeitetes Gleis
    pub edit: EntityEditState,
    /// Aktueller Modus
    pub mode: LineMode,
    /// Gegriffener Stützpunkt (nur im Verschiebe-Modus)
    pub grabbed: Option<GrabbedVertex>,
    /// `true` solange Klicks im Anhänge-Modus Punkte anhängen
    pub drawing: bool,
    /// Letzte Cursorposition (für die Vorschau)
    pub cursor: Option<DVec2>,
    /// Deklarierte Länge folgt der Geometrie
    pub auto_length: bool,
}

impl LineDrawState {
    /// Neues, leeres Gleis.
    pub fn new_track() -> Self {
        let mut entity = Entity::new(
            ObjectType::TrackSegment,
            serde_json::Map::from_iter([(LENGTH_KEY.to_string(), json!(0.0))]),
        );
        entity.geometry = Geometry::LineString(Vec::new());
        Self {
            edit: EntityEditState::new(entity),
            mode: LineMode::AddPoints,
            grabbed: None,
            drawing: true,
            cursor: None,
            auto_length: true,
        }
    }

    /// Bestehendes Gleis; die deklarierte Länge bleibt unangetastet.
    pub fn existing_track(entity: Entity) -> Self {
        Self {
            edit: EntityEditState::existing(entity),
            mode: LineMode::MovePoints,
            grabbed: None,
            drawing: false,
            cursor: None,
            auto_length: false,
        }
    }

    /// Stützpunkte des Gleises (leer ohne LineString-Geometrie).
    pub fn points(&self) -> &[DVec2] {
        match &self.edit.entity.geometry {
            Geometry::LineString(points) => points,
            _ => &[],
        }
    }

    /// Ersetzt die Stützpunkte; bei automatischer Länge wird `length` nachgeführt.
    pub(crate) fn set_points(&mut self, points: Vec<DVec2>, unit_scale: f64) {
        if self.auto_length {
            let length = polyline_length(&points) * unit_scale;
            self.edit.entity.set_property(LENGTH_KEY, json!(length));
        }
        self.edit.entity.geometry = Geometry::LineString(points);
    }

    /// Verschiebt einen Stützpunkt.
    pub(crate) fn move_vertex(&mut self, index: usize, pos: DVec2, unit_scale: f64) {
        let mut points = self.points().to_vec();
        if let Some(point) = points.get_mut(index) {
            *point = pos;
            self.set_points(points, unit_scale);
        }
    }
}

impl EditsEntity for LineDrawState {
    fn edit(&self) -> &EntityEditState {
        &self.edit
    }

    fn edit_mut(&mut self) -> &mut EntityEditState {
        &mut self.edit
    }
}
