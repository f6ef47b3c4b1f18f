//! State-Definitionen für die Punkt-Tool-Fabrik.

use glam::DVec2;
use serde_json::{json, Map};

use super::{ANGLE_KEY, POSITION_KEY, TRACK_KEY};
use crate::app::tools::common::{EditsEntity, EntityEditState, TrackSnap};
use crate::app::tools::{BUFFER_STOP_TOOL_ID, DETECTOR_TOOL_ID, SIGNAL_TOOL_ID};
use crate::core::{
    Entity, EntityError, EntityId, Geometry, LinearTrack, ObjectType, RequestId, TrackCache,
};

/// Parametrisierung der Fabrik pro Objekttyp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointKind {
    /// Objekttyp der platzierten Entities
    pub object_type: ObjectType,
    /// Tool-ID
    pub tool_id: &'static str,
    /// Anzeigename
    pub label: &'static str,
    /// Speichert die Gleisrichtung als `angle`
    pub oriented: bool,
}

impl PointKind {
    /// Signale (gerichtet)
    pub const SIGNAL: PointKind = PointKind {
        object_type: ObjectType::Signal,
        tool_id: SIGNAL_TOOL_ID,
        label: "Signal",
        oriented: true,
    };
    /// Prellböcke
    pub const BUFFER_STOP: PointKind = PointKind {
        object_type: ObjectType::BufferStop,
        tool_id: BUFFER_STOP_TOOL_ID,
        label: "Prellbock",
        oriented: false,
    };
    /// Gleisfreimelder
    pub const DETECTOR: PointKind = PointKind {
        object_type: ObjectType::Detector,
        tool_id: DETECTOR_TOOL_ID,
        label: "Gleisfreimelder",
        oriented: false,
    };
}

/// Punkt-Tool für eine `PointKind`.
#[derive(Debug, Clone)]
pub struct PointTool {
    pub(crate) kind: PointKind,
}

impl PointTool {
    /// Erstellt das Tool für `kind`.
    pub fn new(kind: PointKind) -> Self {
        Self { kind }
    }

    /// Objektart des Tools.
    pub fn kind(&self) -> PointKind {
        self.kind
    }
}

/// Platzierungszustand
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Objekt folgt dem Cursor
    Moving,
    /// Objekt liegt auf einem Gleis
    Placed,
    /// Klick erfolgt, Gleis wird noch geladen
    Parked {
        /// Anfrage, auf deren Antwort gewartet wird
        request: RequestId,
        /// Einrast-Punkt zum Zeitpunkt des Klicks
        snap: TrackSnap,
    },
}

/// Zustand des Punkt-Tools.
#[derive(Debug, Clone, PartialEq)]
pub struct PointState {
    /// Objektart
    pub kind: PointKind,
    /// Bearbeitetes Entity
    pub edit: EntityEditState,
    /// Platzierungszustand
    pub placement: Placement,
    /// Aktueller Einrast-Kandidat unter dem Cursor
    pub snap: Option<TrackSnap>,
    /// Gleis-Cache dieser Aktivierung
    pub tracks: TrackCache,
    /// Stand vor dem Aufnehmen (für Escape)
    pub before_move: Option<Entity>,
}

impl PointState {
    /// Neues Objekt, das dem Cursor folgt.
    pub fn new_point(kind: PointKind) -> Self {
        Self {
            kind,
            edit: EntityEditState::new(Entity::new(kind.object_type, Map::new())),
            placement: Placement::Moving,
            snap: None,
            tracks: TrackCache::new(),
            before_move: None,
        }
    }

    /// Bestehendes, platziertes Objekt.
    pub fn existing(kind: PointKind, entity: Entity) -> Self {
        Self {
            kind,
            edit: EntityEditState::existing(entity),
            placement: Placement::Placed,
            snap: None,
            tracks: TrackCache::new(),
            before_move: None,
        }
    }

    /// Gleis, auf dem das Objekt liegt.
    pub fn track_id(&self) -> Result<Option<EntityId>, EntityError> {
        self.edit.entity.typed_property::<EntityId>(TRACK_KEY)
    }

    /// Position des Objekts auf der Karte.
    pub fn position(&self) -> Option<DVec2> {
        match self.edit.entity.geometry {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Setzt das Objekt an die Projektion von `snap` auf `track`.
    pub(crate) fn place_on(&mut self, track: &LinearTrack, snap: &TrackSnap) {
        let projection = track.project(snap.coordinate);
        let entity = &mut self.edit.entity;
        entity.set_property(TRACK_KEY, json!(track.id().as_str()));
        entity.set_property(POSITION_KEY, json!(projection.declared_distance));
        if self.kind.oriented {
            entity.set_property(ANGLE_KEY, json!(projection.tangent_angle));
        }
        entity.geometry = Geometry::Point(projection.coordinate);
        self.placement = Placement::Placed;
        self.before_move = None;
    }
}

impl EditsEntity for PointState {
    fn edit(&self) -> &EntityEditState {
        &self.edit
    }

    fn edit_mut(&mut self) -> &mut EntityEditState {
        &mut self.edit
    }

    fn track_cache_mut(&mut self) -> Option<&mut TrackCache> {
        Some(&mut self.tracks)
    }
}

/// Gleis-Cache im State (für `ToolContext::fetch_tracks`).
pub(crate) fn track_cache(state: &mut PointState) -> &mut TrackCache {
    &mut state.tracks
}
