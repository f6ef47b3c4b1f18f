//! State-Definitionen für die Bereichs-Tool-Fabrik.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::app::tools::common::{EditsEntity, EntityEditState};
use crate::app::tools::{ELECTRIFICATION_TOOL_ID, SPEED_RESTRICTION_TOOL_ID};
use crate::core::{
    Entity, EntityError, EntityId, Geometry, MarkerSign, ObjectType, RangeEnd, TrackCache,
    TrackRange, MARKER_SIGNS_KEY, TRACK_RANGES_KEY,
};

/// Parametrisierung der Fabrik pro Objekttyp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeKind {
    /// Objekttyp der bearbeiteten Entities
    pub object_type: ObjectType,
    /// Tool-ID
    pub tool_id: &'static str,
    /// Anzeigename
    pub label: &'static str,
    /// Property des Kennwerts (Geschwindigkeit, Spannung)
    pub value_key: &'static str,
    /// Objekt trägt Marker-Schilder
    pub has_marker_signs: bool,
}

impl RangeKind {
    /// Geschwindigkeitsbeschränkungen (mit Ankündigungsschildern)
    pub const SPEED_RESTRICTION: RangeKind = RangeKind {
        object_type: ObjectType::SpeedRestriction,
        tool_id: SPEED_RESTRICTION_TOOL_ID,
        label: "Geschwindigkeitsbeschränkung",
        value_key: "speed_limit",
        has_marker_signs: true,
    };
    /// Elektrifizierungen
    pub const ELECTRIFICATION: RangeKind = RangeKind {
        object_type: ObjectType::Electrification,
        tool_id: ELECTRIFICATION_TOOL_ID,
        label: "Elektrifizierung",
        value_key: "voltage",
        has_marker_signs: false,
    };
}

/// Bereichs-Tool für eine `RangeKind`.
#[derive(Debug, Clone)]
pub struct RangeTool {
    pub(crate) kind: RangeKind,
}

impl RangeTool {
    /// Erstellt das Tool für `kind`.
    pub fn new(kind: RangeKind) -> Self {
        Self { kind }
    }

    /// Objektart des Tools.
    pub fn kind(&self) -> RangeKind {
        self.kind
    }
}

/// Laufende Teil-Interaktion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RangeInteraction {
    /// Keine
    #[default]
    Idle,
    /// Ein Bereichsende wird gezogen
    DraggingRangeExtremity {
        /// Index in `track_ranges`
        range_index: usize,
        /// Gezogenes Ende
        end: RangeEnd,
        /// Bereich vor dem Greifen (für Escape)
        before: TrackRange,
    },
    /// Ein Marker-Schild wird verschoben
    MovingMarkerSign {
        /// Index in `marker_signs`
        sign_index: usize,
        /// Schild vor dem Greifen (für Escape); `None` für ein gerade angelegtes Schild
        before: Option<MarkerSign>,
    },
}

/// Zustand des Bereichs-Tools.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeState {
    /// Objektart
    pub kind: RangeKind,
    /// Bearbeitetes Entity
    pub edit: EntityEditState,
    /// Laufende Teil-Interaktion
    pub interaction: RangeInteraction,
    /// Gleis-Cache dieser Aktivierung
    pub tracks: TrackCache,
    /// Gleis unter dem Cursor
    pub hovered_track: Option<EntityId>,
}

impl RangeState {
    /// Neues Objekt ohne Bereiche.
    pub fn new_range(kind: RangeKind) -> Self {
        let mut properties = Map::new();
        properties.insert(TRACK_RANGES_KEY.to_string(), json!([]));
        if kind.has_marker_signs {
            properties.insert(MARKER_SIGNS_KEY.to_string(), json!([]));
        }
        properties.insert(kind.value_key.to_string(), Value::Null);
        let mut entity = Entity::new(kind.object_type, properties);
        entity.geometry = Geometry::MultiLineString(Vec::new());
        Self::with_edit(kind, EntityEditState::new(entity))
    }

    /// Bestehendes Objekt.
    ///
    /// Ohne mitgelieferte Geometrie startet es mit einem leeren MultiLineString;
    /// die Schnitte entstehen, sobald die Gleise geladen sind.
    pub fn existing(kind: RangeKind, mut entity: Entity) -> Self {
        if entity.geometry == Geometry::Null {
            entity.geometry = Geometry::MultiLineString(Vec::new());
        }
        Self::with_edit(kind, EntityEditState::existing(entity))
    }

    fn with_edit(kind: RangeKind, edit: EntityEditState) -> Self {
        Self {
            kind,
            edit,
            interaction: RangeInteraction::Idle,
            tracks: TrackCache::new(),
            hovered_track: None,
        }
    }

    /// Bereiche des Objekts.
    pub fn ranges(&self) -> Result<Vec<TrackRange>, EntityError> {
        self.edit.entity.track_ranges()
    }

    /// Marker-Schilder des Objekts.
    pub fn signs(&self) -> Result<Vec<MarkerSign>, EntityError> {
        self.edit.entity.marker_signs()
    }

    /// Ersetzt die Bereiche und aktualisiert die Geometrie.
    pub(crate) fn set_ranges(&mut self, ranges: &[TrackRange]) -> Result<(), EntityError> {
        self.edit.entity.set_track_ranges(ranges)?;
        self.refresh_geometry()
    }

    /// Ersetzt die Marker-Schilder.
    pub(crate) fn set_signs(&mut self, signs: &[MarkerSign]) -> Result<(), EntityError> {
        self.edit.entity.set_marker_signs(signs)
    }

    /// Kennwert (z.B. `speed_limit`).
    pub fn value(&self) -> Option<&Value> {
        self.edit
            .entity
            .property(self.kind.value_key)
            .filter(|v| !v.is_null())
    }

    /// Setzt den Kennwert.
    pub fn set_value(&mut self, value: Value) {
        self.edit.entity.set_property(self.kind.value_key, value);
    }

    /// Alle Gleise, auf die Bereiche oder Schilder verweisen (ohne Duplikate).
    pub fn referenced_tracks(&self) -> Result<Vec<EntityId>, EntityError> {
        let mut ids = BTreeSet::new();
        ids.extend(self.ranges()?.into_iter().map(|r| r.track));
        if self.kind.has_marker_signs {
            ids.extend(self.signs()?.into_iter().map(|s| s.track));
        }
        Ok(ids.into_iter().collect())
    }

    /// Geometrie = MultiLineString aller Bereiche auf geladenen Gleisen.
    pub(crate) fn refresh_geometry(&mut self) -> Result<(), EntityError> {
        let lines = self
            .ranges()?
            .iter()
            .filter_map(|range| {
                self.tracks
                    .linear(&range.track)
                    .map(|track| track.range_geometry(range))
            })
            .collect();
        self.edit.entity.geometry = Geometry::MultiLineString(lines);
        Ok(())
    }

    /// `true` solange ein Ende oder Schild gezogen wird.
    pub fn is_dragging(&self) -> bool {
        self.interaction != RangeInteraction::Idle
    }
}

impl EditsEntity for RangeState {
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
pub(crate) fn track_cache(state: &mut RangeState) -> &mut TrackCache {
    &mut state.tracks
}
