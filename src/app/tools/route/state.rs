//! State-Definitionen des Fahrstraßen-Tools.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{ENTRY_POINT_KEY, EXIT_POINT_KEY, RELEASE_DETECTORS_KEY, SWITCHES_DIRECTIONS_KEY};
use crate::app::tools::common::{EditsEntity, EntityEditState};
use crate::core::{Entity, EntityError, EntityId, ObjectType, RequestId};

/// Fahrstraßen-Tool
#[derive(Debug, Clone, Default)]
pub struct RouteBuilderTool;

impl RouteBuilderTool {
    /// Erstellt das Fahrstraßen-Tool.
    pub fn new() -> Self {
        Self
    }
}

/// Start- oder Zielpunkt einer Fahrstraße (Gleisfreimelder oder Prellbock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Objekttyp (`Detector` oder `BufferStop`)
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    /// ID des Objekts
    pub id: EntityId,
}

impl Waypoint {
    /// Wegpunkt zu einem Entity, sofern es als Start/Ziel taugt.
    pub fn for_entity(entity: &Entity) -> Option<Self> {
        matches!(
            entity.object_type,
            ObjectType::Detector | ObjectType::BufferStop
        )
        .then(|| Self {
            object_type: entity.object_type,
            id: entity.id.clone(),
        })
    }
}

/// Welcher Wegpunkt gerade gewählt wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    /// Startpunkt
    Entry,
    /// Zielpunkt
    Exit,
}

impl WaypointRole {
    fn key(self) -> &'static str {
        match self {
            WaypointRole::Entry => ENTRY_POINT_KEY,
            WaypointRole::Exit => EXIT_POINT_KEY,
        }
    }
}

/// Anfrage an die externe Wegsuche.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Kennung, mit der die Antwort zurückgegeben wird
    pub request: RequestId,
    /// Infrastruktur
    pub infra_id: u64,
    /// Startpunkt
    pub entry: Waypoint,
    /// Zielpunkt
    pub exit: Waypoint,
}

/// Ein Weg zwischen Start und Ziel, wie ihn die Wegsuche liefert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    /// Stellung jeder befahrenen Weiche
    pub switches_directions: BTreeMap<EntityId, String>,
    /// Gleisfreimelder, die die Fahrstraße auflösen
    pub release_detectors: Vec<EntityId>,
}

/// Stand der Wegsuche.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RouteSearch {
    /// Noch keine Anfrage
    #[default]
    Idle,
    /// Anfrage läuft
    Searching(RequestId),
    /// Kandidaten liegen vor
    Found(Vec<RouteCandidate>),
    /// Wegsuche fehlgeschlagen
    Failed(String),
}

/// Zustand des Fahrstraßen-Tools.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    /// Bearbeitetes Entity
    pub edit: EntityEditState,
    /// Wegpunkt, der per Klick gesetzt wird
    pub picking: Option<WaypointRole>,
    /// Wegsuche
    pub search: RouteSearch,
    /// Übernommener Kandidat (Index in `Found`)
    pub chosen: Option<usize>,
    /// Weg liegt vor (übernommen oder aus der bestehenden Fahrstraße)
    pub has_path: bool,
}

impl RouteState {
    /// Neue Fahrstraße ohne Wegpunkte.
    pub fn new_route() -> Self {
        let mut properties = Map::new();
        properties.insert(ENTRY_POINT_KEY.to_string(), Value::Null);
        properties.insert(EXIT_POINT_KEY.to_string(), Value::Null);
        properties.insert(SWITCHES_DIRECTIONS_KEY.to_string(), json!({}));
        properties.insert(RELEASE_DETECTORS_KEY.to_string(), json!([]));
        Self {
            edit: EntityEditState::new(Entity::new(ObjectType::Route, properties)),
            picking: None,
            search: RouteSearch::Idle,
            chosen: None,
            has_path: false,
        }
    }

    /// Bestehende Fahrstraße.
    pub fn existing(entity: Entity) -> Self {
        Self {
            edit: EntityEditState::existing(entity),
            picking: None,
            search: RouteSearch::Idle,
            chosen: None,
            has_path: true,
        }
    }

    /// Gesetzter Startpunkt.
    pub fn entry(&self) -> Result<Option<Waypoint>, EntityError> {
        self.edit.entity.typed_property(ENTRY_POINT_KEY)
    }

    /// Gesetzter Zielpunkt.
    pub fn exit(&self) -> Result<Option<Waypoint>, EntityError> {
        self.edit.entity.typed_property(EXIT_POINT_KEY)
    }

    /// Setzt einen Wegpunkt; ein bisher übernommener Weg wird verworfen.
    pub fn set_waypoint(
        &mut self,
        role: WaypointRole,
        waypoint: &Waypoint,
    ) -> Result<(), EntityError> {
        let entity = &mut self.edit.entity;
        entity.set_typed_property(role.key(), waypoint)?;
        entity.set_property(SWITCHES_DIRECTIONS_KEY, json!({}));
        entity.set_property(RELEASE_DETECTORS_KEY, json!([]));
        self.search = RouteSearch::Idle;
        self.chosen = None;
        self.has_path = false;
        Ok(())
    }

    /// Gefundene Kandidaten (leer, solange keine vorliegen).
    pub fn candidates(&self) -> &[RouteCandidate] {
        match &self.search {
            RouteSearch::Found(candidates) => candidates,
            _ => &[],
        }
    }

    /// Übernimmt Kandidat `index` in die Properties.
    pub fn choose_candidate(&mut self, index: usize) -> Result<(), EntityError> {
        let Some(candidate) = self.candidates().get(index).cloned() else {
            return Ok(());
        };
        let entity = &mut self.edit.entity;
        entity.set_typed_property(SWITCHES_DIRECTIONS_KEY, &candidate.switches_directions)?;
        entity.set_typed_property(RELEASE_DETECTORS_KEY, &candidate.release_detectors)?;
        self.chosen = Some(index);
        self.has_path = true;
        Ok(())
    }

    /// `true` solange die Wegsuche läuft.
    pub fn is_searching(&self) -> bool {
        matches!(self.search, RouteSearch::Searching(_))
    }
}

impl EditsEntity for RouteState {
    fn edit(&self) -> &EntityEditState {
        &self.edit
    }

    fn edit_mut(&mut self) -> &mut EntityEditState {
        &mut self.edit
    }
}
