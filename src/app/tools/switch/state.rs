//! State-Definitionen des Weichen-Tools.

use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{PORTS_KEY, SWITCH_TYPE_KEY};
use crate::app::tools::common::{EditsEntity, EntityEditState};
use crate::app::tools::SwitchType;
use crate::core::{Entity, EntityError, EntityId, EndpointMatch, Geometry, ObjectType, TrackEndpoint};

/// Weichen-Tool
#[derive(Debug, Clone, Default)]
pub struct SwitchTool;

impl SwitchTool {
    /// Erstellt das Weichen-Tool.
    pub fn new() -> Self {
        Self
    }
}

/// Gleisende, auf dem ein Port liegt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAssignment {
    /// Gleis-ID
    pub track: EntityId,
    /// Welches Ende des Gleises
    pub endpoint: TrackEndpoint,
}

/// Teil-Interaktion
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SwitchInteraction {
    /// Keine
    #[default]
    Idle,
    /// Ein Gleisende für `port` wird gesucht
    SelectingNode {
        /// Name des Ports
        port: String,
        /// Eingerastetes Gleisende unter dem Cursor
        hover: Option<EndpointMatch>,
    },
}

/// Zustand des Weichen-Tools.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchState {
    /// Bearbeitetes Entity
    pub edit: EntityEditState,
    /// Weichentyp-Katalog
    pub switch_types: Vec<SwitchType>,
    /// Teil-Interaktion
    pub interaction: SwitchInteraction,
}

impl SwitchState {
    /// Neue Weiche ohne Typ und ohne Ports.
    pub fn new_switch(switch_types: Vec<SwitchType>) -> Self {
        let mut properties = Map::new();
        properties.insert(SWITCH_TYPE_KEY.to_string(), Value::Null);
        properties.insert(PORTS_KEY.to_string(), json!({}));
        Self {
            edit: EntityEditState::new(Entity::new(ObjectType::Switch, properties)),
            switch_types,
            interaction: SwitchInteraction::Idle,
        }
    }

    /// Bestehende Weiche.
    pub fn existing(switch_types: Vec<SwitchType>, entity: Entity) -> Self {
        Self {
            edit: EntityEditState::existing(entity),
            switch_types,
            interaction: SwitchInteraction::Idle,
        }
    }

    /// Gewählter Weichentyp, sofern im Katalog.
    pub fn switch_type(&self) -> Option<&SwitchType> {
        let id = self.edit.entity.property(SWITCH_TYPE_KEY)?.as_str()?;
        self.switch_types.iter().find(|t| t.id == id)
    }

    /// Port-Zuordnungen in Zuweisungs-Reihenfolge.
    pub fn ports(&self) -> Result<IndexMap<String, PortAssignment>, EntityError> {
        Ok(self
            .edit
            .entity
            .typed_property(PORTS_KEY)?
            .unwrap_or_default())
    }

    /// Wählt einen Typ und verwirft alle Port-Zuordnungen.
    pub fn choose_type(&mut self, type_id: &str) {
        let entity = &mut self.edit.entity;
        entity.set_property(SWITCH_TYPE_KEY, json!(type_id));
        entity.set_property(PORTS_KEY, json!({}));
        entity.geometry = Geometry::Null;
        self.interaction = SwitchInteraction::Idle;
    }

    /// Weist `port` das Gleisende `node` zu.
    ///
    /// Die Geometrie der Weiche ist das Gleisende des ersten zugewiesenen
    /// Ports in der Reihenfolge des Typs.
    pub fn assign_port(&mut self, port: &str, node: &EndpointMatch) -> Result<(), EntityError> {
        let mut ports = self.ports()?;
        ports.insert(
            port.to_string(),
            PortAssignment {
                track: node.track.clone(),
                endpoint: node.endpoint,
            },
        );
        self.edit.entity.set_typed_property(PORTS_KEY, &ports)?;

        let first_assigned = self
            .switch_type()
            .and_then(|t| t.ports.iter().find(|p| ports.contains_key(p.as_str())))
            .map(String::as_str);
        if first_assigned == Some(port) || matches!(self.edit.entity.geometry, Geometry::Null) {
            self.edit.entity.geometry = Geometry::Point(node.position);
        }
        Ok(())
    }

    /// `true` wenn der gewählte Typ den Port hat.
    pub fn has_port(&self, port: &str) -> bool {
        self.switch_type()
            .is_some_and(|t| t.ports.iter().any(|p| p == port))
    }

    /// `true` wenn ein Typ gewählt und jeder seiner Ports zugewiesen ist.
    pub fn is_complete(&self) -> bool {
        let (Some(switch_type), Ok(ports)) = (self.switch_type(), self.ports()) else {
            return false;
        };
        switch_type.ports.iter().all(|p| ports.contains_key(p.as_str()))
    }

    /// Position der Weiche auf der Karte.
    pub fn position(&self) -> Option<DVec2> {
        match self.edit.entity.geometry {
            Geometry::Point(p) => Some(p),
            _ => None,
        }
    }
}

impl EditsEntity for SwitchState {
    fn edit(&self) -> &EntityEditState {
        &self.edit
    }

    fn edit_mut(&mut self) -> &mut EntityEditState {
        &mut self.edit
    }
}
