//! State-Definitionen des Auswahl-Tools.

use glam::DVec2;

use crate::app::tools::common::PendingCommit;
use crate::core::{Entity, EntityId};

/// Auswahl-Tool
#[derive(Debug, Clone, Default)]
pub struct SelectionTool;

impl SelectionTool {
    /// Erstellt das Auswahl-Tool.
    pub fn new() -> Self {
        Self
    }
}

/// Auswahlmodus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Klick wählt ein Entity
    #[default]
    Single,
    /// Klicks sammeln Polygon-Ecken
    Polygon,
}

/// Zustand des Auswahl-Tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Aktueller Modus
    pub mode: SelectionMode,
    /// Ausgewählte Entities in Klick-Reihenfolge
    pub selection: Vec<Entity>,
    /// Gesammelte Polygon-Ecken
    pub polygon: Vec<DVec2>,
    /// Entity unter dem Cursor
    pub hovered: Option<EntityId>,
    /// Laufender Lösch-Commit
    pub pending_delete: Option<PendingCommit>,
}

impl SelectionState {
    /// `true` wenn das Entity ausgewählt ist.
    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selection.iter().any(|e| &e.id == id)
    }

    /// Nimmt das Entity in die Auswahl auf bzw. entfernt es.
    pub fn toggle(&mut self, entity: &Entity) {
        if let Some(index) = self.selection.iter().position(|e| e.id == entity.id) {
            self.selection.remove(index);
        } else {
            self.selection.push(entity.clone());
        }
    }

    /// Ersetzt die Auswahl durch genau dieses Entity.
    pub fn select_only(&mut self, entity: &Entity) {
        self.selection.clear();
        self.selection.push(entity.clone());
    }

    /// Fügt Entities hinzu, die noch nicht ausgewählt sind.
    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            if !self.is_selected(&entity.id) {
                self.selection.push(entity);
            }
        }
    }

    /// Persistierte Entities der Auswahl (nur diese lassen sich löschen).
    pub fn persisted(&self) -> impl Iterator<Item = &Entity> {
        self.selection.iter().filter(|e| !e.is_new())
    }
}
