//! In-Session-Index aller bekannten Entities (nach ID).
//!
//! Wird vom Host aus Backend-Antworten befüllt und nach jedem erfolgreichen
//! Commit abgeglichen: Sentinel-IDs werden durch die vergebenen IDs ersetzt,
//! gelöschte Entities entfernt.

use std::collections::HashMap;

use crate::app::operations::CommitReconciliation;
use crate::core::{Entity, EntityId, ObjectType};

/// Index aller bekannten Entities einer Editor-Sitzung.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
}

impl EntityStore {
    /// Erstellt einen leeren Store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fügt ein Entity ein und gibt ein ggf. ersetztes zurück.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id.clone(), entity)
    }

    /// Fügt mehrere Entities ein.
    pub fn extend(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            self.insert(entity);
        }
    }

    /// Entity zu einer ID.
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// `true` wenn ein Entity mit dieser ID bekannt ist.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entfernt ein Entity.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    /// Anzahl der Entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` wenn der Store leer ist.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Alle Entities eines Typs, nach ID sortiert.
    pub fn by_type(&self, object_type: ObjectType) -> Vec<&Entity> {
        let mut found: Vec<&Entity> = self
            .entities
            .values()
            .filter(|e| e.object_type == object_type)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Iteriert über alle Entities (ungeordnet).
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Übernimmt das Ergebnis eines Commits.
    ///
    /// Reihenfolge: Schlüssel ersetzen, gespeicherte Entities übernehmen,
    /// gelöschte entfernen. Danach existiert kein Eintrag mehr unter einer
    /// Sentinel-ID, die der Commit ersetzt hat.
    pub fn apply_commit(&mut self, reconciliation: &CommitReconciliation) {
        reconciliation.remap.rekey_map(&mut self.entities);
        for (_, to) in reconciliation.remap.pairs() {
            if let Some(entity) = self.entities.get_mut(to) {
                entity.id = to.clone();
            }
        }
        for saved in &reconciliation.saved {
            self.insert(saved.clone());
        }
        for id in &reconciliation.deleted {
            self.entities.remove(id);
        }
        log::debug!(
            "Commit übernommen: {} gespeichert, {} gelöscht, {} ID(s) ersetzt",
            reconciliation.saved.len(),
            reconciliation.deleted.len(),
            reconciliation.remap.pairs().len()
        );
    }
}
