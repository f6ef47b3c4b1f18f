//! Operation-Builder: bearbeitetes Entity (+ Snapshot) → persistierbare Operation.
//!
//! - Sentinel-ID → `Create` mit Properties und frisch erzeugter ID
//! - sonst → `Update` mit strukturellem Patch zwischen Snapshot und Bearbeitung
//! - explizites Löschen → `Delete` (nie aus einem Diff abgeleitet)
//!
//! Nach einem erfolgreichen Create muss die Sentinel-ID überall durch die vom
//! Backend vergebene ID ersetzt werden (`IdRemap`).

use std::collections::HashMap;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::patch::{diff_with_atomic, Patch};
use crate::core::{Entity, EntityError, EntityId, ObjectType, GEO_KEY};

/// Property-Schlüssel der ID im Create-Payload.
pub const ID_KEY: &str = "id";

/// Top-Level-Schlüssel, die nur als ganzer Wert ersetzt werden.
pub const ATOMIC_KEYS: &[&str] = &[GEO_KEY];

/// Persistierbare Änderung an genau einem Entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Neues Entity anlegen
    Create {
        /// Objekttyp
        #[serde(rename = "obj_type")]
        object_type: ObjectType,
        /// Vollständige Properties inkl. frischer `id`
        #[serde(rename = "railjson")]
        payload: Map<String, Value>,
    },
    /// Bestehendes Entity per Patch ändern
    Update {
        /// Objekttyp
        #[serde(rename = "obj_type")]
        object_type: ObjectType,
        /// Persistierte ID
        #[serde(rename = "obj_id")]
        id: EntityId,
        /// Struktureller Patch auf den Properties (kann leer sein)
        #[serde(rename = "railjson_patch")]
        patch: Patch,
    },
    /// Bestehendes Entity löschen
    Delete {
        /// Objekttyp
        #[serde(rename = "obj_type")]
        object_type: ObjectType,
        /// Persistierte ID
        #[serde(rename = "obj_id")]
        id: EntityId,
    },
}

impl Operation {
    /// Objekttyp der Operation.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Operation::Create { object_type, .. }
            | Operation::Update { object_type, .. }
            | Operation::Delete { object_type, .. } => *object_type,
        }
    }

    /// `true` für ein Update ohne Patch-Operationen.
    pub fn is_noop(&self) -> bool {
        matches!(self, Operation::Update { patch, .. } if patch.is_empty())
    }
}

/// Baut die Operation für ein bearbeitetes Entity.
///
/// Für persistierte Entities ist der Snapshot Pflicht und muss dieselbe ID tragen.
/// Ein leerer Patch ist ein gültiges Ergebnis; der Aufrufer entscheidet, ob er
/// den Commit überspringt.
pub fn build_operation(snapshot: Option<&Entity>, edited: &Entity) -> Result<Operation, EntityError> {
    if edited.is_new() {
        let mut payload = edited.persisted_properties()?;
        payload.insert(
            ID_KEY.to_string(),
            Value::String(EntityId::generate().as_str().to_string()),
        );
        return Ok(Operation::Create {
            object_type: edited.object_type,
            payload,
        });
    }

    let snapshot = snapshot.ok_or_else(|| EntityError::MissingSnapshot(edited.id.clone()))?;
    if snapshot.id != edited.id {
        return Err(EntityError::SnapshotMismatch {
            snapshot: snapshot.id.clone(),
            edited: edited.id.clone(),
        });
    }

    let before = Value::Object(snapshot.persisted_properties()?);
    let after = Value::Object(edited.persisted_properties()?);
    Ok(Operation::Update {
        object_type: edited.object_type,
        id: edited.id.clone(),
        patch: diff_with_atomic(&before, &after, ATOMIC_KEYS),
    })
}

/// Baut eine Delete-Operation (bedingungslos).
pub fn build_delete(entity: &Entity) -> Operation {
    Operation::Delete {
        object_type: entity.object_type,
        id: entity.id.clone(),
    }
}

/// Inhalt eines Commit-Aufrufs, nach Operationsart gruppiert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitPayload {
    /// Create-Operationen
    pub create: Vec<Operation>,
    /// Update-Operationen
    pub update: Vec<Operation>,
    /// Delete-Operationen
    pub delete: Vec<Operation>,
}

impl CommitPayload {
    /// Gruppiert Operationen; die Reihenfolge innerhalb einer Gruppe bleibt erhalten.
    pub fn from_operations(operations: impl IntoIterator<Item = Operation>) -> Self {
        let mut payload = Self::default();
        for operation in operations {
            match operation {
                Operation::Create { .. } => payload.create.push(operation),
                Operation::Update { .. } => payload.update.push(operation),
                Operation::Delete { .. } => payload.delete.push(operation),
            }
        }
        payload
    }

    /// Baut den Payload aus Entity-Listen: neue Entities, `(Snapshot, Bearbeitung)`-Paare
    /// und zu löschende Entities.
    pub fn from_edits(
        create: &[Entity],
        update: &[(Entity, Entity)],
        delete: &[Entity],
    ) -> Result<Self, EntityError> {
        let mut operations = Vec::with_capacity(create.len() + update.len() + delete.len());
        for entity in create {
            operations.push(build_operation(None, entity)?);
        }
        for (source, target) in update {
            operations.push(build_operation(Some(source), target)?);
        }
        operations.extend(delete.iter().map(build_delete));
        Ok(Self::from_operations(operations))
    }

    /// `true` wenn keine Operation enthalten ist.
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Alle Operationen in Wire-Reihenfolge (Create, Update, Delete).
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.create
            .iter()
            .chain(self.update.iter())
            .chain(self.delete.iter())
    }

    /// IDs aller gelöschten Entities.
    pub fn deleted_ids(&self) -> Vec<EntityId> {
        self.delete
            .iter()
            .filter_map(|op| match op {
                Operation::Delete { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Zuordnung lokaler IDs → vom Backend vergebene IDs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdRemap {
    pairs: Vec<(EntityId, EntityId)>,
}

impl IdRemap {
    /// Leere Zuordnung.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fügt eine Zuordnung hinzu (identische IDs werden ignoriert).
    pub fn insert(&mut self, from: EntityId, to: EntityId) {
        if from != to && !self.pairs.iter().any(|(f, _)| *f == from) {
            self.pairs.push((from, to));
        }
    }

    /// `true` wenn keine ID ersetzt werden muss.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Alle Zuordnungen.
    pub fn pairs(&self) -> &[(EntityId, EntityId)] {
        &self.pairs
    }

    /// Neue ID für `id`, falls sie ersetzt wird.
    pub fn get(&self, id: &EntityId) -> Option<&EntityId> {
        self.pairs.iter().find(|(from, _)| from == id).map(|(_, to)| to)
    }

    /// Persistierte ID des Entities, das mit der Sentinel-ID angelegt wurde.
    pub fn persisted_id_for_sentinel(&self) -> Option<&EntityId> {
        self.get(&EntityId::new_sentinel())
    }

    /// Ersetzt `id` in-place, falls eine Zuordnung existiert.
    pub fn rekey_id(&self, id: &mut EntityId) -> bool {
        match self.get(id) {
            Some(to) => {
                *id = to.clone();
                true
            }
            None => false,
        }
    }

    /// Ersetzt die ID eines Entities.
    pub fn rekey_entity(&self, entity: &mut Entity) -> bool {
        self.rekey_id(&mut entity.id)
    }

    /// Verschiebt alle Einträge einer Map mit ersetzten Schlüsseln.
    ///
    /// Danach existiert kein Eintrag mehr unter einer alten ID.
    pub fn rekey_map<V>(&self, map: &mut HashMap<EntityId, V>) {
        for (from, to) in &self.pairs {
            if let Some(value) = map.remove(from) {
                map.insert(to.clone(), value);
            }
        }
    }
}

/// Abgleich eines Commit-Ergebnisses: ID-Zuordnung, gespeicherte und gelöschte Entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReconciliation {
    /// Sentinel- bzw. Payload-ID → persistierte ID
    pub remap: IdRemap,
    /// Vom Backend zurückgegebene, gespeicherte Entities
    pub saved: Vec<Entity>,
    /// Gelöschte IDs
    pub deleted: Vec<EntityId>,
}

impl CommitReconciliation {
    /// Gleicht `response` mit dem gesendeten `payload` ab.
    ///
    /// Das Backend liefert die gespeicherten Entities in Operations-Reihenfolge:
    /// zuerst alle Creates, dann alle Updates. Die i-te Create-Operation gehört zum
    /// i-ten zurückgegebenen Entity.
    pub fn from_response(payload: &CommitPayload, response: Vec<Entity>) -> anyhow::Result<Self> {
        let expected = payload.create.len() + payload.update.len();
        if response.len() < payload.create.len() {
            bail!(
                "Commit-Antwort enthält {} Entities, erwartet mindestens {}",
                response.len(),
                payload.create.len()
            );
        }
        if response.len() != expected {
            log::debug!(
                "Commit-Antwort mit {} statt {} Entities",
                response.len(),
                expected
            );
        }

        let mut remap = IdRemap::new();
        for (operation, saved) in payload.create.iter().zip(&response) {
            let Operation::Create {
                object_type,
                payload: railjson,
            } = operation
            else {
                continue;
            };
            if *object_type != saved.object_type {
                bail!(
                    "Commit-Antwort: {} statt {} für angelegtes Entity",
                    saved.object_type,
                    object_type
                );
            }
            let generated = railjson
                .get(ID_KEY)
                .and_then(Value::as_str)
                .map(EntityId::from)
                .context("Create-Payload ohne `id`")?;
            remap.insert(EntityId::new_sentinel(), saved.id.clone());
            remap.insert(generated, saved.id.clone());
        }

        Ok(Self {
            remap,
            saved: response,
            deleted: payload.deleted_ids(),
        })
    }
}
