//! Strukturfehler im Entity-Modell.
//!
//! Diese Fehler zeigen Programmier- oder Schemafehler an (fehlende Pflicht-Komponente,
//! falsche Geometrie-Art) und brechen die laufende Operation ab. Wiederherstellbare
//! Zustände (degeneriertes Gleis, fehlgeschlagener Fetch) sind keine Fehler, sondern
//! getaggte Werte (`TrackShape::Degenerate`, `TrackCacheEntry::Error`).

use super::entity::{EntityId, GeometryKind, ObjectType};

/// Verletzung einer strukturellen Invariante eines Entities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntityError {
    /// Eine Pflicht-Komponente (z.B. `length` eines Gleises) fehlt oder hat den falschen Typ.
    #[error("{object_type}: Pflicht-Komponente `{component}` fehlt")]
    MissingComponent {
        /// Objekttyp des betroffenen Entities
        object_type: ObjectType,
        /// Name der fehlenden Komponente
        component: &'static str,
    },
    /// Die Geometrie hat nicht die für den Objekttyp erwartete Art.
    #[error("{object_type}: Geometrie {found} statt {expected}")]
    GeometryKindMismatch {
        /// Objekttyp des betroffenen Entities
        object_type: ObjectType,
        /// Erwartete Geometrie-Art
        expected: GeometryKind,
        /// Tatsächlich vorgefundene Geometrie-Art
        found: GeometryKind,
    },
    /// Ein Property ist vorhanden, lässt sich aber nicht in den erwarteten Typ lesen.
    #[error("{object_type}: Property `{key}` ungültig: {reason}")]
    InvalidProperty {
        /// Objekttyp des betroffenen Entities
        object_type: ObjectType,
        /// Property-Schlüssel
        key: String,
        /// Beschreibung des Fehlers
        reason: String,
    },
    /// Ein persistiertes Entity soll aktualisiert werden, es gibt aber keinen Snapshot.
    #[error("Kein Snapshot für persistiertes Entity {0}")]
    MissingSnapshot(EntityId),
    /// Snapshot und bearbeitetes Entity gehören zu verschiedenen Objekten.
    #[error("Snapshot {snapshot} passt nicht zu bearbeitetem Entity {edited}")]
    SnapshotMismatch {
        /// ID des Snapshots
        snapshot: EntityId,
        /// ID des bearbeiteten Entities
        edited: EntityId,
    },
}
