//! Linien-Tool für Gleisabschnitte: Stützpunkte setzen, verschieben, löschen.
//!
//! Bei neuen Gleisen folgt die deklarierte Länge der geometrischen Länge, bis
//! das Gleis zum ersten Mal gespeichert wurde.

mod lifecycle;
mod state;

pub use state::{GrabbedVertex, LineDrawState, LineDrawTool, LineMode};

/// Aktion: Stützpunkte anhängen
pub const MODE_ADD_ACTION: &str = "mode:add-points";
/// Aktion: Stützpunkte verschieben
pub const MODE_MOVE_ACTION: &str = "mode:move-points";
/// Aktion: Stützpunkte löschen
pub const MODE_DELETE_ACTION: &str = "mode:delete-points";
