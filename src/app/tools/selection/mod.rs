//! Auswahl-Tool: Einzel- und Polygon-Auswahl, Löschen der Auswahl und
//! Übergabe eines Entities an sein Bearbeitungs-Tool.

mod lifecycle;
mod state;

pub use state::{SelectionMode, SelectionState, SelectionTool};

/// Aktion: Einzelauswahl
pub const MODE_SINGLE_ACTION: &str = "mode:single";
/// Aktion: Polygon-Auswahl
pub const MODE_POLYGON_ACTION: &str = "mode:polygon";
/// Aktion: Polygon schließen und enthaltene Entities auswählen
pub const CLOSE_POLYGON_ACTION: &str = "close-polygon";
/// Aktion: alle ausgewählten Entities löschen
pub const DELETE_SELECTION_ACTION: &str = "delete-selection";
/// Aktion: einziges ausgewähltes Entity bearbeiten
pub const EDIT_ACTION: &str = "edit";
/// Aktion: Auswahl leeren
pub const CLEAR_SELECTION_ACTION: &str = "clear-selection";
