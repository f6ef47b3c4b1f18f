//! Bereichs-Tool-Fabrik: ein generalisiertes Tool für alle Objekte, die aus
//! Gleisbereichen bestehen (Geschwindigkeitsbeschränkungen, Elektrifizierungen).
//!
//! Aufgeteilt in:
//! - `state`     — RangeKind, RangeState, Interaktionszustand
//! - `drag`      — Greifen, Ziehen und Loslassen von Bereichsenden und Schildern
//! - `lifecycle` — EditorTool-Implementierung

mod drag;
mod lifecycle;
mod state;

pub use state::{RangeInteraction, RangeKind, RangeState, RangeTool};

/// Aktion: Ankündigungsschild hinzufügen
pub const ADD_MARKER_SIGN_ACTION: &str = "add-marker-sign";

/// Schild-Art neu angelegter Marker-Schilder
pub const DEFAULT_SIGN_KIND: &str = "announcement";

#[cfg(test)]
mod tests;
