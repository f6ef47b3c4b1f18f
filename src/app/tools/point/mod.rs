//! Punkt-Tool-Fabrik: ein generalisiertes Tool für alle Punkt-Objekte, die
//! auf einem Gleis sitzen (Signale, Prellböcke, Gleisfreimelder).
//!
//! Das Objekt folgt dem Cursor, eingerastet auf das nächste Gleis. Ein Klick
//! platziert es: `track` und `position` (deklarierte Distanz) werden über den
//! Gleis-Cache berechnet. Ist das Gleis noch nicht geladen, wird die
//! Platzierung geparkt, bis die passende Antwort eintrifft.

mod lifecycle;
mod state;

pub use state::{Placement, PointKind, PointState, PointTool};

/// Property: Gleis-ID
pub const TRACK_KEY: &str = "track";
/// Property: deklarierte Position auf dem Gleis
pub const POSITION_KEY: &str = "position";
/// Property: Ausrichtung (Radiant, nur gerichtete Objekte)
pub const ANGLE_KEY: &str = "angle";
