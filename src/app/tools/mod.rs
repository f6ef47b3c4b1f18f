//! Trait-basiertes Tool-System: Zustandsmaschinen für alle Bearbeitungsmodi.
//!
//! Jedes Tool implementiert den `EditorTool`-Trait mit eigenem State-Typ und
//! wird als `ToolSession` beim `ToolManager` registriert. Die Engine reicht
//! Eingaben an die Hooks des aktiven Tools weiter, inspiziert den State aber nie.
//! Netzwerk und Rendering laufen ausschließlich über `HostEffects`.

mod action;
/// Gemeinsame Bausteine: Bearbeitungszustand, Speichern/Löschen, Standard-Aktionen.
pub mod common;
mod context;
mod editor_tool;
mod engine;
/// Linien-Tool für Gleisabschnitte (Stützpunkte setzen, verschieben, löschen).
pub mod line_draw;
/// Punkt-Tool-Fabrik für Signale, Prellböcke und Gleisfreimelder.
pub mod point;
/// Bereichs-Tool-Fabrik für Geschwindigkeitsbeschränkungen und Elektrifizierungen.
pub mod range;
/// Fahrstraßen-Tool (Start/Ziel wählen, Kandidat übernehmen).
pub mod route;
/// Auswahl-Tool (Einzel- und Polygon-Auswahl).
pub mod selection;
/// Weichen-Tool (Typ wählen, Ports auf Gleisenden setzen).
pub mod switch;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{ActionView, ToolAction};
pub use context::{CommitRequest, HostEffects, ToolContext, ToolSwitch, TrackRequest};
pub use editor_tool::EditorTool;
pub use engine::{AnyToolSession, ToolManager, ToolSession};
pub use line_draw::LineDrawTool;
pub use point::{PointKind, PointTool};
pub use range::{RangeKind, RangeTool};
pub use route::{RouteBuilderTool, RouteCandidate, RouteRequest, Waypoint};
pub use selection::SelectionTool;
pub use switch::SwitchTool;

use serde::{Deserialize, Serialize};

use crate::core::ObjectType;
use crate::shared::EditorOptions;

// ── Tool-IDs ─────────────────────────────────────────────────────

/// ID des Auswahl-Tools
pub const SELECTION_TOOL_ID: &str = "selection";
/// ID des Gleis-Tools
pub const TRACK_TOOL_ID: &str = "track";
/// ID des Signal-Tools
pub const SIGNAL_TOOL_ID: &str = "signal";
/// ID des Prellbock-Tools
pub const BUFFER_STOP_TOOL_ID: &str = "buffer-stop";
/// ID des Gleisfreimelder-Tools
pub const DETECTOR_TOOL_ID: &str = "detector";
/// ID des Weichen-Tools
pub const SWITCH_TOOL_ID: &str = "switch";
/// ID des Geschwindigkeitsbeschränkungs-Tools
pub const SPEED_RESTRICTION_TOOL_ID: &str = "speed-restriction";
/// ID des Elektrifizierungs-Tools
pub const ELECTRIFICATION_TOOL_ID: &str = "electrification";
/// ID des Fahrstraßen-Tools
pub const ROUTE_TOOL_ID: &str = "route";

/// Tool, das Entities eines Objekttyps bearbeitet.
pub fn tool_id_for(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::TrackSegment => TRACK_TOOL_ID,
        ObjectType::Signal => SIGNAL_TOOL_ID,
        ObjectType::BufferStop => BUFFER_STOP_TOOL_ID,
        ObjectType::Detector => DETECTOR_TOOL_ID,
        ObjectType::Switch => SWITCH_TOOL_ID,
        ObjectType::SpeedRestriction => SPEED_RESTRICTION_TOOL_ID,
        ObjectType::Electrification => ELECTRIFICATION_TOOL_ID,
        ObjectType::Route => ROUTE_TOOL_ID,
    }
}

// ── Eingabe-Typen ────────────────────────────────────────────────

/// Tastatur-Eingabe, soweit für Tools relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Bricht die laufende Teil-Interaktion ab
    Escape,
    /// Bestätigen
    Enter,
    /// Entfernen
    Delete,
    /// Sonstiges Zeichen
    Character(char),
}

/// Modifier-Tasten zum Zeitpunkt eines Klicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift gedrückt (additive Auswahl)
    pub shift: bool,
    /// Ctrl/Cmd gedrückt
    pub ctrl: bool,
}

impl Modifiers {
    /// Nur Shift.
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
    };
}

/// Vom Tool gewünschter Mauszeiger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorStyle {
    /// Standard-Pfeil
    #[default]
    Default,
    /// Klickbares Objekt unter dem Cursor
    Pointer,
    /// Platzieren / Punkte setzen
    Crosshair,
    /// Greifbares Element unter dem Cursor
    Grab,
    /// Element wird gezogen
    Grabbing,
    /// Warten auf eine Antwort
    Wait,
    /// Aktion an dieser Stelle nicht möglich
    NotAllowed,
}

// ── Kataloge & Umgebung ──────────────────────────────────────────

/// Weichentyp aus dem Katalog: ID und Namen der Ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchType {
    /// Typ-ID (z.B. "point_switch")
    pub id: String,
    /// Port-Namen in Anzeigereihenfolge
    pub ports: Vec<String>,
}

/// Read-only Kataloge, aus denen Tools ihren Anfangszustand ableiten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogs {
    /// Verfügbare Weichentypen
    pub switch_types: Vec<SwitchType>,
}

impl Catalogs {
    /// Weichentyp zu einer ID.
    pub fn switch_type(&self, id: &str) -> Option<&SwitchType> {
        self.switch_types.iter().find(|t| t.id == id)
    }
}

/// Umgebung einer Tool-Sitzung: Optionen und Kataloge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolEnvironment {
    /// Laufzeit-Optionen
    pub options: EditorOptions,
    /// Kataloge
    pub catalogs: Catalogs,
}

impl ToolEnvironment {
    /// Umgebung mit Optionen und leeren Katalogen.
    pub fn new(options: EditorOptions) -> Self {
        Self {
            options,
            catalogs: Catalogs::default(),
        }
    }

    /// Setzt die Kataloge.
    pub fn with_catalogs(mut self, catalogs: Catalogs) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Infrastruktur, gegen die Anfragen laufen.
    pub fn infra_id(&self) -> u64 {
        self.options.infra_id
    }
}
