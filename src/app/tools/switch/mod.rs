//! Weichen-Tool: Weichentyp wählen und jeden Port auf ein Gleisende setzen.
//!
//! `pick_port:<port>` startet die Auswahl eines Gleisendes. Mausbewegungen
//! rasten auf das nächste Gleisende der Features in Cursornähe ein
//! (KD-Tree, `endpoint_snap_radius`), ein Klick weist es dem Port zu.

mod lifecycle;
mod state;

pub use state::{PortAssignment, SwitchInteraction, SwitchState, SwitchTool};

/// Property: ID des Weichentyps
pub const SWITCH_TYPE_KEY: &str = "switch_type";
/// Property: Port-Zuordnungen `{port: {track, endpoint}}`
pub const PORTS_KEY: &str = "ports";
/// Präfix der Aktionen zur Typwahl (`choose_type:<typ>`)
pub const CHOOSE_TYPE_PREFIX: &str = "choose_type:";
/// Präfix der Aktionen zur Port-Auswahl (`pick_port:<port>`)
pub const PICK_PORT_PREFIX: &str = "pick_port:";
