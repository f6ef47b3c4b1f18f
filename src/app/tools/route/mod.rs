//! Fahrstraßen-Tool: Start- und Zielpunkt wählen, Kandidaten der externen
//! Wegsuche anzeigen und einen davon übernehmen.

mod lifecycle;
mod state;

pub use state::{
    RouteBuilderTool, RouteCandidate, RouteRequest, RouteSearch, RouteState, Waypoint,
    WaypointRole,
};

/// Property: Startpunkt
pub const ENTRY_POINT_KEY: &str = "entry_point";
/// Property: Zielpunkt
pub const EXIT_POINT_KEY: &str = "exit_point";
/// Property: Weichenstellungen `{weiche: stellung}`
pub const SWITCHES_DIRECTIONS_KEY: &str = "switches_directions";
/// Property: Gleisfreimelder, die die Fahrstraße auflösen
pub const RELEASE_DETECTORS_KEY: &str = "release_detectors";

/// Aktion: Startpunkt wählen
pub const PICK_ENTRY_ACTION: &str = "pick_entry";
/// Aktion: Zielpunkt wählen
pub const PICK_EXIT_ACTION: &str = "pick_exit";
/// Präfix der Aktionen zur Kandidatenwahl (`choose_candidate:<i>`)
pub const CHOOSE_CANDIDATE_PREFIX: &str = "choose_candidate:";

/// Höchstzahl angebotener Kandidaten
pub const MAX_ROUTE_CANDIDATES: usize = 8;
