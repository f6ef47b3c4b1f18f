//! Gemeinsame Bausteine der Bearbeitungs-Tools.
//!
//! Aufgeteilt in:
//! - `edit`     — EntityEditState, Speichern/Löschen, Commit-Abgleich
//! - `actions`  — Standard-Aktionen (save, delete, reset)
//! - `geometry` — Picking-Hilfen (Stützpunkte, Gleise in Cursornähe)

mod actions;
mod edit;
mod geometry;

pub use actions::{
    delete_action, reset_action, save_action, DELETE_ACTION, RESET_ACTION, SAVE_ACTION,
};
pub use edit::{
    delete, handle_commit_result, save, CommitOutcome, EditsEntity, EntityEditState,
    PendingCommit,
};
pub use geometry::{nearest_track_among, nearest_vertex_within, TrackSnap};
