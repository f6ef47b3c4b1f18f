//! Geteilte Laufzeit-Optionen des Editors.

pub mod options;

pub use options::EditorOptions;
pub use options::{ENDPOINT_SNAP_RADIUS, PICK_RADIUS, SNAP_RADIUS};
