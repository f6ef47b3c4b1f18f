//! Interaktions-Kern des Infrastruktur-Editors.
//!
//! Tool-Zustandsmaschinen, lineare Referenzierung entlang von Gleisen und
//! Diff-basierte Changesets. Rendering, UI und Backend sind Sache des Hosts;
//! alle Aufrufe nach außen laufen über [`app::tools::HostEffects`].

pub mod app;
pub mod core;
pub mod shared;

pub use crate::app::{
    build_operation, AnyToolSession, CommitPayload, EditorTool, EntityStore, HostEffects,
    Operation, ToolManager, ToolSession,
};
pub use crate::core::{
    flatten, nest, Entity, EntityId, Geometry, LinearTrack, ObjectType, TrackCache, TrackRange,
};
pub use crate::shared::EditorOptions;
