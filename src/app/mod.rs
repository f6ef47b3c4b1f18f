//! Application-Layer: Tools, Operation-Builder und Entity-Store.

pub mod entity_store;
pub mod operations;
pub mod tools;

pub use entity_store::EntityStore;
pub use operations::{
    apply_patch, build_delete, build_operation, diff, CommitPayload, CommitReconciliation,
    IdRemap, Operation, Patch, PatchOperation,
};
pub use tools::{
    AnyToolSession, EditorTool, HostEffects, ToolContext, ToolEnvironment, ToolManager,
    ToolSession,
};
