//! Diff & Operation-Builder: strukturelle Patches, persistierbare Operationen,
//! Commit-Payload und Abgleich der Backend-Antwort.

mod builder;
mod patch;

pub use builder::{
    build_delete, build_operation, CommitPayload, CommitReconciliation, IdRemap, Operation,
    ATOMIC_KEYS, ID_KEY,
};
pub use patch::{
    apply_patch, diff, diff_with_atomic, escape_segment, Patch, PatchError, PatchOperation,
};
