//! Bearbeitungszustand eines Entities und der Commit-Kreislauf.
//!
//! Ablauf: `save`/`delete` baut die Operation, merkt sich die laufende Anfrage
//! und sendet den Commit über den Host. `handle_commit_result` gleicht die
//! Antwort ab, sofern sie zur laufenden Anfrage gehört.
//!
//! Zwei Commits für dasselbe Entity gleichzeitig sind ein Fehler des
//! Aufrufers: die Save-Aktion ist deaktiviert, solange eine Anfrage läuft.

use anyhow::bail;

use crate::app::operations::{
    build_delete, build_operation, CommitPayload, CommitReconciliation, Operation,
};
use crate::app::tools::{CommitRequest, ToolContext};
use crate::core::{Entity, EntityError, RequestId, TrackCache};

/// Laufender Commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    /// Anfrage-ID
    pub request: RequestId,
    /// Gesendeter Payload (für den Abgleich der Antwort)
    pub payload: CommitPayload,
}

/// Bearbeitetes Entity samt Snapshot vor der Bearbeitung.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEditState {
    /// Aktueller Bearbeitungsstand
    pub entity: Entity,
    /// Persistierter Stand (`None` für neue Entities)
    pub snapshot: Option<Entity>,
    /// Laufender Commit
    pub pending: Option<PendingCommit>,
}

impl EntityEditState {
    /// Bearbeitung eines neuen Entities.
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            snapshot: None,
            pending: None,
        }
    }

    /// Bearbeitung eines persistierten Entities (Snapshot = aktueller Stand).
    pub fn existing(entity: Entity) -> Self {
        Self {
            snapshot: Some(entity.clone()),
            entity,
            pending: None,
        }
    }

    /// `true` solange das Entity noch nie gespeichert wurde.
    pub fn is_new(&self) -> bool {
        self.entity.is_new()
    }

    /// `true` solange ein Commit läuft.
    pub fn is_saving(&self) -> bool {
        self.pending.is_some()
    }

    /// `true` wenn sich der Bearbeitungsstand vom Snapshot unterscheidet.
    pub fn is_dirty(&self) -> bool {
        self.snapshot.as_ref() != Some(&self.entity)
    }

    /// Operation, die den aktuellen Stand persistieren würde.
    pub fn operation(&self) -> Result<Operation, EntityError> {
        build_operation(self.snapshot.as_ref(), &self.entity)
    }
}

/// Tool-States, die genau ein Entity bearbeiten.
pub trait EditsEntity {
    /// Bearbeitungszustand
    fn edit(&self) -> &EntityEditState;
    /// Bearbeitungszustand (veränderbar)
    fn edit_mut(&mut self) -> &mut EntityEditState;

    /// Gleis-Cache des States, falls vorhanden. Wird nach einem Commit abgeglichen.
    fn track_cache_mut(&mut self) -> Option<&mut TrackCache> {
        None
    }
}

/// Speichert das bearbeitete Entity.
///
/// Ein Update ohne Änderungen wird nicht gesendet (`Ok(None)`).
pub fn save<S: EditsEntity>(ctx: &mut ToolContext<'_, S>) -> anyhow::Result<Option<RequestId>> {
    let operation = ctx.state().edit().operation()?;
    if operation.is_noop() {
        log::debug!(
            "Keine Änderungen an {}, Commit übersprungen",
            ctx.state().edit().entity.id
        );
        return Ok(None);
    }
    Ok(Some(submit(ctx, CommitPayload::from_operations([operation]))))
}

/// Löscht das bearbeitete Entity. Für neue Entities passiert nichts.
pub fn delete<S: EditsEntity>(ctx: &mut ToolContext<'_, S>) -> anyhow::Result<Option<RequestId>> {
    if ctx.state().edit().is_new() {
        return Ok(None);
    }
    let operation = build_delete(&ctx.state().edit().entity);
    Ok(Some(submit(ctx, CommitPayload::from_operations([operation]))))
}

fn submit<S: EditsEntity>(ctx: &mut ToolContext<'_, S>, payload: CommitPayload) -> RequestId {
    let request = ctx.next_request_id();
    let infra_id = ctx.infra_id();
    ctx.state_mut().edit_mut().pending = Some(PendingCommit {
        request,
        payload: payload.clone(),
    });
    log::info!(
        "Commit {request:?}: {} neu, {} geändert, {} gelöscht",
        payload.create.len(),
        payload.update.len(),
        payload.delete.len()
    );
    ctx.host().submit_commit(CommitRequest {
        request,
        infra_id,
        payload,
    });
    request
}

/// Ergebnis einer Commit-Antwort.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Antwort gehört nicht zur laufenden Anfrage, verworfen
    Stale,
    /// Entity gespeichert; ID ggf. ersetzt, Snapshot aktualisiert
    Saved(CommitReconciliation),
    /// Entity gelöscht
    Deleted(CommitReconciliation),
}

impl CommitOutcome {
    /// Abgleich, falls die Antwort übernommen wurde.
    pub fn into_reconciliation(self) -> Option<CommitReconciliation> {
        match self {
            CommitOutcome::Stale => None,
            CommitOutcome::Saved(rec) | CommitOutcome::Deleted(rec) => Some(rec),
        }
    }
}

/// Verarbeitet die Antwort auf einen Commit.
///
/// Bei Fehlern bleibt der Bearbeitungsstand unverändert (nur die laufende
/// Anfrage wird verworfen, damit erneut gespeichert werden kann) und der
/// Fehler geht an den Aufrufer.
pub fn handle_commit_result<S: EditsEntity>(
    ctx: &mut ToolContext<'_, S>,
    request: RequestId,
    result: Result<Vec<Entity>, String>,
) -> anyhow::Result<CommitOutcome> {
    let pending = match &ctx.state().edit().pending {
        Some(pending) if pending.request == request => pending.clone(),
        _ => {
            log::debug!("Veraltete Commit-Antwort {request:?} verworfen");
            return Ok(CommitOutcome::Stale);
        }
    };
    ctx.state_mut().edit_mut().pending = None;

    let response = match result {
        Ok(response) => response,
        Err(message) => {
            log::warn!("Commit {request:?} fehlgeschlagen: {message}");
            bail!("Commit fehlgeschlagen: {message}");
        }
    };
    let reconciliation = CommitReconciliation::from_response(&pending.payload, response)?;
    if !reconciliation.deleted.is_empty() {
        return Ok(CommitOutcome::Deleted(reconciliation));
    }

    let state = ctx.state_mut();
    if let Some(cache) = state.track_cache_mut() {
        cache.reconcile(reconciliation.remap.pairs(), &reconciliation.saved);
    }
    let edit = state.edit_mut();
    reconciliation.remap.rekey_entity(&mut edit.entity);
    edit.snapshot = Some(edit.entity.clone());
    log::info!("Entity {} gespeichert", edit.entity.id);
    Ok(CommitOutcome::Saved(reconciliation))
}
