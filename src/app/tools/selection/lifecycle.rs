//! Lifecycle-Methoden des SelectionTool (EditorTool-Implementierung).

use anyhow::bail;
use glam::DVec2;

use super::state::{SelectionMode, SelectionState, SelectionTool};
use super::{
    CLEAR_SELECTION_ACTION, CLOSE_POLYGON_ACTION, DELETE_SELECTION_ACTION, EDIT_ACTION,
    MODE_POLYGON_ACTION, MODE_SINGLE_ACTION,
};
use crate::app::operations::{build_delete, CommitPayload, CommitReconciliation};
use crate::app::tools::common::PendingCommit;
use crate::app::tools::{
    tool_id_for, CommitRequest, CursorStyle, EditorTool, Key, Modifiers, ToolAction,
    ToolContext, ToolEnvironment, ToolSwitch, SELECTION_TOOL_ID,
};
use crate::core::{Entity, RequestId};

type Action = ToolAction<SelectionState>;

impl EditorTool for SelectionTool {
    type State = SelectionState;

    fn id(&self) -> &str {
        SELECTION_TOOL_ID
    }

    fn label(&self) -> &str {
        "Auswahl"
    }

    fn initial_state(&self, _env: &ToolEnvironment) -> SelectionState {
        SelectionState::default()
    }

    fn on_pointer_down(
        &self,
        ctx: &mut ToolContext<'_, SelectionState>,
        pos: DVec2,
        modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let state = ctx.state_mut();
        match state.mode {
            SelectionMode::Polygon => state.polygon.push(pos),
            SelectionMode::Single if !modifiers.shift => state.selection.clear(),
            SelectionMode::Single => {}
        }
        Ok(())
    }

    fn on_entity_click(
        &self,
        ctx: &mut ToolContext<'_, SelectionState>,
        entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let state = ctx.state_mut();
        match state.mode {
            SelectionMode::Polygon => state.polygon.push(pos),
            SelectionMode::Single if modifiers.shift => state.toggle(entity),
            SelectionMode::Single => state.select_only(entity),
        }
        Ok(())
    }

    fn on_pointer_move(
        &self,
        ctx: &mut ToolContext<'_, SelectionState>,
        _pos: DVec2,
        nearby: &[Entity],
    ) -> anyhow::Result<()> {
        ctx.state_mut().hovered = nearby.first().map(|e| e.id.clone());
        Ok(())
    }

    fn on_key_down(
        &self,
        ctx: &mut ToolContext<'_, SelectionState>,
        key: Key,
    ) -> anyhow::Result<()> {
        match key {
            Key::Escape => {
                let state = ctx.state_mut();
                if state.polygon.is_empty() {
                    state.selection.clear();
                } else {
                    state.polygon.clear();
                }
            }
            Key::Delete => {
                if ctx.state().pending_delete.is_none() {
                    delete_selection(ctx)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, SelectionState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        let pending = match &ctx.state().pending_delete {
            Some(pending) if pending.request == request => pending.clone(),
            _ => {
                log::debug!("Veraltete Commit-Antwort {request:?} verworfen");
                return Ok(None);
            }
        };
        ctx.state_mut().pending_delete = None;
        let response = match result {
            Ok(response) => response,
            Err(message) => {
                log::warn!("Löschen fehlgeschlagen: {message}");
                bail!("Löschen fehlgeschlagen: {message}");
            }
        };
        let reconciliation = CommitReconciliation::from_response(&pending.payload, response)?;
        ctx.state_mut()
            .selection
            .retain(|e| !reconciliation.deleted.contains(&e.id));
        log::info!("{} Entities gelöscht", reconciliation.deleted.len());
        Ok(Some(reconciliation))
    }

    fn cursor_style(&self, state: &SelectionState, is_dragging: bool) -> CursorStyle {
        if is_dragging {
            CursorStyle::Grabbing
        } else if state.mode == SelectionMode::Polygon {
            CursorStyle::Crosshair
        } else if state.hovered.is_some() {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        }
    }

    fn actions(&self, _env: &ToolEnvironment) -> Vec<Action> {
        vec![
            Action::new(MODE_SINGLE_ACTION, "Einzelauswahl", |ctx| {
                ctx.update_state(|old| SelectionState {
                    mode: SelectionMode::Single,
                    polygon: Vec::new(),
                    ..old.clone()
                });
                Ok(())
            })
            .enabled_when(|s: &SelectionState| s.mode != SelectionMode::Single),
            Action::new(MODE_POLYGON_ACTION, "Polygon-Auswahl", |ctx| {
                ctx.state_mut().mode = SelectionMode::Polygon;
                Ok(())
            })
            .enabled_when(|s: &SelectionState| s.mode != SelectionMode::Polygon),
            Action::new(CLOSE_POLYGON_ACTION, "Polygon schließen", close_polygon)
                .enabled_when(|s: &SelectionState| s.polygon.len() >= 3)
                .hidden_when(|s: &SelectionState| s.mode != SelectionMode::Polygon),
            Action::new(DELETE_SELECTION_ACTION, "Auswahl löschen", |ctx| {
                delete_selection(ctx).map(|_| ())
            })
            .enabled_when(|s: &SelectionState| {
                s.pending_delete.is_none() && s.persisted().next().is_some()
            }),
            Action::new(EDIT_ACTION, "Bearbeiten", edit_selected)
                .enabled_when(|s: &SelectionState| s.selection.len() == 1),
            Action::new(CLEAR_SELECTION_ACTION, "Auswahl aufheben", |ctx| {
                ctx.state_mut().selection.clear();
                Ok(())
            })
            .enabled_when(|s: &SelectionState| !s.selection.is_empty()),
        ]
    }
}

/// Schließt das Polygon und übernimmt die enthaltenen Entities in die Auswahl.
///
/// Mit weniger als drei Ecken passiert nichts.
fn close_polygon(ctx: &mut ToolContext<'_, SelectionState>) -> anyhow::Result<()> {
    if ctx.state().polygon.len() < 3 {
        return Ok(());
    }
    let polygon = std::mem::take(&mut ctx.state_mut().polygon);
    let contained = ctx.host().entities_in_polygon(&polygon);
    log::debug!("Polygon mit {} Ecken: {} Treffer", polygon.len(), contained.len());
    ctx.state_mut().extend(contained);
    Ok(())
}

/// Sendet eine Delete-Operation je persistiertem, ausgewähltem Entity.
fn delete_selection(
    ctx: &mut ToolContext<'_, SelectionState>,
) -> anyhow::Result<Option<RequestId>> {
    let payload = CommitPayload::from_operations(ctx.state().persisted().map(build_delete));
    if payload.is_empty() {
        return Ok(None);
    }
    let request = ctx.next_request_id();
    let infra_id = ctx.infra_id();
    log::info!("Commit {request:?}: {} Entities löschen", payload.delete.len());
    ctx.state_mut().pending_delete = Some(PendingCommit {
        request,
        payload: payload.clone(),
    });
    ctx.host().submit_commit(CommitRequest {
        request,
        infra_id,
        payload,
    });
    Ok(Some(request))
}

fn edit_selected(ctx: &mut ToolContext<'_, SelectionState>) -> anyhow::Result<()> {
    let [entity] = ctx.state().selection.as_slice() else {
        return Ok(());
    };
    let switch = ToolSwitch {
        tool_id: tool_id_for(entity.object_type).to_string(),
        entity: entity.clone(),
    };
    ctx.host().switch_tool(switch);
    Ok(())
}
