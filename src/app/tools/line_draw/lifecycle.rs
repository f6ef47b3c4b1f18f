//! Lifecycle-Methoden des LineDrawTool (EditorTool-Implementierung).

use glam::DVec2;

use super::state::{GrabbedVertex, LineDrawState, LineDrawTool, LineMode};
use super::{MODE_ADD_ACTION, MODE_DELETE_ACTION, MODE_MOVE_ACTION};
use crate::app::operations::CommitReconciliation;
use crate::app::tools::common::{
    delete_action, handle_commit_result, nearest_vertex_within, reset_action, save_action,
    CommitOutcome,
};
use crate::app::tools::{
    CursorStyle, EditorTool, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment,
    TRACK_TOOL_ID,
};
use crate::core::{Entity, ObjectType, RequestId};

type Action = ToolAction<LineDrawState>;

impl EditorTool for LineDrawTool {
    type State = LineDrawState;

    fn id(&self) -> &str {
        TRACK_TOOL_ID
    }

    fn label(&self) -> &str {
        "Gleis"
    }

    fn initial_state(&self, _env: &ToolEnvironment) -> LineDrawState {
        LineDrawState::new_track()
    }

    fn state_for_entity(
        &self,
        _env: &ToolEnvironment,
        entity: Entity,
    ) -> anyhow::Result<Option<LineDrawState>> {
        if entity.object_type != ObjectType::TrackSegment {
            return Ok(None);
        }
        entity.line_points()?;
        entity.declared_length()?;
        Ok(Some(LineDrawState::existing_track(entity)))
    }

    fn on_pointer_down(
        &self,
        ctx: &mut ToolContext<'_, LineDrawState>,
        pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let pick_radius = ctx.options().pick_radius;
        let unit_scale = ctx.options().geometry_unit_scale;
        let state = ctx.state_mut();

        match state.mode {
            LineMode::AddPoints => {
                let points = state.points();
                let on_last = points.len() >= 2
                    && points
                        .last()
                        .is_some_and(|last| last.distance(pos) <= pick_radius);
                if on_last {
                    state.drawing = false;
                    return Ok(());
                }
                let mut points = points.to_vec();
                points.push(pos);
                state.set_points(points, unit_scale);
                state.drawing = true;
            }
            LineMode::MovePoints => {
                if let Some(grabbed) = state.grabbed.take() {
                    state.move_vertex(grabbed.index, pos, unit_scale);
                } else if let Some(index) =
                    nearest_vertex_within(state.points(), pos, pick_radius)
                {
                    let origin = state.points()[index];
                    state.grabbed = Some(GrabbedVertex { index, origin });
                }
            }
            LineMode::DeletePoints => {
                // eine Linie mit genau zwei Punkten bleibt erhalten
                if state.points().len() == 2 {
                    return Ok(());
                }
                if let Some(index) = nearest_vertex_within(state.points(), pos, pick_radius) {
                    let mut points = state.points().to_vec();
                    points.remove(index);
                    state.set_points(points, unit_scale);
                }
            }
        }
        Ok(())
    }

    fn on_pointer_move(
        &self,
        ctx: &mut ToolContext<'_, LineDrawState>,
        pos: DVec2,
        _nearby: &[Entity],
    ) -> anyhow::Result<()> {
        let unit_scale = ctx.options().geometry_unit_scale;
        let state = ctx.state_mut();
        state.cursor = Some(pos);
        if let Some(grabbed) = state.grabbed {
            state.move_vertex(grabbed.index, pos, unit_scale);
        }
        Ok(())
    }

    fn on_key_down(
        &self,
        ctx: &mut ToolContext<'_, LineDrawState>,
        key: Key,
    ) -> anyhow::Result<()> {
        let unit_scale = ctx.options().geometry_unit_scale;
        let state = ctx.state_mut();
        match key {
            Key::Escape => {
                if let Some(grabbed) = state.grabbed.take() {
                    state.move_vertex(grabbed.index, grabbed.origin, unit_scale);
                } else {
                    state.drawing = false;
                }
            }
            Key::Enter => state.drawing = false,
            _ => {}
        }
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, LineDrawState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        match handle_commit_result(ctx, request, result)? {
            CommitOutcome::Stale => Ok(None),
            CommitOutcome::Saved(reconciliation) => {
                let state = ctx.state_mut();
                state.auto_length = false;
                state.drawing = false;
                Ok(Some(reconciliation))
            }
            CommitOutcome::Deleted(reconciliation) => {
                ctx.set_state(LineDrawState::new_track());
                Ok(Some(reconciliation))
            }
        }
    }

    fn cursor_style(&self, state: &LineDrawState, is_dragging: bool) -> CursorStyle {
        if is_dragging || state.grabbed.is_some() {
            return CursorStyle::Grabbing;
        }
        match state.mode {
            LineMode::AddPoints => CursorStyle::Crosshair,
            LineMode::MovePoints => CursorStyle::Grab,
            LineMode::DeletePoints if state.points().len() == 2 => CursorStyle::NotAllowed,
            LineMode::DeletePoints => CursorStyle::Pointer,
        }
    }

    fn actions(&self, _env: &ToolEnvironment) -> Vec<Action> {
        vec![
            mode_action(MODE_ADD_ACTION, "Punkte hinzufügen", LineMode::AddPoints),
            mode_action(MODE_MOVE_ACTION, "Punkte verschieben", LineMode::MovePoints),
            mode_action(MODE_DELETE_ACTION, "Punkte löschen", LineMode::DeletePoints),
            save_action(|s: &LineDrawState| s.points().len() >= 2 && s.grabbed.is_none()),
            delete_action(),
            reset_action(|_| LineDrawState::new_track()),
        ]
    }
}

fn mode_action(id: &str, label: &str, mode: LineMode) -> Action {
    Action::new(id, label, move |ctx| {
        ctx.update_state(|old| LineDrawState {
            mode,
            grabbed: None,
            ..old.clone()
        });
        Ok(())
    })
    .enabled_when(move |s: &LineDrawState| s.mode != mode)
}
