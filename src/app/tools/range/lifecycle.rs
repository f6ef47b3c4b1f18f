//! Lifecycle-Methoden des RangeTool (EditorTool-Implementierung).

use glam::DVec2;

use super::drag::{cancel, drag_to, grab_or_release};
use super::state::{track_cache, RangeInteraction, RangeState, RangeTool};
use super::{ADD_MARKER_SIGN_ACTION, DEFAULT_SIGN_KIND};
use crate::app::operations::CommitReconciliation;
use crate::app::tools::common::{
    delete_action, handle_commit_result, reset_action, save_action, CommitOutcome,
};
use crate::app::tools::{
    CursorStyle, EditorTool, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment,
};
use crate::core::{
    Entity, MarkerSign, ObjectType, RequestId, SignSide, TrackRange,
};

type Action = ToolAction<RangeState>;

impl EditorTool for RangeTool {
    type State = RangeState;

    fn id(&self) -> &str {
        self.kind.tool_id
    }

    fn label(&self) -> &str {
        self.kind.label
    }

    fn initial_state(&self, _env: &ToolEnvironment) -> RangeState {
        RangeState::new_range(self.kind)
    }

    fn state_for_entity(
        &self,
        _env: &ToolEnvironment,
        entity: Entity,
    ) -> anyhow::Result<Option<RangeState>> {
        if entity.object_type != self.kind.object_type {
            return Ok(None);
        }
        entity.track_ranges()?;
        if self.kind.has_marker_signs {
            entity.marker_signs()?;
        }
        Ok(Some(RangeState::existing(self.kind, entity)))
    }

    fn on_activate(&self, ctx: &mut ToolContext<'_, RangeState>) -> anyhow::Result<()> {
        let tracks = ctx.state().referenced_tracks()?;
        ctx.fetch_missing_tracks(&tracks, track_cache);
        Ok(())
    }

    fn on_pointer_down(
        &self,
        ctx: &mut ToolContext<'_, RangeState>,
        pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let pick_radius = ctx.options().pick_radius;
        grab_or_release(ctx.state_mut(), pos, pick_radius)?;
        Ok(())
    }

    fn on_entity_click(
        &self,
        ctx: &mut ToolContext<'_, RangeState>,
        entity: &Entity,
        pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let pick_radius = ctx.options().pick_radius;
        if grab_or_release(ctx.state_mut(), pos, pick_radius)? {
            return Ok(());
        }
        if entity.object_type == ObjectType::TrackSegment {
            toggle_track(ctx.state_mut(), entity)?;
        }
        Ok(())
    }

    fn on_pointer_move(
        &self,
        ctx: &mut ToolContext<'_, RangeState>,
        pos: DVec2,
        nearby: &[Entity],
    ) -> anyhow::Result<()> {
        let state = ctx.state_mut();
        if state.is_dragging() {
            drag_to(state, pos)?;
        } else {
            state.hovered_track = nearby
                .iter()
                .find(|e| e.object_type == ObjectType::TrackSegment)
                .map(|e| e.id.clone());
        }
        Ok(())
    }

    fn on_key_down(&self, ctx: &mut ToolContext<'_, RangeState>, key: Key) -> anyhow::Result<()> {
        if key == Key::Escape {
            cancel(ctx.state_mut())?;
        }
        Ok(())
    }

    fn on_tracks_loaded(
        &self,
        ctx: &mut ToolContext<'_, RangeState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<()> {
        let drift = ctx.options().drift_check();
        let state = ctx.state_mut();
        let update = state.tracks.complete(request, result, drift);
        if update.is_stale() {
            log::debug!("Gleis-Antwort {request:?} ohne Wirkung");
            return Ok(());
        }
        state.refresh_geometry()?;
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, RangeState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        match handle_commit_result(ctx, request, result)? {
            CommitOutcome::Stale => Ok(None),
            CommitOutcome::Saved(reconciliation) => Ok(Some(reconciliation)),
            CommitOutcome::Deleted(reconciliation) => {
                ctx.set_state(RangeState::new_range(self.kind));
                Ok(Some(reconciliation))
            }
        }
    }

    fn cursor_style(&self, state: &RangeState, is_dragging: bool) -> CursorStyle {
        if is_dragging || state.is_dragging() {
            CursorStyle::Grabbing
        } else if state.hovered_track.is_some() {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        }
    }

    fn actions(&self, _env: &ToolEnvironment) -> Vec<Action> {
        let kind = self.kind;
        vec![
            save_action(|s: &RangeState| {
                !s.is_dragging() && s.ranges().is_ok_and(|ranges| !ranges.is_empty())
            }),
            delete_action(),
            reset_action(move |_| RangeState::new_range(kind)),
            Action::new(ADD_MARKER_SIGN_ACTION, "Schild hinzufügen", add_marker_sign)
                .enabled_when(|s: &RangeState| {
                    !s.is_dragging() && s.ranges().is_ok_and(|ranges| !ranges.is_empty())
                })
                .hidden_when(|s: &RangeState| !s.kind.has_marker_signs),
        ]
    }
}

/// Schaltet einen vollen Bereich auf dem geklickten Gleis ein bzw. aus.
fn toggle_track(state: &mut RangeState, track: &Entity) -> anyhow::Result<()> {
    let mut ranges = state.ranges()?;
    if ranges.iter().any(|r| r.track == track.id) {
        ranges.retain(|r| r.track != track.id);
        log::debug!("Bereiche auf Gleis {} entfernt", track.id);
    } else {
        if state.tracks.ready(&track.id).is_none() {
            state.tracks.insert_ready(track.clone())?;
        }
        let declared_length = match state.tracks.linear(&track.id) {
            Some(linear) => linear.declared_length(),
            None => track.declared_length()?,
        };
        ranges.push(TrackRange::full(track.id.clone(), declared_length));
        log::debug!("Voller Bereich auf Gleis {} hinzugefügt", track.id);
    }
    state.set_ranges(&ranges)?;
    Ok(())
}

/// Legt ein Schild am Anfang des ersten Bereichs an und nimmt es auf.
fn add_marker_sign(ctx: &mut ToolContext<'_, RangeState>) -> anyhow::Result<()> {
    let state = ctx.state_mut();
    let Some(first) = state.ranges()?.into_iter().next() else {
        return Ok(());
    };
    let sign = MarkerSign {
        track: first.track,
        position: first.begin.min(first.end),
        side: SignSide::default(),
        kind: DEFAULT_SIGN_KIND.to_string(),
        value: None,
    };
    let mut signs = state.signs()?;
    signs.push(sign);
    state.set_signs(&signs)?;
    state.interaction = RangeInteraction::MovingMarkerSign {
        sign_index: signs.len() - 1,
        before: None,
    };
    Ok(())
}
