//! Lifecycle-Methoden des PointTool (EditorTool-Implementierung).

use glam::DVec2;

use super::state::{track_cache, Placement, PointState, PointTool};
use crate::app::operations::CommitReconciliation;
use crate::app::tools::common::{
    delete_action, handle_commit_result, nearest_track_among, reset_action, save_action,
    CommitOutcome, TrackSnap,
};
use crate::app::tools::{
    CursorStyle, EditorTool, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment,
};
use crate::core::{Entity, EntityError, Geometry, GeometryKind, RequestId, TrackCacheEntry};

impl EditorTool for PointTool {
    type State = PointState;

    fn id(&self) -> &str {
        self.kind.tool_id
    }

    fn label(&self) -> &str {
        self.kind.label
    }

    fn initial_state(&self, _env: &ToolEnvironment) -> PointState {
        PointState::new_point(self.kind)
    }

    fn state_for_entity(
        &self,
        _env: &ToolEnvironment,
        entity: Entity,
    ) -> anyhow::Result<Option<PointState>> {
        if entity.object_type != self.kind.object_type {
            return Ok(None);
        }
        if !matches!(entity.geometry, Geometry::Point(_) | Geometry::Null) {
            return Err(EntityError::GeometryKindMismatch {
                object_type: entity.object_type,
                expected: GeometryKind::Point,
                found: entity.geometry.kind(),
            }
            .into());
        }
        Ok(Some(PointState::existing(self.kind, entity)))
    }

    fn on_activate(&self, ctx: &mut ToolContext<'_, PointState>) -> anyhow::Result<()> {
        if let Some(track) = ctx.state().track_id()? {
            ctx.fetch_missing_tracks(&[track], track_cache);
        }
        Ok(())
    }

    fn on_pointer_down(
        &self,
        ctx: &mut ToolContext<'_, PointState>,
        pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        match ctx.state().placement {
            Placement::Moving => match ctx.state().snap.clone() {
                Some(snap) => place(ctx, snap),
                None => {
                    log::debug!("{}: kein Gleis in Reichweite", self.kind.label);
                    Ok(())
                }
            },
            Placement::Placed => {
                let pick_radius = ctx.options().pick_radius;
                if ctx
                    .state()
                    .position()
                    .is_some_and(|p| p.distance(pos) <= pick_radius)
                {
                    pick_up(ctx.state_mut());
                }
                Ok(())
            }
            Placement::Parked { .. } => Ok(()),
        }
    }

    fn on_entity_click(
        &self,
        ctx: &mut ToolContext<'_, PointState>,
        entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let state = ctx.state();
        if state.placement == Placement::Placed && entity.id == state.edit.entity.id {
            pick_up(ctx.state_mut());
            return Ok(());
        }
        self.on_pointer_down(ctx, pos, modifiers)
    }

    fn on_pointer_move(
        &self,
        ctx: &mut ToolContext<'_, PointState>,
        pos: DVec2,
        nearby: &[Entity],
    ) -> anyhow::Result<()> {
        if ctx.state().placement != Placement::Moving {
            return Ok(());
        }
        let snap = nearest_track_among(nearby, pos, ctx.options().snap_radius);
        let state = ctx.state_mut();
        state.edit.entity.geometry =
            Geometry::Point(snap.as_ref().map_or(pos, |s| s.coordinate));
        state.snap = snap;
        Ok(())
    }

    fn on_key_down(&self, ctx: &mut ToolContext<'_, PointState>, key: Key) -> anyhow::Result<()> {
        if key != Key::Escape {
            return Ok(());
        }
        let state = ctx.state_mut();
        match state.placement {
            Placement::Parked { .. } => state.placement = Placement::Moving,
            Placement::Moving => {
                if let Some(before) = state.before_move.take() {
                    state.edit.entity = before;
                    state.placement = Placement::Placed;
                    state.snap = None;
                }
            }
            Placement::Placed => {}
        }
        Ok(())
    }

    fn on_tracks_loaded(
        &self,
        ctx: &mut ToolContext<'_, PointState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<()> {
        let drift = ctx.options().drift_check();
        let update = ctx.state_mut().tracks.complete(request, result, drift);
        if update.is_stale() {
            log::debug!("Gleis-Antwort {request:?} ohne Wirkung");
        }

        let state = ctx.state_mut();
        let Placement::Parked {
            request: parked,
            snap,
        } = &state.placement
        else {
            return Ok(());
        };
        if *parked != request {
            return Ok(());
        }
        let snap = snap.clone();
        match state.tracks.linear(&snap.track).cloned() {
            Some(track) => state.place_on(&track, &snap),
            None => {
                log::warn!(
                    "{}: Gleis {} nicht verwendbar, Platzierung verworfen",
                    self.kind.label,
                    snap.track
                );
                state.placement = Placement::Moving;
            }
        }
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, PointState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        match handle_commit_result(ctx, request, result)? {
            CommitOutcome::Stale => Ok(None),
            CommitOutcome::Saved(reconciliation) => Ok(Some(reconciliation)),
            CommitOutcome::Deleted(reconciliation) => {
                ctx.set_state(PointState::new_point(self.kind));
                Ok(Some(reconciliation))
            }
        }
    }

    fn cursor_style(&self, state: &PointState, is_dragging: bool) -> CursorStyle {
        match state.placement {
            _ if is_dragging => CursorStyle::Grabbing,
            Placement::Moving if state.snap.is_some() => CursorStyle::Crosshair,
            Placement::Moving => CursorStyle::NotAllowed,
            Placement::Parked { .. } => CursorStyle::Wait,
            Placement::Placed => CursorStyle::Pointer,
        }
    }

    fn actions(&self, _env: &ToolEnvironment) -> Vec<ToolAction<PointState>> {
        let kind = self.kind;
        vec![
            save_action(|s: &PointState| s.placement == Placement::Placed),
            delete_action(),
            reset_action(move |_| PointState::new_point(kind)),
        ]
    }
}

/// Nimmt das platzierte Objekt wieder auf.
fn pick_up(state: &mut PointState) {
    state.before_move = Some(state.edit.entity.clone());
    state.placement = Placement::Moving;
}

/// Platziert das Objekt auf dem Gleis von `snap` oder parkt die Platzierung.
fn place(ctx: &mut ToolContext<'_, PointState>, snap: TrackSnap) -> anyhow::Result<()> {
    let entry = ctx.state().tracks.get(&snap.track).cloned();
    match entry {
        Some(TrackCacheEntry::Ready(cached)) => match cached.linear() {
            Some(track) => ctx.state_mut().place_on(track, &snap),
            None => log::warn!("Gleis {} ist degeneriert, keine Platzierung", snap.track),
        },
        Some(TrackCacheEntry::Loading(request)) => {
            ctx.state_mut().placement = Placement::Parked { request, snap };
        }
        None | Some(TrackCacheEntry::Error(_)) => {
            if let Some(request) = ctx.fetch_tracks(vec![snap.track.clone()], track_cache) {
                ctx.state_mut().placement = Placement::Parked { request, snap };
            }
        }
    }
    Ok(())
}
