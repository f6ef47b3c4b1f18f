//! Lifecycle-Methoden des RouteBuilderTool (EditorTool-Implementierung).

use glam::DVec2;

use super::state::{
    RouteBuilderTool, RouteCandidate, RouteRequest, RouteSearch, RouteState, Waypoint,
    WaypointRole,
};
use super::{
    CHOOSE_CANDIDATE_PREFIX, MAX_ROUTE_CANDIDATES, PICK_ENTRY_ACTION, PICK_EXIT_ACTION,
};
use crate::app::operations::CommitReconciliation;
use crate::app::tools::common::{
    delete_action, handle_commit_result, reset_action, save_action, CommitOutcome,
};
use crate::app::tools::{
    CursorStyle, EditorTool, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment,
    ROUTE_TOOL_ID,
};
use crate::core::{Entity, ObjectType, RequestId};

type Action = ToolAction<RouteState>;

impl EditorTool for RouteBuilderTool {
    type State = RouteState;

    fn id(&self) -> &str {
        ROUTE_TOOL_ID
    }

    fn label(&self) -> &str {
        "Fahrstraße"
    }

    fn initial_state(&self, _env: &ToolEnvironment) -> RouteState {
        RouteState::new_route()
    }

    fn state_for_entity(
        &self,
        _env: &ToolEnvironment,
        entity: Entity,
    ) -> anyhow::Result<Option<RouteState>> {
        if entity.object_type != ObjectType::Route {
            return Ok(None);
        }
        let state = RouteState::existing(entity);
        state.entry()?;
        state.exit()?;
        Ok(Some(state))
    }

    fn on_entity_click(
        &self,
        ctx: &mut ToolContext<'_, RouteState>,
        entity: &Entity,
        _pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let Some(role) = ctx.state().picking else {
            return Ok(());
        };
        let Some(waypoint) = Waypoint::for_entity(entity) else {
            log::debug!(
                "{:?} {} taugt nicht als Start/Ziel",
                entity.object_type,
                entity.id
            );
            return Ok(());
        };
        let state = ctx.state_mut();
        state.set_waypoint(role, &waypoint)?;
        state.picking = None;

        let (Some(entry), Some(exit)) = (ctx.state().entry()?, ctx.state().exit()?) else {
            return Ok(());
        };
        let request = ctx.next_request_id();
        let infra_id = ctx.infra_id();
        ctx.state_mut().search = RouteSearch::Searching(request);
        log::info!("Wegsuche {request:?}: {} → {}", entry.id, exit.id);
        ctx.host().request_routes(RouteRequest {
            request,
            infra_id,
            entry,
            exit,
        });
        Ok(())
    }

    fn on_key_down(&self, ctx: &mut ToolContext<'_, RouteState>, key: Key) -> anyhow::Result<()> {
        if key == Key::Escape {
            ctx.state_mut().picking = None;
        }
        Ok(())
    }

    fn on_routes_found(
        &self,
        ctx: &mut ToolContext<'_, RouteState>,
        request: RequestId,
        result: Result<Vec<RouteCandidate>, String>,
    ) -> anyhow::Result<()> {
        if ctx.state().search != RouteSearch::Searching(request) {
            log::debug!("Veraltete Wegsuche {request:?} verworfen");
            return Ok(());
        }
        ctx.state_mut().search = match result {
            Ok(mut candidates) => {
                if candidates.len() > MAX_ROUTE_CANDIDATES {
                    log::debug!(
                        "{} Kandidaten, nur die ersten {MAX_ROUTE_CANDIDATES} angeboten",
                        candidates.len()
                    );
                    candidates.truncate(MAX_ROUTE_CANDIDATES);
                }
                RouteSearch::Found(candidates)
            }
            Err(message) => {
                log::warn!("Wegsuche {request:?} fehlgeschlagen: {message}");
                RouteSearch::Failed(message)
            }
        };
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, RouteState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        match handle_commit_result(ctx, request, result)? {
            CommitOutcome::Stale => Ok(None),
            CommitOutcome::Saved(reconciliation) => Ok(Some(reconciliation)),
            CommitOutcome::Deleted(reconciliation) => {
                ctx.set_state(RouteState::new_route());
                Ok(Some(reconciliation))
            }
        }
    }

    fn cursor_style(&self, state: &RouteState, is_dragging: bool) -> CursorStyle {
        if is_dragging {
            CursorStyle::Grabbing
        } else if state.picking.is_some() {
            CursorStyle::Crosshair
        } else if state.is_searching() {
            CursorStyle::Wait
        } else {
            CursorStyle::Default
        }
    }

    fn actions(&self, _env: &ToolEnvironment) -> Vec<Action> {
        let mut actions = vec![
            save_action(|s: &RouteState| s.has_path && !s.is_searching()),
            delete_action(),
            reset_action(|_| RouteState::new_route()),
            Action::new(PICK_ENTRY_ACTION, "Startpunkt wählen", |ctx| {
                ctx.state_mut().picking = Some(WaypointRole::Entry);
                Ok(())
            }),
            Action::new(PICK_EXIT_ACTION, "Zielpunkt wählen", |ctx| {
                ctx.state_mut().picking = Some(WaypointRole::Exit);
                Ok(())
            }),
        ];
        for index in 0..MAX_ROUTE_CANDIDATES {
            actions.push(
                Action::new(
                    format!("{CHOOSE_CANDIDATE_PREFIX}{index}"),
                    format!("Kandidat {}", index + 1),
                    move |ctx| Ok(ctx.state_mut().choose_candidate(index)?),
                )
                .hidden_when(move |s: &RouteState| index >= s.candidates().len()),
            );
        }
        actions
    }
}
