//! Lifecycle-Methoden des SwitchTool (EditorTool-Implementierung).

use glam::DVec2;

use super::state::{SwitchInteraction, SwitchState, SwitchTool};
use super::{CHOOSE_TYPE_PREFIX, PICK_PORT_PREFIX};
use crate::app::operations::CommitReconciliation;
use crate::app::tools::common::{
    delete_action, handle_commit_result, reset_action, save_action, CommitOutcome,
};
use crate::app::tools::{
    CursorStyle, EditorTool, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment,
    SWITCH_TOOL_ID,
};
use crate::core::{EndpointIndex, Entity, ObjectType, RequestId};

type Action = ToolAction<SwitchState>;

impl EditorTool for SwitchTool {
    type State = SwitchState;

    fn id(&self) -> &str {
        SWITCH_TOOL_ID
    }

    fn label(&self) -> &str {
        "Weiche"
    }

    fn initial_state(&self, env: &ToolEnvironment) -> SwitchState {
        SwitchState::new_switch(env.catalogs.switch_types.clone())
    }

    fn state_for_entity(
        &self,
        env: &ToolEnvironment,
        entity: Entity,
    ) -> anyhow::Result<Option<SwitchState>> {
        if entity.object_type != ObjectType::Switch {
            return Ok(None);
        }
        let state = SwitchState::existing(env.catalogs.switch_types.clone(), entity);
        state.ports()?;
        if state.switch_type().is_none() {
            log::warn!(
                "Weiche {}: Typ nicht im Katalog",
                state.edit.entity.id
            );
        }
        Ok(Some(state))
    }

    fn on_pointer_down(
        &self,
        ctx: &mut ToolContext<'_, SwitchState>,
        _pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        let state = ctx.state_mut();
        let SwitchInteraction::SelectingNode { port, hover } = &state.interaction else {
            return Ok(());
        };
        let Some(node) = hover.clone() else {
            log::debug!("Port {port}: kein Gleisende in Reichweite");
            return Ok(());
        };
        let port = port.clone();
        state.assign_port(&port, &node)?;
        state.interaction = SwitchInteraction::Idle;
        log::debug!("Port {port} → {} ({:?})", node.track, node.endpoint);
        Ok(())
    }

    fn on_pointer_move(
        &self,
        ctx: &mut ToolContext<'_, SwitchState>,
        pos: DVec2,
        nearby: &[Entity],
    ) -> anyhow::Result<()> {
        let radius = ctx.options().endpoint_snap_radius;
        if let SwitchInteraction::SelectingNode { hover, .. } = &mut ctx.state_mut().interaction {
            *hover = EndpointIndex::from_tracks(nearby).nearest_within(pos, radius);
        }
        Ok(())
    }

    fn on_key_down(&self, ctx: &mut ToolContext<'_, SwitchState>, key: Key) -> anyhow::Result<()> {
        if key == Key::Escape {
            ctx.state_mut().interaction = SwitchInteraction::Idle;
        }
        Ok(())
    }

    fn on_commit_result(
        &self,
        ctx: &mut ToolContext<'_, SwitchState>,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        match handle_commit_result(ctx, request, result)? {
            CommitOutcome::Stale => Ok(None),
            CommitOutcome::Saved(reconciliation) => Ok(Some(reconciliation)),
            CommitOutcome::Deleted(reconciliation) => {
                let switch_types = ctx.env().catalogs.switch_types.clone();
                ctx.set_state(SwitchState::new_switch(switch_types));
                Ok(Some(reconciliation))
            }
        }
    }

    fn cursor_style(&self, state: &SwitchState, is_dragging: bool) -> CursorStyle {
        match &state.interaction {
            _ if is_dragging => CursorStyle::Grabbing,
            SwitchInteraction::SelectingNode { hover: Some(_), .. } => CursorStyle::Crosshair,
            SwitchInteraction::SelectingNode { hover: None, .. } => CursorStyle::NotAllowed,
            SwitchInteraction::Idle => CursorStyle::Default,
        }
    }

    fn actions(&self, env: &ToolEnvironment) -> Vec<Action> {
        let mut actions = vec![
            save_action(|s: &SwitchState| s.is_complete()),
            delete_action(),
            reset_action(|env| SwitchState::new_switch(env.catalogs.switch_types.clone())),
        ];

        for switch_type in &env.catalogs.switch_types {
            let type_id = switch_type.id.clone();
            actions.push(Action::new(
                format!("{CHOOSE_TYPE_PREFIX}{type_id}"),
                switch_type.id.clone(),
                move |ctx| {
                    ctx.state_mut().choose_type(&type_id);
                    Ok(())
                },
            ));
        }

        // ein Eintrag pro Port-Name über alle Typen, versteckt wenn der Typ ihn nicht hat
        let mut port_names: Vec<&String> = Vec::new();
        for port in env.catalogs.switch_types.iter().flat_map(|t| &t.ports) {
            if !port_names.contains(&port) {
                port_names.push(port);
            }
        }
        for port in port_names {
            let selecting = port.clone();
            let visible = port.clone();
            actions.push(
                Action::new(format!("{PICK_PORT_PREFIX}{port}"), format!("Port {port}"), move |ctx| {
                    ctx.state_mut().interaction = SwitchInteraction::SelectingNode {
                        port: selecting.clone(),
                        hover: None,
                    };
                    Ok(())
                })
                .hidden_when(move |s: &SwitchState| !s.has_port(&visible)),
            );
        }
        actions
    }
}
