//! Tool-Engine: Sitzungen (Tool + State) und der ToolManager.

use std::any::Any;

use glam::DVec2;

use super::point::PointKind;
use super::range::RangeKind;
use super::route::RouteCandidate;
use super::{
    ActionView, CursorStyle, EditorTool, HostEffects, Key, LineDrawTool, Modifiers, PointTool,
    RangeTool, RouteBuilderTool, SelectionTool, SwitchTool, ToolAction, ToolContext,
    ToolEnvironment,
};
use crate::app::entity_store::EntityStore;
use crate::app::operations::CommitReconciliation;
use crate::core::{Entity, ObjectType, RequestId};

/// Ein Tool samt seinem State und dem Anfrage-Zähler der Sitzung.
///
/// Der Zähler wird beim Reset nicht zurückgesetzt: eine verspätete Antwort aus
/// der Zeit vor dem Reset kann so nie eine neue Anfrage-ID treffen.
pub struct ToolSession<T: EditorTool> {
    tool: T,
    env: ToolEnvironment,
    state: T::State,
    next_request: u64,
    actions: Vec<ToolAction<T::State>>,
}

impl<T: EditorTool> ToolSession<T> {
    /// Erstellt eine Sitzung im Anfangszustand des Tools.
    pub fn new(tool: T, env: ToolEnvironment) -> Self {
        let state = tool.initial_state(&env);
        let actions = tool.actions(&env);
        Self {
            tool,
            env,
            state,
            next_request: 0,
            actions,
        }
    }

    /// Das Tool.
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Aktueller State.
    pub fn state(&self) -> &T::State {
        &self.state
    }

    /// Umgebung der Sitzung.
    pub fn env(&self) -> &ToolEnvironment {
        &self.env
    }

    /// Zuletzt vergebene Anfrage-ID (0 = noch keine).
    pub fn last_request(&self) -> RequestId {
        RequestId(self.next_request)
    }

    fn run_hook<R>(
        &mut self,
        host: &mut dyn HostEffects,
        hook: impl FnOnce(&T, &mut ToolContext<'_, T::State>) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        let mut ctx = ToolContext::new(&mut self.state, host, &self.env, &mut self.next_request);
        hook(&self.tool, &mut ctx)
    }
}

/// Typ-gelöschte Sitzung, wie sie der `ToolManager` hält.
pub trait AnyToolSession {
    /// Tool-ID
    fn id(&self) -> &str;
    /// Anzeigename
    fn label(&self) -> &str;
    /// Aktiviert das Tool (ruft `on_activate`).
    fn activate(&mut self, host: &mut dyn HostEffects) -> anyhow::Result<()>;
    /// Setzt den State auf den Anfangszustand zurück.
    fn reset(&mut self);
    /// Lädt ein bestehendes Entity zur Bearbeitung. `false`: Objekttyp passt nicht.
    fn edit_entity(&mut self, entity: Entity, host: &mut dyn HostEffects)
        -> anyhow::Result<bool>;
    /// Klick auf leere Fläche.
    fn pointer_down(
        &mut self,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()>;
    /// Klick auf ein Entity.
    fn entity_click(
        &mut self,
        entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()>;
    /// Mausbewegung.
    fn pointer_move(
        &mut self,
        pos: DVec2,
        nearby: &[Entity],
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()>;
    /// Tastendruck.
    fn key_down(&mut self, key: Key, host: &mut dyn HostEffects) -> anyhow::Result<()>;
    /// Antwort auf eine Gleis-Anfrage.
    fn tracks_loaded(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()>;
    /// Antwort auf einen Commit.
    fn commit_result(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<Option<CommitReconciliation>>;
    /// Antwort auf eine Fahrstraßen-Suche.
    fn routes_found(
        &mut self,
        request: RequestId,
        result: Result<Vec<RouteCandidate>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()>;
    /// Gewünschter Mauszeiger.
    fn cursor_style(&self, is_dragging: bool) -> CursorStyle;
    /// Sichtbare Aktionen im aktuellen State.
    fn actions(&self) -> Vec<ActionView>;
    /// Löst eine Aktion aus. `false`: versteckt oder nicht aktiv, nichts passiert.
    fn trigger_action(&mut self, id: &str, host: &mut dyn HostEffects) -> anyhow::Result<bool>;
    /// Für den Downcast auf die konkrete Sitzung.
    fn as_any(&self) -> &dyn Any;
}

impl<T: EditorTool + 'static> AnyToolSession for ToolSession<T> {
    fn id(&self) -> &str {
        self.tool.id()
    }

    fn label(&self) -> &str {
        self.tool.label()
    }

    fn activate(&mut self, host: &mut dyn HostEffects) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_activate(ctx))
    }

    fn reset(&mut self) {
        self.state = self.tool.initial_state(&self.env);
        log::debug!("Tool {} zurückgesetzt", self.tool.id());
    }

    fn edit_entity(
        &mut self,
        entity: Entity,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<bool> {
        let id = entity.id.clone();
        let Some(state) = self.tool.state_for_entity(&self.env, entity)? else {
            log::debug!("Tool {} bearbeitet Entity {id} nicht", self.tool.id());
            return Ok(false);
        };
        self.state = state;
        log::info!("Tool {} bearbeitet Entity {id}", self.tool.id());
        self.run_hook(host, |tool, ctx| tool.on_activate(ctx))?;
        Ok(true)
    }

    fn pointer_down(
        &mut self,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_pointer_down(ctx, pos, modifiers))
    }

    fn entity_click(
        &mut self,
        entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| {
            tool.on_entity_click(ctx, entity, pos, modifiers)
        })
    }

    fn pointer_move(
        &mut self,
        pos: DVec2,
        nearby: &[Entity],
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_pointer_move(ctx, pos, nearby))
    }

    fn key_down(&mut self, key: Key, host: &mut dyn HostEffects) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_key_down(ctx, key))
    }

    fn tracks_loaded(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_tracks_loaded(ctx, request, result))
    }

    fn commit_result(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        self.run_hook(host, |tool, ctx| tool.on_commit_result(ctx, request, result))
    }

    fn routes_found(
        &mut self,
        request: RequestId,
        result: Result<Vec<RouteCandidate>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        self.run_hook(host, |tool, ctx| tool.on_routes_found(ctx, request, result))
    }

    fn cursor_style(&self, is_dragging: bool) -> CursorStyle {
        self.tool.cursor_style(&self.state, is_dragging)
    }

    fn actions(&self) -> Vec<ActionView> {
        self.actions
            .iter()
            .filter(|action| !action.is_hidden(&self.state))
            .map(|action| action.view(&self.state))
            .collect()
    }

    fn trigger_action(&mut self, id: &str, host: &mut dyn HostEffects) -> anyhow::Result<bool> {
        let Some(action) = self.actions.iter().find(|action| action.id == id) else {
            anyhow::bail!("Tool {}: unbekannte Aktion `{id}`", self.tool.id());
        };
        if action.is_hidden(&self.state) || !action.is_enabled(&self.state) {
            log::debug!("Tool {}: Aktion `{id}` ist nicht verfügbar", self.tool.id());
            return Ok(false);
        }
        let mut ctx = ToolContext::new(&mut self.state, host, &self.env, &mut self.next_request);
        action.run(&mut ctx)?;
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── ToolManager ──────────────────────────────────────────────────

/// Verwaltet registrierte Tool-Sitzungen, das aktive Tool und den Entity-Store.
pub struct ToolManager {
    sessions: Vec<Box<dyn AnyToolSession>>,
    active_index: Option<usize>,
    store: EntityStore,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(ToolEnvironment::default())
    }
}

impl ToolManager {
    /// Erstellt einen ToolManager mit allen Standard-Tools.
    pub fn new(env: ToolEnvironment) -> Self {
        let mut manager = Self::empty();
        manager.register_tool(SelectionTool::new(), env.clone());
        manager.register_tool(LineDrawTool::new(), env.clone());
        for kind in [PointKind::SIGNAL, PointKind::BUFFER_STOP, PointKind::DETECTOR] {
            manager.register_tool(PointTool::new(kind), env.clone());
        }
        for kind in [RangeKind::SPEED_RESTRICTION, RangeKind::ELECTRIFICATION] {
            manager.register_tool(RangeTool::new(kind), env.clone());
        }
        manager.register_tool(SwitchTool::new(), env.clone());
        manager.register_tool(RouteBuilderTool::new(), env);
        manager
    }

    /// Erstellt einen ToolManager ohne Tools.
    pub fn empty() -> Self {
        Self {
            sessions: Vec::new(),
            active_index: None,
            store: EntityStore::new(),
        }
    }

    /// Registriert eine Sitzung.
    pub fn register(&mut self, session: Box<dyn AnyToolSession>) {
        self.sessions.push(session);
    }

    /// Registriert ein Tool in einer neuen Sitzung.
    pub fn register_tool<T: EditorTool + 'static>(&mut self, tool: T, env: ToolEnvironment) {
        self.register(Box::new(ToolSession::new(tool, env)));
    }

    /// Anzahl registrierter Tools.
    pub fn tool_count(&self) -> usize {
        self.sessions.len()
    }

    /// Index, ID und Anzeigename aller registrierten Tools.
    pub fn tool_entries(&self) -> Vec<(usize, &str, &str)> {
        self.sessions
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.id(), s.label()))
            .collect()
    }

    /// Index eines Tools per ID.
    pub fn index_of(&self, tool_id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id() == tool_id)
    }

    /// Setzt das aktive Tool per Index; das bisher aktive wird zurückgesetzt.
    pub fn set_active(&mut self, index: usize, host: &mut dyn HostEffects) -> anyhow::Result<()> {
        if index >= self.sessions.len() {
            log::warn!("Tool-Index {index} existiert nicht");
            return Ok(());
        }
        if let Some(old) = self.active_index {
            if old != index {
                self.sessions[old].reset();
            }
        }
        self.active_index = Some(index);
        log::info!("Aktives Tool: {}", self.sessions[index].id());
        self.sessions[index].activate(host)
    }

    /// Setzt das aktive Tool per ID. `false` wenn die ID unbekannt ist.
    pub fn set_active_by_id(
        &mut self,
        tool_id: &str,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<bool> {
        let Some(index) = self.index_of(tool_id) else {
            return Ok(false);
        };
        self.set_active(index, host)?;
        Ok(true)
    }

    /// Index des aktiven Tools.
    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    /// ID des aktiven Tools.
    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|s| s.id())
    }

    /// Aktive Sitzung.
    pub fn active(&self) -> Option<&dyn AnyToolSession> {
        self.active_index.map(|i| self.sessions[i].as_ref())
    }

    /// Aktive Sitzung (veränderbar).
    pub fn active_mut(&mut self) -> Option<&mut dyn AnyToolSession> {
        let i = self.active_index?;
        Some(self.sessions[i].as_mut())
    }

    /// Konkrete Sitzung eines Tools (per Downcast).
    pub fn session<T: EditorTool + 'static>(&self, tool_id: &str) -> Option<&ToolSession<T>> {
        let index = self.index_of(tool_id)?;
        self.sessions[index].as_any().downcast_ref::<ToolSession<T>>()
    }

    /// Setzt das aktive Tool zurück und deaktiviert es.
    pub fn reset(&mut self) {
        if let Some(i) = self.active_index {
            self.sessions[i].reset();
        }
        self.active_index = None;
    }

    /// Entity-Store der Sitzung.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Entity-Store (veränderbar, z.B. zum Befüllen durch den Host).
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Aktiviert das zum Objekttyp passende Tool (per ID) und lädt `entity`.
    pub fn edit_entity(
        &mut self,
        tool_id: &str,
        entity: Entity,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<bool> {
        let Some(index) = self.index_of(tool_id) else {
            log::warn!("Kein Tool mit ID {tool_id}");
            return Ok(false);
        };
        if let Some(old) = self.active_index {
            if old != index {
                self.sessions[old].reset();
            }
        }
        self.active_index = Some(index);
        self.sessions[index].edit_entity(entity, host)
    }

    // ── Eingaben ─────────────────────────────────────────────────

    /// Klick auf leere Fläche (ohne aktives Tool: ignoriert).
    pub fn pointer_down(
        &mut self,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        match self.active_mut() {
            Some(session) => session.pointer_down(pos, modifiers, host),
            None => Ok(()),
        }
    }

    /// Klick auf ein Entity.
    pub fn entity_click(
        &mut self,
        entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        match self.active_mut() {
            Some(session) => session.entity_click(entity, pos, modifiers, host),
            None => Ok(()),
        }
    }

    /// Mausbewegung.
    pub fn pointer_move(
        &mut self,
        pos: DVec2,
        nearby: &[Entity],
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        match self.active_mut() {
            Some(session) => session.pointer_move(pos, nearby, host),
            None => Ok(()),
        }
    }

    /// Tastendruck.
    pub fn key_down(&mut self, key: Key, host: &mut dyn HostEffects) -> anyhow::Result<()> {
        match self.active_mut() {
            Some(session) => session.key_down(key, host),
            None => Ok(()),
        }
    }

    /// Löst eine Aktion des aktiven Tools aus.
    pub fn trigger_action(&mut self, id: &str, host: &mut dyn HostEffects) -> anyhow::Result<bool> {
        match self.active_mut() {
            Some(session) => session.trigger_action(id, host),
            None => Ok(false),
        }
    }

    // ── Antworten ────────────────────────────────────────────────

    /// Antwort auf eine Gleis-Anfrage; geladene Gleise landen auch im Store.
    pub fn tracks_loaded(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        if let Ok(entities) = &result {
            self.store.extend(
                entities
                    .iter()
                    .filter(|e| e.object_type == ObjectType::TrackSegment)
                    .cloned(),
            );
        }
        match self.active_mut() {
            Some(session) => session.tracks_loaded(request, result, host),
            None => Ok(()),
        }
    }

    /// Antwort auf einen Commit; ein Abgleich wird in den Store übernommen.
    pub fn commit_result(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        let Some(index) = self.active_index else {
            log::debug!("Commit-Antwort {request:?} ohne aktives Tool verworfen");
            return Ok(());
        };
        let reconciliation = self.sessions[index].commit_result(request, result, host)?;
        if let Some(reconciliation) = reconciliation {
            self.store.apply_commit(&reconciliation);
        }
        Ok(())
    }

    /// Antwort auf eine Fahrstraßen-Suche.
    pub fn routes_found(
        &mut self,
        request: RequestId,
        result: Result<Vec<RouteCandidate>, String>,
        host: &mut dyn HostEffects,
    ) -> anyhow::Result<()> {
        match self.active_mut() {
            Some(session) => session.routes_found(request, result, host),
            None => Ok(()),
        }
    }

    /// Mauszeiger des aktiven Tools.
    pub fn cursor_style(&self, is_dragging: bool) -> CursorStyle {
        self.active()
            .map(|s| s.cursor_style(is_dragging))
            .unwrap_or_default()
    }

    /// Sichtbare Aktionen des aktiven Tools.
    pub fn actions(&self) -> Vec<ActionView> {
        self.active().map(|s| s.actions()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tools::testing::RecordingHost;
    use crate::app::tools::{
        BUFFER_STOP_TOOL_ID, DETECTOR_TOOL_ID, ELECTRIFICATION_TOOL_ID, ROUTE_TOOL_ID,
        SELECTION_TOOL_ID, SIGNAL_TOOL_ID, SPEED_RESTRICTION_TOOL_ID, SWITCH_TOOL_ID,
        TRACK_TOOL_ID,
    };

    /// Minimal-Tool: zählt Klicks, Escape schlägt fehl.
    struct CounterTool;

    impl EditorTool for CounterTool {
        type State = u32;

        fn id(&self) -> &str {
            "counter"
        }

        fn label(&self) -> &str {
            "Zähler"
        }

        fn initial_state(&self, _env: &ToolEnvironment) -> u32 {
            0
        }

        fn on_pointer_down(
            &self,
            ctx: &mut ToolContext<'_, u32>,
            _pos: DVec2,
            _modifiers: Modifiers,
        ) -> anyhow::Result<()> {
            ctx.update_state(|n| n + 1);
            ctx.next_request_id();
            Ok(())
        }

        fn on_key_down(&self, _ctx: &mut ToolContext<'_, u32>, key: Key) -> anyhow::Result<()> {
            if key == Key::Escape {
                anyhow::bail!("Zustand kaputt");
            }
            Ok(())
        }

        fn actions(&self, _env: &ToolEnvironment) -> Vec<ToolAction<u32>> {
            vec![ToolAction::<u32>::new("zero", "Null", |ctx| {
                ctx.set_state(0);
                Ok(())
            })
            .enabled_when(|n: &u32| *n > 0)]
        }
    }

    fn click(manager: &mut ToolManager, host: &mut RecordingHost) {
        manager
            .pointer_down(DVec2::ZERO, Modifiers::default(), host)
            .expect("Klick");
    }

    fn counter(manager: &ToolManager) -> u32 {
        *manager
            .session::<CounterTool>("counter")
            .expect("Zähler registriert")
            .state()
    }

    #[test]
    fn test_hook_errors_reach_the_host() {
        let mut session = ToolSession::new(CounterTool, ToolEnvironment::default());
        let mut host = RecordingHost::default();
        let error = session
            .key_down(Key::Escape, &mut host)
            .expect_err("Fehler erwartet");
        assert_eq!(error.to_string(), "Zustand kaputt");
    }

    #[test]
    fn test_switching_tools_resets_previous_session_but_not_request_ids() {
        let mut manager = ToolManager::new(ToolEnvironment::default());
        manager.register_tool(CounterTool, ToolEnvironment::default());
        let mut host = RecordingHost::default();

        assert!(manager.set_active_by_id("counter", &mut host).expect("Aktivieren"));
        click(&mut manager, &mut host);
        click(&mut manager, &mut host);
        assert_eq!(counter(&manager), 2);

        assert!(manager
            .set_active_by_id(SELECTION_TOOL_ID, &mut host)
            .expect("Aktivieren"));
        assert_eq!(counter(&manager), 0);

        assert!(manager.set_active_by_id("counter", &mut host).expect("Aktivieren"));
        click(&mut manager, &mut host);
        let session = manager
            .session::<CounterTool>("counter")
            .expect("Zähler registriert");
        assert_eq!(session.last_request(), RequestId(3));
    }

    #[test]
    fn test_actions_respect_predicates_and_unknown_ids_fail() {
        let mut session = ToolSession::new(CounterTool, ToolEnvironment::default());
        let mut host = RecordingHost::default();

        assert!(!session.trigger_action("zero", &mut host).expect("kein Fehler"));
        session
            .pointer_down(DVec2::ZERO, Modifiers::default(), &mut host)
            .expect("Klick");
        assert_eq!(
            session.actions(),
            vec![ActionView {
                id: "zero".into(),
                label: "Null".into(),
                enabled: true,
            }]
        );
        assert!(session.trigger_action("zero", &mut host).expect("Aktion"));
        assert_eq!(*session.state(), 0);

        assert!(session.trigger_action("gibt-es-nicht", &mut host).is_err());
    }

    #[test]
    fn test_manager_without_active_tool_ignores_input() {
        let mut manager = ToolManager::default();
        let mut host = RecordingHost::default();
        click(&mut manager, &mut host);
        assert_eq!(manager.active_id(), None);
        assert!(!manager.trigger_action("save", &mut host).expect("kein Fehler"));
        assert_eq!(manager.cursor_style(false), CursorStyle::Default);
        assert!(!manager.set_active_by_id("unbekannt", &mut host).expect("kein Fehler"));
    }

    #[test]
    fn test_manager_registers_standard_tools_in_order() {
        let manager = ToolManager::default();
        let ids: Vec<&str> = manager
            .tool_entries()
            .into_iter()
            .map(|(_, id, _)| id)
            .collect();
        assert_eq!(
            ids,
            vec![
                SELECTION_TOOL_ID,
                TRACK_TOOL_ID,
                SIGNAL_TOOL_ID,
                BUFFER_STOP_TOOL_ID,
                DETECTOR_TOOL_ID,
                SPEED_RESTRICTION_TOOL_ID,
                ELECTRIFICATION_TOOL_ID,
                SWITCH_TOOL_ID,
                ROUTE_TOOL_ID,
            ]
        );
        assert_eq!(manager.tool_count(), ids.len());
    }
}
