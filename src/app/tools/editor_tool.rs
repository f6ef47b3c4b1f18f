//! EditorTool-Trait — Schnittstelle für alle Bearbeitungsmodi.

use std::fmt;

use glam::DVec2;

use super::route::RouteCandidate;
use super::{CursorStyle, Key, Modifiers, ToolAction, ToolContext, ToolEnvironment};
use crate::app::operations::CommitReconciliation;
use crate::core::{Entity, RequestId};

/// Schnittstelle für alle Tools (Auswahl, Gleis, Punkt, Bereich, Weiche, Fahrstraße).
///
/// Das Tool selbst ist unveränderliche Konfiguration; der gesamte
/// Interaktionszustand liegt im `State`, den die Engine besitzt, aber nie
/// inspiziert. Hooks ändern ihn ausschließlich über den `ToolContext`.
///
/// Fehler aus Hooks werden von der Engine unverändert an den Host
/// weitergereicht.
pub trait EditorTool {
    /// Tool-spezifischer Zustand
    type State: Clone + fmt::Debug + 'static;

    /// Stabile Tool-ID
    fn id(&self) -> &str;

    /// Anzeigename für die Toolbar
    fn label(&self) -> &str;

    /// Anfangszustand (rein, nur aus Optionen und Katalogen).
    fn initial_state(&self, env: &ToolEnvironment) -> Self::State;

    /// Zustand zum Bearbeiten eines bestehenden Entities.
    ///
    /// `Ok(None)`: das Tool bearbeitet diesen Objekttyp nicht.
    fn state_for_entity(
        &self,
        _env: &ToolEnvironment,
        _entity: Entity,
    ) -> anyhow::Result<Option<Self::State>> {
        Ok(None)
    }

    /// Wird nach dem Aktivieren bzw. nach `state_for_entity` aufgerufen.
    fn on_activate(&self, _ctx: &mut ToolContext<'_, Self::State>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Primärklick auf leere Fläche.
    fn on_pointer_down(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _pos: DVec2,
        _modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Primärklick auf ein gerendertes Entity.
    fn on_entity_click(
        &self,
        ctx: &mut ToolContext<'_, Self::State>,
        _entity: &Entity,
        pos: DVec2,
        modifiers: Modifiers,
    ) -> anyhow::Result<()> {
        self.on_pointer_down(ctx, pos, modifiers)
    }

    /// Mausbewegung mit den vom Host vorselektierten Features in Cursornähe.
    ///
    /// Muss idempotent sein und darf keine Anfragen auslösen.
    fn on_pointer_move(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _pos: DVec2,
        _nearby: &[Entity],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Tastendruck; `Escape` bricht mindestens die laufende Teil-Interaktion ab.
    fn on_key_down(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _key: Key,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Antwort auf eine Gleis-Anfrage.
    fn on_tracks_loaded(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _request: RequestId,
        _result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Antwort auf einen Commit.
    ///
    /// Gibt den Abgleich zurück, wenn die Antwort zur laufenden Anfrage gehört.
    fn on_commit_result(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _request: RequestId,
        _result: Result<Vec<Entity>, String>,
    ) -> anyhow::Result<Option<CommitReconciliation>> {
        Ok(None)
    }

    /// Antwort auf eine Fahrstraßen-Suche.
    fn on_routes_found(
        &self,
        _ctx: &mut ToolContext<'_, Self::State>,
        _request: RequestId,
        _result: Result<Vec<RouteCandidate>, String>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Gewünschter Mauszeiger.
    fn cursor_style(&self, _state: &Self::State, is_dragging: bool) -> CursorStyle {
        if is_dragging {
            CursorStyle::Grabbing
        } else {
            CursorStyle::Default
        }
    }

    /// Aktionen des Tools (einmal pro Sitzung erzeugt).
    fn actions(&self, _env: &ToolEnvironment) -> Vec<ToolAction<Self::State>> {
        Vec::new()
    }
}
