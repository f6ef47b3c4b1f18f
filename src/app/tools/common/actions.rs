//! Standard-Aktionen für Tools, die ein Entity bearbeiten.

use super::edit::{delete, save, EditsEntity};
use crate::app::tools::{ToolAction, ToolEnvironment};

/// ID der Speichern-Aktion
pub const SAVE_ACTION: &str = "save";
/// ID der Löschen-Aktion
pub const DELETE_ACTION: &str = "delete";
/// ID der Zurücksetzen-Aktion
pub const RESET_ACTION: &str = "reset";

/// Speichern: aktiv, wenn kein Commit läuft und `can_save` zustimmt.
pub fn save_action<S: EditsEntity + 'static>(
    can_save: impl Fn(&S) -> bool + 'static,
) -> ToolAction<S> {
    ToolAction::<S>::new(SAVE_ACTION, "Speichern", |ctx| save(ctx).map(|_| ()))
        .enabled_when(move |state: &S| !state.edit().is_saving() && can_save(state))
}

/// Löschen: versteckt für neue Entities.
pub fn delete_action<S: EditsEntity + 'static>() -> ToolAction<S> {
    ToolAction::<S>::new(DELETE_ACTION, "Löschen", |ctx| delete(ctx).map(|_| ()))
        .enabled_when(|state: &S| !state.edit().is_saving())
        .hidden_when(|state: &S| state.edit().is_new())
}

/// Zurücksetzen auf den Anfangszustand des Tools.
pub fn reset_action<S: 'static>(
    initial: impl Fn(&ToolEnvironment) -> S + 'static,
) -> ToolAction<S> {
    ToolAction::<S>::new(RESET_ACTION, "Zurücksetzen", move |ctx| {
        let state = initial(ctx.env());
        ctx.set_state(state);
        Ok(())
    })
}
