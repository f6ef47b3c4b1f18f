//! Deklarative Tool-Aktionen (Toolbar-Einträge).

use super::ToolContext;

type Predicate<S> = Box<dyn Fn(&S) -> bool>;
type Handler<S> = Box<dyn Fn(&mut ToolContext<'_, S>) -> anyhow::Result<()>>;

/// Eine Aktion mit unabhängigen Prädikaten für "aktiv" und "versteckt".
///
/// Der Handler darf den State setzen und/oder einen Commit auslösen.
pub struct ToolAction<S> {
    /// Stabile ID (z.B. `"save"`, `"choose_type:point_switch"`)
    pub id: String,
    /// Anzeigename
    pub label: String,
    enabled: Predicate<S>,
    hidden: Predicate<S>,
    handler: Handler<S>,
}

impl<S: 'static> ToolAction<S> {
    /// Erstellt eine immer aktive, sichtbare Aktion.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut ToolContext<'_, S>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            enabled: Box::new(|_| true),
            hidden: Box::new(|_| false),
            handler: Box::new(handler),
        }
    }

    /// Setzt das Aktiv-Prädikat.
    pub fn enabled_when(mut self, predicate: impl Fn(&S) -> bool + 'static) -> Self {
        self.enabled = Box::new(predicate);
        self
    }

    /// Setzt das Versteckt-Prädikat.
    pub fn hidden_when(mut self, predicate: impl Fn(&S) -> bool + 'static) -> Self {
        self.hidden = Box::new(predicate);
        self
    }

    /// Ist die Aktion im State `state` aktiv?
    pub fn is_enabled(&self, state: &S) -> bool {
        (self.enabled)(state)
    }

    /// Ist die Aktion im State `state` versteckt?
    pub fn is_hidden(&self, state: &S) -> bool {
        (self.hidden)(state)
    }

    /// Führt den Handler aus (ohne Prädikat-Prüfung).
    pub fn run(&self, ctx: &mut ToolContext<'_, S>) -> anyhow::Result<()> {
        (self.handler)(ctx)
    }

    /// Sicht auf die Aktion im State `state`.
    pub fn view(&self, state: &S) -> ActionView {
        ActionView {
            id: self.id.clone(),
            label: self.label.clone(),
            enabled: self.is_enabled(state),
        }
    }
}

/// Sichtbare Aktion, wie sie der Host darstellt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    /// Aktions-ID
    pub id: String,
    /// Anzeigename
    pub label: String,
    /// Anklickbar?
    pub enabled: bool,
}
