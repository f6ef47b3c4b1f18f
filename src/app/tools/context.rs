//! Hook-Kontext: Zugriff auf den Tool-State und die Host-Effekte.

use glam::DVec2;

use super::route::RouteRequest;
use super::ToolEnvironment;
use crate::app::operations::CommitPayload;
use crate::core::{Entity, EntityId, ObjectType, RequestId, TrackCache};
use crate::shared::EditorOptions;

/// Anfrage: Entities per ID laden.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRequest {
    /// Kennung, mit der die Antwort zurückgegeben wird
    pub request: RequestId,
    /// Infrastruktur
    pub infra_id: u64,
    /// Gesuchte IDs
    pub ids: Vec<EntityId>,
    /// Objekttyp der gesuchten Entities
    pub object_type: ObjectType,
}

/// Anfrage: Commit an das Backend senden.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    /// Kennung, mit der die Antwort zurückgegeben wird
    pub request: RequestId,
    /// Infrastruktur
    pub infra_id: u64,
    /// Operationen
    pub payload: CommitPayload,
}

/// Wunsch eines Tools, ein Entity in einem anderen Tool zu bearbeiten.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSwitch {
    /// Ziel-Tool
    pub tool_id: String,
    /// Zu bearbeitendes Entity
    pub entity: Entity,
}

/// Alle nach außen gerichteten Aufrufe eines Tools.
///
/// Asynchrone Anfragen kehren über die Completion-Methoden der Sitzung
/// (`tracks_loaded`, `commit_result`, `routes_found`) mit derselben
/// `RequestId` zurück.
pub trait HostEffects {
    /// Lädt Entities per ID (asynchron).
    fn request_tracks(&mut self, request: TrackRequest);

    /// Sendet einen Commit (asynchron).
    fn submit_commit(&mut self, request: CommitRequest);

    /// Sucht Fahrstraßen-Kandidaten (asynchron, externe Wegsuche).
    fn request_routes(&mut self, _request: RouteRequest) {}

    /// Entities innerhalb eines Polygons (synchron, aus den gerenderten Daten).
    fn entities_in_polygon(&mut self, _polygon: &[DVec2]) -> Vec<Entity> {
        Vec::new()
    }

    /// Übergibt ein Entity an ein anderes Tool; der Host entscheidet über die Aktivierung.
    fn switch_tool(&mut self, _switch: ToolSwitch) {}
}

/// Kontext eines Hook- oder Aktions-Aufrufs.
///
/// Der State wird entweder komplett ersetzt (`set_state`) oder über eine reine
/// Funktion `alt -> neu` aktualisiert (`update_state`). Beide Wege schreiben das
/// Ergebnis als ganzen Wert in den State der Sitzung.
pub struct ToolContext<'a, S> {
    state: &'a mut S,
    host: &'a mut dyn HostEffects,
    env: &'a ToolEnvironment,
    requests: &'a mut u64,
}

impl<'a, S> ToolContext<'a, S> {
    /// Erstellt einen Kontext über den Teilen einer Sitzung.
    pub fn new(
        state: &'a mut S,
        host: &'a mut dyn HostEffects,
        env: &'a ToolEnvironment,
        requests: &'a mut u64,
    ) -> Self {
        Self {
            state,
            host,
            env,
            requests,
        }
    }

    /// Aktueller State.
    pub fn state(&self) -> &S {
        &*self.state
    }

    /// Veränderbarer State.
    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    /// Ersetzt den State komplett.
    pub fn set_state(&mut self, state: S) {
        *self.state = state;
    }

    /// Berechnet den neuen State aus dem alten.
    pub fn update_state(&mut self, update: impl FnOnce(&S) -> S) {
        let next = update(&*self.state);
        *self.state = next;
    }

    /// Host-Effekte.
    pub fn host(&mut self) -> &mut dyn HostEffects {
        &mut *self.host
    }

    /// Umgebung der Sitzung.
    pub fn env(&self) -> &'a ToolEnvironment {
        self.env
    }

    /// Laufzeit-Optionen.
    pub fn options(&self) -> &'a EditorOptions {
        &self.env.options
    }

    /// Infrastruktur-ID für Anfragen.
    pub fn infra_id(&self) -> u64 {
        self.env.infra_id()
    }

    /// Vergibt die nächste Anfrage-ID der Sitzung.
    pub fn next_request_id(&mut self) -> RequestId {
        *self.requests += 1;
        RequestId(*self.requests)
    }

    /// Lädt alle Gleise aus `ids`, die im Cache noch fehlen.
    ///
    /// `cache` wählt den Cache im State. Gibt die ID der Anfrage zurück, oder
    /// `None` wenn nichts zu laden war.
    pub fn fetch_missing_tracks(
        &mut self,
        ids: &[EntityId],
        cache: fn(&mut S) -> &mut TrackCache,
    ) -> Option<RequestId> {
        let missing = cache(&mut *self.state).missing(ids.iter());
        self.fetch_tracks(missing, cache)
    }

    /// Lädt die angegebenen Gleise, unabhängig vom Cache-Zustand.
    pub fn fetch_tracks(
        &mut self,
        ids: Vec<EntityId>,
        cache: fn(&mut S) -> &mut TrackCache,
    ) -> Option<RequestId> {
        if ids.is_empty() {
            return None;
        }
        let request = self.next_request_id();
        cache(&mut *self.state).mark_loading(request, &ids);
        log::debug!("Gleis-Anfrage {request:?}: {} ID(s)", ids.len());
        let infra_id = self.infra_id();
        self.host.request_tracks(TrackRequest {
            request,
            infra_id,
            ids,
            object_type: ObjectType::TrackSegment,
        });
        Some(request)
    }
}
