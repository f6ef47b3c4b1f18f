//! Gleis-Cache einer Tool-Aktivierung mit Unterdrückung veralteter Antworten.
//!
//! Der Cache gehört genau einer Tool-Sitzung (er liegt im Tool-State), wird lazy
//! befüllt und erst beim Reset der Sitzung bzw. beim Start eines neuen Entities
//! komplett verworfen. Jeder Fetch trägt eine [`RequestId`]; eine Antwort schreibt
//! nur in Einträge, die noch auf genau diese Anfrage warten.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::linear_ref::{LinearTrack, TrackShape};
use super::{Entity, EntityError, EntityId, ObjectType};

/// Monoton wachsende ID einer asynchronen Anfrage einer Tool-Sitzung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Ein geladenes Gleis samt aufgelöster Form.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTrack {
    /// Das Gleis-Entity, wie vom Backend geliefert
    pub entity: Entity,
    /// Lineare Form oder Grund der Degenerierung
    pub shape: TrackShape,
}

impl CachedTrack {
    /// Referenzierbare Form, falls das Gleis nicht degeneriert ist.
    pub fn linear(&self) -> Option<&LinearTrack> {
        self.shape.as_linear()
    }
}

/// Zustand eines Cache-Eintrags.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackCacheEntry {
    /// Fetch läuft
    Loading(RequestId),
    /// Fetch fehlgeschlagen – "noch nicht darstellbar", nie ein harter Fehler
    Error(String),
    /// Gleis geladen
    Ready(CachedTrack),
}

/// Ergebnis einer abgeschlossenen Anfrage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheUpdate {
    /// Einträge, die durch diese Antwort `Ready` wurden
    pub ready: Vec<EntityId>,
    /// Einträge, die durch diese Antwort `Error` wurden
    pub failed: Vec<EntityId>,
    /// IDs, deren Antwort verworfen wurde (inzwischen von einer neueren Anfrage
    /// oder einem anderen Ergebnis belegt)
    pub discarded: Vec<EntityId>,
}

impl CacheUpdate {
    /// `true` wenn die Antwort den Cache nicht verändert hat.
    pub fn is_stale(&self) -> bool {
        self.ready.is_empty() && self.failed.is_empty()
    }
}

/// Gleis-Cache, nach Gleis-ID geordnet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackCache {
    entries: BTreeMap<EntityId, TrackCacheEntry>,
}

impl TrackCache {
    /// Erstellt einen leeren Cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Eintrag zu einer Gleis-ID.
    pub fn get(&self, id: &EntityId) -> Option<&TrackCacheEntry> {
        self.entries.get(id)
    }

    /// Geladenes Gleis (nur `Ready`).
    pub fn ready(&self, id: &EntityId) -> Option<&CachedTrack> {
        match self.entries.get(id)? {
            TrackCacheEntry::Ready(track) => Some(track),
            _ => None,
        }
    }

    /// Referenzierbare Form eines geladenen, nicht degenerierten Gleises.
    pub fn linear(&self, id: &EntityId) -> Option<&LinearTrack> {
        self.ready(id)?.linear()
    }

    /// `true` solange für `id` eine Anfrage läuft.
    pub fn is_loading(&self, id: &EntityId) -> bool {
        matches!(self.entries.get(id), Some(TrackCacheEntry::Loading(_)))
    }

    /// IDs aus `ids`, für die noch kein Eintrag existiert (ohne Duplikate, in Reihenfolge).
    pub fn missing<'a>(&self, ids: impl IntoIterator<Item = &'a EntityId>) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        ids.into_iter()
            .filter(|id| !self.entries.contains_key(*id) && seen.insert(*id))
            .cloned()
            .collect()
    }

    /// Markiert `ids` als von `request` geladen.
    ///
    /// Ein laufender älterer Fetch für dieselbe ID wird damit überholt: seine
    /// Antwort wird später verworfen.
    pub fn mark_loading(&mut self, request: RequestId, ids: &[EntityId]) {
        for id in ids {
            if let Some(TrackCacheEntry::Loading(previous)) = self.entries.get(id) {
                log::debug!("Gleis {id}: Anfrage {previous:?} überholt durch {request:?}");
            }
            self.entries
                .insert(id.clone(), TrackCacheEntry::Loading(request));
        }
    }

    /// Trägt ein bereits bekanntes Gleis direkt ein (z.B. aus dem Entity-Store).
    pub fn insert_ready(&mut self, entity: Entity) -> Result<(), EntityError> {
        let shape = LinearTrack::from_entity(&entity)?;
        self.entries.insert(
            entity.id.clone(),
            TrackCacheEntry::Ready(CachedTrack { entity, shape }),
        );
        Ok(())
    }

    /// Verarbeitet die Antwort auf `request`.
    ///
    /// Nur Einträge, die noch `Loading(request)` sind, werden geschrieben. IDs, die
    /// in einer erfolgreichen Antwort fehlen, werden `Error`, ebenso Gleise mit
    /// Strukturfehler (z.B. ohne `length`). Danach wartet kein Eintrag mehr auf
    /// `request`.
    pub fn complete(
        &mut self,
        request: RequestId,
        result: Result<Vec<Entity>, String>,
        drift: DriftCheck,
    ) -> CacheUpdate {
        let waiting: Vec<EntityId> = self
            .entries
            .iter()
            .filter(|(_, entry)| **entry == TrackCacheEntry::Loading(request))
            .map(|(id, _)| id.clone())
            .collect();

        let mut update = CacheUpdate::default();

        match result {
            Err(message) => {
                for id in waiting {
                    log::warn!("Gleis {id} konnte nicht geladen werden: {message}");
                    self.entries
                        .insert(id.clone(), TrackCacheEntry::Error(message.clone()));
                    update.failed.push(id);
                }
            }
            Ok(entities) => {
                for entity in entities {
                    if !waiting.contains(&entity.id) {
                        log::debug!(
                            "Veraltete Antwort {request:?} für Gleis {} verworfen",
                            entity.id
                        );
                        update.discarded.push(entity.id);
                        continue;
                    }
                    let id = entity.id.clone();
                    match LinearTrack::from_entity(&entity) {
                        Ok(shape) => {
                            if let Some(track) = shape.as_linear() {
                                drift.check(track);
                            }
                            self.entries.insert(
                                id.clone(),
                                TrackCacheEntry::Ready(CachedTrack { entity, shape }),
                            );
                            update.ready.push(id);
                        }
                        Err(err) => {
                            log::warn!("Gleis {id} unbrauchbar: {err}");
                            self.entries
                                .insert(id.clone(), TrackCacheEntry::Error(err.to_string()));
                            update.failed.push(id);
                        }
                    }
                }
                for id in waiting {
                    if !update.ready.contains(&id) && !update.failed.contains(&id) {
                        self.entries.insert(
                            id.clone(),
                            TrackCacheEntry::Error("Gleis nicht gefunden".to_string()),
                        );
                        update.failed.push(id);
                    }
                }
            }
        }

        update
    }

    /// Verwirft alle Einträge.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Anzahl der Einträge.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` wenn der Cache leer ist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alle bekannten Gleis-IDs.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    /// Übernimmt gespeicherte Gleise aus einem Commit.
    ///
    /// `pairs` ordnet alte IDs (Sentinel, generierte ID) den persistierten zu.
    /// Verschoben wird nur, was zu einem gespeicherten Gleis gehört: ein anderes
    /// neues Gleis unter der Sentinel-ID bleibt liegen, wenn der Commit z.B. ein
    /// Signal angelegt hat. Bekannte Gleise erhalten den gespeicherten Stand.
    pub fn reconcile(&mut self, pairs: &[(EntityId, EntityId)], saved: &[Entity]) {
        for entity in saved
            .iter()
            .filter(|e| e.object_type == ObjectType::TrackSegment)
        {
            for (from, _) in pairs.iter().filter(|(_, to)| *to == entity.id) {
                self.rekey(from, &entity.id);
            }
            if !self.entries.contains_key(&entity.id) {
                continue;
            }
            let entry = match LinearTrack::from_entity(entity) {
                Ok(shape) => TrackCacheEntry::Ready(CachedTrack {
                    entity: entity.clone(),
                    shape,
                }),
                Err(err) => {
                    log::warn!("Gespeichertes Gleis {} unbrauchbar: {err}", entity.id);
                    TrackCacheEntry::Error(err.to_string())
                }
            };
            self.entries.insert(entity.id.clone(), entry);
        }
    }

    /// Ersetzt den Schlüssel `from` durch `to` (inkl. der ID des gecachten Entities).
    pub fn rekey(&mut self, from: &EntityId, to: &EntityId) {
        let Some(mut entry) = self.entries.remove(from) else {
            return;
        };
        if let TrackCacheEntry::Ready(cached) = &mut entry {
            cached.entity.id = to.clone();
            if let Ok(shape) = LinearTrack::from_entity(&cached.entity) {
                cached.shape = shape;
            }
        }
        self.entries.insert(to.clone(), entry);
    }
}

/// Schwellwert-Prüfung für die Längen-Drift beim Auflösen eines Gleises.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftCheck {
    /// Umrechnung Koordinaten- → Längeneinheiten
    pub unit_scale: f64,
    /// Relative Drift, ab der gewarnt wird
    pub warning_ratio: f64,
}

impl DriftCheck {
    /// Loggt eine Warnung, wenn die Drift von `track` den Schwellwert übersteigt.
    ///
    /// Gibt `true` zurück, wenn gewarnt wurde. Die Geometrie wird in jedem Fall
    /// weiter reskaliert und begrenzt.
    pub fn check(&self, track: &LinearTrack) -> bool {
        let ratio = track.drift_ratio(self.unit_scale);
        if ratio > self.warning_ratio {
            log::warn!(
                "Gleis {}: geometrische Länge weicht um {:.1}% von der deklarierten ab",
                track.id(),
                ratio * 100.0
            );
            return true;
        }
        false
    }
}

impl Default for DriftCheck {
    fn default() -> Self {
        Self {
            unit_scale: 1.0,
            warning_ratio: crate::shared::options::LENGTH_DRIFT_WARNING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Geometry, ObjectType, LENGTH_KEY};
    use glam::DVec2;
    use serde_json::{json, Map};

    fn track(id: &str, length: f64) -> Entity {
        let mut properties = Map::new();
        properties.insert(LENGTH_KEY.into(), json!(length));
        Entity::persisted(
            id,
            ObjectType::TrackSegment,
            Geometry::LineString(vec![DVec2::ZERO, DVec2::new(length, 0.0)]),
            properties,
        )
    }

    #[test]
    fn stale_response_does_not_overwrite_newer_request() {
        let mut cache = TrackCache::new();
        let id = EntityId::from("A");

        cache.mark_loading(RequestId(1), std::slice::from_ref(&id));
        cache.mark_loading(RequestId(2), std::slice::from_ref(&id));

        // Neuere Antwort zuerst
        let update = cache.complete(
            RequestId(2),
            Ok(vec![track("A", 20.0)]),
            DriftCheck::default(),
        );
        assert_eq!(update.ready, vec![id.clone()]);

        // Ältere Antwort trifft danach ein und wird verworfen
        let update = cache.complete(
            RequestId(1),
            Ok(vec![track("A", 5.0)]),
            DriftCheck::default(),
        );
        assert!(update.is_stale());
        assert_eq!(update.discarded, vec![id.clone()]);

        let ready = cache.linear(&id).expect("Gleis erwartet");
        assert_eq!(ready.declared_length(), 20.0);
    }

    #[test]
    fn stale_response_for_other_id_keeps_entries_separate() {
        let mut cache = TrackCache::new();
        let a = EntityId::from("A");
        let b = EntityId::from("B");
        cache.mark_loading(RequestId(1), std::slice::from_ref(&a));
        cache.mark_loading(RequestId(2), std::slice::from_ref(&b));

        cache.complete(
            RequestId(2),
            Ok(vec![track("B", 8.0)]),
            DriftCheck::default(),
        );
        // Antwort für A enthält versehentlich auch B: B darf nicht überschrieben werden
        let update = cache.complete(
            RequestId(1),
            Ok(vec![track("A", 3.0), track("B", 99.0)]),
            DriftCheck::default(),
        );

        assert_eq!(update.ready, vec![a.clone()]);
        assert_eq!(update.discarded, vec![b.clone()]);
        assert_eq!(cache.linear(&b).map(LinearTrack::declared_length), Some(8.0));
    }

    #[test]
    fn failed_fetch_sets_error_state() {
        let mut cache = TrackCache::new();
        let ids = vec![EntityId::from("A"), EntityId::from("B")];
        cache.mark_loading(RequestId(7), &ids);

        let update = cache.complete(
            RequestId(7),
            Err("timeout".into()),
            DriftCheck::default(),
        );
        assert_eq!(update.failed, ids);
        assert_eq!(
            cache.get(&ids[0]),
            Some(&TrackCacheEntry::Error("timeout".into()))
        );
        assert!(cache.linear(&ids[0]).is_none());
    }

    #[test]
    fn ids_missing_from_response_become_errors() {
        let mut cache = TrackCache::new();
        let ids = vec![EntityId::from("A"), EntityId::from("B")];
        cache.mark_loading(RequestId(1), &ids);

        let update = cache.complete(
            RequestId(1),
            Ok(vec![track("A", 4.0)]),
            DriftCheck::default(),
        );
        assert_eq!(update.failed, vec![EntityId::from("B")]);
        assert!(matches!(
            cache.get(&EntityId::from("B")),
            Some(TrackCacheEntry::Error(_))
        ));
    }

    #[test]
    fn malformed_track_becomes_error_and_releases_the_request() {
        let mut cache = TrackCache::new();
        let ids = vec![EntityId::from("A"), EntityId::from("B"), EntityId::from("C")];
        cache.mark_loading(RequestId(1), &ids);

        let mut broken = track("A", 4.0);
        broken.properties.clear();
        let update = cache.complete(
            RequestId(1),
            Ok(vec![broken, track("B", 6.0), track("C", 2.0)]),
            DriftCheck::default(),
        );

        assert_eq!(update.failed, vec![EntityId::from("A")]);
        assert_eq!(update.ready, vec![EntityId::from("B"), EntityId::from("C")]);
        assert!(matches!(
            cache.get(&EntityId::from("A")),
            Some(TrackCacheEntry::Error(_))
        ));
        assert!(ids.iter().all(|id| !cache.is_loading(id)));
        assert_eq!(
            cache.linear(&EntityId::from("C")).map(LinearTrack::declared_length),
            Some(2.0)
        );
    }

    #[test]
    fn missing_skips_known_and_duplicate_ids() {
        let mut cache = TrackCache::new();
        cache.insert_ready(track("A", 1.0)).expect("Gleis erwartet");
        let ids = [
            EntityId::from("A"),
            EntityId::from("B"),
            EntityId::from("B"),
        ];
        assert_eq!(cache.missing(ids.iter()), vec![EntityId::from("B")]);
    }

    #[test]
    fn rekey_moves_entry_and_entity_id() {
        let mut cache = TrackCache::new();
        let mut fresh = track("A", 10.0);
        fresh.id = EntityId::new_sentinel();
        cache.insert_ready(fresh).expect("Gleis erwartet");

        let persisted = EntityId::from("B-42");
        cache.rekey(&EntityId::new_sentinel(), &persisted);

        assert!(cache.get(&EntityId::new_sentinel()).is_none());
        let cached = cache.ready(&persisted).expect("Eintrag erwartet");
        assert_eq!(cached.entity.id, persisted);
        assert_eq!(cached.linear().map(|t| t.id().clone()), Some(persisted));
    }

    #[test]
    fn reconcile_moves_saved_track_to_persisted_id() {
        let mut cache = TrackCache::new();
        let mut fresh = track("A", 10.0);
        fresh.id = EntityId::new_sentinel();
        cache.insert_ready(fresh).expect("Gleis erwartet");

        let persisted = EntityId::from("T-9");
        let pairs = vec![
            (EntityId::new_sentinel(), persisted.clone()),
            (EntityId::from("uuid-1"), persisted.clone()),
        ];
        cache.reconcile(&pairs, &[track("T-9", 12.0)]);

        assert!(cache.get(&EntityId::new_sentinel()).is_none());
        assert_eq!(cache.len(), 1);
        let cached = cache.ready(&persisted).expect("Eintrag erwartet");
        assert_eq!(cached.entity.id, persisted);
        assert_eq!(cached.linear().map(LinearTrack::declared_length), Some(12.0));
    }

    #[test]
    fn reconcile_keeps_unsaved_track_when_other_object_was_created() {
        let mut cache = TrackCache::new();
        let mut fresh = track("A", 10.0);
        fresh.id = EntityId::new_sentinel();
        cache.insert_ready(fresh).expect("Gleis erwartet");

        let signal = Entity::persisted("S-1", ObjectType::Signal, Geometry::Null, Map::new());
        cache.reconcile(
            &[(EntityId::new_sentinel(), EntityId::from("S-1"))],
            &[signal],
        );

        assert!(cache.ready(&EntityId::new_sentinel()).is_some());
        assert!(cache.get(&EntityId::from("S-1")).is_none());
    }

    #[test]
    fn drift_check_warns_only_above_threshold() {
        let shape = LinearTrack::resolve("t".into(), vec![DVec2::ZERO, DVec2::new(97.3, 0.0)], 100.0);
        let track = shape.as_linear().expect("Gleis erwartet");
        let strict = DriftCheck {
            unit_scale: 1.0,
            warning_ratio: 0.01,
        };
        assert!(strict.check(track));
        assert!(!DriftCheck::default().check(track));
    }
}
