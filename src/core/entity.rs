//! Entity-Modell: ID (persistiert oder Sentinel), Objekttyp, Geometrie und Properties.

use std::fmt;

use glam::DVec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::EntityError;

/// Wohlbekannte ID eines noch nicht gespeicherten Entities.
pub const NEW_ENTITY_ID: &str = "new";

/// Property-Schlüssel, unter dem die Geometrie linearer Objekte persistiert wird.
pub const GEO_KEY: &str = "geo";

/// Property-Schlüssel der deklarierten Länge eines Gleises.
pub const LENGTH_KEY: &str = "length";

/// Identifikator eines Entities.
///
/// Entweder eine stabile, vom Backend vergebene ID oder der Sentinel [`NEW_ENTITY_ID`]
/// vor dem ersten Speichern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Sentinel-ID für neue, noch nicht gespeicherte Entities.
    pub fn new_sentinel() -> Self {
        Self(NEW_ENTITY_ID.to_string())
    }

    /// Erzeugt eine frische, zufällige ID (UUID v4) für einen Create-Payload.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// `true` wenn dies der Sentinel eines ungespeicherten Entities ist.
    pub fn is_new(&self) -> bool {
        self.0 == NEW_ENTITY_ID
    }

    /// String-Darstellung der ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Objekttyp eines Entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Gleisabschnitt (linear, Träger aller Positionsangaben)
    TrackSegment,
    /// Signal (Punkt-Objekt)
    Signal,
    /// Prellbock (Punkt-Objekt)
    BufferStop,
    /// Gleisfreimelder (Punkt-Objekt)
    Detector,
    /// Weiche / Knoten
    Switch,
    /// Geschwindigkeitsbeschränkung (Bereichs-Objekt)
    SpeedRestriction,
    /// Elektrifizierung (Bereichs-Objekt)
    Electrification,
    /// Fahrstraße
    Route,
}

impl ObjectType {
    /// Objekte, deren Geometrie als `geo`-Property persistiert wird.
    pub fn persists_geometry(self) -> bool {
        matches!(self, ObjectType::TrackSegment)
    }

    /// Punkt-Objekte, die relativ zu einem Gleis platziert werden.
    pub fn is_point_asset(self) -> bool {
        matches!(
            self,
            ObjectType::Signal | ObjectType::BufferStop | ObjectType::Detector
        )
    }

    /// Bereichs-Objekte mit einer Liste von `TrackRange`s.
    pub fn is_range_asset(self) -> bool {
        matches!(
            self,
            ObjectType::SpeedRestriction | ObjectType::Electrification
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Art einer Geometrie (für Fehlermeldungen und Prüfungen).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Einzelner Punkt
    Point,
    /// Polyline
    LineString,
    /// Mehrere Polylines
    MultiLineString,
    /// Keine Geometrie
    Null,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geometrie eines Entities (GeoJSON-artig serialisiert).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Einzelner Punkt
    Point(DVec2),
    /// Polyline
    LineString(Vec<DVec2>),
    /// Mehrere Polylines (z.B. alle Abschnitte eines Bereichs-Objekts)
    MultiLineString(Vec<Vec<DVec2>>),
    /// Sentinel: Objekt hat (noch) keine Geometrie
    #[default]
    Null,
}

impl Geometry {
    /// Art der Geometrie.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::Null => GeometryKind::Null,
        }
    }

    /// Gibt die Linien der Geometrie zurück (Punkt und Null: keine).
    pub fn lines(&self) -> Vec<&[DVec2]> {
        match self {
            Geometry::LineString(points) => vec![points.as_slice()],
            Geometry::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
            Geometry::Point(_) | Geometry::Null => Vec::new(),
        }
    }
}

/// Ein editierbares Infrastruktur-Objekt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Persistierte ID oder Sentinel
    pub id: EntityId,
    /// Objekttyp
    pub object_type: ObjectType,
    /// Geometrie (für Punkt- und Bereichs-Objekte abgeleitet)
    #[serde(default)]
    pub geometry: Geometry,
    /// Schema-definierte Properties
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Erstellt ein neues, ungespeichertes Entity mit Sentinel-ID und ohne Geometrie.
    pub fn new(object_type: ObjectType, properties: Map<String, Value>) -> Self {
        Self {
            id: EntityId::new_sentinel(),
            object_type,
            geometry: Geometry::Null,
            properties,
        }
    }

    /// Erstellt ein persistiertes Entity (z.B. aus einer Backend-Antwort).
    pub fn persisted(
        id: impl Into<EntityId>,
        object_type: ObjectType,
        geometry: Geometry,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            object_type,
            geometry,
            properties,
        }
    }

    /// `true` solange das Entity noch nie gespeichert wurde.
    pub fn is_new(&self) -> bool {
        self.id.is_new()
    }

    /// Liest ein Property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Setzt ein Property (überschreibt einen vorhandenen Wert).
    pub fn set_property(&mut self, key: &str, value: Value) {
        self.properties.insert(key.to_string(), value);
    }

    /// Deklarierte Länge eines linearen Objekts (`length`-Property).
    pub fn declared_length(&self) -> Result<f64, EntityError> {
        self.properties
            .get(LENGTH_KEY)
            .and_then(Value::as_f64)
            .ok_or(EntityError::MissingComponent {
                object_type: self.object_type,
                component: LENGTH_KEY,
            })
    }

    /// Stützpunkte einer LineString-Geometrie.
    ///
    /// Fehlende Geometrie ist eine fehlende Pflicht-Komponente, jede andere Art ein
    /// Geometrie-Konflikt.
    pub fn line_points(&self) -> Result<&[DVec2], EntityError> {
        match &self.geometry {
            Geometry::LineString(points) => Ok(points),
            Geometry::Null => Err(EntityError::MissingComponent {
                object_type: self.object_type,
                component: GEO_KEY,
            }),
            other => Err(EntityError::GeometryKindMismatch {
                object_type: self.object_type,
                expected: GeometryKind::LineString,
                found: other.kind(),
            }),
        }
    }

    /// Liest ein Property und deserialisiert es in `T`.
    ///
    /// Fehlt der Schlüssel, wird `Ok(None)` geliefert.
    pub fn typed_property<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, EntityError> {
        match self.properties.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                EntityError::InvalidProperty {
                    object_type: self.object_type,
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Serialisiert `value` und legt ihn unter `key` ab.
    pub fn set_typed_property<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), EntityError> {
        let json = serde_json::to_value(value).map_err(|e| EntityError::InvalidProperty {
            object_type: self.object_type,
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.properties.insert(key.to_string(), json);
        Ok(())
    }

    /// Legt eine Liste unter `key` ab und behält dabei die bisherige JSON-Form.
    ///
    /// Unveränderte Elemente bleiben unangetastet. Geänderte Elemente lassen
    /// Default-Felder weg, die vorher fehlten, und schreiben ganzzahlige Werte
    /// wieder als Ganzzahl, wenn sie so gespeichert waren. Ein Diff gegen den
    /// Snapshot enthält damit nur echte Änderungen.
    pub fn set_typed_list<T>(&mut self, key: &str, items: &[T]) -> Result<(), EntityError>
    where
        T: Serialize + DeserializeOwned + PartialEq,
    {
        let previous = match self.properties.get(key) {
            Some(Value::Array(values)) => values.clone(),
            _ => Vec::new(),
        };
        let mut list = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let old = previous.get(index);
            if let Some(old) = old.filter(|old| reads_as(old, item)) {
                list.push(old.clone());
                continue;
            }
            let fresh = serde_json::to_value(item).map_err(|e| EntityError::InvalidProperty {
                object_type: self.object_type,
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            list.push(match old {
                Some(old) => conform_to(fresh, old, item),
                None => fresh,
            });
        }
        self.properties.insert(key.to_string(), Value::Array(list));
        Ok(())
    }

    /// Properties in der Form, in der sie persistiert und gedifft werden.
    ///
    /// Für Objekte mit persistierter Geometrie wird die aktuelle Geometrie als ganzer
    /// Wert unter [`GEO_KEY`] eingetragen.
    pub fn persisted_properties(&self) -> Result<Map<String, Value>, EntityError> {
        let mut properties = self.properties.clone();
        if self.object_type.persists_geometry() {
            let geo = serde_json::to_value(&self.geometry).map_err(|e| {
                EntityError::InvalidProperty {
                    object_type: self.object_type,
                    key: GEO_KEY.to_string(),
                    reason: e.to_string(),
                }
            })?;
            properties.insert(GEO_KEY.to_string(), geo);
        }
        Ok(properties)
    }
}

/// `true` wenn `value` sich als `item` lesen lässt.
fn reads_as<T: DeserializeOwned + PartialEq>(value: &Value, item: &T) -> bool {
    serde_json::from_value::<T>(value.clone()).is_ok_and(|read| read == *item)
}

/// Gleicht ein frisch serialisiertes Objekt an die Form von `old` an, solange es
/// sich weiterhin als `item` liest.
fn conform_to<T: DeserializeOwned + PartialEq>(fresh: Value, old: &Value, item: &T) -> Value {
    let (Value::Object(mut fields), Value::Object(old)) = (fresh.clone(), old) else {
        return fresh;
    };
    let keys: Vec<String> = fields.keys().cloned().collect();
    for key in keys {
        let candidate: Map<String, Value> = match old.get(&key) {
            None => fields
                .iter()
                .filter(|(k, _)| **k != key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Some(previous) if previous.is_i64() || previous.is_u64() => {
                let Some(whole) = fields
                    .get(&key)
                    .and_then(Value::as_f64)
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                else {
                    continue;
                };
                let mut candidate = fields.clone();
                candidate.insert(key.clone(), Value::from(whole as i64));
                candidate
            }
            Some(_) => continue,
        };
        if reads_as(&Value::Object(candidate.clone()), item) {
            fields = candidate;
        }
    }
    Value::Object(fields)
}
