//! Gleisbezogene Bereiche und Marker für Bereichs-Objekte.
//!
//! Alle Positionen sind in der *deklarierten* Länge des Gleises angegeben,
//! nie in der geometrischen Länge der gerenderten Polyline.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use super::error::EntityError;

/// Property-Schlüssel der Bereichsliste.
pub const TRACK_RANGES_KEY: &str = "track_ranges";

/// Property-Schlüssel der Marker-Schilder (nur Geschwindigkeitsbeschränkungen).
pub const MARKER_SIGNS_KEY: &str = "marker_signs";

/// Fahrtrichtung, für die ein Bereich gilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicableDirection {
    /// In Gleisrichtung (Anfang → Ende)
    StartToStop,
    /// Gegen die Gleisrichtung
    StopToStart,
    /// Beide Richtungen
    #[default]
    Both,
}

/// Welches Ende eines Bereichs gemeint ist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeEnd {
    /// Anfang (`begin`)
    Begin,
    /// Ende (`end`)
    End,
}

/// Abschnitt `[begin, end]` eines Gleises in deklarierten Längeneinheiten.
///
/// Während eines Drags darf `begin > end` vorübergehend gelten; beim Loslassen
/// wird mit [`TrackRange::canonicalize`] getauscht.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRange {
    /// Gleis-ID
    pub track: EntityId,
    /// Anfang (deklarierte Distanz)
    pub begin: f64,
    /// Ende (deklarierte Distanz)
    pub end: f64,
    /// Gültige Fahrtrichtung
    #[serde(default)]
    pub applicable_directions: ApplicableDirection,
}

impl TrackRange {
    /// Bereich über die volle deklarierte Länge eines Gleises.
    pub fn full(track: EntityId, declared_length: f64) -> Self {
        Self {
            track,
            begin: 0.0,
            end: declared_length,
            applicable_directions: ApplicableDirection::Both,
        }
    }

    /// Wert eines Bereichsendes.
    pub fn bound(&self, end: RangeEnd) -> f64 {
        match end {
            RangeEnd::Begin => self.begin,
            RangeEnd::End => self.end,
        }
    }

    /// Setzt ein Bereichsende, ohne zu kanonisieren.
    pub fn set_bound(&mut self, end: RangeEnd, value: f64) {
        match end {
            RangeEnd::Begin => self.begin = value,
            RangeEnd::End => self.end = value,
        }
    }

    /// `true` wenn `begin <= end`.
    pub fn is_canonical(&self) -> bool {
        self.begin <= self.end
    }

    /// Tauscht `begin` und `end`, falls `begin > end`.
    pub fn canonicalize(&mut self) {
        if !self.is_canonical() {
            std::mem::swap(&mut self.begin, &mut self.end);
        }
    }

    /// Begrenzt beide Enden auf `[0, declared_length]`.
    pub fn clamp_to(&mut self, declared_length: f64) {
        self.begin = self.begin.clamp(0.0, declared_length);
        self.end = self.end.clamp(0.0, declared_length);
    }

    /// Länge des Bereichs (unabhängig von der Orientierung).
    pub fn length(&self) -> f64 {
        (self.end - self.begin).abs()
    }
}

/// Seite, auf der ein Schild steht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignSide {
    /// Links der Gleisrichtung
    Left,
    /// Rechts der Gleisrichtung
    #[default]
    Right,
    /// Mittig
    Center,
}

/// Schild, das zu einem Bereichs-Objekt gehört (z.B. Ankündigung einer Beschränkung).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSign {
    /// Gleis, an dem das Schild steht
    pub track: EntityId,
    /// Deklarierte Position auf dem Gleis
    pub position: f64,
    /// Seite
    #[serde(default)]
    pub side: SignSide,
    /// Schild-Art (schemaabhängig, z.B. "announcement")
    pub kind: String,
    /// Optionaler Anzeigewert
    #[serde(default)]
    pub value: Option<String>,
}

impl Entity {
    /// Bereichsliste eines Bereichs-Objekts (fehlend = leer).
    pub fn track_ranges(&self) -> Result<Vec<TrackRange>, EntityError> {
        Ok(self
            .typed_property::<Vec<TrackRange>>(TRACK_RANGES_KEY)?
            .unwrap_or_default())
    }

    /// Ersetzt die Bereichsliste.
    pub fn set_track_ranges(&mut self, ranges: &[TrackRange]) -> Result<(), EntityError> {
        self.set_typed_list(TRACK_RANGES_KEY, ranges)
    }

    /// Marker-Schilder eines Bereichs-Objekts (fehlend = leer).
    pub fn marker_signs(&self) -> Result<Vec<MarkerSign>, EntityError> {
        Ok(self
            .typed_property::<Vec<MarkerSign>>(MARKER_SIGNS_KEY)?
            .unwrap_or_default())
    }

    /// Ersetzt die Marker-Schilder.
    pub fn set_marker_signs(&mut self, signs: &[MarkerSign]) -> Result<(), EntityError> {
        self.set_typed_list(MARKER_SIGNS_KEY, signs)
    }
}
