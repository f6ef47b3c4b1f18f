//! Lineare Referenzierung auf einem Gleis: deklarierte Länge ↔ Polyline-Koordinaten.
//!
//! Jedes Gleis hat eine *deklarierte* Länge (persistiert, Wahrheit für alle Bereiche)
//! und eine *geometrische* Länge (Summe der Polyline-Segmente, driftet immer ein wenig).
//! Jede Operation auf der Polyline reskaliert:
//! `geometrisch = deklariert / L * G`, begrenzt auf `[0, G]`. Die Extremwerte
//! `<= 0` und `>= L` werden exakt auf den ersten bzw. letzten Stützpunkt abgebildet.

use glam::DVec2;

use super::polyline::{self, point_along, polyline_length, slice_along};
use crate::core::{Entity, EntityError, EntityId, TrackRange};

/// Grund, warum ein Gleis nicht linear referenzierbar ist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Degenerate {
    /// Weniger als zwei Stützpunkte
    TooFewVertices(usize),
    /// Alle Stützpunkte fallen zusammen
    ZeroGeometricLength,
    /// Deklarierte Länge `<= 0` oder nicht endlich
    InvalidDeclaredLength(f64),
}

/// Ergebnis der Auflösung eines Gleises.
///
/// `Degenerate` ist kein Fehler: der Aufrufer behandelt das Gleis als
/// "noch nicht darstellbar".
#[derive(Debug, Clone, PartialEq)]
pub enum TrackShape {
    /// Gleis ist referenzierbar
    Linear(LinearTrack),
    /// Gleis ist degeneriert
    Degenerate(Degenerate),
}

impl TrackShape {
    /// Gibt das referenzierbare Gleis zurück, falls vorhanden.
    pub fn as_linear(&self) -> Option<&LinearTrack> {
        match self {
            TrackShape::Linear(track) => Some(track),
            TrackShape::Degenerate(_) => None,
        }
    }
}

/// Projektion eines Punkts auf ein Gleis, in beiden Längenräumen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackProjection {
    /// Nächster Punkt auf der Polyline
    pub coordinate: DVec2,
    /// Deklarierte Distanz vom Gleisanfang
    pub declared_distance: f64,
    /// Richtungswinkel der Polyline an dieser Stelle (Radiant)
    pub tangent_angle: f64,
    /// Abstand des Query-Punkts zur Polyline
    pub offset: f64,
}

/// Ein Gleis mit gültiger Polyline und deklarierter Länge.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTrack {
    id: EntityId,
    points: Vec<DVec2>,
    declared_length: f64,
    geometric_length: f64,
}

impl LinearTrack {
    /// Löst ein Gleis aus Polyline und deklarierter Länge auf.
    pub fn resolve(id: EntityId, points: Vec<DVec2>, declared_length: f64) -> TrackShape {
        if points.len() < 2 {
            return TrackShape::Degenerate(Degenerate::TooFewVertices(points.len()));
        }
        if !declared_length.is_finite() || declared_length <= 0.0 {
            return TrackShape::Degenerate(Degenerate::InvalidDeclaredLength(declared_length));
        }
        let geometric_length = polyline_length(&points);
        if geometric_length <= 0.0 {
            return TrackShape::Degenerate(Degenerate::ZeroGeometricLength);
        }
        TrackShape::Linear(Self {
            id,
            points,
            declared_length,
            geometric_length,
        })
    }

    /// Löst ein Gleis-Entity auf.
    ///
    /// Fehlende `length` oder eine Nicht-LineString-Geometrie sind Strukturfehler;
    /// zu wenige Stützpunkte ergeben `TrackShape::Degenerate`.
    pub fn from_entity(entity: &Entity) -> Result<TrackShape, EntityError> {
        let points = entity.line_points()?.to_vec();
        let declared_length = entity.declared_length()?;
        Ok(Self::resolve(entity.id.clone(), points, declared_length))
    }

    /// Gleis-ID.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Stützpunkte der Polyline.
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Deklarierte (persistierte) Länge.
    pub fn declared_length(&self) -> f64 {
        self.declared_length
    }

    /// Geometrische Länge der Polyline.
    pub fn geometric_length(&self) -> f64 {
        self.geometric_length
    }

    /// Erster Stützpunkt.
    pub fn first(&self) -> DVec2 {
        self.points[0]
    }

    /// Letzter Stützpunkt.
    pub fn last(&self) -> DVec2 {
        self.points[self.points.len() - 1]
    }

    /// Relative Abweichung der geometrischen von der deklarierten Länge.
    ///
    /// `unit_scale` rechnet Koordinateneinheiten in Längeneinheiten um.
    pub fn drift_ratio(&self, unit_scale: f64) -> f64 {
        (self.geometric_length * unit_scale - self.declared_length).abs() / self.declared_length
    }

    /// Deklarierte → geometrische Distanz, begrenzt auf `[0, G]`.
    pub fn declared_to_geometric(&self, declared: f64) -> f64 {
        (declared / self.declared_length * self.geometric_length).clamp(0.0, self.geometric_length)
    }

    /// Geometrische → deklarierte Distanz, begrenzt auf `[0, L]`.
    pub fn geometric_to_declared(&self, geometric: f64) -> f64 {
        (geometric / self.geometric_length * self.declared_length).clamp(0.0, self.declared_length)
    }

    /// Koordinate in deklarierter Distanz vom Gleisanfang.
    ///
    /// Monoton entlang der Gleisrichtung; Werte außerhalb `[0, L]` landen exakt auf
    /// dem ersten bzw. letzten Stützpunkt.
    pub fn point_at_distance(&self, declared: f64) -> DVec2 {
        if declared <= 0.0 {
            return self.first();
        }
        if declared >= self.declared_length {
            return self.last();
        }
        point_along(&self.points, self.declared_to_geometric(declared))
    }

    /// Teil-Polyline für den deklarierten Bereich `[begin, end]`.
    ///
    /// - Vertauschte Grenzen werden getauscht, beide auf `[0, L]` begrenzt.
    /// - Volle Abdeckung liefert die unveränderte Polyline.
    /// - `begin == end` liefert zwei identische Punkte an dieser Stelle. Ein naiver
    ///   Schnitt mit gleichen Grenzen ergäbe eine leere bzw. ungültige Linie, daher
    ///   wird dieser Fall hier explizit behandelt.
    pub fn slice_by_declared_range(&self, begin: f64, end: f64) -> Vec<DVec2> {
        let (lo, hi) = if begin <= end { (begin, end) } else { (end, begin) };
        let lo = lo.clamp(0.0, self.declared_length);
        let hi = hi.clamp(0.0, self.declared_length);

        if lo <= 0.0 && hi >= self.declared_length {
            return self.points.clone();
        }
        if lo == hi {
            let p = self.point_at_distance(lo);
            return vec![p, p];
        }

        let g_start = if lo <= 0.0 {
            0.0
        } else {
            self.declared_to_geometric(lo)
        };
        let g_end = if hi >= self.declared_length {
            self.geometric_length
        } else {
            self.declared_to_geometric(hi)
        };
        let mut path = slice_along(&self.points, g_start, g_end);
        if hi >= self.declared_length {
            // Rundungsfehler der Summation dürfen das Ende nicht vom letzten Stützpunkt lösen
            let last = path.len() - 1;
            path[last] = self.last();
        }
        path
    }

    /// Gerenderte Geometrie eines `TrackRange` auf diesem Gleis.
    pub fn range_geometry(&self, range: &TrackRange) -> Vec<DVec2> {
        self.slice_by_declared_range(range.begin, range.end)
    }

    /// Projiziert `coordinate` auf das Gleis.
    pub fn project(&self, coordinate: DVec2) -> TrackProjection {
        let proj = polyline::project(&self.points, coordinate);
        TrackProjection {
            coordinate: proj.point,
            declared_distance: self.geometric_to_declared(proj.distance_along),
            tangent_angle: proj.tangent_angle,
            offset: proj.offset,
        }
    }

    /// Deklarierte Distanz des nächsten Gleispunkts zu `coordinate`.
    ///
    /// Inhärent approximativ (Projektion + Reskalierung).
    pub fn declared_distance_from_point(&self, coordinate: DVec2) -> f64 {
        self.project(coordinate).declared_distance
    }
}
