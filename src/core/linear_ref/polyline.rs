//! Rein geometrische Polyline-Funktionen (geometrische Distanzen, keine Reskalierung).
//!
//! Layer-neutral: wird von `LinearTrack`, dem Snapping und den Tools genutzt.
//! Alle Funktionen erwarten mindestens einen Stützpunkt.

use glam::DVec2;

/// Approximierte Länge einer Polyline.
pub fn polyline_length(points: &[DVec2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Richtungswinkel (Radiant, gegen den Uhrzeigersinn ab +X) der Strecke `a → b`.
pub fn segment_angle(a: DVec2, b: DVec2) -> f64 {
    let d = b - a;
    d.y.atan2(d.x)
}

/// Punkt im geometrischen Abstand `distance` vom Polyline-Anfang.
///
/// `distance <= 0` liefert exakt den ersten, `distance >= Länge` exakt den letzten Stützpunkt.
pub fn point_along(points: &[DVec2], distance: f64) -> DVec2 {
    if distance <= 0.0 {
        return points[0];
    }
    let mut travelled = 0.0;
    for w in points.windows(2) {
        let seg_len = w[0].distance(w[1]);
        if travelled + seg_len >= distance && seg_len > 0.0 {
            let t = (distance - travelled) / seg_len;
            if t >= 1.0 {
                return w[1];
            }
            return w[0].lerp(w[1], t.max(0.0));
        }
        travelled += seg_len;
    }
    points[points.len() - 1]
}

/// Teil-Polyline zwischen zwei geometrischen Distanzen (`start < end` vorausgesetzt).
///
/// Enthält Anfangspunkt, alle Stützpunkte strikt dazwischen und den Endpunkt.
pub fn slice_along(points: &[DVec2], start: f64, end: f64) -> Vec<DVec2> {
    let mut result = Vec::with_capacity(points.len().min(16) + 2);
    result.push(point_along(points, start));

    let mut travelled = 0.0;
    for w in points.windows(2) {
        travelled += w[0].distance(w[1]);
        if travelled > start && travelled < end {
            result.push(w[1]);
        }
    }

    result.push(point_along(points, end));
    result
}

/// Ergebnis einer Projektion auf eine Polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Nächster Punkt auf der Polyline
    pub point: DVec2,
    /// Geometrische Distanz vom Anfang bis zu `point`
    pub distance_along: f64,
    /// Index des Segments (`points[i] → points[i + 1]`)
    pub segment_index: usize,
    /// Richtungswinkel des getroffenen Segments (Radiant)
    pub tangent_angle: f64,
    /// Abstand des Query-Punkts zu `point`
    pub offset: f64,
}

/// Projiziert `query` auf die Polyline (global nächster Punkt).
///
/// Bei gleichem Abstand gewinnt das erste Segment. Eine Polyline mit einem einzelnen
/// Stützpunkt liefert diesen Punkt mit Winkel 0.
pub fn project(points: &[DVec2], query: DVec2) -> Projection {
    let mut best = Projection {
        point: points[0],
        distance_along: 0.0,
        segment_index: 0,
        tangent_angle: 0.0,
        offset: points[0].distance(query),
    };
    let mut first = true;
    let mut travelled = 0.0;

    for (i, w) in points.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        let ab = b - a;
        let seg_len_sq = ab.length_squared();
        let t = if seg_len_sq > 0.0 {
            ((query - a).dot(ab) / seg_len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let candidate = a + ab * t;
        let offset = candidate.distance(query);
        let seg_len = seg_len_sq.sqrt();

        if first || offset < best.offset {
            best = Projection {
                point: candidate,
                distance_along: travelled + seg_len * t,
                segment_index: i,
                tangent_angle: if seg_len > 0.0 {
                    segment_angle(a, b)
                } else {
                    best.tangent_angle
                },
                offset,
            };
            first = false;
        }
        travelled += seg_len;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn l_shape() -> Vec<DVec2> {
        vec![DVec2::ZERO, DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)]
    }

    #[test]
    fn test_polyline_length() {
        assert_relative_eq!(polyline_length(&l_shape()), 20.0);
        assert_eq!(polyline_length(&[DVec2::ONE]), 0.0);
    }

    #[test]
    fn test_point_along_interpolates_across_vertices() {
        let line = l_shape();
        assert_eq!(point_along(&line, -1.0), DVec2::ZERO);
        assert_eq!(point_along(&line, 10.0), DVec2::new(10.0, 0.0));
        let p = point_along(&line, 15.0);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 5.0);
        assert_eq!(point_along(&line, 99.0), DVec2::new(10.0, 10.0));
    }

    #[test]
    fn test_point_along_skips_zero_length_segments() {
        let line = vec![DVec2::ZERO, DVec2::ZERO, DVec2::new(4.0, 0.0)];
        let p = point_along(&line, 2.0);
        assert_relative_eq!(p.x, 2.0);
    }

    #[test]
    fn test_slice_keeps_interior_vertices() {
        let slice = slice_along(&l_shape(), 5.0, 15.0);
        assert_eq!(slice.len(), 3);
        assert_relative_eq!(slice[0].x, 5.0);
        assert_eq!(slice[1], DVec2::new(10.0, 0.0));
        assert_relative_eq!(slice[2].y, 5.0);
    }

    #[test]
    fn test_project_reports_distance_and_tangent() {
        let proj = project(&l_shape(), DVec2::new(12.0, 4.0));
        assert_eq!(proj.segment_index, 1);
        assert_relative_eq!(proj.point.x, 10.0);
        assert_relative_eq!(proj.point.y, 4.0);
        assert_relative_eq!(proj.distance_along, 14.0);
        assert_relative_eq!(proj.offset, 2.0);
        assert_relative_eq!(proj.tangent_angle, FRAC_PI_2);
    }
}
