//! Linear-Referencing-Engine: Abbildung zwischen deklarierter Distanz entlang eines
//! Gleises und 2D-Koordinaten, plus Snapping.
//!
//! - `polyline` – rein geometrische Hilfsfunktionen
//! - `track` – `LinearTrack` mit Reskalierung deklariert ↔ geometrisch
//! - `snapping` – nächster Punkt über mehrere Kandidaten

pub mod polyline;
mod snapping;
mod track;

pub use polyline::{point_along, polyline_length, project, slice_along, Projection};
pub use snapping::{nearest_point_on_any_of, NearestPoint};
pub use track::{Degenerate, LinearTrack, TrackProjection, TrackShape};

#[cfg(test)]
mod tests;
