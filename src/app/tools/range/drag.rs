//! Greifen, Ziehen und Loslassen von Bereichsenden und Marker-Schildern.
//!
//! Ein Klick greift, Mausbewegungen ziehen, der nächste Klick lässt los.
//! Während des Ziehens darf `begin > end` gelten; erst beim Loslassen wird
//! der Bereich kanonisiert.

use glam::DVec2;

use super::state::{RangeInteraction, RangeState};
use crate::core::{EntityError, EntityId, LinearTrack, RangeEnd, TrackCache};

/// Greifbares Element in Cursornähe.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Handle {
    Extremity { range_index: usize, end: RangeEnd },
    Sign { sign_index: usize },
}

/// Nächstes greifbares Element innerhalb `radius`.
fn handle_at(state: &RangeState, pos: DVec2, radius: f64) -> Result<Option<Handle>, EntityError> {
    let mut best: Option<(Handle, f64)> = None;
    let mut consider = |handle: Handle, point: DVec2| {
        let distance = point.distance(pos);
        if distance <= radius && best.map_or(true, |(_, d)| distance < d) {
            best = Some((handle, distance));
        }
    };

    for (range_index, range) in state.ranges()?.iter().enumerate() {
        let Some(track) = state.tracks.linear(&range.track) else {
            continue;
        };
        for end in [RangeEnd::Begin, RangeEnd::End] {
            consider(
                Handle::Extremity { range_index, end },
                track.point_at_distance(range.bound(end)),
            );
        }
    }
    if state.kind.has_marker_signs {
        for (sign_index, sign) in state.signs()?.iter().enumerate() {
            if let Some(track) = state.tracks.linear(&sign.track) {
                consider(Handle::Sign { sign_index }, track.point_at_distance(sign.position));
            }
        }
    }
    Ok(best.map(|(handle, _)| handle))
}

/// Klick: greift ein Element bzw. lässt das gezogene los.
///
/// Gibt `true` zurück, wenn der Klick verbraucht wurde.
pub(super) fn grab_or_release(
    state: &mut RangeState,
    pos: DVec2,
    pick_radius: f64,
) -> Result<bool, EntityError> {
    match std::mem::take(&mut state.interaction) {
        RangeInteraction::DraggingRangeExtremity { range_index, .. } => {
            let mut ranges = state.ranges()?;
            if let Some(range) = ranges.get_mut(range_index) {
                range.canonicalize();
            }
            state.set_ranges(&ranges)?;
            Ok(true)
        }
        RangeInteraction::MovingMarkerSign { .. } => Ok(true),
        RangeInteraction::Idle => {
            let Some(handle) = handle_at(state, pos, pick_radius)? else {
                return Ok(false);
            };
            state.interaction = match handle {
                Handle::Extremity { range_index, end } => {
                    RangeInteraction::DraggingRangeExtremity {
                        range_index,
                        end,
                        before: state.ranges()?[range_index].clone(),
                    }
                }
                Handle::Sign { sign_index } => RangeInteraction::MovingMarkerSign {
                    sign_index,
                    before: Some(state.signs()?[sign_index].clone()),
                },
            };
            Ok(true)
        }
    }
}

/// Mausbewegung während des Ziehens.
pub(super) fn drag_to(state: &mut RangeState, pos: DVec2) -> Result<(), EntityError> {
    match state.interaction.clone() {
        RangeInteraction::Idle => Ok(()),
        RangeInteraction::DraggingRangeExtremity {
            range_index, end, ..
        } => {
            let mut ranges = state.ranges()?;
            let Some(range) = ranges.get_mut(range_index) else {
                return Ok(());
            };
            let Some(track) = state.tracks.linear(&range.track) else {
                return Ok(());
            };
            let distance = track
                .declared_distance_from_point(pos)
                .clamp(0.0, track.declared_length());
            range.set_bound(end, distance);
            state.set_ranges(&ranges)
        }
        RangeInteraction::MovingMarkerSign { sign_index, .. } => {
            let Some((track, position)) = nearest_cached_track(&state.tracks, pos) else {
                return Ok(());
            };
            let mut signs = state.signs()?;
            if let Some(sign) = signs.get_mut(sign_index) {
                sign.track = track;
                sign.position = position;
            }
            state.set_signs(&signs)
        }
    }
}

/// Escape: stellt den Stand vor dem Greifen wieder her.
pub(super) fn cancel(state: &mut RangeState) -> Result<(), EntityError> {
    match std::mem::take(&mut state.interaction) {
        RangeInteraction::Idle => Ok(()),
        RangeInteraction::DraggingRangeExtremity {
            range_index,
            before,
            ..
        } => {
            let mut ranges = state.ranges()?;
            if let Some(range) = ranges.get_mut(range_index) {
                *range = before;
            }
            state.set_ranges(&ranges)
        }
        RangeInteraction::MovingMarkerSign { sign_index, before } => {
            let mut signs = state.signs()?;
            match before {
                Some(before) => {
                    if let Some(sign) = signs.get_mut(sign_index) {
                        *sign = before;
                    }
                }
                None if sign_index < signs.len() => {
                    signs.remove(sign_index);
                }
                None => {}
            }
            state.set_signs(&signs)
        }
    }
}

/// Nächstes geladenes Gleis zu `pos` samt deklarierter Position.
fn nearest_cached_track(tracks: &TrackCache, pos: DVec2) -> Option<(EntityId, f64)> {
    tracks
        .ids()
        .filter_map(|id| tracks.linear(id))
        .map(|track: &LinearTrack| (track, track.project(pos)))
        .min_by(|a, b| a.1.offset.total_cmp(&b.1.offset))
        .map(|(track, projection)| (track.id().clone(), projection.declared_distance))
}
