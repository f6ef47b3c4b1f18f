use super::*;
use crate::app::operations::Operation;
use crate::app::tools::common::SAVE_ACTION;
use crate::app::tools::testing::{props, straight_track, track, RecordingHost};
use crate::app::tools::{AnyToolSession, CursorStyle, Key, Modifiers, ToolEnvironment, ToolSession};
use crate::core::{Entity, EntityId, Geometry, ObjectType, RangeEnd, RequestId, TrackRange};
use approx::assert_relative_eq;
use glam::DVec2;
use serde_json::json;

fn session(kind: RangeKind) -> ToolSession<RangeTool> {
    ToolSession::new(RangeTool::new(kind), ToolEnvironment::default())
}

fn click(session: &mut ToolSession<RangeTool>, host: &mut RecordingHost, x: f64, y: f64) {
    session
        .pointer_down(DVec2::new(x, y), Modifiers::default(), host)
        .expect("Klick");
}

fn move_to(session: &mut ToolSession<RangeTool>, host: &mut RecordingHost, x: f64, y: f64) {
    session
        .pointer_move(DVec2::new(x, y), &[], host)
        .expect("Bewegung");
}

fn ranges(session: &ToolSession<RangeTool>) -> Vec<TrackRange> {
    session.state().ranges().expect("Bereiche lesbar")
}

fn lines(session: &ToolSession<RangeTool>) -> Vec<Vec<DVec2>> {
    match &session.state().edit.entity.geometry {
        Geometry::MultiLineString(lines) => lines.clone(),
        other => panic!("MultiLineString erwartet, erhalten: {other:?}"),
    }
}

/// Sitzung mit vollem Bereich auf einem geraden Gleis der Länge 100.
fn session_with_full_range(kind: RangeKind, host: &mut RecordingHost) -> ToolSession<RangeTool> {
    let mut session = session(kind);
    session
        .entity_click(
            &straight_track("t", 100.0),
            DVec2::new(50.0, 0.0),
            Modifiers::default(),
            host,
        )
        .expect("Klick auf Gleis");
    session
}

#[test]
fn test_click_on_track_toggles_full_range() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::ELECTRIFICATION, &mut host);

    assert_eq!(
        ranges(&session),
        vec![TrackRange::full(EntityId::from("t"), 100.0)]
    );
    assert_eq!(lines(&session), vec![vec![DVec2::ZERO, DVec2::new(100.0, 0.0)]]);
    assert!(host.track_requests.is_empty(), "Gleis kommt aus dem Klick");

    session
        .entity_click(
            &straight_track("t", 100.0),
            DVec2::new(50.0, 0.0),
            Modifiers::default(),
            &mut host,
        )
        .expect("Klick auf Gleis");
    assert!(ranges(&session).is_empty());
    assert!(lines(&session).is_empty());
}

#[test]
fn test_drag_extremity_allows_inversion_until_release() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::ELECTRIFICATION, &mut host);

    // Ende auf 40 ziehen
    click(&mut session, &mut host, 99.5, 0.5);
    assert!(matches!(
        session.state().interaction,
        RangeInteraction::DraggingRangeExtremity {
            range_index: 0,
            end: RangeEnd::End,
            ..
        }
    ));
    assert_eq!(session.cursor_style(false), CursorStyle::Grabbing);
    move_to(&mut session, &mut host, 40.0, 3.0);
    click(&mut session, &mut host, 40.0, 3.0);
    assert_relative_eq!(ranges(&session)[0].end, 40.0, epsilon = 1e-9);

    // Anfang über das Ende hinaus ziehen
    click(&mut session, &mut host, 0.5, 0.0);
    move_to(&mut session, &mut host, 70.0, -2.0);
    let dragged = &ranges(&session)[0];
    assert_relative_eq!(dragged.begin, 70.0, epsilon = 1e-9);
    assert_relative_eq!(dragged.end, 40.0, epsilon = 1e-9);
    assert!(!dragged.is_canonical());

    click(&mut session, &mut host, 70.0, -2.0);
    let released = &ranges(&session)[0];
    assert!(released.is_canonical());
    assert_relative_eq!(released.begin, 40.0, epsilon = 1e-9);
    assert_relative_eq!(released.end, 70.0, epsilon = 1e-9);
    assert_eq!(session.state().interaction, RangeInteraction::Idle);

    let line = &lines(&session)[0];
    assert_relative_eq!(line[0].x, 40.0, epsilon = 1e-9);
    assert_relative_eq!(line[line.len() - 1].x, 70.0, epsilon = 1e-9);
}

#[test]
fn test_drag_beyond_track_end_is_clamped() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::ELECTRIFICATION, &mut host);

    click(&mut session, &mut host, 0.0, 1.0);
    move_to(&mut session, &mut host, -40.0, 0.0);
    assert_relative_eq!(ranges(&session)[0].begin, 0.0);
    move_to(&mut session, &mut host, 180.0, 0.0);
    assert_relative_eq!(ranges(&session)[0].begin, 100.0);
}

#[test]
fn test_escape_restores_range_before_drag() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::ELECTRIFICATION, &mut host);

    click(&mut session, &mut host, 100.0, 0.0);
    move_to(&mut session, &mut host, 10.0, 0.0);
    session.key_down(Key::Escape, &mut host).expect("Escape");

    assert_eq!(session.state().interaction, RangeInteraction::Idle);
    assert_eq!(
        ranges(&session),
        vec![TrackRange::full(EntityId::from("t"), 100.0)]
    );
    assert_eq!(lines(&session), vec![vec![DVec2::ZERO, DVec2::new(100.0, 0.0)]]);
}

#[test]
fn test_range_on_drifting_track_ends_at_last_vertex() {
    let mut session = session(RangeKind::SPEED_RESTRICTION);
    let mut host = RecordingHost::default();
    let restriction = Entity::persisted(
        "sr1",
        ObjectType::SpeedRestriction,
        Geometry::Null,
        props(json!({
            "track_ranges": [{ "track": "t1", "begin": 90.0, "end": 100.0 }],
            "marker_signs": [],
            "speed_limit": 30,
        })),
    );
    assert!(session.edit_entity(restriction, &mut host).expect("Laden"));
    assert_eq!(host.track_requests.len(), 1);
    let request = host.track_requests[0].request;

    // noch nicht geladen: keine Geometrie, kein Fehler
    assert!(lines(&session).is_empty());

    let drifting = track("t1", vec![DVec2::ZERO, DVec2::new(0.0, 97.3)], 100.0);
    session
        .tracks_loaded(request, Ok(vec![drifting]), &mut host)
        .expect("Antwort");

    let line = &lines(&session)[0];
    assert!(line.len() >= 2);
    assert_relative_eq!(line[0].y, 87.57, epsilon = 1e-6 * 97.3);
    assert_eq!(line[line.len() - 1], DVec2::new(0.0, 97.3));
}

#[test]
fn test_stale_track_response_is_ignored() {
    let mut session = session(RangeKind::ELECTRIFICATION);
    let mut host = RecordingHost::default();
    let electrification = Entity::persisted(
        "e1",
        ObjectType::Electrification,
        Geometry::Null,
        props(json!({
            "track_ranges": [{ "track": "t", "begin": 0.0, "end": 10.0 }],
            "voltage": "25000V",
        })),
    );
    session
        .edit_entity(electrification, &mut host)
        .expect("Laden");
    let request = host.track_requests[0].request;

    session
        .tracks_loaded(
            RequestId(request.0 + 1),
            Ok(vec![straight_track("t", 10.0)]),
            &mut host,
        )
        .expect("veraltete Antwort");
    assert!(session.state().tracks.is_loading(&EntityId::from("t")));
    assert!(lines(&session).is_empty());

    session
        .tracks_loaded(request, Ok(vec![straight_track("t", 10.0)]), &mut host)
        .expect("Antwort");
    assert_eq!(lines(&session).len(), 1);
    assert_eq!(session.state().value(), Some(&json!("25000V")));
}

#[test]
fn test_marker_sign_moves_along_cached_track() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::SPEED_RESTRICTION, &mut host);

    assert!(session
        .trigger_action(ADD_MARKER_SIGN_ACTION, &mut host)
        .expect("Schild"));
    assert!(matches!(
        session.state().interaction,
        RangeInteraction::MovingMarkerSign { sign_index: 0, .. }
    ));
    // während des Verschiebens kein Speichern
    assert!(!session.trigger_action(SAVE_ACTION, &mut host).expect("kein Fehler"));

    move_to(&mut session, &mut host, 30.0, 4.0);
    click(&mut session, &mut host, 30.0, 4.0);

    let signs = session.state().signs().expect("Schilder lesbar");
    assert_eq!(signs.len(), 1);
    assert_eq!(signs[0].track.as_str(), "t");
    assert_relative_eq!(signs[0].position, 30.0, epsilon = 1e-9);
    assert_eq!(signs[0].kind, DEFAULT_SIGN_KIND);
    assert_eq!(session.state().interaction, RangeInteraction::Idle);

    // Schild erneut greifen und mit Escape zurücksetzen
    click(&mut session, &mut host, 30.0, 0.5);
    move_to(&mut session, &mut host, 80.0, 0.0);
    session.key_down(Key::Escape, &mut host).expect("Escape");
    let signs = session.state().signs().expect("Schilder lesbar");
    assert_relative_eq!(signs[0].position, 30.0, epsilon = 1e-9);
}

#[test]
fn test_escape_discards_freshly_added_marker_sign() {
    let mut host = RecordingHost::default();
    let mut session = session_with_full_range(RangeKind::SPEED_RESTRICTION, &mut host);
    let before = session.state().edit.entity.clone();

    assert!(session
        .trigger_action(ADD_MARKER_SIGN_ACTION, &mut host)
        .expect("Schild"));
    move_to(&mut session, &mut host, 30.0, 4.0);
    session.key_down(Key::Escape, &mut host).expect("Escape");

    assert!(session.state().signs().expect("Schilder lesbar").is_empty());
    assert_eq!(session.state().interaction, RangeInteraction::Idle);
    assert_eq!(session.state().edit.entity, before);
}

#[test]
fn test_dragging_one_end_yields_single_patch_operation() {
    let mut session = session(RangeKind::ELECTRIFICATION);
    let mut host = RecordingHost::default();
    let electrification = Entity::persisted(
        "e1",
        ObjectType::Electrification,
        Geometry::Null,
        props(json!({
            "track_ranges": [
                { "track": "t", "begin": 0, "end": 100 },
                { "track": "u", "begin": 10, "end": 20 }
            ],
            "voltage": "25000V",
        })),
    );
    assert!(session.edit_entity(electrification, &mut host).expect("Laden"));
    let request = host.track_requests[0].request;
    session
        .tracks_loaded(
            request,
            Ok(vec![straight_track("t", 100.0), straight_track("u", 50.0)]),
            &mut host,
        )
        .expect("Antwort");

    click(&mut session, &mut host, 99.5, 0.5);
    move_to(&mut session, &mut host, 60.0, 1.0);
    click(&mut session, &mut host, 60.0, 1.0);
    assert!(session.trigger_action(SAVE_ACTION, &mut host).expect("Speichern"));

    let Operation::Update { patch, .. } = &host.commits[0].payload.update[0] else {
        panic!("Update erwartet");
    };
    assert_eq!(patch.len(), 1);
    assert_eq!(patch.0[0].path(), "/track_ranges/0/end");
}

#[test]
fn test_marker_sign_action_hidden_for_electrification() {
    let mut host = RecordingHost::default();
    let session = session_with_full_range(RangeKind::ELECTRIFICATION, &mut host);
    assert!(!session
        .actions()
        .iter()
        .any(|a| a.id == ADD_MARKER_SIGN_ACTION));
}

#[test]
fn test_save_requires_ranges_and_sends_create() {
    let mut session = session(RangeKind::ELECTRIFICATION);
    let mut host = RecordingHost::default();
    assert!(!session.trigger_action(SAVE_ACTION, &mut host).expect("kein Fehler"));

    session
        .entity_click(
            &straight_track("t", 100.0),
            DVec2::new(50.0, 0.0),
            Modifiers::default(),
            &mut host,
        )
        .expect("Klick auf Gleis");
    assert!(session.trigger_action(SAVE_ACTION, &mut host).expect("Speichern"));

    let Operation::Create {
        object_type,
        payload,
    } = &host.commits[0].payload.create[0]
    else {
        panic!("Create erwartet");
    };
    assert_eq!(*object_type, ObjectType::Electrification);
    assert_eq!(payload["track_ranges"][0]["track"], json!("t"));
    assert_eq!(payload["track_ranges"][0]["end"], json!(100.0));
    assert!(payload.contains_key("voltage"));
    assert!(!payload.contains_key("geo"));
}

#[test]
fn test_edit_entity_rejects_malformed_ranges() {
    let mut session = session(RangeKind::ELECTRIFICATION);
    let mut host = RecordingHost::default();
    let broken = Entity::persisted(
        "e",
        ObjectType::Electrification,
        Geometry::Null,
        props(json!({ "track_ranges": "kaputt" })),
    );
    assert!(session.edit_entity(broken, &mut host).is_err());
    assert!(host.track_requests.is_empty());
}
