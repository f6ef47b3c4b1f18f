//! Integrationstests über den ToolManager:
//! - Anlegen, Speichern und Ersetzen der Sentinel-ID
//! - Fehlgeschlagener Commit und doppeltes Speichern
//! - Veraltete Gleis-Antworten und Bereiche auf Gleisen mit Längendrift
//! - Übergabe der Auswahl an das Bearbeitungs-Tool

mod support;

use glam::DVec2;
use infra_editor::app::tools::common::SAVE_ACTION;
use infra_editor::app::tools::point::{Placement, PointState, POSITION_KEY, TRACK_KEY};
use infra_editor::app::tools::range::RangeState;
use infra_editor::app::tools::selection::EDIT_ACTION;
use infra_editor::app::tools::{
    Modifiers, PointTool, RangeTool, ToolEnvironment, SIGNAL_TOOL_ID, SPEED_RESTRICTION_TOOL_ID,
};
use infra_editor::core::RequestId;
use infra_editor::{Entity, EntityId, Geometry, ObjectType, Operation, ToolManager};
use serde_json::json;
use support::{drifting_track, props, FakeBackend};

fn manager() -> ToolManager {
    ToolManager::new(ToolEnvironment::default())
}

fn signal_state(manager: &ToolManager) -> &PointState {
    manager
        .session::<PointTool>(SIGNAL_TOOL_ID)
        .expect("Signal-Tool registriert")
        .state()
}

/// Platziert ein neues Signal auf Gleis `t1` und löst Speichern aus.
fn place_and_save_signal(manager: &mut ToolManager, backend: &mut FakeBackend) -> RequestId {
    assert!(manager
        .set_active_by_id(SIGNAL_TOOL_ID, backend)
        .expect("Aktivieren"));
    let nearby = vec![drifting_track("t1")];
    manager
        .pointer_move(DVec2::new(1.5, 48.65), &nearby, backend)
        .expect("Bewegung");
    manager
        .pointer_down(DVec2::new(1.5, 48.65), Modifiers::default(), backend)
        .expect("Klick");

    let fetch = backend.track_requests.last().expect("Gleis-Anfrage").request;
    manager
        .tracks_loaded(fetch, Ok(nearby), backend)
        .expect("Gleis-Antwort");
    assert_eq!(signal_state(manager).placement, Placement::Placed);

    assert!(manager.trigger_action(SAVE_ACTION, backend).expect("Speichern"));
    backend.commits.last().expect("Commit gesendet").request
}

#[test]
fn test_create_signal_replaces_sentinel_everywhere() {
    let mut manager = manager();
    let mut backend = FakeBackend::default();
    let request = place_and_save_signal(&mut manager, &mut backend);

    let Operation::Create { payload, .. } = &backend.commits[0].payload.create[0] else {
        panic!("Create erwartet");
    };
    assert_eq!(payload[TRACK_KEY], json!("t1"));
    let position = payload[POSITION_KEY].as_f64().expect("Position");
    assert!((position - 50.0).abs() <= 1e-6 * 97.3);
    assert!(manager.store().contains(&EntityId::from("t1")));

    let saved = Entity::persisted(
        "S-7",
        ObjectType::Signal,
        Geometry::Point(DVec2::new(0.0, 48.65)),
        payload.clone(),
    );
    manager
        .commit_result(request, Ok(vec![saved]), &mut backend)
        .expect("Commit-Antwort");

    let state = signal_state(&manager);
    assert_eq!(state.edit.entity.id.as_str(), "S-7");
    assert_eq!(
        state.edit.snapshot.as_ref().map(|s| s.id.as_str()),
        Some("S-7")
    );
    assert!(!state.edit.is_saving());
    assert!(manager.store().contains(&EntityId::from("S-7")));
    assert!(!manager.store().contains(&EntityId::new_sentinel()));

    // erneutes Speichern ohne Änderung sendet nichts
    assert!(manager.trigger_action(SAVE_ACTION, &mut backend).expect("Speichern"));
    assert_eq!(backend.commits.len(), 1);
}

#[test]
fn test_failed_commit_keeps_edit_and_allows_retry() {
    let mut manager = manager();
    let mut backend = FakeBackend::default();
    let request = place_and_save_signal(&mut manager, &mut backend);
    let before = signal_state(&manager).edit.entity.clone();

    let error = manager
        .commit_result(request, Err("503 Service Unavailable".into()), &mut backend)
        .expect_err("Fehler geht an den Host");
    assert!(error.to_string().contains("503"));

    let state = signal_state(&manager);
    assert_eq!(state.edit.entity, before);
    assert!(state.edit.entity.is_new());
    assert!(!state.edit.is_saving());

    assert!(manager.trigger_action(SAVE_ACTION, &mut backend).expect("Speichern"));
    assert_eq!(backend.commits.len(), 2);
}

#[test]
fn test_save_is_disabled_while_commit_pending() {
    let mut manager = manager();
    let mut backend = FakeBackend::default();
    let request = place_and_save_signal(&mut manager, &mut backend);

    assert!(!manager.trigger_action(SAVE_ACTION, &mut backend).expect("kein Fehler"));
    assert_eq!(backend.commits.len(), 1);
    assert!(manager
        .actions()
        .iter()
        .any(|a| a.id == SAVE_ACTION && !a.enabled));

    // eine Antwort mit fremder ID ändert nichts
    manager
        .commit_result(RequestId(request.0 + 40), Ok(Vec::new()), &mut backend)
        .expect("veraltet");
    assert!(signal_state(&manager).edit.is_saving());
}

#[test]
fn test_range_on_drifting_track_with_stale_fetch() {
    let mut manager = manager();
    let mut backend = FakeBackend::default();
    let restriction = Entity::persisted(
        "sr1",
        ObjectType::SpeedRestriction,
        Geometry::Null,
        props(json!({
            "track_ranges": [{ "track": "t1", "begin": 90.0, "end": 100.0 }],
            "marker_signs": [],
            "speed_limit": 80,
        })),
    );
    assert!(manager
        .edit_entity(SPEED_RESTRICTION_TOOL_ID, restriction, &mut backend)
        .expect("Laden"));
    let fetch = backend.track_requests[0].request;

    let range_state = |manager: &ToolManager| -> RangeState {
        manager
            .session::<RangeTool>(SPEED_RESTRICTION_TOOL_ID)
            .expect("Bereichs-Tool registriert")
            .state()
            .clone()
    };

    manager
        .tracks_loaded(RequestId(fetch.0 + 1), Ok(vec![drifting_track("t1")]), &mut backend)
        .expect("veraltete Antwort");
    assert_eq!(
        range_state(&manager).edit.entity.geometry,
        Geometry::MultiLineString(Vec::new())
    );

    manager
        .tracks_loaded(fetch, Ok(vec![drifting_track("t1")]), &mut backend)
        .expect("Antwort");
    let Geometry::MultiLineString(lines) = range_state(&manager).edit.entity.geometry else {
        panic!("MultiLineString erwartet");
    };
    let line = &lines[0];
    assert!((line[0].y - 87.57).abs() <= 1e-6 * 97.3);
    assert_eq!(line[line.len() - 1], DVec2::new(0.0, 97.3));
}

#[test]
fn test_selection_hands_entity_to_editing_tool() {
    let mut manager = manager();
    let mut backend = FakeBackend::default();
    assert!(manager
        .set_active_by_id("selection", &mut backend)
        .expect("Aktivieren"));

    let signal = Entity::persisted(
        "s1",
        ObjectType::Signal,
        Geometry::Point(DVec2::new(0.0, 20.0)),
        props(json!({ "track": "t1", "position": 20.5, "angle": 1.5707963267948966 })),
    );
    manager
        .entity_click(&signal, DVec2::new(0.0, 20.0), Modifiers::default(), &mut backend)
        .expect("Klick");
    assert!(manager.trigger_action(EDIT_ACTION, &mut backend).expect("Bearbeiten"));

    let switch = backend.switches.pop().expect("Tool-Wechsel angefragt");
    assert_eq!(switch.tool_id, SIGNAL_TOOL_ID);
    assert!(manager
        .edit_entity(&switch.tool_id, switch.entity, &mut backend)
        .expect("Laden"));

    assert_eq!(manager.active_id(), Some(SIGNAL_TOOL_ID));
    let state = signal_state(&manager);
    assert_eq!(state.edit.entity.id.as_str(), "s1");
    assert_eq!(state.placement, Placement::Placed);
    assert_eq!(backend.track_requests.len(), 1, "Gleis wird beim Laden angefragt");
}
