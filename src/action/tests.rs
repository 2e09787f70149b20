//! Tests for action status

use super::*;

#[test]
fn test_action_kind_names() {
    assert_eq!(ActionKind::InitialLoad.to_string(), "initial_load");
    assert_eq!(ActionKind::Refresh.to_string(), "refresh");
    assert_eq!(ActionKind::NextPage.as_str(), "next_page");
}

#[test]
fn test_action_starts_idle() {
    let action = Action::<String>::new(ActionKind::Refresh);
    assert_eq!(action.kind(), ActionKind::Refresh);
    assert!(!action.is_executing().get());
    assert!(action.last_error().get().is_none());
    assert!(matches!(action.state(), ActionState::Idle));
}

#[test]
fn test_action_in_flight_tracks_count() {
    let action = Action::<String>::new(ActionKind::InitialLoad);

    action.publish_in_flight(2);
    assert!(action.state().is_in_flight());

    action.publish_in_flight(1);
    assert!(action.is_executing().get());

    action.publish_in_flight(0);
    assert!(!action.is_executing().get());
}

#[test]
fn test_action_failure_is_recorded_and_emitted() {
    let action = Action::<String>::new(ActionKind::NextPage);
    let mut errors = action.errors().subscribe();

    action.failed(Arc::new("timeout".to_string()));

    assert_eq!(errors.try_recv().unwrap().as_str(), "timeout");
    assert!(action.state().is_failed());
    assert_eq!(
        action.last_error().get().as_deref().map(String::as_str),
        Some("timeout")
    );
}

#[test]
fn test_action_success_clears_last_error() {
    let action = Action::<String>::new(ActionKind::NextPage);
    action.failed(Arc::new("timeout".to_string()));

    action.succeeded();

    assert!(action.last_error().get().is_none());
    assert!(matches!(action.state(), ActionState::Idle));
}

#[test]
fn test_in_flight_takes_precedence_over_failure() {
    let action = Action::<String>::new(ActionKind::Refresh);
    action.failed(Arc::new("offline".to_string()));
    action.publish_in_flight(1);

    assert!(action.state().is_in_flight());
}
