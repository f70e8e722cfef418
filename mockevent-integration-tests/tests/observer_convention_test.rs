//! Observers registered on a mocked observable.

use mockevent::{CallOutcome, ObservationError, Observatory, Value};
use mockevent_testing::assertions::assert_invoked;
use mockevent_testing::{callback, fixtures, RecordingListener, ScriptError, ScriptedMock};

fn observed_observable(observatory: &Observatory) -> ScriptedMock {
    let observable = ScriptedMock::new(fixtures::observable());
    let _observed = observatory
        .register_mock_for_observation(&observable)
        .unwrap();
    observable
}

#[test]
fn observer_is_updated_with_source_and_argument() {
    // Given an observer added to an observed observable
    let observatory = Observatory::new(fixtures::catalog());
    let observable = observed_observable(&observatory);
    let newsroom = RecordingListener::new("newsroom", fixtures::OBSERVER).shared();
    let outcomes = observable
        .invoke("addObserver", vec![newsroom.listener_ref().into()])
        .unwrap();
    assert_eq!(outcomes, vec![CallOutcome::Registered]);

    // When the observable notifies
    let invoked = observatory.fire_event(
        observable.mock(),
        &callback("update"),
        &[observable.as_value(), "headline".into()],
    );

    // Then the observer saw the source and the argument
    assert_invoked(invoked, 1);
    assert_eq!(
        newsroom.received_args("update"),
        vec![vec![observable.as_value(), Value::from("headline")]]
    );
}

#[test]
fn deleted_observer_is_not_updated() {
    let observatory = Observatory::new(fixtures::catalog());
    let observable = observed_observable(&observatory);
    let newsroom = RecordingListener::new("newsroom", fixtures::OBSERVER).shared();
    let _added = observable
        .invoke("addObserver", vec![newsroom.listener_ref().into()])
        .unwrap();
    let deleted = observable
        .invoke("deleteObserver", vec![newsroom.listener_ref().into()])
        .unwrap();
    assert_eq!(deleted, vec![CallOutcome::Unregistered]);

    assert_invoked(
        observatory.fire_event(
            observable.mock(),
            &callback("update"),
            &[observable.as_value(), Value::Null],
        ),
        0,
    );
    assert_eq!(newsroom.call_count(), 0);
}

#[test]
fn unrelated_calls_are_ignored() {
    let observatory = Observatory::new(fixtures::catalog());
    let observable = observed_observable(&observatory);

    let outcomes = observable
        .invoke("notifyObservers", vec!["ignored".into()])
        .unwrap();

    assert_eq!(outcomes, vec![CallOutcome::Ignored]);
}

#[test]
fn registering_a_non_observer_is_rejected() {
    let observatory = Observatory::new(fixtures::catalog());
    let observable = observed_observable(&observatory);
    let add_observer = fixtures::observable().methods[0].clone();
    let impostor = RecordingListener::new("impostor", fixtures::TEMPERATURE_LISTENER).shared();

    let err = observable
        .invoke_signature(add_observer.clone(), vec![impostor.listener_ref().into()])
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Observation(ObservationError::ListenerContractMismatch { .. })
    ));

    let err = observable
        .invoke_signature(add_observer, vec![Value::Null])
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Observation(ObservationError::ListenerContractMismatch { .. })
    ));

    let observed = observatory.observed(observable.mock()).unwrap();
    assert_eq!(observed.number_of_registered_listeners(), 0);
}
