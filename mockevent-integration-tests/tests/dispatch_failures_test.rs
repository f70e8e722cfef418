//! Listener failures during dispatch.

use mockevent::{InvocationFailure, ObservationError, Observatory};
use mockevent_testing::assertions::expect_dispatch_failures;
use mockevent_testing::{callback, fixtures, CallJournal, RecordingListener, ScriptedMock};
use std::sync::Arc;

fn attach(sensor: &ScriptedMock, listener: RecordingListener) -> Arc<RecordingListener> {
    let listener = listener.shared();
    let _outcomes = sensor
        .invoke(
            "addTemperatureListener",
            vec![listener.listener_ref().into()],
        )
        .unwrap();
    listener
}

#[test]
fn failing_listener_does_not_stop_the_others() {
    // Given three listeners where the middle one fails
    let observatory = Observatory::new(fixtures::catalog());
    let sensor = ScriptedMock::new(fixtures::temperature_sensor());
    let _observed = observatory.register_mock_for_observation(&sensor).unwrap();
    let journal = CallJournal::new();
    let first = attach(
        &sensor,
        RecordingListener::new("first", fixtures::TEMPERATURE_LISTENER)
            .with_journal(journal.clone()),
    );
    let _broken = attach(
        &sensor,
        RecordingListener::new("broken", fixtures::TEMPERATURE_LISTENER)
            .with_journal(journal.clone())
            .failing_with("display unplugged"),
    );
    let last = attach(
        &sensor,
        RecordingListener::new("last", fixtures::TEMPERATURE_LISTENER)
            .with_journal(journal.clone()),
    );

    // When an event is fired
    let failures = expect_dispatch_failures(observatory.fire_event(
        sensor.mock(),
        &callback("onChange"),
        &[19.0.into()],
    ));

    // Then every listener was attempted and the failure is reported
    assert_eq!(
        journal.entries(),
        vec!["first.onChange", "broken.onChange", "last.onChange"]
    );
    assert_eq!(first.call_count(), 1);
    assert_eq!(last.call_count(), 1);
    assert_eq!(failures.attempted, 3);
    assert_eq!(failures.invoked, 2);
    assert_eq!(failures.failures.len(), 1);
    assert_eq!(failures.failures[0].position, 1);
    assert!(failures.failures[0].listener.starts_with("broken#"));
    assert!(matches!(
        &failures.failures[0].cause,
        InvocationFailure::Callback(cause) if cause.0 == "display unplugged"
    ));
    assert!(failures
        .to_string()
        .starts_with("1 of 3 listener invocation(s) failed for TemperatureListener.onChange(float)"));
}

#[test]
fn arguments_that_do_not_fit_fail_every_listener() {
    let observatory = Observatory::new(fixtures::catalog());
    let sensor = ScriptedMock::new(fixtures::temperature_sensor());
    let _observed = observatory.register_mock_for_observation(&sensor).unwrap();
    let a = attach(&sensor, RecordingListener::new("a", fixtures::TEMPERATURE_LISTENER));
    let b = attach(&sensor, RecordingListener::new("b", fixtures::TEMPERATURE_LISTENER));

    let result = observatory.fire_event(sensor.mock(), &callback("onChange"), &["warm".into()]);

    let ObservationError::Dispatch(failures) = result.unwrap_err() else {
        panic!("expected dispatch failures");
    };
    assert_eq!(failures.invoked, 0);
    assert_eq!(failures.failures.len(), 2);
    assert!(failures
        .failures
        .iter()
        .all(|failure| matches!(failure.cause, InvocationFailure::ArgumentMismatch(_))));
    assert_eq!(a.call_count(), 0);
    assert_eq!(b.call_count(), 0);
}
