//! Helpers that unpack observation results in tests.
//!
//! Each helper panics with the offending result when it does not hold the
//! expected variant.

use mockevent::{DispatchFailures, ObservationError, ObservationResult};
use std::fmt::Debug;

/// Asserts that an event reached exactly `expected` listeners.
#[track_caller]
pub fn assert_invoked(result: ObservationResult<usize>, expected: usize) {
    match result {
        Ok(invoked) => assert_eq!(
            invoked, expected,
            "expected {expected} listener(s) invoked, got {invoked}"
        ),
        Err(e) => panic!("expected {expected} listener(s) invoked, got error: {e}"),
    }
}

/// Unwraps the per-listener failures of a dispatch.
#[track_caller]
pub fn expect_dispatch_failures<T: Debug>(result: ObservationResult<T>) -> DispatchFailures {
    match result {
        Err(ObservationError::Dispatch(failures)) => failures,
        other => panic!("expected dispatch failures, got {other:?}"),
    }
}

/// Unwraps the candidates of an ambiguous selector.
#[track_caller]
pub fn expect_ambiguous<T: Debug>(result: ObservationResult<T>) -> Vec<String> {
    match result {
        Err(ObservationError::AmbiguousSelector { candidates, .. }) => candidates,
        other => panic!("expected an ambiguous selector, got {other:?}"),
    }
}

/// Unwraps the rendered selector of an unresolved selector.
#[track_caller]
pub fn expect_unresolved<T: Debug>(result: ObservationResult<T>) -> String {
    match result {
        Err(ObservationError::UnresolvedSelector { selector, .. }) => selector,
        other => panic!("expected an unresolved selector, got {other:?}"),
    }
}

/// Unwraps the descriptions of listeners left registered.
#[track_caller]
pub fn expect_still_registered<T: Debug>(result: ObservationResult<T>) -> Vec<String> {
    match result {
        Err(ObservationError::ListenersStillRegistered { listeners, .. }) => listeners,
        other => panic!("expected listeners still registered, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockevent::TypeName;

    #[test]
    fn unpacks_matching_variants() {
        assert_invoked(Ok(2), 2);
        let candidates = expect_ambiguous::<usize>(Err(ObservationError::AmbiguousSelector {
            selector: "onChange".to_string(),
            candidates: vec!["A.onChange()".to_string(), "B.onChange()".to_string()],
        }));
        assert_eq!(candidates.len(), 2);
        let selector = expect_unresolved::<usize>(Err(ObservationError::UnresolvedSelector {
            selector: "missing".to_string(),
            type_name: TypeName::try_new("Sensor").unwrap(),
        }));
        assert_eq!(selector, "missing");
    }

    #[test]
    #[should_panic(expected = "expected dispatch failures")]
    fn panics_on_other_results() {
        let _failures = expect_dispatch_failures(Ok(1));
    }
}
