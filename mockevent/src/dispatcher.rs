//! Event dispatcher.
//!
//! Firing an event resolves the selector, takes a snapshot of the matching
//! listeners and invokes the resolved callback on each of them in
//! registration order. The registry lock is released before the first
//! callback runs, so listeners may register or unregister on the same mock
//! while being notified; such changes take effect for the next event.
//!
//! Every listener is attempted. Failures (arguments that do not fit the
//! callback, or a listener reporting an error) are collected and returned
//! together once the last listener has run.

use crate::classifier::Classification;
use crate::errors::{
    DispatchFailures, InvocationFailure, ListenerFailure, ObservationError, ObservationResult,
};
use crate::registry::ListenerRegistry;
use crate::resolver::{ContractResolver, ResolvedEvent, Selector};
use crate::value::{adapt_arguments, ListenerRef, Value};
use tracing::{debug, instrument, trace};

/// Invokes resolved callbacks on registered listeners.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher {
    strict_listener_check: bool,
}

impl EventDispatcher {
    /// Creates a dispatcher; zero matching listeners is not an error.
    pub const fn new() -> Self {
        Self {
            strict_listener_check: false,
        }
    }

    /// Makes firing an event without matching listeners an error.
    #[must_use]
    pub const fn with_strict_listener_check(mut self, strict: bool) -> Self {
        self.strict_listener_check = strict;
        self
    }

    /// Resolves `selector` and notifies the matching listeners in `registry`.
    ///
    /// Returns how many listeners were invoked successfully. `registry` is
    /// `None` when no registration has been observed on the mock yet.
    #[instrument(skip_all, fields(type_name = %classification.type_name(), selector = %selector))]
    pub fn fire_event(
        &self,
        classification: &Classification,
        registry: Option<&ListenerRegistry>,
        selector: &Selector,
        args: &[Value],
    ) -> ObservationResult<usize> {
        let event = ContractResolver::new(classification).resolve(selector, args)?;
        let listeners = registry
            .map(|registry| registry.registered_listeners(event.contract.name(), &event.key))
            .unwrap_or_default();

        if listeners.is_empty() {
            if self.strict_listener_check {
                return Err(ObservationError::ListenersNotFound {
                    contract: event.contract.name().clone(),
                    key: event.key,
                });
            }
            debug!(event = %event, "no listener registered");
            return Ok(0);
        }

        Self::dispatch(&event, &listeners, args).map_err(ObservationError::from)
    }

    /// Invokes `event` on each listener in order, collecting failures.
    pub fn dispatch(
        event: &ResolvedEvent,
        listeners: &[ListenerRef],
        args: &[Value],
    ) -> Result<usize, DispatchFailures> {
        let adapted = adapt_arguments(&event.callback.params, args);
        let mut failures = Vec::new();
        let mut invoked = 0;

        for (position, listener) in listeners.iter().enumerate() {
            let outcome: Result<(), InvocationFailure> = match &adapted {
                Ok(adapted) => listener
                    .on_callback(&event.callback, adapted)
                    .map_err(Into::into),
                Err(mismatch) => Err(mismatch.clone().into()),
            };
            match outcome {
                Ok(()) => {
                    trace!(event = %event, position, listener = %listener, "listener notified");
                    invoked += 1;
                }
                Err(cause) => {
                    debug!(event = %event, position, listener = %listener, %cause, "listener invocation failed");
                    failures.push(ListenerFailure {
                        position,
                        listener: listener.to_string(),
                        cause,
                    });
                }
            }
        }

        debug!(event = %event, attempted = listeners.len(), invoked, "event dispatched");
        if failures.is_empty() {
            Ok(invoked)
        } else {
            Err(DispatchFailures {
                event: event.to_string(),
                attempted: listeners.len(),
                invoked,
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::classifier::Classifier;
    use crate::errors::ArgumentMismatch;
    use crate::shape::{MethodSignature, ParamType, TypeShape};
    use crate::types::{MethodName, TypeName};
    use crate::value::{CallbackError, Listener, SelectorKey};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        fail: bool,
        seen: Mutex<Vec<Vec<Value>>>,
    }

    impl Listener for Recorder {
        fn implements(&self, contract: &TypeName) -> bool {
            contract.as_ref() == "TemperatureListener"
        }

        fn on_callback(&self, _: &MethodSignature, args: &[Value]) -> Result<(), CallbackError> {
            self.seen.lock().push(args.to_vec());
            if self.fail {
                return Err(CallbackError::new("sensor offline"));
            }
            Ok(())
        }

        fn description(&self) -> String {
            "recorder".to_string()
        }
    }

    fn name(s: &str) -> TypeName {
        TypeName::try_new(s).unwrap()
    }

    fn sig(method: &str, params: Vec<ParamType>) -> MethodSignature {
        MethodSignature::new(MethodName::try_new(method).unwrap(), params)
    }

    fn classification() -> Arc<Classification> {
        let listener = ParamType::object(name("TemperatureListener"));
        let catalog = TypeCatalog::with_shapes([TypeShape::interface(name("TemperatureListener"))
            .with_method(sig("onChange", vec![ParamType::Float]))])
        .unwrap();
        let sensor = TypeShape::class(name("TemperatureSensor"))
            .with_method(sig("addTemperatureListener", vec![listener.clone()]))
            .with_method(sig("removeTemperatureListener", vec![listener]));
        Classifier::new(Arc::new(catalog)).classify(&sensor)
    }

    fn on_change() -> Selector {
        Selector::callback(MethodName::try_new("onChange").unwrap())
    }

    fn register(
        classification: &Classification,
        registry: &ListenerRegistry,
        listener: Arc<Recorder>,
    ) -> ListenerRef {
        let listener = ListenerRef::from_arc(listener);
        registry
            .on_register(&classification.pairs()[0], listener.clone(), SelectorKey::none())
            .unwrap();
        listener
    }

    #[test]
    fn notifies_listeners_in_registration_order() {
        struct Journaled(&'static str, Arc<Mutex<Vec<&'static str>>>);
        impl Listener for Journaled {
            fn implements(&self, _: &TypeName) -> bool {
                true
            }
            fn on_callback(&self, _: &MethodSignature, _: &[Value]) -> Result<(), CallbackError> {
                self.1.lock().push(self.0);
                Ok(())
            }
        }

        let classification = classification();
        let registry = ListenerRegistry::new();
        let journal = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            registry
                .on_register(
                    &classification.pairs()[0],
                    ListenerRef::new(Journaled(label, Arc::clone(&journal))),
                    SelectorKey::none(),
                )
                .unwrap();
        }

        let invoked = EventDispatcher::new()
            .fire_event(&classification, Some(&registry), &on_change(), &[21.5.into()])
            .unwrap();

        assert_eq!(invoked, 3);
        assert_eq!(*journal.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn arguments_are_adapted_to_the_callback() {
        let classification = classification();
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let _listener = register(&classification, &registry, Arc::clone(&recorder));

        let invoked = EventDispatcher::new()
            .fire_event(&classification, Some(&registry), &on_change(), &[21.into()])
            .unwrap();

        assert_eq!(invoked, 1);
        assert_eq!(*recorder.seen.lock(), vec![vec![Value::Float(21.0)]]);
    }

    #[traced_test]
    #[test]
    fn no_listeners_yields_zero() {
        let classification = classification();
        let invoked = EventDispatcher::new()
            .fire_event(&classification, None, &on_change(), &[1.0.into()])
            .unwrap();
        assert_eq!(invoked, 0);
        assert!(logs_contain("no listener registered"));
    }

    #[test]
    fn strict_check_rejects_missing_listeners() {
        let classification = classification();
        let err = EventDispatcher::new()
            .with_strict_listener_check(true)
            .fire_event(&classification, Some(&ListenerRegistry::new()), &on_change(), &[1.0.into()])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no listener registered for 'TemperatureListener' with selector()"
        );
    }

    #[test]
    fn failures_do_not_stop_remaining_listeners() {
        let classification = classification();
        let registry = ListenerRegistry::new();
        let failing = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let healthy = Arc::new(Recorder::default());
        let _failing = register(&classification, &registry, Arc::clone(&failing));
        let _healthy = register(&classification, &registry, Arc::clone(&healthy));

        let err = EventDispatcher::new()
            .fire_event(&classification, Some(&registry), &on_change(), &[3.0.into()])
            .unwrap_err();

        let ObservationError::Dispatch(failures) = err else {
            panic!("expected dispatch failures");
        };
        assert_eq!(failures.attempted, 2);
        assert_eq!(failures.invoked, 1);
        assert_eq!(failures.failures.len(), 1);
        assert_eq!(failures.failures[0].position, 0);
        assert_eq!(
            failures.failures[0].cause,
            InvocationFailure::Callback(CallbackError::new("sensor offline"))
        );
        assert_eq!(healthy.seen.lock().len(), 1);
    }

    #[test]
    fn argument_mismatch_is_reported_for_every_listener() {
        let classification = classification();
        let registry = ListenerRegistry::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let _first = register(&classification, &registry, Arc::clone(&first));
        let _second = register(&classification, &registry, Arc::clone(&second));

        let err = EventDispatcher::new()
            .fire_event(
                &classification,
                Some(&registry),
                &on_change(),
                &[1.0.into(), 2.0.into()],
            )
            .unwrap_err();

        let ObservationError::Dispatch(failures) = err else {
            panic!("expected dispatch failures");
        };
        assert_eq!(failures.invoked, 0);
        assert!(failures.failures.iter().all(|failure| failure.cause
            == InvocationFailure::ArgumentMismatch(ArgumentMismatch::Count {
                expected: 1,
                actual: 2
            })));
        assert_eq!(failures.failures.len(), 2);
        assert!(first.seen.lock().is_empty());
    }
}
