//! The observation surface used by tests.
//!
//! An [`Observatory`] lives for one test. Mocks are handed to it through
//! [`Observatory::register_mock_for_observation`]; from then on every
//! registration call made on the mock is tracked, and the test can fire
//! events toward the registered listeners or verify that none remain.

use crate::catalog::TypeCatalog;
use crate::classifier::{Classification, Classifier};
use crate::config::ObservationConfig;
use crate::dispatcher::EventDispatcher;
use crate::errors::{ConfigError, ObservationError, ObservationResult};
use crate::observer::{CallSink, CapturedCall, InvocationObserver};
use crate::registry::{ListenerRegistry, RegisteredListener};
use crate::resolver::Selector;
use crate::shape::TypeShape;
use crate::types::{MockId, MockRef, TypeName};
use crate::value::{ListenerRef, SelectorKey, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A mocked instance as provided by a mocking-framework adapter.
pub trait MockInstance: Send + Sync {
    /// Identity and type of the instance.
    fn mock_ref(&self) -> MockRef;

    /// Shape of the mocked type.
    fn shape(&self) -> Arc<TypeShape>;

    /// Attaches `sink` to the instance's call feed.
    ///
    /// Returns the calls captured before the sink was attached, in
    /// invocation order. Every call must reach the sink exactly once, either
    /// through the returned backlog or live. Live calls may reach the sink
    /// before this returns.
    fn attach(&self, sink: Arc<dyn CallSink>) -> Vec<CapturedCall>;

    /// Removes `sink` from the instance's call feed.
    fn detach(&self, sink: &Arc<dyn CallSink>);
}

/// Observation state of one mock.
#[derive(Debug)]
pub struct ObservedMock {
    observer: Arc<InvocationObserver>,
    dispatcher: EventDispatcher,
}

impl ObservedMock {
    /// The observed mock.
    pub fn mock(&self) -> &MockRef {
        self.observer.mock()
    }

    /// The classification of the mock's type.
    pub fn classification(&self) -> &Arc<Classification> {
        self.observer.classification()
    }

    /// The observer attached to the mock's call feed.
    pub const fn observer(&self) -> &Arc<InvocationObserver> {
        &self.observer
    }

    /// Simulates the mock firing the event identified by `selector`.
    ///
    /// Returns how many listeners were invoked successfully.
    pub fn fire_event(&self, selector: &Selector, args: &[Value]) -> ObservationResult<usize> {
        self.dispatcher.fire_event(
            self.classification(),
            self.observer.registry(),
            selector,
            args,
        )
    }

    /// Listeners notified for `contract` under `key`: the ones registered
    /// with exactly that key plus the keyless ones.
    pub fn registered_listeners(&self, contract: &TypeName, key: &SelectorKey) -> Vec<ListenerRef> {
        self.observer
            .registry()
            .map(|registry| registry.registered_listeners(contract, key))
            .unwrap_or_default()
    }

    /// Listeners registered for `contract` under any key.
    pub fn listeners_for(&self, contract: &TypeName) -> Vec<ListenerRef> {
        self.observer
            .registry()
            .map(|registry| registry.listeners_for(contract))
            .unwrap_or_default()
    }

    /// Listeners registered for `contract` under exactly `key`.
    pub fn listeners_with_key(&self, contract: &TypeName, key: &SelectorKey) -> Vec<ListenerRef> {
        self.observer
            .registry()
            .map(|registry| registry.listeners_with_key(contract, key))
            .unwrap_or_default()
    }

    /// Every current registration.
    pub fn all_listeners(&self) -> Vec<RegisteredListener> {
        self.observer
            .registry()
            .map(ListenerRegistry::all_listeners)
            .unwrap_or_default()
    }

    /// Distinct `(contract, key)` combinations with registered listeners.
    pub fn registered_keys(&self) -> Vec<(TypeName, SelectorKey)> {
        self.observer
            .registry()
            .map(ListenerRegistry::registered_keys)
            .unwrap_or_default()
    }

    /// Number of listeners currently registered.
    pub fn number_of_registered_listeners(&self) -> usize {
        self.observer
            .registry()
            .map_or(0, ListenerRegistry::number_of_registered_listeners)
    }

    /// Number of registration calls observed.
    pub fn number_of_listener_registrations(&self) -> usize {
        self.observer
            .registry()
            .map_or(0, ListenerRegistry::number_of_listener_registrations)
    }

    /// Number of unregistration calls that removed a listener.
    pub fn number_of_listener_deregistrations(&self) -> usize {
        self.observer
            .registry()
            .map_or(0, ListenerRegistry::number_of_listener_deregistrations)
    }

    /// Returns true when at least one listener was registered and all of
    /// them have been unregistered since.
    pub fn all_listeners_unregistered(&self) -> bool {
        self.observer
            .registry()
            .is_some_and(ListenerRegistry::all_listeners_unregistered)
    }

    /// Fails when listeners remain registered, for `contract` only or for
    /// any contract.
    pub fn verify_no_listeners_registered(&self, contract: Option<&TypeName>) -> ObservationResult<()> {
        let remaining: Vec<String> = self
            .all_listeners()
            .into_iter()
            .filter(|entry| contract.map_or(true, |name| &entry.contract == name))
            .map(|entry| entry.to_string())
            .collect();
        if remaining.is_empty() {
            return Ok(());
        }
        Err(ObservationError::ListenersStillRegistered {
            mock: self.mock().clone(),
            listeners: remaining,
        })
    }
}

/// Observes mocks for the duration of one test.
#[derive(Debug)]
pub struct Observatory {
    classifier: Arc<Classifier>,
    config: ObservationConfig,
    mocks: RwLock<HashMap<MockId, Arc<ObservedMock>>>,
}

impl Observatory {
    /// Creates an observatory with the default configuration.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        let config = ObservationConfig::default();
        Self::with_classifier(Arc::new(Classifier::from_config(catalog, &config)), config)
    }

    /// Creates an observatory with `config`.
    pub fn with_config(catalog: Arc<TypeCatalog>, config: ObservationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_classifier(
            Arc::new(Classifier::from_config(catalog, &config)),
            config,
        ))
    }

    /// Creates an observatory sharing an existing classifier and its cache.
    ///
    /// The classifier's own conventions apply; only the dispatch settings of
    /// `config` are used.
    pub fn with_classifier(classifier: Arc<Classifier>, config: ObservationConfig) -> Self {
        Self {
            classifier,
            config,
            mocks: RwLock::new(HashMap::new()),
        }
    }

    /// The classifier used for mocked types.
    pub const fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// The active configuration.
    pub const fn config(&self) -> &ObservationConfig {
        &self.config
    }

    /// Starts tracking registration calls on `mock`.
    ///
    /// Listeners registered before this call are picked up from the calls
    /// the mock already captured; live calls arriving meanwhile are applied
    /// after them. Registering the same mock again returns the existing
    /// state. When a captured call cannot be replayed the observer is
    /// detached again and the mock stays unobserved.
    pub fn register_mock_for_observation(&self, mock: &dyn MockInstance) -> ObservationResult<Arc<ObservedMock>> {
        let mock_ref = mock.mock_ref();
        let mut mocks = self.mocks.write();
        if let Some(existing) = mocks.get(&mock_ref.id) {
            return Ok(Arc::clone(existing));
        }

        let classification = self.classifier.classify(&mock.shape());
        if classification.is_empty() {
            return Err(ObservationError::UnsupportedType {
                type_name: mock_ref.type_name,
                conventions: self.classifier.convention_names().join(", "),
            });
        }

        let observer = Arc::new(InvocationObserver::holding_live_calls(
            mock_ref.clone(),
            classification,
        ));
        let sink: Arc<dyn CallSink> = observer.clone();
        let backlog = mock.attach(Arc::clone(&sink));
        let replayed = match observer.replay(&backlog) {
            Ok(replayed) => replayed,
            Err(err) => {
                mock.detach(&sink);
                warn!(mock = %mock_ref, error = %err, "captured calls could not be replayed, observer detached");
                return Err(err);
            }
        };

        let observed = Arc::new(ObservedMock {
            observer,
            dispatcher: EventDispatcher::new().with_strict_listener_check(self.config.strict_listener_check),
        });
        let _previous = mocks.insert(mock_ref.id, Arc::clone(&observed));
        debug!(mock = %mock_ref, replayed, "mock observed");
        Ok(observed)
    }

    /// The observation state of `mock`.
    pub fn observed(&self, mock: &MockRef) -> ObservationResult<Arc<ObservedMock>> {
        self.mocks
            .read()
            .get(&mock.id)
            .cloned()
            .ok_or(ObservationError::UnknownMock(mock.id))
    }

    /// Every observed mock, in observation order.
    pub fn observed_mocks(&self) -> Vec<MockRef> {
        let mut mocks: Vec<MockRef> = self
            .mocks
            .read()
            .values()
            .map(|observed| observed.mock().clone())
            .collect();
        mocks.sort_by_key(|mock| mock.id);
        mocks
    }

    /// Simulates `mock` firing the event identified by `selector`.
    ///
    /// Returns how many listeners were invoked successfully.
    pub fn fire_event(&self, mock: &MockRef, selector: &Selector, args: &[Value]) -> ObservationResult<usize> {
        self.observed(mock)?.fire_event(selector, args)
    }

    /// Fails when listeners remain registered on `mock`, for `contract` only
    /// or for any contract.
    pub fn verify_no_listeners_registered(
        &self,
        mock: &MockRef,
        contract: Option<&TypeName>,
    ) -> ObservationResult<()> {
        self.observed(mock)?.verify_no_listeners_registered(contract)
    }

    /// Fails when any observed mock still holds a listener.
    pub fn verify_all_listeners_unregistered(&self) -> ObservationResult<()> {
        for mock in self.observed_mocks() {
            self.verify_no_listeners_registered(&mock, None)?;
        }
        Ok(())
    }

    /// Stops tracking `mock` and drops its registry.
    pub fn forget(&self, mock: &MockRef) -> bool {
        let removed = self.mocks.write().remove(&mock.id).is_some();
        if removed {
            debug!(mock = %mock, "mock forgotten");
        }
        removed
    }
}
