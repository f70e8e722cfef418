//! Invocation observer.
//!
//! Mocking adapters capture every call made on a tracked mock and hand it to
//! a [`CallSink`]. The [`InvocationObserver`] is the sink that keeps a
//! mock's [`ListenerRegistry`] up to date: calls matching a classified
//! register or unregister method update the registry, everything else is
//! ignored. It never answers calls and never runs any logic of the mocked
//! type.
//!
//! An observer attached to a mock that already captured calls is created
//! with [`InvocationObserver::holding_live_calls`]: live calls are queued
//! until [`InvocationObserver::replay`] has applied the backlog, so the
//! registry sees every call in invocation order.

use crate::classifier::{Classification, RegistrationRole};
use crate::errors::ObservationResult;
use crate::registry::ListenerRegistry;
use crate::shape::MethodSignature;
use crate::types::MockRef;
use crate::value::Value;
use std::fmt;
use parking_lot::{const_mutex, Mutex};
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// A call captured on a mocked instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    /// The instance the call was made on
    pub instance: MockRef,
    /// The declared signature of the invoked method
    pub method: MethodSignature,
    /// The passed arguments
    pub args: Vec<Value>,
}

impl CapturedCall {
    /// Creates a captured call.
    pub fn new(instance: MockRef, method: MethodSignature, args: Vec<Value>) -> Self {
        Self {
            instance,
            method,
            args,
        }
    }
}

impl fmt::Display for CapturedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.instance, self.method.name)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// What observing a call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// A listener was added to the registry.
    Registered,
    /// A listener was removed from the registry.
    Unregistered,
    /// The call was an unregistration for a listener that was not registered.
    NotRegistered,
    /// The call is not a registration call of the observed mock.
    Ignored,
    /// The call arrived while captured calls were being replayed and is
    /// applied right after them.
    Held,
}

/// Receiver of captured calls, fed synchronously and in invocation order.
pub trait CallSink: Send + Sync {
    /// Handles one captured call.
    fn on_call(&self, call: &CapturedCall) -> ObservationResult<CallOutcome>;
}

/// Updates one mock's registry from its captured calls.
#[derive(Debug)]
pub struct InvocationObserver {
    mock: MockRef,
    classification: Arc<Classification>,
    registry: OnceLock<ListenerRegistry>,
    held: Mutex<Option<Vec<CapturedCall>>>,
}

impl InvocationObserver {
    /// Creates an observer for `mock` using its type's classification.
    pub const fn new(mock: MockRef, classification: Arc<Classification>) -> Self {
        Self {
            mock,
            classification,
            registry: OnceLock::new(),
            held: const_mutex(None),
        }
    }

    /// Creates an observer that queues live calls until [`Self::replay`]
    /// succeeds.
    pub const fn holding_live_calls(mock: MockRef, classification: Arc<Classification>) -> Self {
        Self {
            mock,
            classification,
            registry: OnceLock::new(),
            held: const_mutex(Some(Vec::new())),
        }
    }

    /// Applies `backlog`, then the live calls held meanwhile, and from then
    /// on applies live calls as they arrive.
    ///
    /// Returns the number of calls applied. On error the observer keeps
    /// holding live calls.
    pub fn replay(&self, backlog: &[CapturedCall]) -> ObservationResult<usize> {
        for call in backlog {
            let _outcome = self.observe(call)?;
        }

        let mut held = self.held.lock();
        for call in held.iter().flatten() {
            let _outcome = self.observe(call)?;
        }
        let released = held.take().map_or(0, |calls| calls.len());
        drop(held);

        trace!(mock = %self.mock, replayed = backlog.len(), released, "replay complete");
        Ok(backlog.len() + released)
    }

    /// The observed mock.
    pub const fn mock(&self) -> &MockRef {
        &self.mock
    }

    /// The classification calls are matched against.
    pub const fn classification(&self) -> &Arc<Classification> {
        &self.classification
    }

    /// The registry, once the first registration call has been observed.
    pub fn registry(&self) -> Option<&ListenerRegistry> {
        self.registry.get()
    }

    /// Matches a captured call against the classified registration methods.
    pub fn observe(&self, call: &CapturedCall) -> ObservationResult<CallOutcome> {
        if call.instance.id != self.mock.id {
            trace!(call = %call, mock = %self.mock, "call on another instance ignored");
            return Ok(CallOutcome::Ignored);
        }

        let Some((pair, role)) = self.classification.find_role(&call.method) else {
            trace!(call = %call, "call ignored");
            return Ok(CallOutcome::Ignored);
        };

        let (listener, key) = pair.extract(&call.method, &call.args)?;
        let outcome = match role {
            RegistrationRole::Register => {
                self.registry
                    .get_or_init(ListenerRegistry::new)
                    .on_register(pair, listener, key)?;
                CallOutcome::Registered
            }
            RegistrationRole::Unregister => {
                let removed = self
                    .registry
                    .get()
                    .is_some_and(|registry| registry.on_unregister(pair, &listener, &key));
                if removed {
                    CallOutcome::Unregistered
                } else {
                    CallOutcome::NotRegistered
                }
            }
        };

        trace!(call = %call, contract = %pair.contract(), ?outcome, "registration call observed");
        Ok(outcome)
    }
}

impl CallSink for InvocationObserver {
    fn on_call(&self, call: &CapturedCall) -> ObservationResult<CallOutcome> {
        {
            let mut held = self.held.lock();
            if let Some(calls) = held.as_mut() {
                calls.push(call.clone());
                trace!(call = %call, "call held until replay completes");
                return Ok(CallOutcome::Held);
            }
        }
        self.observe(call)
    }
}
