//! Per-mock listener registry.
//!
//! The registry records which listeners are currently registered on one
//! mocked instance, partitioned by listener contract and selector key.
//! Every operation takes the registry's lock for its whole duration, so a
//! lookup for dispatch sees either the state before or after a concurrent
//! registration, never a half-applied one.

use crate::classifier::RegistrationMethodPair;
use crate::errors::{ObservationError, ObservationResult};
use crate::types::TypeName;
use crate::value::{ListenerRef, SelectorKey};
use parking_lot::Mutex;
use std::fmt;

/// One registration currently held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredListener {
    /// The listener contract it was registered for
    pub contract: TypeName,
    /// The qualifying arguments of the registration call
    pub key: SelectorKey,
    /// The registered listener
    pub listener: ListenerRef,
}

impl fmt::Display for RegisteredListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.listener, self.contract)?;
        if !self.key.is_empty() {
            write!(f, " with {}", self.key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<RegisteredListener>,
    registrations: usize,
    deregistrations: usize,
}

/// Listeners registered on one mocked instance, in registration order.
///
/// The same listener may be registered several times under the same
/// contract and key; each registration is kept, and each unregistration
/// removes one of them.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    state: Mutex<RegistryState>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a registration made through `pair`.
    ///
    /// Listeners that do not implement the pair's contract are rejected, so
    /// the registry only ever holds contracts the mock's registration
    /// methods support.
    pub fn on_register(
        &self,
        pair: &RegistrationMethodPair,
        listener: ListenerRef,
        key: SelectorKey,
    ) -> ObservationResult<()> {
        let contract = pair.contract().name();
        if !listener.implements(contract) {
            return Err(ObservationError::ListenerContractMismatch {
                method: pair.register().clone(),
                contract: contract.clone(),
                listener: listener.to_string(),
            });
        }

        let mut state = self.state.lock();
        state.entries.push(RegisteredListener {
            contract: contract.clone(),
            key,
            listener,
        });
        state.registrations += 1;
        Ok(())
    }

    /// Records an unregistration made through `pair`.
    ///
    /// Removes the earliest matching registration and returns true. A
    /// listener that is not registered under that contract and key is left
    /// alone and false is returned.
    pub fn on_unregister(
        &self,
        pair: &RegistrationMethodPair,
        listener: &ListenerRef,
        key: &SelectorKey,
    ) -> bool {
        let contract = pair.contract().name();
        let mut state = self.state.lock();
        let position = state.entries.iter().position(|entry| {
            &entry.contract == contract && &entry.key == key && &entry.listener == listener
        });
        match position {
            Some(position) => {
                let _removed = state.entries.remove(position);
                state.deregistrations += 1;
                true
            }
            None => false,
        }
    }

    /// Listeners to notify for `contract` under `key`, in registration order.
    ///
    /// Listeners registered with exactly `key` are returned together with
    /// listeners registered without any key.
    pub fn registered_listeners(&self, contract: &TypeName, key: &SelectorKey) -> Vec<ListenerRef> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| {
                &entry.contract == contract && (&entry.key == key || entry.key.is_empty())
            })
            .map(|entry| entry.listener.clone())
            .collect()
    }

    /// Listeners registered for `contract` under exactly `key`.
    pub fn listeners_with_key(&self, contract: &TypeName, key: &SelectorKey) -> Vec<ListenerRef> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| &entry.contract == contract && &entry.key == key)
            .map(|entry| entry.listener.clone())
            .collect()
    }

    /// Listeners registered for `contract` under any key.
    pub fn listeners_for(&self, contract: &TypeName) -> Vec<ListenerRef> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| &entry.contract == contract)
            .map(|entry| entry.listener.clone())
            .collect()
    }

    /// Every current registration.
    pub fn all_listeners(&self) -> Vec<RegisteredListener> {
        self.state.lock().entries.clone()
    }

    /// Distinct `(contract, key)` combinations with at least one listener, in
    /// order of first registration.
    pub fn registered_keys(&self) -> Vec<(TypeName, SelectorKey)> {
        let state = self.state.lock();
        let mut keys: Vec<(TypeName, SelectorKey)> = Vec::new();
        for entry in &state.entries {
            if !keys
                .iter()
                .any(|(contract, key)| contract == &entry.contract && key == &entry.key)
            {
                keys.push((entry.contract.clone(), entry.key.clone()));
            }
        }
        keys
    }

    /// Number of listeners currently registered.
    pub fn number_of_registered_listeners(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Number of registration calls recorded so far.
    pub fn number_of_listener_registrations(&self) -> usize {
        self.state.lock().registrations
    }

    /// Number of unregistration calls that removed a listener.
    pub fn number_of_listener_deregistrations(&self) -> usize {
        self.state.lock().deregistrations
    }

    /// Returns true when at least one listener was registered and none
    /// remains.
    pub fn all_listeners_unregistered(&self) -> bool {
        let state = self.state.lock();
        state.registrations > 0 && state.entries.is_empty()
    }
}
