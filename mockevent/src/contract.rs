//! Listener contracts.
//!
//! A listener contract is the interface a registered observer implements:
//! its identity is the listener type's name and its callbacks are that type's
//! methods. Contracts are derived from shapes only, never from a mock
//! instance, so the same listener type always yields the same contract.

use crate::shape::{MethodSignature, TypeShape};
use crate::types::{MethodName, TypeName};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable listener contract.
#[derive(Debug, Clone)]
pub struct ListenerContract {
    name: TypeName,
    callbacks: Vec<MethodSignature>,
}

impl ListenerContract {
    /// Derives the contract of a listener type.
    pub fn from_shape(shape: &TypeShape) -> Self {
        Self {
            name: shape.name.clone(),
            callbacks: shape.methods.clone(),
        }
    }

    /// The listener type's name; the contract's identity.
    pub const fn name(&self) -> &TypeName {
        &self.name
    }

    /// Every callback method of the contract.
    pub fn callbacks(&self) -> &[MethodSignature] {
        &self.callbacks
    }

    /// Callback overloads named `method`.
    pub fn callbacks_named<'a>(
        &'a self,
        method: &'a MethodName,
    ) -> impl Iterator<Item = &'a MethodSignature> + 'a {
        self.callbacks.iter().filter(move |c| &c.name == method)
    }

    /// Renders `Contract.callback(params)` for diagnostics.
    pub fn describe_callback(&self, callback: &MethodSignature) -> String {
        format!("{}.{callback}", self.name)
    }
}

impl PartialEq for ListenerContract {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ListenerContract {}

impl Hash for ListenerContract {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for ListenerContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
