//! Error types for mockevent.
//!
//! Errors fall into two groups:
//!
//! - **Eager** errors are reported by the call that triggered them:
//!   classification (`UnsupportedType`), selector resolution
//!   (`AmbiguousSelector`, `UnresolvedSelector`) and registration bookkeeping.
//! - **Deferred** errors come out of event dispatch. Every registered
//!   listener is attempted; failures are collected into [`DispatchFailures`]
//!   and reported together once the last listener has been called.
//!
//! Nothing is retried. The engine is a deterministic, synchronous simulation,
//! so a failure here always points at the test setup or at a listener.

use crate::shape::{MethodSignature, ParamType};
use crate::types::{MockId, MockRef, TypeName};
use crate::value::{CallbackError, SelectorKey};
use thiserror::Error;

/// Result type used throughout the engine.
pub type ObservationResult<T> = Result<T, ObservationError>;

/// Errors raised while observing mocks and dispatching events.
#[derive(Debug, Clone, Error)]
pub enum ObservationError {
    /// The mocked type exposes no recognizable registration methods.
    ///
    /// This usually means the wrong object was handed over for observation,
    /// or the listener types are missing from the type catalog.
    #[error(
        "no listener registration methods detected on type '{type_name}' (conventions tried: {conventions})"
    )]
    UnsupportedType {
        /// The mocked type
        type_name: TypeName,
        /// Names of the conventions that were tried
        conventions: String,
    },

    /// More than one callback or registration shape matches a selector.
    #[error("selector {selector} is ambiguous; candidates: {listed}", listed = .candidates.join(", "))]
    AmbiguousSelector {
        /// The selector as written by the test
        selector: String,
        /// Every matching candidate
        candidates: Vec<String>,
    },

    /// No callback or registration shape matches a selector.
    #[error("selector {selector} matches no listener callback of type '{type_name}'")]
    UnresolvedSelector {
        /// The selector as written by the test
        selector: String,
        /// The mocked type the selector was resolved against
        type_name: TypeName,
    },

    /// One or more listener invocations failed during dispatch.
    #[error(transparent)]
    Dispatch(#[from] DispatchFailures),

    /// Strict listener checking is enabled and no listener matched.
    #[error("no listener registered for '{contract}' with {key}")]
    ListenersNotFound {
        /// The resolved listener contract
        contract: TypeName,
        /// The resolved key
        key: SelectorKey,
    },

    /// Listeners are still registered where none were expected.
    #[error("{count} listener(s) still registered on {mock}: {listed}", count = .listeners.len(), listed = .listeners.join(", "))]
    ListenersStillRegistered {
        /// The mock holding the listeners
        mock: MockRef,
        /// Descriptions of the remaining registrations
        listeners: Vec<String>,
    },

    /// The mock was never registered for observation.
    #[error("mock {0} is not registered for observation")]
    UnknownMock(MockId),

    /// A captured call was matched to a registration method it does not fit.
    #[error("captured call {actual} with {arguments} argument(s) does not fit registration method {expected}")]
    RegistrationCallMismatch {
        /// The registration method that was matched
        expected: MethodSignature,
        /// The method that was captured
        actual: MethodSignature,
        /// Number of captured arguments
        arguments: usize,
    },

    /// A registration call passed a listener that does not implement the contract.
    #[error("{listener} passed to {method} does not implement '{contract}'")]
    ListenerContractMismatch {
        /// The registration method
        method: MethodSignature,
        /// The contract the method manages
        contract: TypeName,
        /// Description of the offending argument
        listener: String,
    },

    /// A type catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Dispatch arguments do not fit a callback's declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentMismatch {
    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), got {actual}")]
    Count {
        /// Declared parameter count
        expected: usize,
        /// Passed argument count
        actual: usize,
    },

    /// Too few arguments before a varargs parameter.
    #[error("expected at least {minimum} argument(s), got {actual}")]
    TooFew {
        /// Fixed parameter count
        minimum: usize,
        /// Passed argument count
        actual: usize,
    },

    /// An argument does not fit its parameter type.
    #[error("argument {index} expected {expected}, got {actual}")]
    Type {
        /// Zero-based argument position
        index: usize,
        /// Declared parameter type
        expected: ParamType,
        /// Description of the passed value
        actual: String,
    },
}

/// Why one listener invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationFailure {
    /// The arguments did not fit the callback.
    #[error("argument mismatch: {0}")]
    ArgumentMismatch(#[from] ArgumentMismatch),

    /// The listener itself reported a failure.
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

/// One failed listener invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener #{position} ({listener}): {cause}")]
pub struct ListenerFailure {
    /// Zero-based position of the listener in registration order
    pub position: usize,
    /// Description of the listener
    pub listener: String,
    /// What went wrong
    pub cause: InvocationFailure,
}

/// All listener failures of one dispatched event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{failed} of {attempted} listener invocation(s) failed for {event}: {listed}",
    failed = .failures.len(),
    listed = .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
)]
pub struct DispatchFailures {
    /// The resolved event, e.g. `TemperatureListener.onChange(float)`
    pub event: String,
    /// Number of listeners attempted
    pub attempted: usize,
    /// Number of listeners invoked successfully
    pub invoked: usize,
    /// Every failed invocation, in registration order
    pub failures: Vec<ListenerFailure>,
}

/// Errors raised by the type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A different shape is already registered under the same name.
    #[error("type '{type_name}' is already registered with a different shape")]
    ShapeConflict {
        /// The conflicting type name
        type_name: TypeName,
    },

    /// Shape descriptions could not be parsed.
    #[error("failed to parse type shapes: {0}")]
    Parse(String),
}

/// Errors raised while building configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration could not be parsed.
    #[error("failed to parse observation config: {0}")]
    Parse(String),

    /// The configuration names no registration convention.
    #[error("observation config must enable at least one registration convention")]
    NoConventions,
}
