//! A scripted mocking adapter.
//!
//! `ScriptedMock` stands in for a mocking framework: it has a type shape
//! and an identity, answers nothing, and records every invocation. Calls
//! are delivered to attached sinks synchronously, in invocation order.

use mockevent::{
    adapt_arguments, CallOutcome, CallSink, CapturedCall, MethodSignature, MockInstance, MockRef,
    ObservationError, TypeShape, Value,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors raised when invoking a method on a [`ScriptedMock`].
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    /// The mocked type has no method with that name.
    #[error("type '{type_name}' has no method named '{method}'")]
    NoSuchMethod {
        /// The mocked type
        type_name: String,
        /// The requested method name
        method: String,
    },

    /// No overload of the method accepts the arguments.
    #[error("no overload of '{method}' accepts ({arguments})")]
    NoMatchingOverload {
        /// The requested method name
        method: String,
        /// The passed arguments
        arguments: String,
    },

    /// More than one overload accepts the arguments.
    #[error("call to '{method}' is ambiguous between {candidates}")]
    AmbiguousOverload {
        /// The requested method name
        method: String,
        /// The fitting overloads
        candidates: String,
    },

    /// An attached sink rejected the call.
    #[error(transparent)]
    Observation(#[from] ObservationError),
}

#[derive(Default)]
struct Feed {
    calls: Vec<CapturedCall>,
    sinks: Vec<Arc<dyn CallSink>>,
}

/// A mock that records calls and forwards them to attached sinks.
pub struct ScriptedMock {
    mock: MockRef,
    shape: Arc<TypeShape>,
    feed: Mutex<Feed>,
}

impl fmt::Debug for ScriptedMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feed = self.feed.lock();
        f.debug_struct("ScriptedMock")
            .field("mock", &self.mock)
            .field("calls", &feed.calls.len())
            .field("sinks", &feed.sinks.len())
            .finish_non_exhaustive()
    }
}

impl ScriptedMock {
    /// Creates a fresh mock of `shape`.
    pub fn new(shape: impl Into<Arc<TypeShape>>) -> Self {
        let shape = shape.into();
        Self {
            mock: MockRef::new(shape.name.clone()),
            shape,
            feed: Mutex::new(Feed::default()),
        }
    }

    /// Identity and type of the mock.
    pub const fn mock(&self) -> &MockRef {
        &self.mock
    }

    /// The mock as an argument value, e.g. for an observer callback.
    pub fn as_value(&self) -> Value {
        Value::Mock(self.mock.clone())
    }

    /// Invokes the overload of `method` that `args` fit.
    ///
    /// Returns what each attached sink did with the call.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Vec<CallOutcome>, ScriptError> {
        let overloads: Vec<&MethodSignature> = self
            .shape
            .methods
            .iter()
            .filter(|m| m.name.as_ref() == method)
            .collect();
        if overloads.is_empty() {
            return Err(ScriptError::NoSuchMethod {
                type_name: self.shape.name.to_string(),
                method: method.to_string(),
            });
        }

        let fitting: Vec<&MethodSignature> = overloads
            .into_iter()
            .filter(|m| adapt_arguments(&m.params, &args).is_ok())
            .collect();
        match fitting.as_slice() {
            [] => Err(ScriptError::NoMatchingOverload {
                method: method.to_string(),
                arguments: render(&args),
            }),
            [signature] => self.invoke_signature((*signature).clone(), args),
            _ => Err(ScriptError::AmbiguousOverload {
                method: method.to_string(),
                candidates: fitting
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Invokes the exact overload `signature`, without checking the
    /// arguments.
    pub fn invoke_signature(
        &self,
        signature: MethodSignature,
        args: Vec<Value>,
    ) -> Result<Vec<CallOutcome>, ScriptError> {
        let call = CapturedCall::new(self.mock.clone(), signature, args);
        trace!(call = %call, "scripted call");

        let sinks = {
            let mut feed = self.feed.lock();
            feed.calls.push(call.clone());
            feed.sinks.clone()
        };

        let mut outcomes = Vec::with_capacity(sinks.len());
        for sink in sinks {
            outcomes.push(sink.on_call(&call)?);
        }
        Ok(outcomes)
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.feed.lock().calls.clone()
    }

    /// Calls made to methods named `method`.
    pub fn calls_to(&self, method: &str) -> Vec<CapturedCall> {
        self.feed
            .lock()
            .calls
            .iter()
            .filter(|call| call.method.name.as_ref() == method)
            .cloned()
            .collect()
    }
}

impl MockInstance for ScriptedMock {
    fn mock_ref(&self) -> MockRef {
        self.mock.clone()
    }

    fn shape(&self) -> Arc<TypeShape> {
        Arc::clone(&self.shape)
    }

    fn attach(&self, sink: Arc<dyn CallSink>) -> Vec<CapturedCall> {
        let mut feed = self.feed.lock();
        feed.sinks.push(sink);
        feed.calls.clone()
    }

    fn detach(&self, sink: &Arc<dyn CallSink>) {
        let target = Arc::as_ptr(sink).cast::<()>();
        self.feed
            .lock()
            .sinks
            .retain(|attached| Arc::as_ptr(attached).cast::<()>() != target);
    }
}

fn render(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
