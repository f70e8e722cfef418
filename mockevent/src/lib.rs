//! `mockevent` - simulate events fired by mocked collaborators
//!
//! A unit test often replaces an observable collaborator (a sensor, a bean
//! firing property changes, an observable) with a mock. The object under
//! test registers its listeners on that mock, and the test then wants the
//! mock to "fire" an event. This crate makes that possible without giving
//! the mock any behavior:
//!
//! 1. The [`Classifier`] finds the register/unregister methods of the mocked
//!    type and the listener contracts they manage, from the type's shape.
//! 2. The [`InvocationObserver`] watches the calls captured on the mock and
//!    keeps a per-mock [`ListenerRegistry`] up to date.
//! 3. The [`EventDispatcher`] resolves a [`Selector`] with the
//!    [`ContractResolver`] and invokes the callback on every registered
//!    listener, in registration order.
//!
//! Tests use all of this through an [`Observatory`]:
//!
//! ```ignore
//! let observatory = Observatory::new(catalog);
//! let observed = observatory.register_mock_for_observation(&sensor)?;
//!
//! // the object under test calls sensor.addTemperatureListener(listener)
//!
//! let invoked = observed.fire_event(&Selector::callback(on_change), &[21.5.into()])?;
//! assert_eq!(invoked, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod contract;
pub mod dispatcher;
pub mod errors;
pub mod macros;
pub mod observatory;
pub mod observer;
pub mod registry;
pub mod resolver;
pub mod shape;
pub mod types;
pub mod value;

pub use catalog::TypeCatalog;
pub use classifier::conventions::{
    CallbackShapeDetector, ListenerTypeDetector, ObserverConvention, PropertyChangeConvention,
    RegistrationConvention, TypicalListenerConvention,
};
pub use classifier::{Classification, Classifier, RegistrationMethodPair, RegistrationRole};
pub use config::{ConventionKind, ObservationConfig};
pub use contract::ListenerContract;
pub use dispatcher::EventDispatcher;
pub use errors::{
    ArgumentMismatch, CatalogError, ConfigError, DispatchFailures, InvocationFailure,
    ListenerFailure, ObservationError, ObservationResult,
};
pub use observatory::{MockInstance, ObservedMock, Observatory};
pub use observer::{CallOutcome, CallSink, CapturedCall, InvocationObserver};
pub use registry::{ListenerRegistry, RegisteredListener};
pub use resolver::{ContractResolver, ResolvedEvent, Selector};
pub use shape::{MethodSignature, ParamType, TypeKind, TypeShape};
pub use types::{MethodName, MockId, MockRef, TypeName};
pub use value::{adapt_arguments, CallbackError, Listener, ListenerRef, ObjectValue, SelectorKey, Value};
