//! Test tooling for `mockevent`.
//!
//! - [`ScriptedMock`]: a minimal mocking adapter. Tests (or the object under
//!   test) invoke methods on it by name; it records every call and feeds it
//!   to attached call sinks.
//! - [`RecordingListener`]: a listener that records the callbacks it
//!   receives and can be told to fail.
//! - [`fixtures`]: shapes of commonly observed types and a catalog holding
//!   their listener contracts.
//! - [`assertions`]: helpers that unpack observation results.
//! - [`init_test_tracing`]: installs a test-friendly tracing subscriber.

#![deny(warnings)]
#![forbid(
    dead_code,
    invalid_value,
    overflowing_literals,
    unconditional_recursion,
    unreachable_pub,
    unused_allocation,
    unsafe_code
)]
#![deny(
    bad_style,
    clippy::allow_attributes,
    deprecated,
    meta_variable_misuse,
    non_ascii_idents,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_code,
    unused_assignments,
    unused_attributes,
    unused_extern_crates,
    unused_imports,
    unused_must_use,
    unused_mut,
    unused_parens,
    unused_qualifications,
    unused_results,
    unused_variables
)]

pub mod assertions;
pub mod fixtures;
pub mod listener;
pub mod logging;
pub mod mock;

pub use listener::{CallJournal, ReceivedCall, RecordingListener};
pub use logging::init_test_tracing;
pub use mock::{ScriptError, ScriptedMock};

use mockevent::{MethodName, Selector, TypeName};

/// Builds a [`TypeName`], panicking on invalid input.
#[track_caller]
pub fn type_name(name: &str) -> TypeName {
    TypeName::try_new(name).unwrap_or_else(|e| panic!("invalid type name {name:?}: {e}"))
}

/// Builds a [`MethodName`], panicking on invalid input.
#[track_caller]
pub fn method_name(name: &str) -> MethodName {
    MethodName::try_new(name).unwrap_or_else(|e| panic!("invalid method name {name:?}: {e}"))
}

/// Selects the callback named `name`.
#[track_caller]
pub fn callback(name: &str) -> Selector {
    Selector::callback(method_name(name))
}
