//! Core identifiers for the `mockevent` library.
//!
//! All identifiers use smart constructors so that a value, once built, is
//! valid everywhere it travels: type names are never blank, method names are
//! always identifier-shaped and mock ids are always time-ordered UUIDs.

use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of a type known to the engine.
///
/// A `TypeName` is the identity of a mocked type and of a listener contract.
/// It is trimmed and guaranteed to be non-empty and at most 255 characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TypeName(String);

impl TypeName {
    /// Returns true when the name ends with `suffix`.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.as_ref().ends_with(suffix)
    }
}

/// Name of a method declared on a type.
///
/// Method names are trimmed and must look like an identifier: non-empty,
/// starting with a letter, `_` or `$`, and continuing with alphanumerics,
/// `_` or `$`.
#[nutype(
    sanitize(trim),
    validate(predicate = |name: &str| is_identifier(name)),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct MethodName(String);

impl MethodName {
    /// Returns true when the name starts with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_ref().starts_with(prefix)
    }

    /// Returns true when the name ends with `suffix`.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.as_ref().ends_with(suffix)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Identity of one mocked instance.
///
/// `MockId` values are UUIDv7, so ids handed out in sequence sort in
/// creation order, which keeps diagnostics listing several mocks stable.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct MockId(Uuid);

impl MockId {
    /// Creates a new `MockId` for the current moment.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }
}

impl Default for MockId {
    fn default() -> Self {
        Self::new()
    }
}

/// A mocked instance as seen by the engine: its identity and its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockRef {
    /// Identity of the instance.
    pub id: MockId,
    /// The mocked type.
    pub type_name: TypeName,
}

impl MockRef {
    /// Creates a reference to a fresh mock of `type_name`.
    pub fn new(type_name: TypeName) -> Self {
        Self {
            id: MockId::new(),
            type_name,
        }
    }
}

impl fmt::Display for MockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.type_name, self.id)
    }
}
