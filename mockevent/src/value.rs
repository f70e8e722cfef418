//! Runtime values passed through registration calls and event dispatch.
//!
//! A [`Value`] is what a captured call carries as an argument and what a
//! listener callback receives. Listeners are values too ([`ListenerRef`]), so
//! that a registration call can be captured as a plain argument list.

use crate::errors::ArgumentMismatch;
use crate::shape::{MethodSignature, ParamType};
use crate::types::{MockRef, TypeName};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;
use thiserror::Error;

/// An argument value.
///
/// Equality and hashing are total: floats compare by bit pattern and
/// listeners compare by instance identity. This lets any value serve as part
/// of a [`SelectorKey`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A sequence of values, used for varargs.
    List(Vec<Value>),
    /// A structural record.
    Object(ObjectValue),
    /// A listener instance.
    Listener(ListenerRef),
    /// A mocked instance.
    Mock(MockRef),
}

impl Value {
    /// Short description of the value's type, for diagnostics.
    pub fn type_label(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Float(_) => "float".to_string(),
            Self::Str(_) => "str".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Object(object) => object.type_name.to_string(),
            Self::Listener(listener) => format!("listener {listener}"),
            Self::Mock(mock) => format!("mock {}", mock.type_name),
        }
    }

    /// The listener inside a [`Value::Listener`].
    pub const fn as_listener(&self) -> Option<&ListenerRef> {
        match self {
            Self::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    /// The string inside a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The number inside a [`Value::Float`] or [`Value::Int`].
    ///
    /// Integers beyond 2^53 in magnitude have no exact float and give `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => exact_f64(*i),
            _ => None,
        }
    }
}

/// Largest magnitude up to which every integer is an exact `f64`.
const MAX_EXACT_INT: i64 = 1 << f64::MANTISSA_DIGITS;

/// Converts `value` to `f64` when no precision is lost.
fn exact_f64(value: i64) -> Option<f64> {
    if !(-MAX_EXACT_INT..=MAX_EXACT_INT).contains(&value) {
        return None;
    }
    let high = i32::try_from(value >> 32).ok()?;
    let low = u32::try_from(value & 0xFFFF_FFFF).ok()?;
    Some(f64::from(high).mul_add(4_294_967_296.0, f64::from(low)))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => a == b,
            (Self::Mock(a), Self::Mock(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Object(object) => object.hash(state),
            Self::Listener(listener) => listener.hash(state),
            Self::Mock(mock) => mock.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(object) => write!(f, "{object}"),
            Self::Listener(listener) => write!(f, "{listener}"),
            Self::Mock(mock) => write!(f, "{mock}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<ListenerRef> for Value {
    fn from(value: ListenerRef) -> Self {
        Self::Listener(value)
    }
}

impl From<ObjectValue> for Value {
    fn from(value: ObjectValue) -> Self {
        Self::Object(value)
    }
}

impl From<MockRef> for Value {
    fn from(value: MockRef) -> Self {
        Self::Mock(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A structural record value: a type name plus named fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectValue {
    /// The record's type.
    pub type_name: TypeName,
    /// Field values by name.
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    /// Creates a record with no fields.
    pub const fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            fields: BTreeMap::new(),
        }
    }

    /// Sets a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let _previous = self.fields.insert(name.into(), value.into());
        self
    }

    /// Reads a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl fmt::Display for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (idx, (name, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, " {name}: {value}")?;
        }
        f.write_str(" }")
    }
}

/// Failure raised by a listener while handling a callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener callback failed: {0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    /// Creates a callback error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An object that can be registered on a mocked collaborator and receive
/// callbacks.
///
/// This is the uniform call adapter: the dispatcher never knows the concrete
/// listener type, it hands over the resolved callback signature and the
/// already adapted arguments.
pub trait Listener: Send + Sync {
    /// Returns true when this listener implements the listener contract.
    fn implements(&self, contract: &TypeName) -> bool;

    /// Handles one callback of a contract this listener implements.
    fn on_callback(&self, callback: &MethodSignature, args: &[Value]) -> Result<(), CallbackError>;

    /// Human readable description used in diagnostics.
    fn description(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Shared handle to a listener instance.
///
/// Two handles are equal when they point at the same instance, no matter
/// what the listener's own notion of equality is.
#[derive(Clone)]
pub struct ListenerRef(Arc<dyn Listener>);

impl ListenerRef {
    /// Wraps a listener into a new shared instance.
    pub fn new<L: Listener + 'static>(listener: L) -> Self {
        Self(Arc::new(listener))
    }

    /// Wraps an already shared listener; clones of `listener` are the same
    /// instance.
    pub fn from_arc<L: Listener + 'static>(listener: Arc<L>) -> Self {
        Self(listener)
    }

    /// Address of the instance, used for identity.
    fn address(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// See [`Listener::implements`].
    pub fn implements(&self, contract: &TypeName) -> bool {
        self.0.implements(contract)
    }

    /// See [`Listener::on_callback`].
    pub fn on_callback(
        &self,
        callback: &MethodSignature,
        args: &[Value],
    ) -> Result<(), CallbackError> {
        self.0.on_callback(callback, args)
    }

    /// See [`Listener::description`].
    pub fn description(&self) -> String {
        self.0.description()
    }
}

impl PartialEq for ListenerRef {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ListenerRef {}

impl Hash for ListenerRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerRef").field(&self.to_string()).finish()
    }
}

impl fmt::Display for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}", self.description(), self.address())
    }
}

/// The qualifying arguments of a registration call.
///
/// Everything a registration method takes besides the listener itself, in
/// declaration order. A property-change registration keyed by property name
/// yields `selector("temperature")`; a plain `addXListener(listener)` yields
/// the empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectorKey(Vec<Value>);

impl SelectorKey {
    /// The empty key.
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// A key made of `values`.
    pub const fn of(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// A key made of one value.
    pub fn single(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    /// Returns true for the empty key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of values in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The key's values.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Returns true when every value fits the corresponding parameter type.
    pub fn fits(&self, shape: &[ParamType]) -> bool {
        adapt_arguments(shape, &self.0).is_ok()
    }
}

impl From<&str> for SelectorKey {
    fn from(value: &str) -> Self {
        Self::single(value)
    }
}

impl From<Value> for SelectorKey {
    fn from(value: Value) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("selector(")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

impl ParamType {
    /// Adapts `value` to this parameter type.
    ///
    /// Returns `None` when the value does not fit. Integers widen to floats,
    /// `null` fits strings and objects, `Any` takes everything.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Any, _)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Str, Value::Str(_))
            | (Self::Str | Self::Object(_), Value::Null) => Some(value.clone()),
            (Self::Float, Value::Int(i)) => exact_f64(*i).map(Value::Float),
            (Self::Object(expected), Value::Object(object)) if &object.type_name == expected => {
                Some(value.clone())
            }
            (Self::Object(expected), Value::Listener(listener)) if listener.implements(expected) => {
                Some(value.clone())
            }
            (Self::Object(expected), Value::Mock(mock)) if &mock.type_name == expected => {
                Some(value.clone())
            }
            (Self::Varargs(inner), Value::List(items)) => items
                .iter()
                .map(|item| inner.coerce(item))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            _ => None,
        }
    }

    /// Returns true when `value` fits this parameter type.
    pub fn admits(&self, value: &Value) -> bool {
        self.coerce(value).is_some()
    }
}

/// Adapts an argument list to a declared parameter list.
///
/// A trailing varargs parameter collects the remaining arguments into a
/// [`Value::List`], unless exactly one ready-made list is passed for it.
pub fn adapt_arguments(params: &[ParamType], args: &[Value]) -> Result<Vec<Value>, ArgumentMismatch> {
    let (fixed, varargs) = match params.split_last() {
        Some((ParamType::Varargs(inner), init)) => (init, Some(inner.as_ref())),
        _ => (params, None),
    };

    match varargs {
        None if args.len() != fixed.len() => {
            return Err(ArgumentMismatch::Count {
                expected: fixed.len(),
                actual: args.len(),
            });
        }
        Some(_) if args.len() < fixed.len() => {
            return Err(ArgumentMismatch::TooFew {
                minimum: fixed.len(),
                actual: args.len(),
            });
        }
        _ => {}
    }

    let mut adapted = Vec::with_capacity(params.len());
    for (index, (param, arg)) in fixed.iter().zip(args).enumerate() {
        adapted.push(coerce_at(index, param, arg)?);
    }

    if let Some(inner) = varargs {
        let rest = &args[fixed.len()..];
        let items = match rest {
            [Value::List(items)] if items.iter().all(|item| inner.admits(item)) => items.as_slice(),
            _ => rest,
        };
        let mut packed = Vec::with_capacity(items.len());
        for (offset, arg) in items.iter().enumerate() {
            packed.push(coerce_at(fixed.len() + offset, inner, arg)?);
        }
        adapted.push(Value::List(packed));
    }

    Ok(adapted)
}

fn coerce_at(index: usize, param: &ParamType, arg: &Value) -> Result<Value, ArgumentMismatch> {
    param.coerce(arg).ok_or_else(|| ArgumentMismatch::Type {
        index,
        expected: param.clone(),
        actual: arg.type_label(),
    })
}
