//! Naming and shape conventions for registration methods.
//!
//! A convention answers three questions about a mocked type's methods: is a
//! parameter type a listener this convention manages, is a method a
//! register method, and is it an unregister method. The classifier does the
//! rest (finding the listener parameter, pairing, deriving contracts).

use crate::shape::{MethodSignature, TypeShape};
use std::fmt;

/// Decides whether a type is a listener contract at all.
///
/// This is the listener-type detection hook: it works on the shape of the
/// type, independent of any naming convention.
pub trait ListenerTypeDetector: Send + Sync + fmt::Debug {
    /// Returns true when `shape` describes a listener contract.
    fn is_listener_type(&self, shape: &TypeShape) -> bool;
}

/// Accepts interfaces whose methods are all callbacks.
///
/// A callback-shaped interface has at least one method and every method
/// returns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackShapeDetector;

impl ListenerTypeDetector for CallbackShapeDetector {
    fn is_listener_type(&self, shape: &TypeShape) -> bool {
        shape.is_interface()
            && !shape.methods.is_empty()
            && shape.methods.iter().all(MethodSignature::is_callback_shaped)
    }
}

/// A registration naming convention.
pub trait RegistrationConvention: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns true when a listener of this type is managed by the convention.
    fn accepts_listener_type(&self, shape: &TypeShape) -> bool;

    /// Returns true for register methods, e.g. `addMyListener`.
    fn is_register_method(&self, method: &MethodSignature) -> bool;

    /// Returns true for unregister methods, e.g. `removeMyListener`.
    fn is_unregister_method(&self, method: &MethodSignature) -> bool;
}

/// Last segment of a possibly qualified type name.
fn simple_name(shape: &TypeShape) -> &str {
    let name: &str = shape.name.as_ref();
    name.rsplit(|c| c == '.' || c == ':').next().unwrap_or(name)
}

/// `add<X>Listener(s)` / `remove<X>Listener(s)` taking a `...Listener` type.
///
/// Also covers the generic `addListener` / `removeListener` pair and any
/// extra qualifying parameters next to the listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypicalListenerConvention;

impl TypicalListenerConvention {
    fn is_listener_method(method: &MethodSignature, prefix: &str) -> bool {
        method.name.starts_with(prefix)
            && (method.name.ends_with("Listener") || method.name.ends_with("Listeners"))
    }
}

impl RegistrationConvention for TypicalListenerConvention {
    fn name(&self) -> &str {
        "typical_listener"
    }

    fn accepts_listener_type(&self, shape: &TypeShape) -> bool {
        simple_name(shape).ends_with("Listener")
    }

    fn is_register_method(&self, method: &MethodSignature) -> bool {
        Self::is_listener_method(method, "add")
    }

    fn is_unregister_method(&self, method: &MethodSignature) -> bool {
        Self::is_listener_method(method, "remove")
    }
}

/// Java-beans style property change registration.
///
/// `addPropertyChangeListener(listener)` registers for every property,
/// `addPropertyChangeListener(propertyName, listener)` for one property.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyChangeConvention;

impl RegistrationConvention for PropertyChangeConvention {
    fn name(&self) -> &str {
        "property_change"
    }

    fn accepts_listener_type(&self, shape: &TypeShape) -> bool {
        simple_name(shape) == "PropertyChangeListener"
    }

    fn is_register_method(&self, method: &MethodSignature) -> bool {
        method.name.as_ref() == "addPropertyChangeListener"
    }

    fn is_unregister_method(&self, method: &MethodSignature) -> bool {
        method.name.as_ref() == "removePropertyChangeListener"
    }
}

/// Classic observable registration: `addObserver` / `deleteObserver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserverConvention;

impl RegistrationConvention for ObserverConvention {
    fn name(&self) -> &str {
        "observer"
    }

    fn accepts_listener_type(&self, shape: &TypeShape) -> bool {
        simple_name(shape) == "Observer"
    }

    fn is_register_method(&self, method: &MethodSignature) -> bool {
        method.name.as_ref() == "addObserver"
    }

    fn is_unregister_method(&self, method: &MethodSignature) -> bool {
        method.name.as_ref() == "deleteObserver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ParamType;
    use crate::types::{MethodName, TypeName};

    fn method(name: &str) -> MethodSignature {
        MethodSignature::new(MethodName::try_new(name).unwrap(), vec![])
    }

    fn interface(name: &str, methods: Vec<MethodSignature>) -> TypeShape {
        methods
            .into_iter()
            .fold(TypeShape::interface(TypeName::try_new(name).unwrap()), TypeShape::with_method)
    }

    #[test]
    fn callback_shape_detector() {
        let detector = CallbackShapeDetector;
        assert!(detector.is_listener_type(&interface("L", vec![method("onChange")])));
        assert!(!detector.is_listener_type(&interface("Empty", vec![])));
        assert!(!detector.is_listener_type(&interface(
            "Query",
            vec![method("size").returning(ParamType::Int)]
        )));
        assert!(!detector.is_listener_type(
            &TypeShape::class(TypeName::try_new("Impl").unwrap()).with_method(method("onChange"))
        ));
    }

    #[test]
    fn typical_listener_names() {
        let convention = TypicalListenerConvention;
        assert!(convention.is_register_method(&method("addListener")));
        assert!(convention.is_register_method(&method("addMyListener")));
        assert!(convention.is_register_method(&method("addTwoListeners")));
        assert!(convention.is_unregister_method(&method("removeMyListener")));
        assert!(!convention.is_register_method(&method("addObserver")));
        assert!(!convention.is_unregister_method(&method("deleteMyListener")));
        assert!(!convention.is_register_method(&method("removeMyListener")));

        assert!(convention.accepts_listener_type(&interface("MyListener", vec![])));
        assert!(convention.accepts_listener_type(&interface("java.beans.PropertyChangeListener", vec![])));
        assert!(!convention.accepts_listener_type(&interface("Observer", vec![])));
    }

    #[test]
    fn property_change_names() {
        let convention = PropertyChangeConvention;
        assert!(convention.is_register_method(&method("addPropertyChangeListener")));
        assert!(convention.is_unregister_method(&method("removePropertyChangeListener")));
        assert!(!convention.is_register_method(&method("addMyListener")));
        assert!(convention.accepts_listener_type(&interface("java.beans.PropertyChangeListener", vec![])));
        assert!(!convention.accepts_listener_type(&interface("MyListener", vec![])));
    }

    #[test]
    fn observer_names() {
        let convention = ObserverConvention;
        assert!(convention.is_register_method(&method("addObserver")));
        assert!(convention.is_unregister_method(&method("deleteObserver")));
        assert!(!convention.is_unregister_method(&method("removeObserver")));
        assert!(convention.accepts_listener_type(&interface("java.util.Observer", vec![])));
    }
}
