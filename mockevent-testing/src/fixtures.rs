//! Shapes of commonly observed types.
//!
//! Every listener type below is part of [`catalog`], so mocks of the
//! observable types classify out of the box.

use mockevent::{type_shape, MockRef, ObjectValue, TypeCatalog, TypeShape, Value};
use std::sync::Arc;

/// Name of the temperature listener contract.
pub const TEMPERATURE_LISTENER: &str = "TemperatureListener";
/// Name of the property change listener contract.
pub const PROPERTY_CHANGE_LISTENER: &str = "PropertyChangeListener";
/// Name of the property change event record.
pub const PROPERTY_CHANGE_EVENT: &str = "PropertyChangeEvent";
/// Name of the observer contract.
pub const OBSERVER: &str = "Observer";
/// Name of the first custom listener contract.
pub const MY_LISTENER: &str = "MyListener";
/// Name of the second custom listener contract.
pub const MY_ANOTHER_LISTENER: &str = "MyAnotherListener";

/// `TemperatureListener { onChange(float) }`
pub fn temperature_listener() -> TypeShape {
    type_shape!(interface TemperatureListener {
        fn onChange(float);
    })
}

/// `PropertyChangeListener { propertyChange(PropertyChangeEvent) }`
pub fn property_change_listener() -> TypeShape {
    type_shape!(interface PropertyChangeListener {
        fn propertyChange(PropertyChangeEvent);
    })
}

/// `Observer { update(Observable, any) }`
pub fn observer() -> TypeShape {
    type_shape!(interface Observer {
        fn update(Observable, any);
    })
}

/// A listener with one callback overloaded on arity.
pub fn my_listener() -> TypeShape {
    type_shape!(interface MyListener {
        fn onChange(any);
        fn onChange(str, any);
        fn onReset();
    })
}

/// A listener whose callback shares no name with [`my_listener`].
pub fn my_another_listener() -> TypeShape {
    type_shape!(interface MyAnotherListener {
        fn onOtherChange(int);
    })
}

/// A sensor managing temperature listeners.
pub fn temperature_sensor() -> TypeShape {
    type_shape!(class TemperatureSensor {
        fn addTemperatureListener(TemperatureListener);
        fn removeTemperatureListener(TemperatureListener);
        fn currentTemperature() -> float;
    })
}

/// A bean with global and per-property change listeners.
pub fn property_change_bean() -> TypeShape {
    type_shape!(class Bean {
        fn addPropertyChangeListener(PropertyChangeListener);
        fn addPropertyChangeListener(str, PropertyChangeListener);
        fn removePropertyChangeListener(PropertyChangeListener);
        fn removePropertyChangeListener(str, PropertyChangeListener);
        fn setName(str);
        fn getName() -> str;
    })
}

/// An observable in the observer convention.
pub fn observable() -> TypeShape {
    type_shape!(class Observable {
        fn addObserver(Observer);
        fn deleteObserver(Observer);
        fn notifyObservers(any);
        fn countObservers() -> int;
    })
}

/// A type mixing every registration convention.
///
/// `addMyListener` has a plain and a keyed overload; `addMyAnotherListener`
/// has no remove partner; `addTwoListeners` takes two listeners and is
/// skipped.
pub fn mocked_observable() -> TypeShape {
    type_shape!(interface MockedObservable {
        fn addMyListener(MyListener);
        fn addMyListener(str, MyListener, str);
        fn addMyAnotherListener(MyAnotherListener);
        fn addTwoListeners(MyListener, MyAnotherListener);
        fn removeMyListener(MyListener);
        fn removeMyListener(str, MyListener, str);
        fn removeTwoListeners(MyListener, MyAnotherListener);
        fn addPropertyChangeListener(PropertyChangeListener);
        fn addPropertyChangeListener(str, PropertyChangeListener);
        fn removePropertyChangeListener(PropertyChangeListener);
        fn removePropertyChangeListener(str, PropertyChangeListener);
        fn addObserver(Observer);
        fn deleteObserver(Observer);
        fn getValue() -> any;
    })
}

/// A catalog holding every listener type above.
pub fn catalog() -> Arc<TypeCatalog> {
    let catalog = TypeCatalog::new();
    for shape in [
        temperature_listener(),
        property_change_listener(),
        observer(),
        my_listener(),
        my_another_listener(),
    ] {
        let _shape = catalog
            .register(shape)
            .unwrap_or_else(|e| panic!("fixture shapes are distinct: {e}"));
    }
    Arc::new(catalog)
}

/// A `PropertyChangeEvent` record fired by `source`.
pub fn property_change_event(
    source: &MockRef,
    property: &str,
    old_value: impl Into<Value>,
    new_value: impl Into<Value>,
) -> ObjectValue {
    ObjectValue::new(crate::type_name(PROPERTY_CHANGE_EVENT))
        .with_field("source", source.clone())
        .with_field("propertyName", property)
        .with_field("oldValue", old_value)
        .with_field("newValue", new_value)
}
