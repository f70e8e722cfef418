//! Declarative shape macros.
//!
//! Adapters usually describe every mocked and listener type a test touches.
//! [`type_shape!`](crate::type_shape) keeps those descriptions close to how
//! the types read in source.


/// Builds a [`ParamType`](crate::ParamType) from a single token.
///
/// `bool`, `int`, `float`, `str` and `any` map to the built-in types,
/// `[T]` is a trailing varargs parameter of `T`, and any other identifier is
/// an object of the type with that name.
#[macro_export]
macro_rules! param_type {
    (bool) => {
        $crate::ParamType::Bool
    };
    (int) => {
        $crate::ParamType::Int
    };
    (float) => {
        $crate::ParamType::Float
    };
    (str) => {
        $crate::ParamType::Str
    };
    (any) => {
        $crate::ParamType::Any
    };
    ([$inner:tt]) => {
        $crate::ParamType::varargs($crate::param_type!($inner))
    };
    ($object:ident) => {
        $crate::ParamType::object(
            $crate::TypeName::try_new(stringify!($object))
                .expect("an identifier is a valid type name"),
        )
    };
}

/// Builds a [`TypeShape`](crate::TypeShape).
///
/// # Example
///
/// ```
/// use mockevent::{type_shape, ParamType};
///
/// let listener = type_shape!(interface TemperatureListener {
///     fn onChange(float);
/// });
/// let sensor = type_shape!(class TemperatureSensor {
///     fn addTemperatureListener(TemperatureListener);
///     fn removeTemperatureListener(TemperatureListener);
///     fn currentTemperature() -> float;
/// });
///
/// assert!(listener.is_interface());
/// assert_eq!(sensor.methods.len(), 3);
/// assert_eq!(sensor.methods[2].returns, Some(ParamType::Float));
/// ```
#[macro_export]
macro_rules! type_shape {
    (@kind interface) => {
        $crate::TypeKind::Interface
    };
    (@kind class) => {
        $crate::TypeKind::Class
    };
    ($kind:ident $name:ident {
        $( fn $method:ident ( $($param:tt),* ) $(-> $returns:tt)? ; )*
    }) => {{
        let shape = $crate::TypeShape {
            name: $crate::TypeName::try_new(stringify!($name))
                .expect("an identifier is a valid type name"),
            kind: $crate::type_shape!(@kind $kind),
            methods: ::std::vec::Vec::new(),
        };
        $(
            let method = $crate::MethodSignature::new(
                $crate::MethodName::try_new(stringify!($method))
                    .expect("an identifier is a valid method name"),
                ::std::vec![$($crate::param_type!($param)),*],
            );
            $( let method = method.returning($crate::param_type!($returns)); )?
            let shape = shape.with_method(method);
        )*
        shape
    }};
}
