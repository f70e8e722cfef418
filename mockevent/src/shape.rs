//! Structural descriptions of types and their methods.
//!
//! The engine never inspects Rust types at runtime. Instead every mocked type
//! and every listener contract is described by a [`TypeShape`]: its name, its
//! kind and the signatures of its public methods. Shapes are plain data; they
//! can be built in code, with the [`type_shape!`](crate::type_shape) macro, or
//! deserialized from JSON supplied by a mocking adapter.

use crate::types::{MethodName, TypeName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// A floating point number.
    Float,
    /// A string.
    Str,
    /// Any value at all.
    Any,
    /// A reference to an object of the named type.
    Object(TypeName),
    /// Zero or more trailing values of the inner type.
    Varargs(Box<ParamType>),
}

impl ParamType {
    /// Shorthand for [`ParamType::Object`].
    pub fn object(type_name: TypeName) -> Self {
        Self::Object(type_name)
    }

    /// Shorthand for [`ParamType::Varargs`].
    pub fn varargs(inner: Self) -> Self {
        Self::Varargs(Box::new(inner))
    }

    /// The type name behind an object parameter.
    pub const fn object_type(&self) -> Option<&TypeName> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true for a varargs parameter.
    pub const fn is_varargs(&self) -> bool {
        matches!(self, Self::Varargs(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::Any => f.write_str("any"),
            Self::Object(name) => write!(f, "{name}"),
            Self::Varargs(inner) => write!(f, "{inner}..."),
        }
    }
}

/// Signature of one method: name, parameter types and optional return type.
///
/// Two signatures are the same method when all three parts are equal; this
/// is how overloads are told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name.
    pub name: MethodName,
    /// Parameter types in declaration order.
    #[serde(default)]
    pub params: Vec<ParamType>,
    /// Return type, `None` for methods returning nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ParamType>,
}

impl MethodSignature {
    /// Creates a signature for a method returning nothing.
    pub fn new(name: MethodName, params: Vec<ParamType>) -> Self {
        Self {
            name,
            params,
            returns: None,
        }
    }

    /// Sets the return type.
    #[must_use]
    pub fn returning(mut self, returns: ParamType) -> Self {
        self.returns = Some(returns);
        self
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns true when the method returns nothing.
    pub const fn is_callback_shaped(&self) -> bool {
        self.returns.is_none()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}

/// Whether a type is an abstract contract or a concrete class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// An interface or abstract contract.
    Interface,
    /// A concrete class.
    Class,
}

/// Structural description of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeShape {
    /// The type's name, also its identity.
    pub name: TypeName,
    /// Interface or class.
    pub kind: TypeKind,
    /// Public methods in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
}

impl TypeShape {
    /// Starts an interface shape with no methods.
    pub const fn interface(name: TypeName) -> Self {
        Self {
            name,
            kind: TypeKind::Interface,
            methods: Vec::new(),
        }
    }

    /// Starts a class shape with no methods.
    pub const fn class(name: TypeName) -> Self {
        Self {
            name,
            kind: TypeKind::Class,
            methods: Vec::new(),
        }
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns true for interfaces.
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// All overloads named `name`.
    pub fn methods_named<'a>(
        &'a self,
        name: &'a MethodName,
    ) -> impl Iterator<Item = &'a MethodSignature> + 'a {
        self.methods.iter().filter(move |m| &m.name == name)
    }

    /// Looks up the exact signature `method`.
    pub fn find_method(&self, method: &MethodSignature) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| *m == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> TypeName {
        TypeName::try_new(s).unwrap()
    }

    fn method(s: &str) -> MethodName {
        MethodName::try_new(s).unwrap()
    }

    #[test]
    fn signature_display_lists_params_and_return() {
        let sig = MethodSignature::new(
            method("addListener"),
            vec![
                ParamType::object(name("MyListener")),
                ParamType::varargs(ParamType::Str),
            ],
        );
        assert_eq!(sig.to_string(), "addListener(MyListener, str...)");

        let sig = MethodSignature::new(method("size"), vec![]).returning(ParamType::Int);
        assert_eq!(sig.to_string(), "size() -> int");
        assert!(!sig.is_callback_shaped());
    }

    #[test]
    fn overloads_are_distinct_signatures() {
        let plain = MethodSignature::new(
            method("addPropertyChangeListener"),
            vec![ParamType::object(name("PropertyChangeListener"))],
        );
        let keyed = MethodSignature::new(
            method("addPropertyChangeListener"),
            vec![
                ParamType::Str,
                ParamType::object(name("PropertyChangeListener")),
            ],
        );
        assert_ne!(plain, keyed);

        let shape = TypeShape::interface(name("Bean"))
            .with_method(plain.clone())
            .with_method(keyed.clone());
        assert_eq!(shape.methods_named(&plain.name).count(), 2);
        assert_eq!(shape.find_method(&keyed), Some(&keyed));
    }

    #[test]
    fn shape_deserializes_from_adapter_json() {
        let json = r#"{
            "name": "TemperatureListener",
            "kind": "interface",
            "methods": [
                { "name": "onChange", "params": ["float"] }
            ]
        }"#;
        let shape: TypeShape = serde_json::from_str(json).unwrap();
        assert!(shape.is_interface());
        assert_eq!(shape.methods.len(), 1);
        assert_eq!(shape.methods[0].params, vec![ParamType::Float]);
        assert!(shape.methods[0].returns.is_none());
    }

    #[test]
    fn object_and_varargs_params_deserialize() {
        let params: Vec<ParamType> =
            serde_json::from_str(r#"[{"object": "MyListener"}, {"varargs": "str"}]"#).unwrap();
        assert_eq!(
            params,
            vec![
                ParamType::object(name("MyListener")),
                ParamType::varargs(ParamType::Str)
            ]
        );
    }

    #[test]
    fn blank_type_name_in_json_is_rejected() {
        let json = r#"{ "name": "  ", "kind": "class" }"#;
        assert!(serde_json::from_str::<TypeShape>(json).is_err());
    }
}
