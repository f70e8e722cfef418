//! Contract resolver.
//!
//! Turns a test's [`Selector`] into exactly one listener contract callback
//! plus the key under which listeners are looked up. Resolution is purely
//! structural: it only consults the mocked type's [`Classification`], never
//! the registry, so an event with no listener registered still resolves.

use crate::classifier::Classification;
use crate::contract::ListenerContract;
use crate::errors::{ObservationError, ObservationResult};
use crate::shape::{MethodSignature, ParamType};
use crate::types::{MethodName, TypeName};
use crate::value::{adapt_arguments, SelectorKey, Value};
use std::fmt;
use std::sync::Arc;

/// Identifies the event a test wants to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// An explicit reference to a listener callback.
    ///
    /// `TemperatureListener.onChange(float)`, or just `onChange` when the name
    /// is unique among the mock's contracts.
    Callback {
        /// Restricts the lookup to one contract
        contract: Option<TypeName>,
        /// The callback's name
        method: MethodName,
        /// Picks one overload by its exact parameter list
        params: Option<Vec<ParamType>>,
        /// Key the listeners were registered under; empty for keyless ones
        key: SelectorKey,
    },
    /// A symbolic key such as a property name.
    ///
    /// Resolved against the registration methods' qualifying parameters: the
    /// key must fit exactly one contract's key shape.
    Key {
        /// The key
        key: SelectorKey,
        /// Restricts the lookup to one contract
        contract: Option<TypeName>,
        /// Picks a callback when the contract has several
        method: Option<MethodName>,
    },
}

impl Selector {
    /// Selects a callback by name.
    pub const fn callback(method: MethodName) -> Self {
        Self::Callback {
            contract: None,
            method,
            params: None,
            key: SelectorKey::none(),
        }
    }

    /// Selects by key.
    pub fn key(key: impl Into<SelectorKey>) -> Self {
        Self::Key {
            key: key.into(),
            contract: None,
            method: None,
        }
    }

    /// Restricts the selector to one contract.
    #[must_use]
    pub fn on_contract(mut self, name: TypeName) -> Self {
        match &mut self {
            Self::Callback { contract, .. } | Self::Key { contract, .. } => *contract = Some(name),
        }
        self
    }

    /// Picks one overload of a callback selector. Key selectors ignore it.
    #[must_use]
    pub fn with_params(mut self, overload: Vec<ParamType>) -> Self {
        if let Self::Callback { params, .. } = &mut self {
            *params = Some(overload);
        }
        self
    }

    /// Sets the key listeners are looked up under.
    #[must_use]
    pub fn with_key(mut self, selector_key: impl Into<SelectorKey>) -> Self {
        match &mut self {
            Self::Callback { key, .. } | Self::Key { key, .. } => *key = selector_key.into(),
        }
        self
    }

    /// Names the callback to invoke.
    #[must_use]
    pub fn with_method(mut self, name: MethodName) -> Self {
        match &mut self {
            Self::Callback { method, .. } => *method = name,
            Self::Key { method, .. } => *method = Some(name),
        }
        self
    }

    /// The key listeners are looked up under.
    pub const fn selector_key(&self) -> &SelectorKey {
        match self {
            Self::Callback { key, .. } | Self::Key { key, .. } => key,
        }
    }
}

impl From<SelectorKey> for Selector {
    fn from(key: SelectorKey) -> Self {
        Self::key(key)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback {
                contract,
                method,
                params,
                key,
            } => {
                if let Some(contract) = contract {
                    write!(f, "{contract}.")?;
                }
                write!(f, "{method}")?;
                if let Some(params) = params {
                    let listed: Vec<_> = params.iter().map(ToString::to_string).collect();
                    write!(f, "({})", listed.join(", "))?;
                }
                if !key.is_empty() {
                    write!(f, " {key}")?;
                }
                Ok(())
            }
            Self::Key {
                key,
                contract,
                method,
            } => {
                write!(f, "{key}")?;
                match (contract, method) {
                    (Some(contract), Some(method)) => write!(f, " for {contract}.{method}"),
                    (Some(contract), None) => write!(f, " for {contract}"),
                    (None, Some(method)) => write!(f, " for {method}"),
                    (None, None) => Ok(()),
                }
            }
        }
    }
}

/// A selector resolved to one callback.
#[derive(Debug, Clone)]
pub struct ResolvedEvent {
    /// The contract whose listeners are notified
    pub contract: Arc<ListenerContract>,
    /// The callback invoked on each listener
    pub callback: MethodSignature,
    /// The key listeners are looked up under
    pub key: SelectorKey,
}

impl fmt::Display for ResolvedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contract.describe_callback(&self.callback))?;
        if !self.key.is_empty() {
            write!(f, " with {}", self.key)?;
        }
        Ok(())
    }
}

/// Resolves selectors against one mocked type's classification.
#[derive(Debug, Clone, Copy)]
pub struct ContractResolver<'a> {
    classification: &'a Classification,
}

impl<'a> ContractResolver<'a> {
    /// Creates a resolver for `classification`.
    pub const fn new(classification: &'a Classification) -> Self {
        Self { classification }
    }

    /// Resolves `selector` to exactly one callback.
    ///
    /// `args` break ties between callback overloads sharing a name: when
    /// several overloads match, only the ones the arguments fit are kept.
    pub fn resolve(&self, selector: &Selector, args: &[Value]) -> ObservationResult<ResolvedEvent> {
        match selector {
            Selector::Callback {
                contract,
                method,
                params,
                key,
            } => self.resolve_callback(selector, contract.as_ref(), method, params.as_deref(), key, args),
            Selector::Key {
                key,
                contract,
                method,
            } => self.resolve_key(selector, key, contract.as_ref(), method.as_ref(), args),
        }
    }

    fn resolve_callback(
        &self,
        selector: &Selector,
        contract: Option<&TypeName>,
        method: &MethodName,
        params: Option<&[ParamType]>,
        key: &SelectorKey,
        args: &[Value],
    ) -> ObservationResult<ResolvedEvent> {
        let candidates: Vec<(&Arc<ListenerContract>, &MethodSignature)> = self
            .classification
            .contracts()
            .iter()
            .filter(|c| contract.map_or(true, |name| c.name() == name))
            .flat_map(|c| c.callbacks_named(method).map(move |cb| (c, cb)))
            .filter(|(_, cb)| params.map_or(true, |p| cb.params.as_slice() == p))
            .collect();

        let (contract, callback) = self.pick(selector, candidates, args)?;
        if !key.is_empty()
            && !self
                .classification
                .pairs_for(contract.name())
                .any(|pair| pair.is_keyed() && key.fits(&pair.key_shape()))
        {
            return Err(self.unresolved(selector));
        }

        Ok(ResolvedEvent {
            contract: Arc::clone(contract),
            callback: callback.clone(),
            key: key.clone(),
        })
    }

    fn resolve_key(
        &self,
        selector: &Selector,
        key: &SelectorKey,
        contract: Option<&TypeName>,
        method: Option<&MethodName>,
        args: &[Value],
    ) -> ObservationResult<ResolvedEvent> {
        let mut shapes: Vec<(&Arc<ListenerContract>, Vec<ParamType>, String)> = Vec::new();
        for pair in self.classification.pairs() {
            if contract.is_some_and(|name| pair.contract().name() != name) {
                continue;
            }
            let shape = pair.key_shape();
            if !pair.is_keyed() || !key.fits(&shape) {
                continue;
            }
            if !shapes
                .iter()
                .any(|(c, s, _)| c.name() == pair.contract().name() && s == &shape)
            {
                shapes.push((pair.contract(), shape, format!("{} via {}", pair.contract(), pair.register())));
            }
        }

        let owner = match shapes.as_slice() {
            [] => return Err(self.unresolved(selector)),
            [(owner, _, _)] => *owner,
            _ => {
                return Err(ObservationError::AmbiguousSelector {
                    selector: selector.to_string(),
                    candidates: shapes.into_iter().map(|(_, _, described)| described).collect(),
                })
            }
        };

        let candidates: Vec<(&Arc<ListenerContract>, &MethodSignature)> = owner
            .callbacks()
            .iter()
            .filter(|cb| method.map_or(true, |name| &cb.name == name))
            .map(|cb| (owner, cb))
            .collect();
        let (contract, callback) = self.pick(selector, candidates, args)?;

        Ok(ResolvedEvent {
            contract: Arc::clone(contract),
            callback: callback.clone(),
            key: key.clone(),
        })
    }

    fn pick<'c>(
        &self,
        selector: &Selector,
        candidates: Vec<(&'c Arc<ListenerContract>, &'c MethodSignature)>,
        args: &[Value],
    ) -> ObservationResult<(&'c Arc<ListenerContract>, &'c MethodSignature)> {
        match candidates.as_slice() {
            [] => return Err(self.unresolved(selector)),
            [only] => return Ok(*only),
            _ => {}
        }

        let fitting: Vec<_> = candidates
            .iter()
            .filter(|(_, cb)| adapt_arguments(&cb.params, args).is_ok())
            .copied()
            .collect();
        if let [only] = fitting.as_slice() {
            return Ok(*only);
        }

        Err(ObservationError::AmbiguousSelector {
            selector: selector.to_string(),
            candidates: candidates
                .iter()
                .map(|(contract, cb)| contract.describe_callback(cb))
                .collect(),
        })
    }

    fn unresolved(&self, selector: &Selector) -> ObservationError {
        ObservationError::UnresolvedSelector {
            selector: selector.to_string(),
            type_name: self.classification.type_name().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCatalog;
    use crate::classifier::Classifier;
    use crate::shape::TypeShape;

    fn name(s: &str) -> TypeName {
        TypeName::try_new(s).unwrap()
    }

    fn method(s: &str) -> MethodName {
        MethodName::try_new(s).unwrap()
    }

    fn sig(m: &str, params: Vec<ParamType>) -> MethodSignature {
        MethodSignature::new(method(m), params)
    }

    fn obj(s: &str) -> ParamType {
        ParamType::object(name(s))
    }

    fn classification() -> Arc<Classification> {
        let catalog = TypeCatalog::with_shapes([
            TypeShape::interface(name("TemperatureListener"))
                .with_method(sig("onChange", vec![ParamType::Float])),
            TypeShape::interface(name("HumidityListener"))
                .with_method(sig("onChange", vec![ParamType::Int]))
                .with_method(sig("onChange", vec![ParamType::Str]))
                .with_method(sig("onReset", vec![])),
            TypeShape::interface(name("PropertyChangeListener"))
                .with_method(sig("propertyChange", vec![obj("PropertyChangeEvent")])),
            TypeShape::interface(name("FooListener")).with_method(sig("onFoo", vec![ParamType::Str])),
            TypeShape::interface(name("BarListener")).with_method(sig("onBar", vec![ParamType::Str])),
        ])
        .unwrap();
        let station = TypeShape::class(name("WeatherStation"))
            .with_method(sig("addTemperatureListener", vec![obj("TemperatureListener")]))
            .with_method(sig("addHumidityListener", vec![obj("HumidityListener")]))
            .with_method(sig("addPropertyChangeListener", vec![obj("PropertyChangeListener")]))
            .with_method(sig(
                "addPropertyChangeListener",
                vec![ParamType::Str, obj("PropertyChangeListener")],
            ))
            .with_method(sig("addFooListener", vec![ParamType::Str, obj("FooListener")]))
            .with_method(sig("addBarListener", vec![ParamType::Str, obj("BarListener")]));
        Classifier::new(Arc::new(catalog)).classify(&station)
    }

    #[test]
    fn explicit_callback_with_contract_resolves() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let selector = Selector::callback(method("onChange")).on_contract(name("TemperatureListener"));

        let event = resolver.resolve(&selector, &[21.5.into()]).unwrap();

        assert_eq!(event.contract.name(), &name("TemperatureListener"));
        assert_eq!(event.callback, sig("onChange", vec![ParamType::Float]));
        assert_eq!(event.to_string(), "TemperatureListener.onChange(float)");
    }

    #[test]
    fn arguments_break_overload_ties() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let selector = Selector::callback(method("onChange"));

        let event = resolver.resolve(&selector, &["damp".into()]).unwrap();
        assert_eq!(event.contract.name(), &name("HumidityListener"));
        assert_eq!(event.callback.params, vec![ParamType::Str]);

        let event = resolver.resolve(&selector, &[1.5.into()]).unwrap();
        assert_eq!(event.contract.name(), &name("TemperatureListener"));
    }

    #[test]
    fn overload_ties_without_fitting_arguments_are_ambiguous() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let selector = Selector::callback(method("onChange")).on_contract(name("HumidityListener"));

        let err = resolver.resolve(&selector, &[]).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"selector HumidityListener.onChange is ambiguous; candidates: HumidityListener.onChange(int), HumidityListener.onChange(str)"
        );

        let exact = selector.with_params(vec![ParamType::Int]);
        assert!(resolver.resolve(&exact, &[]).is_ok());
    }

    #[test]
    fn unknown_callback_is_unresolved() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let err = resolver
            .resolve(&Selector::callback(method("onExplode")), &[])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "selector onExplode matches no listener callback of type 'WeatherStation'"
        );
    }

    #[test]
    fn key_resolves_through_the_keyed_registration_shape() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let selector = Selector::key("temperature").on_contract(name("PropertyChangeListener"));

        let event = resolver.resolve(&selector, &[]).unwrap();

        assert_eq!(event.contract.name(), &name("PropertyChangeListener"));
        assert_eq!(event.callback.name, method("propertyChange"));
        assert_eq!(event.key, SelectorKey::single("temperature"));
    }

    #[test]
    fn key_matching_several_contracts_is_ambiguous() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);

        let err = resolver.resolve(&Selector::key("a"), &[]).unwrap_err();

        let candidates = match err {
            ObservationError::AmbiguousSelector { candidates, .. } => candidates,
            other => panic!("expected an ambiguity, got {other}"),
        };
        assert_eq!(
            candidates,
            vec![
                "PropertyChangeListener via addPropertyChangeListener(str, PropertyChangeListener)",
                "FooListener via addFooListener(str, FooListener)",
                "BarListener via addBarListener(str, BarListener)",
            ]
        );
    }

    #[test]
    fn key_not_fitting_any_shape_is_unresolved() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let err = resolver
            .resolve(&Selector::key(SelectorKey::single(42)), &[])
            .unwrap_err();
        assert!(matches!(err, ObservationError::UnresolvedSelector { .. }));
    }

    #[test]
    fn key_on_a_contract_without_keyed_registration_is_unresolved() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);
        let foo = Selector::key("x").on_contract(name("FooListener"));
        assert!(resolver.resolve(&foo, &[]).is_ok());

        let humidity = Selector::key("x").on_contract(name("HumidityListener"));
        assert!(matches!(
            resolver.resolve(&humidity, &[]),
            Err(ObservationError::UnresolvedSelector { .. })
        ));
    }

    #[test]
    fn callback_key_must_fit_a_keyed_registration() {
        let classification = classification();
        let resolver = ContractResolver::new(&classification);

        let keyed = Selector::callback(method("propertyChange")).with_key("temperature");
        assert_eq!(resolver.resolve(&keyed, &[]).unwrap().key, SelectorKey::single("temperature"));

        let bogus = Selector::callback(method("onChange"))
            .on_contract(name("TemperatureListener"))
            .with_key("temperature");
        assert!(matches!(
            resolver.resolve(&bogus, &[1.0.into()]),
            Err(ObservationError::UnresolvedSelector { .. })
        ));
    }

    #[test]
    fn selector_display() {
        assert_eq!(
            Selector::callback(method("onChange"))
                .on_contract(name("TemperatureListener"))
                .with_params(vec![ParamType::Float])
                .to_string(),
            "TemperatureListener.onChange(float)"
        );
        assert_eq!(
            Selector::key("a").with_method(method("onFoo")).to_string(),
            r#"selector("a") for onFoo"#
        );
    }
}
