//! Signature classifier.
//!
//! Classification looks at a mocked type's methods and finds the ones that
//! register and unregister listeners, together with the listener contract
//! each of them manages. It is a pure function of the type's shape (and of
//! the shapes of the parameter types, looked up in the [`TypeCatalog`]), so
//! results are cached per type name: computed once, then shared read-only.
//!
//! # Pairing
//!
//! A register method pairs with the unregister method of the same convention
//! taking exactly the same parameter list. A register method without such a
//! partner is kept as add-only; unregister calls for it cannot happen and
//! firing still works. Overloads that differ in their qualifying parameters
//! (`addPropertyChangeListener(listener)` vs
//! `addPropertyChangeListener(name, listener)`) become separate pairs.

pub mod conventions;

use crate::catalog::TypeCatalog;
use crate::config::ObservationConfig;
use crate::contract::ListenerContract;
use crate::errors::{ArgumentMismatch, ObservationError, ObservationResult};
use crate::shape::{MethodSignature, ParamType, TypeShape};
use crate::types::TypeName;
use crate::value::{adapt_arguments, ListenerRef, SelectorKey, Value};
use conventions::{CallbackShapeDetector, ListenerTypeDetector, RegistrationConvention};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Which side of a registration pair a method is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationRole {
    /// The method adds a listener.
    Register,
    /// The method removes a listener.
    Unregister,
}

/// A register method, its unregister partner (if any), and the contract they
/// manage.
#[derive(Debug)]
pub struct RegistrationMethodPair {
    contract: Arc<ListenerContract>,
    register: MethodSignature,
    unregister: Option<MethodSignature>,
    listener_index: usize,
    convention: String,
}

impl RegistrationMethodPair {
    /// The managed listener contract.
    pub const fn contract(&self) -> &Arc<ListenerContract> {
        &self.contract
    }

    /// The register method.
    pub const fn register(&self) -> &MethodSignature {
        &self.register
    }

    /// The unregister method, `None` for add-only registrations.
    pub const fn unregister(&self) -> Option<&MethodSignature> {
        self.unregister.as_ref()
    }

    /// Returns true when the type offers no matching unregister method.
    pub const fn is_add_only(&self) -> bool {
        self.unregister.is_none()
    }

    /// Position of the listener among the register method's parameters.
    pub const fn listener_index(&self) -> usize {
        self.listener_index
    }

    /// Name of the convention that detected the pair.
    pub fn convention(&self) -> &str {
        &self.convention
    }

    /// Parameter types of the qualifying (non-listener) parameters.
    pub fn key_shape(&self) -> Vec<ParamType> {
        self.register
            .params
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.listener_index)
            .map(|(_, param)| param.clone())
            .collect()
    }

    /// Returns true when registrations through this pair carry a key.
    pub fn is_keyed(&self) -> bool {
        self.register.arity() > 1
    }

    /// The role `method` plays in this pair, if any.
    pub fn role_of(&self, method: &MethodSignature) -> Option<RegistrationRole> {
        if &self.register == method {
            Some(RegistrationRole::Register)
        } else if self.unregister.as_ref() == Some(method) {
            Some(RegistrationRole::Unregister)
        } else {
            None
        }
    }

    /// Splits the arguments of a captured registration call into the listener
    /// and its key.
    pub fn extract(
        &self,
        method: &MethodSignature,
        args: &[Value],
    ) -> ObservationResult<(ListenerRef, SelectorKey)> {
        let mut adapted = adapt_arguments(&method.params, args).map_err(|mismatch| match mismatch {
            ArgumentMismatch::Type { index, .. } if index == self.listener_index => {
                ObservationError::ListenerContractMismatch {
                    method: method.clone(),
                    contract: self.contract.name().clone(),
                    listener: args[index].to_string(),
                }
            }
            _ => ObservationError::RegistrationCallMismatch {
                expected: self.register.clone(),
                actual: method.clone(),
                arguments: args.len(),
            },
        })?;

        let listener = match adapted.remove(self.listener_index) {
            Value::Listener(listener) => listener,
            other => {
                return Err(ObservationError::ListenerContractMismatch {
                    method: method.clone(),
                    contract: self.contract.name().clone(),
                    listener: other.to_string(),
                })
            }
        };
        Ok((listener, SelectorKey::of(adapted)))
    }
}

impl fmt::Display for RegistrationMethodPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.register)?;
        match &self.unregister {
            Some(unregister) => write!(f, " / {unregister}")?,
            None => f.write_str(" (add-only)")?,
        }
        write!(f, " for {}", self.contract)
    }
}

/// The classified registration methods of one mocked type.
#[derive(Debug)]
pub struct Classification {
    type_name: TypeName,
    pairs: Vec<Arc<RegistrationMethodPair>>,
    contracts: Vec<Arc<ListenerContract>>,
}

impl Classification {
    /// The classified type.
    pub const fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// All registration pairs, in detection order.
    pub fn pairs(&self) -> &[Arc<RegistrationMethodPair>] {
        &self.pairs
    }

    /// Every distinct listener contract managed by the type.
    pub fn contracts(&self) -> &[Arc<ListenerContract>] {
        &self.contracts
    }

    /// Returns true when no registration method was detected.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Looks up a managed contract by name.
    pub fn contract(&self, name: &TypeName) -> Option<&Arc<ListenerContract>> {
        self.contracts.iter().find(|c| c.name() == name)
    }

    /// Pairs managing `contract`.
    pub fn pairs_for<'a>(
        &'a self,
        contract: &'a TypeName,
    ) -> impl Iterator<Item = &'a Arc<RegistrationMethodPair>> + 'a {
        self.pairs.iter().filter(move |p| p.contract.name() == contract)
    }

    /// Finds the pair and role for a captured method.
    pub fn find_role(
        &self,
        method: &MethodSignature,
    ) -> Option<(&Arc<RegistrationMethodPair>, RegistrationRole)> {
        self.pairs
            .iter()
            .find_map(|pair| pair.role_of(method).map(|role| (pair, role)))
    }
}

/// A register or unregister candidate found by one convention.
struct Candidate<'a> {
    method: &'a MethodSignature,
    listener_index: usize,
    listener_shape: Arc<TypeShape>,
}

/// Classifies mocked types and caches the results.
///
/// Share one classifier (behind an `Arc`) between observatories to classify
/// each type once per process.
pub struct Classifier {
    conventions: Vec<Arc<dyn RegistrationConvention>>,
    detector: Arc<dyn ListenerTypeDetector>,
    catalog: Arc<TypeCatalog>,
    cache: RwLock<HashMap<TypeName, CachedClassification>>,
}

/// A classification together with the shape it was computed from.
struct CachedClassification {
    shape: TypeShape,
    classification: Arc<Classification>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("conventions", &self.convention_names())
            .field("detector", &self.detector)
            .field("cached_types", &self.cached_types())
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Creates a classifier with the default conventions.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self::from_config(catalog, &ObservationConfig::default())
    }

    /// Creates a classifier with the conventions named in `config`.
    pub fn from_config(catalog: Arc<TypeCatalog>, config: &ObservationConfig) -> Self {
        Self {
            conventions: config.build_conventions(),
            detector: Arc::new(CallbackShapeDetector),
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the listener-type detection hook.
    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn ListenerTypeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Adds a custom convention, applied before all others.
    #[must_use]
    pub fn with_convention(mut self, convention: Arc<dyn RegistrationConvention>) -> Self {
        self.conventions.insert(0, convention);
        self
    }

    /// The catalog parameter types are resolved against.
    pub const fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Names of the conventions in application order.
    pub fn convention_names(&self) -> Vec<String> {
        self.conventions.iter().map(|c| c.name().to_string()).collect()
    }

    /// Number of types classified so far.
    pub fn cached_types(&self) -> usize {
        self.cache.read().len()
    }

    /// Classifies `shape`, reusing the cached result for its type name.
    ///
    /// A shape that differs from the one cached under the same name is
    /// classified again and replaces the cached entry.
    ///
    /// Never fails: a type without registration methods yields an empty
    /// classification and the caller decides whether that is an error.
    #[instrument(skip_all, fields(type_name = %shape.name))]
    pub fn classify(&self, shape: &TypeShape) -> Arc<Classification> {
        {
            let cache = self.cache.read();
            if let Some(cached) = cache.get(&shape.name) {
                if &cached.shape == shape {
                    return Arc::clone(&cached.classification);
                }
                warn!("type shape differs from the cached one, classifying again");
            }
        }

        let computed = Arc::new(self.compute(shape));
        let mut cache = self.cache.write();
        match cache.get(&shape.name) {
            Some(cached) if &cached.shape == shape => Arc::clone(&cached.classification),
            _ => {
                let _replaced = cache.insert(
                    shape.name.clone(),
                    CachedClassification {
                        shape: shape.clone(),
                        classification: Arc::clone(&computed),
                    },
                );
                computed
            }
        }
    }

    fn compute(&self, shape: &TypeShape) -> Classification {
        let mut remaining: Vec<&MethodSignature> = shape.methods.iter().collect();
        let mut contracts: Vec<Arc<ListenerContract>> = Vec::new();
        let mut pairs = Vec::new();

        for convention in &self.conventions {
            let mut registers = Vec::new();
            let mut unregisters = Vec::new();
            let mut consumed = Vec::new();

            for (position, method) in remaining.iter().enumerate() {
                let is_register = convention.is_register_method(method);
                if !is_register && !convention.is_unregister_method(method) {
                    continue;
                }
                let Some(candidate) = self.candidate(convention.as_ref(), method) else {
                    continue;
                };
                consumed.push(position);
                if is_register {
                    registers.push(candidate);
                } else {
                    unregisters.push(candidate);
                }
            }

            for register in registers {
                let contract = intern_contract(&mut contracts, &register.listener_shape);
                let unregister = unregisters
                    .iter()
                    .position(|u| u.method.params == register.method.params)
                    .map(|idx| unregisters.remove(idx).method.clone());
                if unregister.is_none() {
                    debug!(method = %register.method, "register method has no unregister partner, keeping it add-only");
                }
                pairs.push(Arc::new(RegistrationMethodPair {
                    contract,
                    register: register.method.clone(),
                    unregister,
                    listener_index: register.listener_index,
                    convention: convention.name().to_string(),
                }));
            }

            for orphan in unregisters {
                warn!(
                    method = %orphan.method,
                    convention = convention.name(),
                    "unregister method without register partner ignored"
                );
            }

            remaining = remaining
                .into_iter()
                .enumerate()
                .filter(|(position, _)| !consumed.contains(position))
                .map(|(_, method)| method)
                .collect();
        }

        debug!(
            pairs = pairs.len(),
            contracts = contracts.len(),
            "classified registration methods"
        );

        Classification {
            type_name: shape.name.clone(),
            pairs,
            contracts,
        }
    }

    /// Finds the single listener parameter of a register/unregister method.
    fn candidate<'a>(
        &self,
        convention: &dyn RegistrationConvention,
        method: &'a MethodSignature,
    ) -> Option<Candidate<'a>> {
        let mut listeners = method.params.iter().enumerate().filter_map(|(index, param)| {
            let shape = self.catalog.get(param.object_type()?)?;
            (self.detector.is_listener_type(&shape) && convention.accepts_listener_type(&shape))
                .then_some((index, shape))
        });

        let (listener_index, listener_shape) = listeners.next()?;
        if listeners.next().is_some() {
            warn!(
                method = %method,
                convention = convention.name(),
                "registration method takes more than one listener, skipped"
            );
            return None;
        }

        Some(Candidate {
            method,
            listener_index,
            listener_shape,
        })
    }
}

fn intern_contract(
    contracts: &mut Vec<Arc<ListenerContract>>,
    shape: &TypeShape,
) -> Arc<ListenerContract> {
    if let Some(existing) = contracts.iter().find(|c| c.name() == &shape.name) {
        return Arc::clone(existing);
    }
    let contract = Arc::new(ListenerContract::from_shape(shape));
    contracts.push(Arc::clone(&contract));
    contract
}
