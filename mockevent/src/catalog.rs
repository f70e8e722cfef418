//! Type catalog for resolving parameter types to their shapes.
//!
//! A method parameter only names its type (`ParamType::Object(TypeName)`).
//! To decide whether that parameter is a listener, the classifier needs the
//! named type's own shape; the catalog maps names to shapes. Adapters fill it
//! in code or from a JSON document describing every type a test touches.

use crate::errors::CatalogError;
use crate::shape::TypeShape;
use crate::types::TypeName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe registry of type shapes keyed by type name.
///
/// Registering the same shape twice is a no-op; registering a different
/// shape under an existing name is a [`CatalogError::ShapeConflict`].
#[derive(Debug, Default)]
pub struct TypeCatalog {
    shapes: RwLock<HashMap<TypeName, Arc<TypeShape>>>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `shapes`.
    pub fn with_shapes(
        shapes: impl IntoIterator<Item = TypeShape>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for shape in shapes {
            let _shape = catalog.register(shape)?;
        }
        Ok(catalog)
    }

    /// Parses a JSON array of shapes into a new catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        let _registered = catalog.register_json(json)?;
        Ok(catalog)
    }

    /// Registers a shape and returns the shared instance stored for its name.
    pub fn register(&self, shape: TypeShape) -> Result<Arc<TypeShape>, CatalogError> {
        let mut shapes = self.shapes.write();
        if let Some(existing) = shapes.get(&shape.name) {
            if **existing != shape {
                return Err(CatalogError::ShapeConflict {
                    type_name: shape.name,
                });
            }
            return Ok(Arc::clone(existing));
        }
        let shape = Arc::new(shape);
        let _previous = shapes.insert(shape.name.clone(), Arc::clone(&shape));
        Ok(shape)
    }

    /// Registers every shape of a JSON array, returning how many were read.
    ///
    /// Shapes registered before a conflicting entry stay registered.
    pub fn register_json(&self, json: &str) -> Result<usize, CatalogError> {
        let shapes: Vec<TypeShape> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        let count = shapes.len();
        for shape in shapes {
            let _shape = self.register(shape)?;
        }
        Ok(count)
    }

    /// Looks up a shape.
    pub fn get(&self, name: &TypeName) -> Option<Arc<TypeShape>> {
        self.shapes.read().get(name).cloned()
    }

    /// Returns true when a shape is registered under `name`.
    pub fn contains(&self, name: &TypeName) -> bool {
        self.shapes.read().contains_key(name)
    }

    /// All registered type names, sorted.
    pub fn type_names(&self) -> Vec<TypeName> {
        let mut names: Vec<_> = self.shapes.read().keys().cloned().collect();
        names.sort();
        names
    }
}
