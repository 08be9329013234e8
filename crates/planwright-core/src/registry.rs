//! The function registry.

use std::collections::HashMap;

use crate::error::{PlanwrightError, Result};
use crate::function::FunctionDescriptor;

/// Registry of callable skill functions, keyed by `(collection, name)`.
///
/// Populated once at startup by skill providers, then shared read-only
/// behind an `Arc` for the lifetime of the process; enumeration order is
/// registration order so planner prompts stay deterministic.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    /// Descriptors in registration order.
    entries: Vec<FunctionDescriptor>,

    /// `(collection, name)` → index into `entries`.
    index: HashMap<(String, String), usize>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function descriptor.
    ///
    /// Fails with [`PlanwrightError::DuplicateFunction`] if the
    /// `(collection, name)` pair is already present.
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Result<()> {
        let key = (descriptor.collection.clone(), descriptor.name.clone());
        if self.index.contains_key(&key) {
            return Err(PlanwrightError::DuplicateFunction {
                collection: descriptor.collection,
                name: descriptor.name,
            });
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(descriptor);
        Ok(())
    }

    /// Resolve a function by collection and name.
    ///
    /// Fails with [`PlanwrightError::UnknownFunction`] if absent.
    pub fn resolve(&self, collection: &str, name: &str) -> Result<&FunctionDescriptor> {
        self.index
            .get(&(collection.to_string(), name.to_string()))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| PlanwrightError::UnknownFunction {
                collection: collection.to_string(),
                name: name.to_string(),
            })
    }

    /// Returns true if a function is registered under the pair.
    pub fn contains(&self, collection: &str, name: &str) -> bool {
        self.index
            .contains_key(&(collection.to_string(), name.to_string()))
    }

    /// Iterate over all descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.entries.iter()
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no functions are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionDescriptor, ParameterSpec};

    fn descriptor(collection: &str, name: &str) -> FunctionDescriptor {
        FunctionDescriptor::builder()
            .collection(collection)
            .name(name)
            .description("test function")
            .parameter(ParameterSpec::new("input", "input text"))
            .invoke(|_| Box::pin(async { Ok(String::new()) }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = FunctionRegistry::new();
        registry.register(descriptor("text", "concat")).unwrap();

        let resolved = registry.resolve("text", "concat").unwrap();
        assert_eq!(resolved.qualified_name(), "text.concat");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = FunctionRegistry::new();
        registry.register(descriptor("text", "concat")).unwrap();

        let err = registry.register(descriptor("text", "concat")).unwrap_err();
        assert!(matches!(
            err,
            PlanwrightError::DuplicateFunction { .. }
        ));
    }

    #[test]
    fn test_resolve_unknown_function() {
        let registry = FunctionRegistry::new();
        let err = registry.resolve("email", "send").unwrap_err();
        assert!(matches!(err, PlanwrightError::UnknownFunction { .. }));
    }

    #[test]
    fn test_same_name_different_collections() {
        let mut registry = FunctionRegistry::new();
        registry.register(descriptor("text", "send")).unwrap();
        registry.register(descriptor("email", "send")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iteration_order_is_registration_order() {
        let mut registry = FunctionRegistry::new();
        registry.register(descriptor("b", "second")).unwrap();
        registry.register(descriptor("a", "first")).unwrap();
        registry.register(descriptor("c", "third")).unwrap();

        let names: Vec<String> = registry.iter().map(|d| d.qualified_name()).collect();
        assert_eq!(names, vec!["b.second", "a.first", "c.third"]);
    }
}
