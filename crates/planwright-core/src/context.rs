//! The named variable store threading data between plan steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the distinguished default-input slot.
///
/// The executor refreshes this slot with every step's output, which is
/// how steps chain without explicit bindings.
pub const INPUT_VARIABLE: &str = "input";

/// An ordered, named bag of string variables plus the distinguished
/// `input` slot.
///
/// Keys are unique and last-write-wins. A fresh instance holds an empty
/// `input`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ContextVariables {
    variables: BTreeMap<String, String>,
}

impl ContextVariables {
    /// Create an empty context.
    pub fn new() -> Self {
        let mut variables = BTreeMap::new();
        variables.insert(INPUT_VARIABLE.to_string(), String::new());
        Self { variables }
    }

    /// Create a context seeded with an initial input value.
    pub fn with_input(input: impl Into<String>) -> Self {
        let mut context = Self::new();
        context.update(input);
        context
    }

    /// Set the default input slot, returning the context for chaining.
    pub fn update(&mut self, value: impl Into<String>) -> &mut Self {
        self.variables
            .insert(INPUT_VARIABLE.to_string(), value.into());
        self
    }

    /// The current value of the default input slot.
    pub fn input(&self) -> &str {
        self.variables
            .get(INPUT_VARIABLE)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Set a variable, overwriting any prior value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Returns true if a variable is present.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Snapshot the context as a plain key → value mapping.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.variables.clone()
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for ContextVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextVariables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.input())
    }
}
