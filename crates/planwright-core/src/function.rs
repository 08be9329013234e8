//! Callable skill descriptors.
//!
//! A [`FunctionDescriptor`] is the registration contract for a skill:
//! a name, a collection, a description, a typed parameter list, and an
//! explicit invoke capability. Descriptors are built at startup and are
//! immutable once registered; there is no runtime discovery.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::context::ContextVariables;
use crate::error::{PlanwrightError, Result};

/// The declared type of a skill parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    #[default]
    String,
    Number,
    Boolean,
}

/// A single named parameter of a skill function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within the function.
    pub name: String,

    /// Human-readable description, surfaced in planner prompts.
    pub description: String,

    /// Declared type of the parameter value.
    #[serde(default)]
    pub kind: ParameterKind,

    /// Default value used when no binding supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParameterSpec {
    /// Create a required string parameter.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ParameterKind::String,
            default: None,
        }
    }

    /// Set a default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the parameter kind.
    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Resolved arguments handed to a skill invocation.
///
/// The executor resolves every binding to a concrete string before the
/// call, so skills only ever see plain values.
#[derive(Debug, Clone, Default)]
pub struct SkillArgs {
    values: std::collections::BTreeMap<String, String>,
}

impl SkillArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up an argument by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Look up an argument, failing with a skill error if absent.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| PlanwrightError::skill(format!("missing argument '{name}'")))
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<&ContextVariables> for SkillArgs {
    fn from(context: &ContextVariables) -> Self {
        let mut args = SkillArgs::new();
        for (name, value) in context.iter() {
            args.insert(name, value);
        }
        args
    }
}

/// The invoke capability of a skill: resolved arguments in, string out.
pub type SkillFn = Arc<dyn Fn(SkillArgs) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// A registered, invocable skill function.
///
/// Immutable once registered; owned by the registry.
#[derive(Clone)]
pub struct FunctionDescriptor {
    /// Function name, unique within its collection.
    pub name: String,

    /// Collection (skill group) this function belongs to.
    pub collection: String,

    /// Human-readable description, surfaced in planner prompts.
    pub description: String,

    /// Ordered parameter list.
    pub parameters: Vec<ParameterSpec>,

    /// The call capability.
    pub invoke: SkillFn,
}

impl std::fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl FunctionDescriptor {
    /// Create a new FunctionDescriptorBuilder.
    pub fn builder() -> FunctionDescriptorBuilder {
        FunctionDescriptorBuilder::default()
    }

    /// The `collection.name` reference for this function.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.collection, self.name)
    }

    /// Look up a parameter spec by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Builder for [`FunctionDescriptor`] with a fluent API.
#[derive(Default)]
pub struct FunctionDescriptorBuilder {
    name: Option<String>,
    collection: Option<String>,
    description: String,
    parameters: Vec<ParameterSpec>,
    invoke: Option<SkillFn>,
}

impl FunctionDescriptorBuilder {
    /// Set the function name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a parameter.
    pub fn parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the invoke capability from a closure returning a boxed future.
    pub fn invoke<F>(mut self, invoke: F) -> Self
    where
        F: Fn(SkillArgs) -> BoxFuture<'static, Result<String>> + Send + Sync + 'static,
    {
        self.invoke = Some(Arc::new(invoke));
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> Result<FunctionDescriptor> {
        let name = self
            .name
            .ok_or_else(|| PlanwrightError::skill("function name is required"))?;
        let collection = self
            .collection
            .ok_or_else(|| PlanwrightError::skill("function collection is required"))?;
        let invoke = self
            .invoke
            .ok_or_else(|| PlanwrightError::skill("function invoke capability is required"))?;

        Ok(FunctionDescriptor {
            name,
            collection,
            description: self.description,
            parameters: self.parameters,
            invoke,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_descriptor() -> FunctionDescriptor {
        FunctionDescriptor::builder()
            .collection("test")
            .name("echo")
            .description("Echoes its input.")
            .parameter(ParameterSpec::new("input", "The text to echo."))
            .invoke(|args| {
                Box::pin(async move { Ok(args.require("input")?.to_string()) })
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_descriptor_invoke() {
        let descriptor = echo_descriptor();
        let mut args = SkillArgs::new();
        args.insert("input", "hello");
        let out = (descriptor.invoke)(args).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_builder_requires_invoke() {
        let result = FunctionDescriptor::builder()
            .collection("test")
            .name("broken")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(echo_descriptor().qualified_name(), "test.echo");
    }

    #[test]
    fn test_require_missing_argument() {
        let args = SkillArgs::new();
        assert!(args.require("absent").is_err());
    }
}
