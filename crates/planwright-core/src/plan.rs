//! Plan and plan-step data structures.
//!
//! A [`Plan`] is an ordered sequence of bound calls into the function
//! registry, produced by a planner to satisfy a goal. Step order is the
//! execution order. A plan with zero steps is a valid value meaning "no
//! viable plan found" and is distinguished with [`Plan::is_empty`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ContextVariables;
use crate::error::PlanwrightError;

/// A reference to a registered function as `collection.name`.
///
/// Serializes as the qualified string so plan traces stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionRef {
    pub collection: String,
    pub name: String,
}

impl FunctionRef {
    /// Create a reference from collection and name.
    pub fn new(collection: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            name: name.into(),
        }
    }

    /// Parse a `collection.name` string.
    pub fn parse(qualified: &str) -> Result<Self, PlanwrightError> {
        match qualified.split_once('.') {
            Some((collection, name)) if !collection.is_empty() && !name.is_empty() => {
                Ok(Self::new(collection, name))
            }
            _ => Err(PlanwrightError::malformed(format!(
                "'{qualified}' is not a collection.name function reference"
            ))),
        }
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.collection, self.name)
    }
}

impl TryFrom<String> for FunctionRef {
    type Error = PlanwrightError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FunctionRef::parse(&value)
    }
}

impl From<FunctionRef> for String {
    fn from(value: FunctionRef) -> Self {
        value.to_string()
    }
}

/// An input binding on a plan step: either a literal value or a
/// reference to a context variable.
///
/// Serializes as a plain string where a leading `$` marks a variable
/// reference, so `{"address": "$recipient", "input": "hello"}` binds one
/// variable and one literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Binding {
    /// A literal value passed through unchanged.
    Literal(String),
    /// A reference to a variable in the running context.
    Variable(String),
}

impl Binding {
    /// Parse the string form: `$name` is a variable, anything else a literal.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('$') {
            Some(name) if !name.is_empty() => Binding::Variable(name.to_string()),
            _ => Binding::Literal(raw.to_string()),
        }
    }

    /// Reference a variable by name.
    pub fn variable(name: impl Into<String>) -> Self {
        Binding::Variable(name.into())
    }

    /// A literal value.
    pub fn literal(value: impl Into<String>) -> Self {
        Binding::Literal(value.into())
    }

    /// The variable name, if this binding is a reference.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Binding::Variable(name) => Some(name),
            Binding::Literal(_) => None,
        }
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::parse(&value)
    }
}

impl From<Binding> for String {
    fn from(value: Binding) -> Self {
        match value {
            Binding::Literal(text) => text,
            Binding::Variable(name) => format!("${name}"),
        }
    }
}

/// One bound call into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// The target function.
    pub function: FunctionRef,

    /// Parameter name → binding.
    #[serde(default)]
    pub inputs: BTreeMap<String, Binding>,

    /// Variable the step's result is written to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl PlanStep {
    /// Create a step with no bindings.
    pub fn new(function: FunctionRef) -> Self {
        Self {
            function,
            inputs: BTreeMap::new(),
            output: None,
        }
    }

    /// Bind an input parameter.
    pub fn with_input(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.inputs.insert(name.into(), binding);
        self
    }

    /// Set the output variable.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// An ordered sequence of plan steps produced for a goal.
///
/// Created fresh per request by a planner, mutated only while running,
/// and discarded after the response is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: Uuid,

    /// The goal this plan was produced for.
    pub goal: String,

    /// Steps in execution order.
    pub steps: Vec<PlanStep>,

    /// Running state of the plan.
    #[serde(default)]
    pub state: ContextVariables,

    /// Timestamp when the plan was created.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create an empty plan for a goal.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal: goal.into(),
            steps: Vec::new(),
            state: ContextVariables::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a step.
    pub fn push_step(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Returns true if no steps were produced — the distinguished
    /// "no viable plan" value, not an error.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The set of output variable names written by the steps, in step order.
    pub fn output_variables(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| s.output.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        let mut plan = Plan::new("summarize and mail");
        plan.push_step(
            PlanStep::new(FunctionRef::new("text", "uppercase"))
                .with_input("input", Binding::literal("hello"))
                .with_output("SHOUTED"),
        );
        plan.push_step(
            PlanStep::new(FunctionRef::new("email", "send"))
                .with_input("input", Binding::variable("SHOUTED"))
                .with_input("address", Binding::literal("a@b.example")),
        );
        plan
    }

    #[test]
    fn test_binding_parse_round_trip() {
        assert_eq!(Binding::parse("$topic"), Binding::variable("topic"));
        assert_eq!(Binding::parse("plain"), Binding::literal("plain"));
        // A bare dollar sign is not a reference.
        assert_eq!(Binding::parse("$"), Binding::literal("$"));

        let back: String = Binding::variable("topic").into();
        assert_eq!(back, "$topic");
    }

    #[test]
    fn test_function_ref_parse() {
        let fref = FunctionRef::parse("text.concat").unwrap();
        assert_eq!(fref.collection, "text");
        assert_eq!(fref.name, "concat");
        assert!(FunctionRef::parse("noseparator").is_err());
        assert!(FunctionRef::parse(".name").is_err());
    }

    #[test]
    fn test_plan_serde_round_trip() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        let restored: Plan = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.goal, plan.goal);
        assert_eq!(restored.steps, plan.steps);
    }

    #[test]
    fn test_step_serializes_bindings_as_strings() {
        let plan = sample_plan();
        let json = serde_json::to_value(&plan).unwrap();
        let inputs = &json["steps"][1]["inputs"];
        assert_eq!(inputs["input"], "$SHOUTED");
        assert_eq!(inputs["address"], "a@b.example");
        assert_eq!(json["steps"][1]["function"], "email.send");
    }

    #[test]
    fn test_empty_plan_is_distinguished() {
        let plan = Plan::new("anything");
        assert!(plan.is_empty());
        assert!(plan.output_variables().is_empty());
    }

    #[test]
    fn test_output_variables_in_step_order() {
        let plan = sample_plan();
        assert_eq!(plan.output_variables(), vec!["SHOUTED"]);
    }
}
