//! Single-step, classification-style planner.

use std::collections::BTreeMap;

use async_trait::async_trait;
use planwright_core::{Binding, FunctionRegistry, Plan, PlanStep, PlanwrightError, Result};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::prompt::{extract_json, render_catalog};
use crate::provider::{CompletionOptions, CompletionProvider};
use crate::{complete_or_cancel, validate_goal, Planner};

/// Configuration for the action planner.
#[derive(Debug, Clone)]
pub struct ActionPlannerConfig {
    /// Token budget for the single completion call.
    pub max_tokens: u32,
}

impl Default for ActionPlannerConfig {
    fn default() -> Self {
        Self { max_tokens: 1024 }
    }
}

/// Picks at most one registered function that satisfies the goal.
///
/// A zero-step result signals "no matching function" and is not an
/// error; callers detect it with [`Plan::is_empty`].
#[derive(Debug, Default)]
pub struct ActionPlanner {
    config: ActionPlannerConfig,
}

/// Shape the completion must produce.
#[derive(Debug, Deserialize)]
struct ActionCompletion {
    /// Qualified function reference, or empty when nothing fits.
    #[serde(default)]
    function: String,

    /// Literal argument values chosen by the provider.
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

impl ActionPlanner {
    /// Create an action planner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an action planner with custom configuration.
    pub fn with_config(config: ActionPlannerConfig) -> Self {
        Self { config }
    }

    fn build_prompt(&self, goal: &str, registry: &FunctionRegistry) -> String {
        let catalog = render_catalog(registry);
        format!(
            "Choose the single function that best satisfies the goal.\n\n\
             [AVAILABLE FUNCTIONS]\n{catalog}\n\
             [GOAL]\n{goal}\n\n\
             Respond with exactly one JSON object:\n\
             {{\"function\": \"collection.name\", \"parameters\": {{\"name\": \"value\"}}}}\n\
             If no listed function satisfies the goal, respond with {{\"function\": \"\"}}.\n\
             Return JSON only."
        )
    }
}

#[async_trait]
impl Planner for ActionPlanner {
    async fn create_plan(
        &self,
        goal: &str,
        registry: &FunctionRegistry,
        provider: &dyn CompletionProvider,
        cancel: &CancellationToken,
    ) -> Result<Plan> {
        validate_goal(goal)?;

        let prompt = self.build_prompt(goal, registry);
        let options = CompletionOptions::default().with_max_tokens(self.config.max_tokens);
        let completion = complete_or_cancel(provider, &prompt, &options, cancel).await?;

        let json = extract_json(&completion).ok_or_else(|| {
            PlanwrightError::malformed("completion did not contain a JSON object")
        })?;
        let parsed: ActionCompletion = serde_json::from_str(json)
            .map_err(|e| PlanwrightError::malformed(format!("invalid action JSON: {e}")))?;

        let mut plan = Plan::new(goal);

        if parsed.function.is_empty() {
            debug!(goal, "provider found no matching function");
            return Ok(plan);
        }

        let function = planwright_core::FunctionRef::parse(&parsed.function)?;
        // An invented function name is a malformed completion, not an
        // empty plan.
        if !registry.contains(&function.collection, &function.name) {
            return Err(PlanwrightError::malformed(format!(
                "completion chose unregistered function {function}"
            )));
        }

        let mut step = PlanStep::new(function);
        for (name, value) in parsed.parameters {
            step = step.with_input(name, Binding::literal(value));
        }
        plan.push_step(step);

        debug!(goal, steps = plan.steps.len(), "action plan created");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;
    use planwright_core::{FunctionDescriptor, ParameterSpec};

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry
            .register(
                FunctionDescriptor::builder()
                    .collection("text")
                    .name("uppercase")
                    .description("Converts text to upper case.")
                    .parameter(ParameterSpec::new("input", "The text to convert."))
                    .invoke(|args| {
                        Box::pin(async move { Ok(args.require("input")?.to_uppercase()) })
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_single_step_plan() {
        let provider = ScriptedProvider::new([
            r#"{"function": "text.uppercase", "parameters": {"input": "hello"}}"#,
        ]);
        let plan = ActionPlanner::new()
            .create_plan("shout hello", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].function.to_string(), "text.uppercase");
        assert_eq!(
            plan.steps[0].inputs.get("input"),
            Some(&Binding::literal("hello"))
        );
    }

    #[tokio::test]
    async fn test_no_matching_function_yields_empty_plan() {
        let provider = ScriptedProvider::new([r#"{"function": ""}"#]);
        let plan = ActionPlanner::new()
            .create_plan("fly to the moon", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_function_is_malformed() {
        let provider = ScriptedProvider::new([r#"{"function": "rocket.launch"}"#]);
        let err = ActionPlanner::new()
            .create_plan("fly", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_planning());
    }

    #[tokio::test]
    async fn test_non_json_completion_is_malformed() {
        let provider = ScriptedProvider::new(["I would use text.uppercase for this."]);
        let err = ActionPlanner::new()
            .create_plan("shout", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_planning());
    }

    #[tokio::test]
    async fn test_empty_goal_rejected_before_provider_runs() {
        let provider = ScriptedProvider::new([r#"{"function": ""}"#]);
        let err = ActionPlanner::new()
            .create_plan("  ", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanwrightError::Validation { .. }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_planning_error() {
        // Empty script: the provider fails on the first call.
        let provider = ScriptedProvider::default();
        let err = ActionPlanner::new()
            .create_plan("shout", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_planning());
    }
}
