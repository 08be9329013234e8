//! Multi-step planner: one completion call, full ordered step list.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use planwright_core::{
    Binding, FunctionRef, FunctionRegistry, Plan, PlanStep, PlanwrightError, Result,
    INPUT_VARIABLE,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::prompt::{extract_json, render_catalog};
use crate::provider::{CompletionOptions, CompletionProvider};
use crate::{complete_or_cancel, validate_goal, Planner};

/// Configuration for the sequential planner.
#[derive(Debug, Clone)]
pub struct SequentialPlannerConfig {
    /// Token budget for the single completion call.
    pub max_tokens: u32,
}

impl Default for SequentialPlannerConfig {
    fn default() -> Self {
        Self { max_tokens: 2000 }
    }
}

/// Requests a complete ordered step list with inter-step variable
/// bindings in one completion call.
#[derive(Debug, Default)]
pub struct SequentialPlanner {
    config: SequentialPlannerConfig,
}

#[derive(Debug, Deserialize)]
struct SequentialCompletion {
    #[serde(default)]
    steps: Vec<StepCompletion>,
}

#[derive(Debug, Deserialize)]
struct StepCompletion {
    function: String,

    /// Parameter name → `$variable` reference or literal.
    #[serde(default)]
    inputs: BTreeMap<String, String>,

    /// Variable the step result is stored under.
    #[serde(default)]
    output: Option<String>,
}

impl SequentialPlanner {
    /// Create a sequential planner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequential planner with custom configuration.
    pub fn with_config(config: SequentialPlannerConfig) -> Self {
        Self { config }
    }

    fn build_prompt(&self, goal: &str, registry: &FunctionRegistry) -> String {
        let catalog = render_catalog(registry);
        format!(
            "Create a step-by-step plan that satisfies the goal using only the \
             functions listed below.\n\n\
             [AVAILABLE FUNCTIONS]\n{catalog}\n\
             [GOAL]\n{goal}\n\n\
             Respond with exactly one JSON object:\n\
             {{\"steps\": [{{\"function\": \"collection.name\", \
             \"inputs\": {{\"param\": \"literal or $VARIABLE\"}}, \
             \"output\": \"VARIABLE\"}}]}}\n\
             Reference an earlier step's output as $VARIABLE. The initial \
             request value is available as $input. Give each output a unique \
             name. If the goal cannot be satisfied, respond with \
             {{\"steps\": []}}.\n\
             Return JSON only."
        )
    }

    /// Check functions, forward references, and output uniqueness.
    fn validate_steps(
        &self,
        steps: &[StepCompletion],
        registry: &FunctionRegistry,
    ) -> Result<()> {
        let mut available: HashSet<&str> = HashSet::from([INPUT_VARIABLE]);
        let mut outputs: HashSet<&str> = HashSet::new();

        for step in steps {
            let function = FunctionRef::parse(&step.function)?;
            if !registry.contains(&function.collection, &function.name) {
                return Err(PlanwrightError::malformed(format!(
                    "plan references unregistered function {function}"
                )));
            }

            let descriptor = registry.resolve(&function.collection, &function.name)?;
            for (name, raw) in &step.inputs {
                if descriptor.parameter(name).is_none() {
                    warn!(function = %function, parameter = %name, "binding for undeclared parameter");
                }
                if let Binding::Variable(var) = Binding::parse(raw) {
                    if !available.contains(var.as_str()) {
                        return Err(PlanwrightError::malformed(format!(
                            "step binds ${var} before any step produces it"
                        )));
                    }
                }
            }

            if let Some(output) = &step.output {
                if !outputs.insert(output.as_str()) {
                    return Err(PlanwrightError::malformed(format!(
                        "plan writes output variable {output} more than once"
                    )));
                }
                available.insert(output.as_str());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Planner for SequentialPlanner {
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
        let parsed: SequentialCompletion = serde_json::from_str(json)
            .map_err(|e| PlanwrightError::malformed(format!("invalid plan JSON: {e}")))?;

        self.validate_steps(&parsed.steps, registry)?;

        let mut plan = Plan::new(goal);
        for step in parsed.steps {
            let function = FunctionRef::parse(&step.function)?;
            let mut plan_step = PlanStep::new(function);
            for (name, raw) in step.inputs {
                plan_step = plan_step.with_input(name, Binding::parse(&raw));
            }
            if let Some(output) = step.output {
                plan_step = plan_step.with_output(output);
            }
            plan.push_step(plan_step);
        }

        debug!(goal, steps = plan.steps.len(), "sequential plan created");
        Ok(plan)
    }
}
