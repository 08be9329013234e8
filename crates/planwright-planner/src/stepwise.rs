//! Iterative, ReAct-style planner.
//!
//! Unlike the other strategies this planner does not produce the whole
//! plan up front: each iteration asks the provider for the next
//! Thought/Action pair, executes the chosen action immediately, and
//! feeds the observation back into the next prompt. The returned plan
//! is a faithful post-hoc record of what actually ran, with the final
//! answer in the plan state's input slot.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use planwright_core::{
    Binding, FunctionDescriptor, FunctionRef, FunctionRegistry, Plan, PlanStep, PlanwrightError,
    Result, SkillArgs, INPUT_VARIABLE,
};
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::prompt::{extract_json, render_catalog};
use crate::provider::{CompletionOptions, CompletionProvider};
use crate::{complete_or_cancel, validate_goal, Planner};

/// Output recorded when the loop exhausts its iteration budget without
/// a final answer.
pub const NO_FINAL_ANSWER: &str = "No final answer was reached within the iteration budget.";

/// Configuration for the stepwise planner.
#[derive(Debug, Clone)]
pub struct StepwisePlannerConfig {
    /// Hard cap on Thought/Action/Observation iterations.
    pub max_iterations: usize,

    /// Minimum wall-clock spacing between consecutive completion
    /// requests, to respect provider rate limits.
    pub min_iteration_time_ms: u64,

    /// Token budget per completion call.
    pub max_tokens: u32,
}

impl Default for StepwisePlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            min_iteration_time_ms: 1500,
            max_tokens: 1024,
        }
    }
}

/// The loop's explicit execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Waiting on the provider for the next thought/action.
    Thinking,
    /// Invoking the chosen function.
    Acting,
    /// Recording the invocation result into the transcript.
    Observing,
    /// A final answer was produced.
    Done,
    /// The cancellation token fired.
    Cancelled,
    /// The completion could not be parsed or the action was invalid.
    Failed,
}

/// One completed Thought/Action/Observation triple.
#[derive(Debug, Clone)]
struct TranscriptEntry {
    thought: String,
    action: String,
    observation: String,
}

/// What the provider must produce each iteration.
#[derive(Debug, Deserialize)]
struct StepwiseCompletion {
    #[serde(default)]
    thought: String,

    /// Qualified function reference for the next action.
    #[serde(default)]
    action: Option<String>,

    /// Literal argument values for the action.
    #[serde(default)]
    action_input: BTreeMap<String, String>,

    /// Set instead of `action` when the goal is satisfied.
    #[serde(default)]
    final_answer: Option<String>,
}

/// Iterative planner that interleaves planning and execution.
#[derive(Debug, Default)]
pub struct StepwisePlanner {
    config: StepwisePlannerConfig,
}

impl StepwisePlanner {
    /// Create a stepwise planner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stepwise planner with custom configuration.
    pub fn with_config(config: StepwisePlannerConfig) -> Self {
        Self { config }
    }

    fn build_prompt(
        &self,
        goal: &str,
        registry: &FunctionRegistry,
        transcript: &[TranscriptEntry],
    ) -> String {
        let catalog = render_catalog(registry);
        let mut prompt = format!(
            "Work toward the goal one action at a time using only the functions \
             listed below.\n\n\
             [AVAILABLE FUNCTIONS]\n{catalog}\n\
             [GOAL]\n{goal}\n"
        );

        if !transcript.is_empty() {
            prompt.push_str("\n[PREVIOUS STEPS]\n");
            for entry in transcript {
                let _ = writeln!(prompt, "Thought: {}", entry.thought);
                let _ = writeln!(prompt, "Action: {}", entry.action);
                let _ = writeln!(prompt, "Observation: {}", entry.observation);
            }
        }

        prompt.push_str(
            "\nRespond with exactly one JSON object. To take an action:\n\
             {\"thought\": \"...\", \"action\": \"collection.name\", \
             \"action_input\": {\"param\": \"value\"}}\n\
             When the goal is satisfied:\n\
             {\"thought\": \"...\", \"final_answer\": \"...\"}\n\
             Return JSON only.",
        );
        prompt
    }

    /// Resolve an action's arguments: literal inputs first, declared
    /// defaults next, and the running input value for an unbound
    /// `input` parameter.
    fn resolve_args(
        descriptor: &FunctionDescriptor,
        action_input: &BTreeMap<String, String>,
        current_input: &str,
    ) -> SkillArgs {
        let mut args = SkillArgs::new();
        for (name, value) in action_input {
            args.insert(name, value);
        }
        for parameter in &descriptor.parameters {
            if args.get(&parameter.name).is_some() {
                continue;
            }
            if let Some(default) = &parameter.default {
                args.insert(&parameter.name, default);
            } else if parameter.name == INPUT_VARIABLE {
                args.insert(INPUT_VARIABLE, current_input);
            }
        }
        args
    }
}

#[async_trait]
impl Planner for StepwisePlanner {
    async fn create_plan(
        &self,
        goal: &str,
        registry: &FunctionRegistry,
        provider: &dyn CompletionProvider,
        cancel: &CancellationToken,
    ) -> Result<Plan> {
        validate_goal(goal)?;

        let floor = Duration::from_millis(self.config.min_iteration_time_ms);
        let options = CompletionOptions::default().with_max_tokens(self.config.max_tokens);

        let mut plan = Plan::new(goal);
        let mut transcript: Vec<TranscriptEntry> = Vec::new();
        let mut phase;
        let mut last_request: Option<Instant> = None;

        for iteration in 0..self.config.max_iterations {
            if cancel.is_cancelled() {
                phase = LoopPhase::Cancelled;
                debug!(iteration, ?phase, "stepwise loop cancelled");
                return Err(PlanwrightError::Cancelled);
            }

            // Respect the per-iteration floor before issuing the next
            // completion request.
            if let Some(previous) = last_request {
                let elapsed = previous.elapsed();
                if elapsed < floor {
                    tokio::time::sleep(floor - elapsed).await;
                }
            }
            last_request = Some(Instant::now());

            phase = LoopPhase::Thinking;
            debug!(iteration, ?phase, "requesting next thought");
            let prompt = self.build_prompt(goal, registry, &transcript);
            let completion = complete_or_cancel(provider, &prompt, &options, cancel).await?;

            let parsed: StepwiseCompletion = match extract_json(&completion)
                .ok_or_else(|| {
                    PlanwrightError::malformed("completion did not contain a JSON object")
                })
                .and_then(|json| {
                    serde_json::from_str(json).map_err(|e| {
                        PlanwrightError::malformed(format!("invalid stepwise JSON: {e}"))
                    })
                }) {
                Ok(parsed) => parsed,
                Err(err) => {
                    phase = LoopPhase::Failed;
                    debug!(iteration, ?phase, "stepwise completion unparseable");
                    return Err(err);
                }
            };

            if let Some(answer) = parsed.final_answer {
                phase = LoopPhase::Done;
                debug!(iteration, ?phase, steps = plan.steps.len(), "goal satisfied");
                plan.state.update(answer);
                return Ok(plan);
            }

            let Some(action) = parsed.action else {
                phase = LoopPhase::Failed;
                debug!(iteration, ?phase, "completion had neither action nor final answer");
                return Err(PlanwrightError::malformed(
                    "completion contained neither an action nor a final answer",
                ));
            };

            phase = LoopPhase::Acting;
            debug!(iteration, ?phase, action, "resolving chosen action");
            let function = match FunctionRef::parse(&action) {
                Ok(function) => function,
                Err(err) => {
                    phase = LoopPhase::Failed;
                    debug!(iteration, ?phase, action, "unparseable action reference");
                    return Err(err);
                }
            };
            let descriptor = match registry.resolve(&function.collection, &function.name) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    phase = LoopPhase::Failed;
                    debug!(iteration, ?phase, %function, "action not in registry");
                    return Err(err);
                }
            };

            let args = Self::resolve_args(descriptor, &parsed.action_input, plan.state.input());
            let observation = tokio::select! {
                _ = cancel.cancelled() => {
                    phase = LoopPhase::Cancelled;
                    debug!(iteration, ?phase, "cancelled during action");
                    return Err(PlanwrightError::Cancelled);
                }
                result = (descriptor.invoke)(args) => match result {
                    Ok(value) => value,
                    // A failed invocation becomes an observation so the
                    // provider can route around it on the next iteration.
                    Err(err) => {
                        warn!(%function, error = %err, "action failed; recording observation");
                        format!("error: {err}")
                    }
                },
            };

            phase = LoopPhase::Observing;
            debug!(iteration, ?phase, %function, "observation recorded");

            let mut step = PlanStep::new(function);
            for (name, value) in &parsed.action_input {
                step = step.with_input(name.clone(), Binding::literal(value.clone()));
            }
            plan.push_step(step);
            plan.state.update(observation.clone());

            transcript.push(TranscriptEntry {
                thought: parsed.thought,
                action,
                observation,
            });
        }

        debug!(
            iterations = self.config.max_iterations,
            steps = plan.steps.len(),
            "iteration budget exhausted without a final answer"
        );
        plan.state.update(NO_FINAL_ANSWER);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ScriptedProvider;
    use planwright_core::ParameterSpec;

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

    fn fast_config() -> StepwisePlannerConfig {
        StepwisePlannerConfig {
            max_iterations: 5,
            min_iteration_time_ms: 0,
            max_tokens: 512,
        }
    }

    fn action_response(input: &str) -> String {
        format!(
            r#"{{"thought": "convert it", "action": "text.uppercase", "action_input": {{"input": "{input}"}}}}"#
        )
    }

    #[tokio::test]
    async fn test_final_answer_ends_loop() {
        let provider = ScriptedProvider::new([
            action_response("hello"),
            r#"{"thought": "done", "final_answer": "HELLO"}"#.to_string(),
        ]);
        let plan = StepwisePlanner::with_config(fast_config())
            .create_plan("shout hello", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.state.input(), "HELLO");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_loop_bounded_by_max_iterations() {
        // The provider keeps emitting actions and never a final answer.
        let responses: Vec<String> = (0..10).map(|_| action_response("x")).collect();
        let provider = ScriptedProvider::new(responses);
        let plan = StepwisePlanner::with_config(fast_config())
            .create_plan("never finish", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 5);
        assert!(plan.steps.len() <= 5);
        assert_eq!(plan.state.input(), NO_FINAL_ANSWER);
    }

    #[tokio::test]
    async fn test_min_iteration_floor_spaces_requests() {
        let provider = ScriptedProvider::new([
            action_response("a"),
            action_response("b"),
            r#"{"thought": "done", "final_answer": "ok"}"#.to_string(),
        ]);
        let config = StepwisePlannerConfig {
            max_iterations: 5,
            min_iteration_time_ms: 50,
            max_tokens: 512,
        };

        let started = Instant::now();
        StepwisePlanner::with_config(config)
            .create_plan("spaced", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        // Three requests means two enforced gaps of at least 50ms each.
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_cancellation_stops_next_iteration() {
        let provider = ScriptedProvider::new([action_response("x")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = StepwisePlanner::with_config(fast_config())
            .create_plan("cancelled", &registry(), &provider, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PlanwrightError::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_observation_chains_into_next_input() {
        // Second action omits an explicit input; the loop feeds it the
        // previous observation through the default-input slot.
        let provider = ScriptedProvider::new([
            action_response("hello"),
            r#"{"thought": "again", "action": "text.uppercase", "action_input": {}}"#.to_string(),
            r#"{"thought": "done", "final_answer": "ok"}"#.to_string(),
        ]);
        let plan = StepwisePlanner::with_config(fast_config())
            .create_plan("chain", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.steps.len(), 2);
        // The transcript carried HELLO forward into the second prompt.
        let prompts = provider.prompts();
        assert!(prompts[1].contains("Observation: HELLO"));
        assert!(prompts[2].contains("Observation: HELLO"));
    }

    #[tokio::test]
    async fn test_unknown_action_fails_planning() {
        let provider = ScriptedProvider::new(
            [r#"{"thought": "hm", "action": "rocket.launch", "action_input": {}}"#],
        );
        let err = StepwisePlanner::with_config(fast_config())
            .create_plan("fly", &registry(), &provider, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanwrightError::UnknownFunction { .. }));
    }
}
