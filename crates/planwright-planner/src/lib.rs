//! # Planwright Planner
//!
//! Three strategies for turning a free-text goal into a [`Plan`]:
//! - [`ActionPlanner`] - classification-style, at most one step
//! - [`SequentialPlanner`] - one completion call, full ordered step list
//! - [`StepwisePlanner`] - iterative Thought/Action/Observation loop that
//!   executes each action as it is chosen
//!
//! All strategies consult the [`FunctionRegistry`] for the available
//! skills and an external [`CompletionProvider`] for plan text.

pub mod action;
pub mod prompt;
pub mod provider;
pub mod sequential;
pub mod stepwise;

use async_trait::async_trait;
use planwright_core::{FunctionRegistry, Plan, PlanwrightError, Result};
use tokio_util::sync::CancellationToken;

pub use action::{ActionPlanner, ActionPlannerConfig};
pub use provider::{
    CompletionOptions, CompletionProvider, OpenAiCompletionProvider, OpenAiConfig, ProviderError,
    ScriptedProvider,
};
pub use sequential::{SequentialPlanner, SequentialPlannerConfig};
pub use stepwise::{LoopPhase, StepwisePlanner, StepwisePlannerConfig};

/// A planning strategy.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce a plan for the goal, or fail with a planning error.
    ///
    /// A returned plan with zero steps means the provider deliberately
    /// found no viable plan; it is not an error.
    async fn create_plan(
        &self,
        goal: &str,
        registry: &FunctionRegistry,
        provider: &dyn CompletionProvider,
        cancel: &CancellationToken,
    ) -> Result<Plan>;
}

/// Reject empty goals before any provider round-trip.
pub(crate) fn validate_goal(goal: &str) -> Result<()> {
    if goal.trim().is_empty() {
        return Err(PlanwrightError::validation("goal must not be empty"));
    }
    Ok(())
}

/// Run a completion request, racing it against cancellation and
/// translating provider failures into planning errors.
pub(crate) async fn complete_or_cancel(
    provider: &dyn CompletionProvider,
    prompt: &str,
    options: &CompletionOptions,
    cancel: &CancellationToken,
) -> Result<String> {
    tokio::select! {
        _ = cancel.cancelled() => Err(PlanwrightError::Cancelled),
        completion = provider.complete(prompt, options) => {
            completion.map_err(|e| PlanwrightError::provider(e.to_string()))
        }
    }
}
