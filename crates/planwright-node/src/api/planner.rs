//! Planning endpoints.
//!
//! One endpoint per strategy. Each request plans against the shared
//! registry with a fresh context and its own cancellation token, so a
//! dropped connection never leaks work into the next request.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use planwright_core::{ContextVariables, Plan, PlanwrightError};
use planwright_executor::PlanExecutor;
use planwright_planner::{
    ActionPlanner, Planner, SequentialPlanner, SequentialPlannerConfig, StepwisePlanner,
    StepwisePlannerConfig,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::AppState;

/// Guidance returned when no plan could be produced for the goal.
pub const NO_PLAN_MESSAGE: &str = "Could not create a plan for the given goal.";

/// Request to plan (and run) a goal.
#[derive(Debug, Deserialize)]
pub struct PlannerRequest {
    /// Free-text description of what to accomplish.
    pub goal: String,
}

/// Response with the executed plan and its result.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Result of the last step, or the guidance message.
    pub output: String,

    /// The plan that was produced.
    pub plan: Plan,
}

/// Response for plans that name intermediate outputs.
#[derive(Debug, Serialize)]
pub struct MultiPlanResponse {
    /// Result of the last step, or the guidance message.
    pub output: String,

    /// Variables written by the plan's steps.
    pub outputs: BTreeMap<String, String>,

    /// The plan that was produced.
    pub plan: Plan,
}

/// Plan a single action for the goal and run it.
pub async fn action_plan(
    State(state): State<AppState>,
    Json(req): Json<PlannerRequest>,
) -> Result<Json<PlanResponse>, (StatusCode, Json<serde_json::Value>)> {
    let cancel = CancellationToken::new();
    let planner = ActionPlanner::new();
    let plan = planner
        .create_plan(&req.goal, &state.registry, state.provider.as_ref(), &cancel)
        .await
        .map_err(error_response)?;

    if plan.is_empty() {
        return Err(no_plan_response(plan));
    }

    let output = run_plan(&state, &plan, &cancel).await?;
    Ok(Json(PlanResponse { output, plan }))
}

/// Plan an ordered step sequence for the goal and run it.
pub async fn sequential_plan(
    State(state): State<AppState>,
    Json(req): Json<PlannerRequest>,
) -> Result<Json<MultiPlanResponse>, (StatusCode, Json<serde_json::Value>)> {
    let cancel = CancellationToken::new();
    let planner = SequentialPlanner::with_config(SequentialPlannerConfig {
        max_tokens: state.planner.max_tokens,
    });
    let plan = planner
        .create_plan(&req.goal, &state.registry, state.provider.as_ref(), &cancel)
        .await
        .map_err(error_response)?;

    if plan.is_empty() {
        return Err(no_plan_response(plan));
    }

    let mut context = ContextVariables::new();
    let executor = PlanExecutor::new(state.registry.clone());
    executor
        .execute(&plan, &mut context, &cancel)
        .await
        .map_err(error_response)?;

    let outputs = plan
        .output_variables()
        .into_iter()
        .filter_map(|name| context.get(name).map(|value| (name.to_string(), value.to_string())))
        .collect();

    info!(goal = %req.goal, steps = plan.steps.len(), "sequential plan complete");
    Ok(Json(MultiPlanResponse {
        output: context.input().to_string(),
        outputs,
        plan,
    }))
}

/// Run the iterative planner; actions were already executed while the
/// plan was produced, so only the recorded result is surfaced.
pub async fn stepwise_plan(
    State(state): State<AppState>,
    Json(req): Json<PlannerRequest>,
) -> Result<Json<PlanResponse>, (StatusCode, Json<serde_json::Value>)> {
    let cancel = CancellationToken::new();
    let planner = StepwisePlanner::with_config(StepwisePlannerConfig {
        max_iterations: state.planner.max_iterations,
        min_iteration_time_ms: state.planner.min_iteration_time_ms,
        ..StepwisePlannerConfig::default()
    });
    let plan = planner
        .create_plan(&req.goal, &state.registry, state.provider.as_ref(), &cancel)
        .await
        .map_err(error_response)?;

    let output = plan.state.input().to_string();
    info!(goal = %req.goal, steps = plan.steps.len(), "stepwise plan complete");
    Ok(Json(PlanResponse { output, plan }))
}

/// Execute a freshly planned sequence with a clean context.
async fn run_plan(
    state: &AppState,
    plan: &Plan,
    cancel: &CancellationToken,
) -> Result<String, (StatusCode, Json<serde_json::Value>)> {
    let mut context = ContextVariables::new();
    let executor = PlanExecutor::new(state.registry.clone());
    executor
        .execute(plan, &mut context, cancel)
        .await
        .map_err(error_response)?;
    Ok(context.input().to_string())
}

fn no_plan_response(plan: Plan) -> (StatusCode, Json<serde_json::Value>) {
    warn!(goal = %plan.goal, "no viable plan for goal");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "output": NO_PLAN_MESSAGE,
            "plan": plan,
        })),
    )
}

fn error_response(err: PlanwrightError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        PlanwrightError::Validation { .. } => StatusCode::BAD_REQUEST,
        PlanwrightError::Planning { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%status, error = %err, "planner request failed");
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
