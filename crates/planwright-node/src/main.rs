//! # Planwright Node
//!
//! Binary hosting the planning API server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use planwright_core::FunctionRegistry;
use planwright_planner::{OpenAiCompletionProvider, OpenAiConfig};
use planwright_skills::{EmailSkill, SearchSkill, SkillProvider, TextSkill};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod api;
mod config;
mod state;

use config::NodeConfig;
use state::AppState;

/// Run the Planwright node server.
pub async fn run_server(addr: SocketAddr, config: NodeConfig) -> anyhow::Result<()> {
    let registry = Arc::new(build_registry(&config)?);
    info!(functions = registry.len(), "function registry built");

    let provider = Arc::new(OpenAiCompletionProvider::new(OpenAiConfig {
        endpoint: config.openai.endpoint.clone(),
        api_key: config.openai.key.clone(),
        model: config.openai.model.clone(),
        ..OpenAiConfig::default()
    })?);

    let state = AppState::new(registry, provider, config.planner.clone());
    let app = create_router(state);

    info!("🌐 Listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Register the configured skills into a fresh registry.
fn build_registry(config: &NodeConfig) -> anyhow::Result<FunctionRegistry> {
    let mut registry = FunctionRegistry::new();

    TextSkill::new().register_into(&mut registry)?;

    if let Some(smtp) = &config.smtp {
        EmailSkill::new(smtp.clone()).register_into(&mut registry)?;
    }
    if let Some(search) = &config.search {
        SearchSkill::new(search.clone()).register_into(&mut registry)?;
    }

    Ok(registry)
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Planner API
        .route("/api/v1/planner/action", post(api::planner::action_plan))
        .route(
            "/api/v1/planner/sequential",
            post(api::planner::sequential_plan),
        )
        .route(
            "/api/v1/planner/stepwise",
            post(api::planner::stepwise_plan),
        )
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Planwright Node starting...");

    let config = config::load_config()?;
    let addr: SocketAddr = config.server.bind.parse()?;
    run_server(addr, config).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use planwright_core::FunctionRegistry;
    use planwright_planner::ScriptedProvider;
    use planwright_skills::{SkillProvider, TextSkill};
    use serde_json::json;

    use crate::api::planner::NO_PLAN_MESSAGE;
    use crate::config::PlannerConfig;
    use crate::state::AppState;

    fn server_with(responses: Vec<&str>) -> TestServer {
        let mut registry = FunctionRegistry::new();
        TextSkill::new().register_into(&mut registry).unwrap();

        let state = AppState::new(
            Arc::new(registry),
            Arc::new(ScriptedProvider::new(responses)),
            PlannerConfig::default(),
        );
        TestServer::new(super::create_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = server_with(vec![]);
        let response = server.get("/health").await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_empty_goal_rejected() {
        let server = server_with(vec![]);
        let response = server
            .post("/api/v1/planner/action")
            .json(&json!({ "goal": "   " }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_unmatched_goal_returns_guidance_message() {
        let server = server_with(vec![r#"{"function": ""}"#]);
        let response = server
            .post("/api/v1/planner/action")
            .json(&json!({ "goal": "fly to the moon" }))
            .await;
        response.assert_status_bad_request();

        let body: serde_json::Value = response.json();
        assert_eq!(body["output"], NO_PLAN_MESSAGE);
        assert!(body["plan"]["steps"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_action_happy_path() {
        let completion = r#"{
            "function": "text.uppercase",
            "parameters": { "input": "netconf" }
        }"#;
        let server = server_with(vec![completion]);

        let response = server
            .post("/api/v1/planner/action")
            .json(&json!({ "goal": "shout the conference name" }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["output"], "NETCONF");
        assert_eq!(body["plan"]["steps"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sequential_reports_step_outputs() {
        let completion = r#"{
            "steps": [
                {
                    "function": "text.concat",
                    "inputs": { "first": "net", "second": "conf" },
                    "output": "JOINED"
                },
                {
                    "function": "text.uppercase",
                    "inputs": { "input": "$JOINED" },
                    "output": "SHOUTED"
                }
            ]
        }"#;
        let server = server_with(vec![completion]);

        let response = server
            .post("/api/v1/planner/sequential")
            .json(&json!({ "goal": "join then shout" }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["output"], "NETCONF");
        assert_eq!(body["outputs"]["JOINED"], "netconf");
        assert_eq!(body["outputs"]["SHOUTED"], "NETCONF");
    }

    #[tokio::test]
    async fn test_stepwise_returns_final_answer() {
        let completion = r#"{
            "thought": "The goal is already satisfied.",
            "final_answer": "netconf"
        }"#;
        let server = server_with(vec![completion]);

        let response = server
            .post("/api/v1/planner/stepwise")
            .json(&json!({ "goal": "say the conference name" }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["output"], "netconf");
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_bad_gateway() {
        // Script exhausted on the first call.
        let server = server_with(vec![]);
        let response = server
            .post("/api/v1/planner/sequential")
            .json(&json!({ "goal": "join then shout" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    }
}
