//! Application state.

use std::sync::Arc;

use planwright_core::FunctionRegistry;
use planwright_planner::CompletionProvider;

use crate::config::PlannerConfig;

/// Shared application state.
///
/// The registry is frozen at startup; handlers only read it, so a bare
/// `Arc` suffices.
#[derive(Clone)]
pub struct AppState {
    /// The function registry, built from the configured skills.
    pub registry: Arc<FunctionRegistry>,

    /// The completion provider behind every planning strategy.
    pub provider: Arc<dyn CompletionProvider>,

    /// Planner budgets from configuration.
    pub planner: PlannerConfig,
}

impl AppState {
    /// Create application state over a frozen registry and provider.
    pub fn new(
        registry: Arc<FunctionRegistry>,
        provider: Arc<dyn CompletionProvider>,
        planner: PlannerConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            planner,
        }
    }
}
