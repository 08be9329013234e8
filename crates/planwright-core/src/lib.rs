//! # Planwright Core
//!
//! Core primitives for the Planwright engine:
//! - [`FunctionRegistry`] - typed, invocable skills keyed by collection and name
//! - [`ContextVariables`] - the named value store threading data between steps
//! - [`Plan`] / [`PlanStep`] - the plan data model and its serialization contract
//! - [`PlanwrightError`] - the engine error taxonomy

pub mod context;
pub mod error;
pub mod function;
pub mod plan;
pub mod registry;

// Re-exports for convenience
pub use context::{ContextVariables, INPUT_VARIABLE};
pub use error::{PlanningFault, PlanwrightError, Result};
pub use function::{
    FunctionDescriptor, FunctionDescriptorBuilder, ParameterKind, ParameterSpec, SkillArgs,
    SkillFn,
};
pub use plan::{Binding, FunctionRef, Plan, PlanStep};
pub use registry::FunctionRegistry;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::context::{ContextVariables, INPUT_VARIABLE};
    pub use crate::error::{PlanningFault, PlanwrightError, Result};
    pub use crate::function::{FunctionDescriptor, ParameterSpec, SkillArgs};
    pub use crate::plan::{Binding, FunctionRef, Plan, PlanStep};
    pub use crate::registry::FunctionRegistry;
}
