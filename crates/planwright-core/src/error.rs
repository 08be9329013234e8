//! Error types shared across the Planwright engine.

use thiserror::Error;

/// The reason a planning attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningFault {
    /// The completion provider itself failed (timeout, quota, transport).
    Provider,
    /// The provider responded, but the completion could not be parsed
    /// into valid plan steps.
    MalformedCompletion,
}

impl std::fmt::Display for PlanningFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningFault::Provider => write!(f, "provider"),
            PlanningFault::MalformedCompletion => write!(f, "malformed completion"),
        }
    }
}

/// Main error type for Planwright operations.
///
/// An empty plan is deliberately *not* represented here: a `Plan` with
/// zero steps is a valid value meaning "no viable plan found", and
/// callers distinguish it with [`crate::Plan::is_empty`].
#[derive(Error, Debug, Clone)]
pub enum PlanwrightError {
    /// The incoming request was invalid before any planner ran.
    #[error("invalid request: {message}")]
    Validation { message: String },

    /// A planner could not produce a plan.
    #[error("planning failed ({kind}): {message}")]
    Planning { kind: PlanningFault, message: String },

    /// A `(collection, name)` pair was registered twice.
    #[error("function {collection}.{name} is already registered")]
    DuplicateFunction { collection: String, name: String },

    /// No function is registered under `(collection, name)`.
    #[error("unknown function {collection}.{name}")]
    UnknownFunction { collection: String, name: String },

    /// A step binding referenced a variable that is not in the context.
    #[error("variable ${name} is not bound")]
    UnboundVariable { name: String },

    /// A skill invocation failed.
    #[error("skill error: {message}")]
    Skill { message: String },

    /// A step failed during plan execution; remaining steps were skipped.
    #[error("step {index} ({function}) failed: {message}")]
    StepExecution {
        index: usize,
        function: String,
        message: String,
    },

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

impl PlanwrightError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        PlanwrightError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a provider-side planning failure.
    pub fn provider(message: impl Into<String>) -> Self {
        PlanwrightError::Planning {
            kind: PlanningFault::Provider,
            message: message.into(),
        }
    }

    /// Shorthand for an unparseable completion.
    pub fn malformed(message: impl Into<String>) -> Self {
        PlanwrightError::Planning {
            kind: PlanningFault::MalformedCompletion,
            message: message.into(),
        }
    }

    /// Shorthand for a failed skill invocation.
    pub fn skill(message: impl Into<String>) -> Self {
        PlanwrightError::Skill {
            message: message.into(),
        }
    }

    /// Returns true if this error came from the planning phase.
    pub fn is_planning(&self) -> bool {
        matches!(self, PlanwrightError::Planning { .. })
    }

    /// Returns true if this error came from executing a plan step.
    pub fn is_execution(&self) -> bool {
        matches!(self, PlanwrightError::StepExecution { .. })
    }
}

/// Convenience Result type for Planwright operations.
pub type Result<T> = std::result::Result<T, PlanwrightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_execution_message_carries_index() {
        let err = PlanwrightError::StepExecution {
            index: 2,
            function: "text.concat".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "step 2 (text.concat) failed: boom");
        assert!(err.is_execution());
    }

    #[test]
    fn test_planning_fault_display() {
        let err = PlanwrightError::malformed("no JSON found");
        assert!(err.to_string().contains("malformed completion"));
        assert!(err.is_planning());
    }
}
