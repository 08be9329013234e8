//! The step executor.

use std::sync::Arc;

use planwright_core::{
    Binding, ContextVariables, FunctionDescriptor, FunctionRegistry, Plan, PlanStep,
    PlanwrightError, Result, SkillArgs, INPUT_VARIABLE,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Executes a plan's steps sequentially against the context store.
///
/// Steps never run in parallel: later steps may depend on earlier
/// steps' outputs, and step order is part of the plan's correctness
/// contract. The executor performs no retry; a failing step aborts the
/// remainder and surfaces the step index to the caller.
pub struct PlanExecutor {
    registry: Arc<FunctionRegistry>,
}

impl PlanExecutor {
    /// Create an executor over a shared registry.
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }

    /// Run all steps of the plan in order, mutating the context.
    ///
    /// On success every step's output variable is present in the
    /// context and the default input slot holds the last step's
    /// result. On the first failing step the error identifies the
    /// 1-based step index and the underlying cause; outputs of the
    /// steps that already ran remain in the context.
    pub async fn execute(
        &self,
        plan: &Plan,
        context: &mut ContextVariables,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!(goal = %plan.goal, steps = plan.steps.len(), "executing plan");

        for (position, step) in plan.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanwrightError::Cancelled);
            }

            let descriptor = self
                .registry
                .resolve(&step.function.collection, &step.function.name)?;
            let args = resolve_args(descriptor, step, context)?;

            debug!(step = position + 1, function = %step.function, "invoking step");
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(PlanwrightError::Cancelled),
                invoked = (descriptor.invoke)(args) => invoked,
            };

            match result {
                Ok(value) => {
                    if let Some(output) = &step.output {
                        context.set(output.clone(), value.clone());
                    }
                    // Refresh the default input slot so the next step's
                    // unqualified input chains from this result.
                    context.update(value);
                }
                Err(PlanwrightError::Cancelled) => return Err(PlanwrightError::Cancelled),
                Err(err) => {
                    return Err(PlanwrightError::StepExecution {
                        index: position + 1,
                        function: step.function.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Resolve a step's arguments against the running context.
///
/// Bindings win; unbound declared parameters fall back to their default
/// or, for the conventional `input` parameter, to the default input
/// slot. A variable reference with no matching context entry and a
/// defaultless parameter with no binding both fail as unbound.
fn resolve_args(
    descriptor: &FunctionDescriptor,
    step: &PlanStep,
    context: &ContextVariables,
) -> Result<SkillArgs> {
    let mut args = SkillArgs::new();

    for (name, binding) in &step.inputs {
        let value = match binding {
            Binding::Literal(value) => value.clone(),
            Binding::Variable(variable) => context
                .get(variable)
                .ok_or_else(|| PlanwrightError::UnboundVariable {
                    name: variable.clone(),
                })?
                .to_string(),
        };
        args.insert(name.clone(), value);
    }

    for parameter in &descriptor.parameters {
        if args.get(&parameter.name).is_some() {
            continue;
        }
        if let Some(default) = &parameter.default {
            args.insert(parameter.name.clone(), default.clone());
        } else if parameter.name == INPUT_VARIABLE {
            args.insert(INPUT_VARIABLE, context.input());
        } else {
            return Err(PlanwrightError::UnboundVariable {
                name: parameter.name.clone(),
            });
        }
    }

    Ok(args)
}
