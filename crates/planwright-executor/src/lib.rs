//! # Planwright Executor
//!
//! Runs a plan's steps strictly in order against the context store,
//! invoking registered functions and propagating outputs and failures.

pub mod executor;

pub use executor::PlanExecutor;
