//! Recipe execution.
//!
//! [`RecipeRunner`] walks a recipe's steps in order: it evaluates each
//! step's condition, renders its body (shell-escaped for bash, plain for
//! agents), dispatches it to an [`ExecutionBackend`](crate::backend::ExecutionBackend),
//! and stores the output in the run's context.

mod executor;
mod json;
mod result;

pub use executor::{RecipeRunner, RunProgress, DRY_RUN_OUTPUT};
pub use json::decode_output;
pub use result::{format_duration, RecipeResult, SkipReason, StepResult, StepStatus};
