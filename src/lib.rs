//! recipe-runner - Declarative recipes of shell and agent steps.
//!
//! A recipe is a YAML document listing ordered steps. Each step is either a
//! shell command or an agent invocation; outputs accumulate in a shared
//! context, steps can be guarded by safe boolean conditions, and templates
//! substituted into shell commands are always quoted.
//!
//! # Modules
//!
//! - [`recipe`] - Recipe model, YAML parsing, and advisory validation
//! - [`context`] - Variable store, templating, and the condition evaluator
//! - [`runner`] - Sequential execution and results
//! - [`backend`] - Execution-backend trait and the process-spawning backend
//! - [`agents`] - Agent persona lookup
//! - [`shell`] - Process execution, quoting, and child environments
//! - [`cli`] - Command-line interface and argument parsing
//! - [`ui`] - Spinners and terminal output
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use recipe_runner::context::RecipeContext;
//! use serde_json::json;
//!
//! let mut ctx = RecipeContext::new();
//! ctx.set("branch", json!("feature; rm -rf ~"));
//! assert_eq!(ctx.render_shell("git checkout {{branch}}"), "git checkout 'feature; rm -rf ~'");
//! ```
//!
//! For end-to-end runs against a scripted backend, see the integration tests.

pub mod agents;
pub mod backend;
pub mod cli;
pub mod context;
pub mod error;
pub mod recipe;
pub mod runner;
pub mod shell;
pub mod ui;

pub use error::{BackendError, ConditionError, RecipeError, Result};
