//! Per-run variable store, templating, and condition evaluation.
//!
//! A [`RecipeContext`] is created for each recipe run, seeded from the
//! recipe's `context:` block plus caller overrides, and updated as steps
//! store their outputs.
//!
//! - Dot-path lookup: [`RecipeContext::get`]
//! - Plain templates (agent prompts): [`RecipeContext::render`]
//! - Shell-escaped templates (bash commands): [`RecipeContext::render_shell`]
//! - Safe conditions: [`RecipeContext::evaluate`]
//!
//! # Example
//!
//! ```
//! use recipe_runner::context::RecipeContext;
//! use serde_json::json;
//!
//! let mut ctx = RecipeContext::new();
//! ctx.set("repo", json!({"owner": "acme"}));
//! assert_eq!(ctx.get("repo.owner"), Some(&json!("acme")));
//! assert_eq!(ctx.render("Owner: {{repo.owner}}"), "Owner: acme");
//! assert!(ctx.evaluate("repo.owner == 'acme'").unwrap());
//! ```

pub mod expression;
pub mod template;

pub use expression::{evaluate_condition, is_truthy, Expression};
pub use template::{
    extract_variables, has_placeholders, parse_template, render_template, value_to_text,
    RenderMode, Segment,
};

use crate::error::ConditionError;
use serde_json::{Map, Value};

/// Mutable variable store for a single recipe run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeContext {
    vars: Map<String, Value>,
}

impl RecipeContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from initial bindings.
    pub fn from_map(vars: Map<String, Value>) -> Self {
        Self { vars }
    }

    /// Seed from recipe defaults, letting caller overrides win key by key.
    pub fn seeded(defaults: &Map<String, Value>, overrides: Option<&Map<String, Value>>) -> Self {
        let mut vars = defaults.clone();
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                vars.insert(key.clone(), value.clone());
            }
        }
        Self { vars }
    }

    /// Look up a dotted path such as `a.b.c`.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is
    /// not a mapping.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.vars.get(first)?, |current, key| {
            current.as_object()?.get(key)
        })
    }

    /// Bind a top-level variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Whether a top-level variable is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// All top-level bindings.
    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    /// Copy of the current bindings.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.vars.clone()
    }

    /// Consume the context, returning its bindings.
    pub fn into_map(self) -> Map<String, Value> {
        self.vars
    }

    /// Render a template with values inserted verbatim.
    pub fn render(&self, template: &str) -> String {
        render_template(template, |name| self.get(name).cloned(), RenderMode::Plain)
    }

    /// Render a template with every value quoted as a single shell word.
    pub fn render_shell(&self, template: &str) -> String {
        render_template(template, |name| self.get(name).cloned(), RenderMode::Shell)
    }

    /// Evaluate a condition against the current bindings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConditionError`] for unsafe or malformed expressions and
    /// for evaluation failures such as undefined variables.
    pub fn evaluate(&self, condition: &str) -> Result<bool, ConditionError> {
        evaluate_condition(condition, &self.vars)
    }
}
