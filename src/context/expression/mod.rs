//! Safe boolean expressions for step conditions.
//!
//! Conditions are parsed into a small syntax tree, every node is checked
//! against a fixed whitelist, and only then is the tree evaluated against the
//! context variables. Nothing in this module can call a function, import a
//! module, or reach outside the variables it is handed.
//!
//! # Supported syntax
//!
//! - Comparisons: `==`, `!=`, `<`, `<=`, `>`, `>=`, chained (`1 < x < 5`)
//! - Membership and identity: `in`, `not in`, `is`, `is not`
//! - Boolean logic: `and`, `or`, `not`, parentheses
//! - Dotted access into mappings: `result.status.code`
//! - Literals: strings, integers, floats, `True`/`False`/`None`
//!   (or `true`/`false`/`null`), lists `[a, b]` and tuples `(a, b)`
//!
//! # Example
//!
//! ```
//! use recipe_runner::context::Expression;
//! use serde_json::json;
//!
//! let vars = json!({"build": {"status": "ok"}});
//! let expr = Expression::parse("build.status == 'ok'").unwrap();
//! assert!(expr.is_true(vars.as_object().unwrap()).unwrap());
//!
//! assert!(Expression::parse("__import__('os').system('x')").is_err());
//! ```

mod eval;
mod lexer;
mod parser;

pub use eval::is_truthy;
pub use parser::{BoolOp, CmpOp, Expr};

use crate::error::ConditionError;
use serde_json::{Map, Value};

/// A parsed, whitelist-checked condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tree: Expr,
}

impl Expression {
    /// Parse and validate an expression.
    ///
    /// # Errors
    ///
    /// - `InvalidSyntax` if the text is not a well-formed expression
    /// - `UnsafeExpression` if it contains any construct outside the whitelist
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let tokens = lexer::tokenize(source)?;
        let tree = parser::parse(source, tokens)?;
        parser::check_allowed(source, &tree)?;
        Ok(Self {
            source: source.to_string(),
            tree,
        })
    }

    /// Original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The validated syntax tree.
    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Evaluate to a value.
    pub fn evaluate(&self, vars: &Map<String, Value>) -> Result<Value, ConditionError> {
        eval::evaluate(&self.tree, vars)
    }

    /// Evaluate and apply truthiness.
    pub fn is_true(&self, vars: &Map<String, Value>) -> Result<bool, ConditionError> {
        self.evaluate(vars).map(|v| is_truthy(&v))
    }
}

/// Parse, validate, and evaluate a condition in one call.
pub fn evaluate_condition(source: &str, vars: &Map<String, Value>) -> Result<bool, ConditionError> {
    Expression::parse(source)?.is_true(vars)
}
