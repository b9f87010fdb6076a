//! Recipe data structures.
//!
//! These types carry no behavior beyond small accessors. They are built once
//! by the [parser](super::parser) and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Default step timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default recipe version when the document omits one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// A named, ordered workflow of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Recipe version.
    pub version: String,

    /// Recipe author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Free-form labels.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Initial variable bindings.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,

    /// Steps in declaration order.
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Step ids in declaration order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Shell command.
    Bash,
    /// Delegated agent prompt.
    Agent,
}

impl StepType {
    /// Parse a `type:` value, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bash" => Some(StepType::Bash),
            "agent" => Some(StepType::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepType::Bash => "bash",
            StepType::Agent => "agent",
        };
        write!(f, "{}", s)
    }
}

/// One unit of work within a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique id within the recipe.
    pub id: String,

    /// Bash or agent, decided at parse time.
    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Shell command (bash steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Agent name (agent steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Prompt text (agent steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Context variable that receives the step output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Guard expression; the step is skipped unless it evaluates truthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Decode the output as JSON before storing it.
    #[serde(default)]
    pub parse_json: bool,

    /// Backend-specific execution hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Directory the step runs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Timeout in seconds (bash steps).
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Step {
    /// The text the runner renders and dispatches for this step.
    ///
    /// Bash steps use `command`, agent steps use `prompt`. Missing text
    /// renders as an empty string.
    pub fn body(&self) -> &str {
        match self.step_type {
            StepType::Bash => self.command.as_deref().unwrap_or(""),
            StepType::Agent => self.prompt.as_deref().unwrap_or(""),
        }
    }

    /// Timeout as a duration.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout)
    }
}
