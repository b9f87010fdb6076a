//! Step and recipe results.

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Final status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step ran and its output was stored.
    Completed,

    /// Backend reported an error; the run stopped here.
    Failed,

    /// Condition was false or could not be evaluated.
    Skipped,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Why a step was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    /// The condition evaluated falsy.
    ConditionFalse,

    /// The condition could not be evaluated.
    ConditionError(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ConditionFalse => write!(f, "condition false"),
            SkipReason::ConditionError(message) => write!(f, "condition error: {}", message),
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step_id: String,

    pub status: StepStatus,

    /// Raw text, decoded JSON, or `null` when the step produced nothing.
    pub output: Value,

    /// Failure description (failed steps only).
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,

    #[serde(skip)]
    pub duration: Duration,
}

impl StepResult {
    /// Create a completed result.
    pub fn completed(step_id: &str, output: Value, duration: Duration) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Completed,
            output,
            error: None,
            skip_reason: None,
            duration,
        }
    }

    /// Create a failed result.
    pub fn failed(step_id: &str, error: String, duration: Duration) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Failed,
            output: Value::Null,
            error: Some(error),
            skip_reason: None,
            duration,
        }
    }

    /// Create a skipped result.
    pub fn skipped(step_id: &str, reason: SkipReason) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Skipped,
            output: Value::Null,
            error: None,
            skip_reason: Some(reason),
            duration: Duration::ZERO,
        }
    }

    /// One-line summary suitable for terminal output.
    pub fn summary_line(&self) -> String {
        let marker = self.status.display_char();
        match self.status {
            StepStatus::Completed => {
                format!("{} {} ({})", marker, self.step_id, format_duration(self.duration))
            }
            StepStatus::Skipped => match &self.skip_reason {
                Some(reason) => format!("{} {} ({})", marker, self.step_id, reason),
                None => format!("{} {} (skipped)", marker, self.step_id),
            },
            StepStatus::Failed => {
                let error = self.error.as_deref().unwrap_or("unknown error");
                format!("{} {} - {}", marker, self.step_id, error)
            }
        }
    }
}

/// Outcome of a whole recipe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeResult {
    pub recipe_name: String,

    /// True when no step failed.
    pub success: bool,

    pub step_results: Vec<StepResult>,

    /// Context bindings at the end of the run.
    pub context: Map<String, Value>,

    #[serde(skip)]
    pub duration: Duration,
}

impl RecipeResult {
    /// The step that stopped the run, if any.
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.step_results
            .iter()
            .find(|r| r.status == StepStatus::Failed)
    }

    /// Result for a step id.
    pub fn step(&self, id: &str) -> Option<&StepResult> {
        self.step_results.iter().find(|r| r.step_id == id)
    }

    /// Count results with the given status.
    pub fn count(&self, status: StepStatus) -> usize {
        self.step_results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }
}

/// Human-readable duration.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
