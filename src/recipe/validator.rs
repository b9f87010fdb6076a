//! Advisory recipe validation.
//!
//! This pass never fails a recipe. It collects warnings that usually point
//! at authoring mistakes:
//! - Agent steps without a `prompt`
//! - Bash steps without a `command`
//! - Unrecognized keys at the top level or on a step (typos)
//!
//! It reads the raw document so that keys the parser ignores are still seen.

use crate::error::{RecipeError, Result};
use crate::recipe::model::StepType;
use crate::recipe::parser::{infer_step_type, RECIPE_FIELDS, STEP_FIELDS};
use serde_yaml::{Mapping, Value};

/// Advisory finding with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Rule identifier
    pub rule: String,
    /// Human-readable message
    pub message: String,
    /// Step id if the warning is step-specific
    pub step: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Validate recipe YAML text.
///
/// # Errors
///
/// Returns `MalformedDocument` only when the text is not valid YAML.
/// Structural problems the parser would reject are not reported here.
pub fn validate_yaml(yaml: &str) -> Result<Vec<ValidationWarning>> {
    let document: Value =
        serde_yaml::from_str(yaml).map_err(|e| RecipeError::MalformedDocument {
            message: e.to_string(),
        })?;
    Ok(validate_document(&document))
}

/// Collect advisory warnings for a parsed YAML document.
pub fn validate_document(document: &Value) -> Vec<ValidationWarning> {
    let Some(root) = document.as_mapping() else {
        return Vec::new();
    };

    let mut warnings = unknown_keys(root, RECIPE_FIELDS, None);

    if let Some(Value::Sequence(steps)) = root.get("steps") {
        for (index, raw) in steps.iter().enumerate() {
            if let Some(step) = raw.as_mapping() {
                warnings.extend(validate_step(step, index));
            }
        }
    }

    warnings
}

fn validate_step(step: &Mapping, index: usize) -> Vec<ValidationWarning> {
    let label = step
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index + 1));

    let mut warnings = Vec::new();

    match infer_step_type(step) {
        Ok(StepType::Agent) if !has_text(step, "prompt") => warnings.push(ValidationWarning {
            rule: "agent-missing-prompt".to_string(),
            message: format!("Agent step '{}' has no 'prompt'", label),
            step: Some(label.clone()),
        }),
        Ok(StepType::Bash) if !has_text(step, "command") => warnings.push(ValidationWarning {
            rule: "bash-missing-command".to_string(),
            message: format!("Bash step '{}' has no 'command'", label),
            step: Some(label.clone()),
        }),
        _ => {}
    }

    warnings.extend(unknown_keys(step, STEP_FIELDS, Some(&label)));
    warnings
}

fn unknown_keys(map: &Mapping, known: &[&str], step: Option<&str>) -> Vec<ValidationWarning> {
    map.keys()
        .filter_map(|key| {
            let name = match key {
                Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default(),
            };
            if known.contains(&name.as_str()) {
                return None;
            }

            let place = match step {
                Some(id) => format!("step '{}'", id),
                None => "recipe".to_string(),
            };
            let mut message = format!("Unknown key '{}' in {}", name, place);
            if let Some(suggestion) = closest_field(&name, known) {
                message.push_str(&format!(" (did you mean '{}'?)", suggestion));
            }

            Some(ValidationWarning {
                rule: "unknown-key".to_string(),
                message,
                step: step.map(str::to_string),
            })
        })
        .collect()
}

fn has_text(map: &Mapping, key: &str) -> bool {
    match map.get(key) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Known field closest to `name`, if within two edits.
fn closest_field<'a>(name: &str, known: &[&'a str]) -> Option<&'a str> {
    known
        .iter()
        .map(|candidate| (edit_distance(name, candidate), *candidate))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Levenshtein distance, case-insensitive.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}
