//! Recipe document parsing.
//!
//! Turns YAML text into a validated [`Recipe`]. Structural problems are
//! fatal and reported as [`RecipeError`]; advisory checks live in the
//! [validator](super::validator).
//!
//! # Step type inference
//!
//! When a step omits `type`, its type is decided from the keys it carries,
//! in this order:
//!
//! 1. explicit `type`
//! 2. an `agent` key means agent
//! 3. a `prompt` key without a `command` key means agent
//! 4. a `command` key means bash
//! 5. otherwise bash
//!
//! ```
//! use recipe_runner::recipe::{parse_recipe, StepType};
//!
//! let recipe = parse_recipe(r#"
//! name: demo
//! steps:
//!   - id: review
//!     agent: reviewer
//!     command: cargo test
//! "#).unwrap();
//! assert_eq!(recipe.steps[0].step_type, StepType::Agent);
//! ```

use crate::error::{RecipeError, Result};
use crate::recipe::model::{Recipe, Step, StepType, DEFAULT_TIMEOUT_SECS, DEFAULT_VERSION};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

/// Keys recognized at the top level of a recipe.
pub const RECIPE_FIELDS: &[&str] = &[
    "name",
    "description",
    "version",
    "author",
    "tags",
    "context",
    "steps",
];

/// Keys recognized on a step.
pub const STEP_FIELDS: &[&str] = &[
    "id",
    "type",
    "command",
    "agent",
    "prompt",
    "output",
    "condition",
    "parse_json",
    "mode",
    "working_dir",
    "timeout",
];

/// Parse a recipe from YAML text.
///
/// # Errors
///
/// - `MalformedDocument` if the YAML is invalid or the top level is not a mapping
/// - `MissingField` if `name` or `steps` is absent, or `steps` is empty
/// - `DuplicateStepId` if two steps share an id
/// - `InvalidField` if a known field has the wrong type
pub fn parse_recipe(yaml: &str) -> Result<Recipe> {
    let document: Value =
        serde_yaml::from_str(yaml).map_err(|e| RecipeError::MalformedDocument {
            message: e.to_string(),
        })?;
    recipe_from_value(&document)
}

/// Build a recipe from an already-parsed YAML value.
pub fn recipe_from_value(document: &Value) -> Result<Recipe> {
    let root = document
        .as_mapping()
        .ok_or_else(|| RecipeError::MalformedDocument {
            message: format!("top level must be a mapping, found {}", kind_name(document)),
        })?;

    let name = optional_string(root, "name", "recipe")?
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| RecipeError::MissingField {
            field: "name".to_string(),
            location: "recipe".to_string(),
        })?;
    let location = format!("recipe '{}'", name);

    let raw_steps = match present(root, "steps") {
        None => {
            return Err(RecipeError::MissingField {
                field: "steps".to_string(),
                location,
            })
        }
        Some(Value::Sequence(seq)) => seq,
        Some(other) => {
            return Err(RecipeError::MalformedDocument {
                message: format!(
                    "'steps' in {} must be a sequence, found {}",
                    location,
                    kind_name(other)
                ),
            })
        }
    };
    if raw_steps.is_empty() {
        return Err(RecipeError::MissingField {
            field: "steps".to_string(),
            location,
        });
    }

    let mut seen = HashSet::new();
    let mut steps = Vec::with_capacity(raw_steps.len());
    for (index, raw) in raw_steps.iter().enumerate() {
        let step = parse_step(raw, index)?;
        if !seen.insert(step.id.clone()) {
            return Err(RecipeError::DuplicateStepId { id: step.id });
        }
        steps.push(step);
    }

    Ok(Recipe {
        description: optional_string(root, "description", &location)?,
        version: optional_string(root, "version", &location)?
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        author: optional_string(root, "author", &location)?,
        tags: parse_tags(root, &location)?,
        context: parse_context(root, &location)?,
        steps,
        name,
    })
}

/// Decide the type of a raw step mapping.
///
/// Returns an error message when an explicit `type` is not `bash` or `agent`.
pub fn infer_step_type(step: &Mapping) -> std::result::Result<StepType, String> {
    if let Some(explicit) = present(step, "type") {
        let name = scalar_string(explicit).unwrap_or_default();
        return StepType::from_name(&name)
            .ok_or_else(|| format!("expected 'bash' or 'agent', found '{}'", name));
    }

    let has = |key: &str| present(step, key).is_some();
    if has("agent") || (has("prompt") && !has("command")) {
        Ok(StepType::Agent)
    } else {
        // A command key and the fallback both resolve to bash.
        Ok(StepType::Bash)
    }
}

fn parse_step(raw: &Value, index: usize) -> Result<Step> {
    let map = raw
        .as_mapping()
        .ok_or_else(|| RecipeError::MalformedDocument {
            message: format!(
                "step #{} must be a mapping, found {}",
                index + 1,
                kind_name(raw)
            ),
        })?;

    let position = format!("step #{}", index + 1);
    let id = optional_string(map, "id", &position)?
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RecipeError::MissingField {
            field: "id".to_string(),
            location: position,
        })?;
    let location = format!("step '{}'", id);

    let step_type = infer_step_type(map).map_err(|message| RecipeError::InvalidField {
        field: "type".to_string(),
        location: location.clone(),
        message,
    })?;

    Ok(Step {
        step_type,
        command: optional_string(map, "command", &location)?,
        agent: optional_string(map, "agent", &location)?,
        prompt: optional_string(map, "prompt", &location)?,
        output: optional_string(map, "output", &location)?,
        condition: optional_string(map, "condition", &location)?,
        parse_json: optional_bool(map, "parse_json", &location)?.unwrap_or(false),
        mode: optional_string(map, "mode", &location)?,
        working_dir: optional_string(map, "working_dir", &location)?.map(PathBuf::from),
        timeout: optional_timeout(map, &location)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        id,
    })
}

fn parse_tags(root: &Mapping, location: &str) -> Result<BTreeSet<String>> {
    let Some(value) = present(root, "tags") else {
        return Ok(BTreeSet::new());
    };
    let invalid = |message: String| RecipeError::InvalidField {
        field: "tags".to_string(),
        location: location.to_string(),
        message,
    };

    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_string(item).ok_or_else(|| {
                    invalid(format!("tags must be strings, found {}", kind_name(item)))
                })
            })
            .collect(),
        other => Err(invalid(format!(
            "expected a sequence, found {}",
            kind_name(other)
        ))),
    }
}

fn parse_context(
    root: &Mapping,
    location: &str,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let Some(value) = present(root, "context") else {
        return Ok(serde_json::Map::new());
    };
    let invalid = |message: String| RecipeError::InvalidField {
        field: "context".to_string(),
        location: location.to_string(),
        message,
    };

    if !value.is_mapping() {
        return Err(invalid(format!(
            "expected a mapping, found {}",
            kind_name(value)
        )));
    }
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("expected a mapping".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Value for `key`, treating an explicit null as absent.
fn present<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn optional_string(map: &Mapping, key: &str, location: &str) -> Result<Option<String>> {
    match present(map, key) {
        None => Ok(None),
        Some(value) => scalar_string(value)
            .map(Some)
            .ok_or_else(|| RecipeError::InvalidField {
                field: key.to_string(),
                location: location.to_string(),
                message: format!("expected a string, found {}", kind_name(value)),
            }),
    }
}

fn optional_bool(map: &Mapping, key: &str, location: &str) -> Result<Option<bool>> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(value) => Err(RecipeError::InvalidField {
            field: key.to_string(),
            location: location.to_string(),
            message: format!("expected a boolean, found {}", kind_name(value)),
        }),
    }
}

fn optional_timeout(map: &Mapping, location: &str) -> Result<Option<u64>> {
    match present(map, "timeout") {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| RecipeError::InvalidField {
                field: "timeout".to_string(),
                location: location.to_string(),
                message: format!(
                    "expected a non-negative integer number of seconds, found {}",
                    kind_name(value)
                ),
            }),
    }
}

/// Render a scalar as text; collections yield `None`.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
