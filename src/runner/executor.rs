//! Sequential recipe execution.

use super::json::decode_output;
use super::result::{RecipeResult, SkipReason, StepResult};
use crate::agents::AgentResolver;
use crate::backend::ExecutionBackend;
use crate::context::RecipeContext;
use crate::error::BackendError;
use crate::recipe::{Recipe, Step, StepType};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Output stored for every step during a dry run.
pub const DRY_RUN_OUTPUT: &str = "[dry run]";

/// Progress events emitted during execution.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step passed its condition and is about to run.
    StepStarting {
        step: &'a Step,
        index: usize,
        total: usize,
    },
    /// A step completed or failed.
    StepFinished { result: &'a StepResult },
    /// A step was skipped by its condition.
    StepSkipped { result: &'a StepResult },
}

/// Runs recipes against an execution backend.
///
/// Steps run strictly in order. Each run gets a fresh context seeded from the
/// recipe's `context:` block and the caller's overrides. The first step whose
/// backend call fails stops the run.
pub struct RecipeRunner<'a> {
    backend: &'a dyn ExecutionBackend,
    agents: Option<&'a dyn AgentResolver>,
    working_dir: Option<PathBuf>,
}

impl<'a> RecipeRunner<'a> {
    pub fn new(backend: &'a dyn ExecutionBackend) -> Self {
        Self {
            backend,
            agents: None,
            working_dir: None,
        }
    }

    /// Look up system prompts for named agents.
    pub fn with_agent_resolver(mut self, resolver: &'a dyn AgentResolver) -> Self {
        self.agents = Some(resolver);
        self
    }

    /// Base directory for steps. Relative step `working_dir` values are
    /// resolved against it.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Execute a recipe.
    pub fn execute(
        &self,
        recipe: &Recipe,
        user_context: Option<&Map<String, Value>>,
        dry_run: bool,
    ) -> RecipeResult {
        self.execute_with_progress(recipe, user_context, dry_run, |_| {})
    }

    /// Execute a recipe, reporting progress through a callback.
    pub fn execute_with_progress(
        &self,
        recipe: &Recipe,
        user_context: Option<&Map<String, Value>>,
        dry_run: bool,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> RecipeResult {
        let start = Instant::now();
        let mut context = RecipeContext::seeded(&recipe.context, user_context);
        let mut results = Vec::with_capacity(recipe.steps.len());
        let mut success = true;
        let total = recipe.steps.len();

        info!(
            "Running recipe '{}' ({} steps{})",
            recipe.name,
            total,
            if dry_run { ", dry run" } else { "" }
        );

        for (index, step) in recipe.steps.iter().enumerate() {
            if let Some(reason) = skip_reason(step, &context) {
                let result = StepResult::skipped(&step.id, reason);
                on_progress(RunProgress::StepSkipped { result: &result });
                results.push(result);
                continue;
            }

            on_progress(RunProgress::StepStarting { step, index, total });
            let step_start = Instant::now();

            let output = if dry_run {
                debug!("Dry run, not dispatching step '{}'", step.id);
                Value::String(DRY_RUN_OUTPUT.to_string())
            } else {
                match self.dispatch(step, &context) {
                    Ok(text) => decode_step_output(step, text),
                    Err(e) => {
                        let message = format!("Step '{}' failed: {}", step.id, e);
                        error!("{}", message);
                        let result = StepResult::failed(&step.id, message, step_start.elapsed());
                        on_progress(RunProgress::StepFinished { result: &result });
                        results.push(result);
                        success = false;
                        break;
                    }
                }
            };

            if let Some(name) = &step.output {
                context.set(name.clone(), output.clone());
            }

            let result = StepResult::completed(&step.id, output, step_start.elapsed());
            info!("Step '{}' completed in {:?}", step.id, result.duration);
            on_progress(RunProgress::StepFinished { result: &result });
            results.push(result);
        }

        RecipeResult {
            recipe_name: recipe.name.clone(),
            success,
            step_results: results,
            context: context.into_map(),
            duration: start.elapsed(),
        }
    }

    fn dispatch(&self, step: &Step, context: &RecipeContext) -> Result<String, BackendError> {
        let working_dir = self.step_working_dir(step, context);

        match step.step_type {
            StepType::Bash => {
                let command = context.render_shell(step.body());
                debug!("Step '{}' command: {}", step.id, command);
                self.backend.execute_bash_step(
                    &command,
                    working_dir.as_deref(),
                    step.timeout_duration(),
                )
            }
            StepType::Agent => {
                let prompt = context.render(step.body());
                debug!("Step '{}' prompt: {}", step.id, prompt);
                let system_prompt = step
                    .agent
                    .as_deref()
                    .and_then(|name| self.resolve_agent(&step.id, name));
                self.backend.execute_agent_step(
                    &prompt,
                    step.agent.as_deref(),
                    system_prompt.as_deref(),
                    step.mode.as_deref(),
                    working_dir.as_deref(),
                )
            }
        }
    }

    fn resolve_agent(&self, step_id: &str, name: &str) -> Option<String> {
        let resolver = self.agents?;
        let found = resolver.resolve(name);
        if found.is_none() {
            warn!(
                "Agent '{}' for step '{}' not found, continuing without a system prompt",
                name, step_id
            );
        }
        found
    }

    fn step_working_dir(&self, step: &Step, context: &RecipeContext) -> Option<PathBuf> {
        let Some(dir) = &step.working_dir else {
            return self.working_dir.clone();
        };

        let rendered = PathBuf::from(context.render(&dir.to_string_lossy()));
        match &self.working_dir {
            Some(base) if rendered.is_relative() => Some(base.join(rendered)),
            _ => Some(rendered),
        }
    }
}

/// Decide whether a step's condition keeps it from running.
fn skip_reason(step: &Step, context: &RecipeContext) -> Option<SkipReason> {
    let condition = step.condition.as_deref()?;

    match context.evaluate(condition) {
        Ok(true) => None,
        Ok(false) => {
            info!("Skipping step '{}': condition '{}' is false", step.id, condition);
            Some(SkipReason::ConditionFalse)
        }
        Err(e) => {
            warn!(
                "Skipping step '{}': could not evaluate condition '{}': {}",
                step.id, condition, e
            );
            Some(SkipReason::ConditionError(e.to_string()))
        }
    }
}

fn decode_step_output(step: &Step, text: String) -> Value {
    if !step.parse_json {
        return Value::String(text);
    }

    match decode_output(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Step '{}' output is not valid JSON ({}), keeping raw text",
                step.id, e
            );
            Value::String(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parse_recipe;
    use crate::runner::StepStatus;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Bash {
            command: String,
            working_dir: Option<PathBuf>,
            timeout: Duration,
        },
        Agent {
            prompt: String,
            agent: Option<String>,
            system_prompt: Option<String>,
            mode: Option<String>,
        },
    }

    #[derive(Default)]
    struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<String, BackendError>>>,
        calls: RefCell<Vec<Call>>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::default(),
            }
        }

        fn next(&self) -> Result<String, BackendError> {
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl ExecutionBackend for ScriptedBackend {
        fn execute_bash_step(
            &self,
            command: &str,
            working_dir: Option<&Path>,
            timeout: Duration,
        ) -> Result<String, BackendError> {
            self.calls.borrow_mut().push(Call::Bash {
                command: command.to_string(),
                working_dir: working_dir.map(Path::to_path_buf),
                timeout,
            });
            self.next()
        }

        fn execute_agent_step(
            &self,
            prompt: &str,
            agent_name: Option<&str>,
            agent_system_prompt: Option<&str>,
            mode: Option<&str>,
            _working_dir: Option<&Path>,
        ) -> Result<String, BackendError> {
            self.calls.borrow_mut().push(Call::Agent {
                prompt: prompt.to_string(),
                agent: agent_name.map(str::to_string),
                system_prompt: agent_system_prompt.map(str::to_string),
                mode: mode.map(str::to_string),
            });
            self.next()
        }
    }

    struct FixedAgents(HashMap<&'static str, &'static str>);

    impl AgentResolver for FixedAgents {
        fn resolve(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|s| s.to_string())
        }
    }

    fn failure(command: &str) -> BackendError {
        BackendError::CommandFailed {
            command: command.to_string(),
            code: Some(1),
            stderr: "boom".to_string(),
        }
    }

    #[test]
    fn outputs_flow_between_steps() {
        let recipe = parse_recipe(
            r#"
name: flow
steps:
  - id: a
    command: echo first
    output: first
  - id: b
    command: "echo {{first}}"
"#,
        )
        .unwrap();
        let backend = ScriptedBackend::replying(vec![Ok("one two".into()), Ok("done".into())]);

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(result.success);
        assert_eq!(result.context["first"], json!("one two"));
        assert_eq!(
            backend.calls()[1],
            Call::Bash {
                command: "echo 'one two'".into(),
                working_dir: None,
                timeout: Duration::from_secs(120),
            }
        );
    }

    #[test]
    fn fail_fast_stops_at_first_failure() {
        let recipe = parse_recipe(
            "name: ff\nsteps:\n  - id: a\n    command: 'true'\n  - id: b\n    command: 'false'\n  - id: c\n    command: echo never\n",
        )
        .unwrap();
        let backend = ScriptedBackend::replying(vec![Ok(String::new()), Err(failure("false"))]);

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(!result.success);
        assert_eq!(result.step_results.len(), 2);
        assert_eq!(result.step_results[1].status, StepStatus::Failed);
        let error = result.step_results[1].error.as_deref().unwrap();
        assert!(error.starts_with("Step 'b' failed:"));
        assert!(error.contains("boom"));
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn falsy_condition_skips_without_dispatch() {
        let recipe = parse_recipe(
            "name: c\ncontext:\n  enabled: false\nsteps:\n  - id: a\n    command: echo hi\n    condition: enabled\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(result.success);
        assert_eq!(result.step_results[0].status, StepStatus::Skipped);
        assert_eq!(
            result.step_results[0].skip_reason,
            Some(SkipReason::ConditionFalse)
        );
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn condition_error_skips_with_reason() {
        let recipe = parse_recipe(
            "name: c\nsteps:\n  - id: a\n    command: echo hi\n    condition: \"missing == 'x'\"\n  - id: b\n    command: echo after\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(result.success);
        assert!(matches!(
            result.step_results[0].skip_reason,
            Some(SkipReason::ConditionError(ref msg)) if msg.contains("missing")
        ));
        assert_eq!(result.step_results[1].status, StepStatus::Completed);
    }

    #[test]
    fn user_context_overrides_recipe_defaults() {
        let recipe = parse_recipe(
            "name: c\ncontext:\n  env: staging\nsteps:\n  - id: a\n    command: \"deploy {{env}}\"\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();
        let mut overrides = Map::new();
        overrides.insert("env".into(), json!("prod"));

        let result = RecipeRunner::new(&backend).execute(&recipe, Some(&overrides), false);

        assert_eq!(result.context["env"], json!("prod"));
        assert!(matches!(&backend.calls()[0], Call::Bash { command, .. } if command == "deploy prod"));
    }

    #[test]
    fn parse_json_decodes_or_keeps_text() {
        let recipe = parse_recipe(
            r#"
name: j
steps:
  - id: good
    command: emit
    output: data
    parse_json: true
  - id: bad
    command: emit
    output: raw
    parse_json: true
  - id: check
    command: "echo {{data.count}}"
    condition: "data.count == 2"
"#,
        )
        .unwrap();
        let backend = ScriptedBackend::replying(vec![
            Ok(r#"{"count": 2}"#.into()),
            Ok("not json".into()),
            Ok(String::new()),
        ]);

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(result.success);
        assert_eq!(result.context["data"], json!({"count": 2}));
        assert_eq!(result.context["raw"], json!("not json"));
        assert_eq!(result.step_results[2].status, StepStatus::Completed);
        assert!(matches!(&backend.calls()[2], Call::Bash { command, .. } if command == "echo 2"));
    }

    #[test]
    fn agent_steps_render_plain_and_resolve_system_prompt() {
        let recipe = parse_recipe(
            r#"
name: a
context:
  topic: "a; b"
steps:
  - id: known
    agent: reviewer
    prompt: "Review {{topic}}"
    mode: plan
  - id: unknown
    agent: ghost
    prompt: "Hello"
"#,
        )
        .unwrap();
        let backend = ScriptedBackend::default();
        let agents = FixedAgents(HashMap::from([("reviewer", "You review code.")]));

        let result = RecipeRunner::new(&backend)
            .with_agent_resolver(&agents)
            .execute(&recipe, None, false);

        assert!(result.success);
        let calls = backend.calls();
        assert_eq!(
            calls[0],
            Call::Agent {
                prompt: "Review a; b".into(),
                agent: Some("reviewer".into()),
                system_prompt: Some("You review code.".into()),
                mode: Some("plan".into()),
            }
        );
        assert!(matches!(&calls[1], Call::Agent { system_prompt: None, .. }));
    }

    #[test]
    fn dry_run_never_dispatches_and_is_repeatable() {
        let recipe = parse_recipe(
            "name: d\nsteps:\n  - id: a\n    command: echo hi\n    output: out\n  - id: b\n    prompt: use {{out}}\n    condition: out\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();
        let runner = RecipeRunner::new(&backend);

        let first = runner.execute(&recipe, None, true);
        let second = runner.execute(&recipe, None, true);

        assert!(backend.calls().is_empty());
        assert_eq!(first.context["out"], json!(DRY_RUN_OUTPUT));
        assert_eq!(first.step_results[1].status, StepStatus::Completed);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn relative_working_dir_joins_base() {
        let recipe = parse_recipe(
            "name: w\ncontext:\n  pkg: core\nsteps:\n  - id: a\n    command: ls\n    working_dir: \"crates/{{pkg}}\"\n  - id: b\n    command: ls\n    working_dir: /abs\n  - id: c\n    command: ls\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();

        RecipeRunner::new(&backend)
            .with_working_dir("/repo")
            .execute(&recipe, None, false);

        let dirs: Vec<Option<PathBuf>> = backend
            .calls()
            .into_iter()
            .map(|c| match c {
                Call::Bash { working_dir, .. } => working_dir,
                Call::Agent { .. } => None,
            })
            .collect();
        assert_eq!(
            dirs,
            vec![
                Some(PathBuf::from("/repo/crates/core")),
                Some(PathBuf::from("/abs")),
                Some(PathBuf::from("/repo")),
            ]
        );
    }

    #[test]
    fn progress_events_in_order() {
        let recipe = parse_recipe(
            "name: p\nsteps:\n  - id: a\n    command: x\n  - id: b\n    command: y\n    condition: 'False'\n",
        )
        .unwrap();
        let backend = ScriptedBackend::default();

        let mut events = Vec::new();
        RecipeRunner::new(&backend).execute_with_progress(&recipe, None, false, |p| match p {
            RunProgress::StepStarting { step, index, total } => {
                events.push(format!("start:{}:{}/{}", step.id, index, total))
            }
            RunProgress::StepFinished { result } => events.push(format!("finish:{}", result.step_id)),
            RunProgress::StepSkipped { result } => events.push(format!("skip:{}", result.step_id)),
        });

        assert_eq!(events, vec!["start:a:0/2", "finish:a", "skip:b"]);
    }

    #[test]
    fn failed_step_output_is_not_stored() {
        let recipe = parse_recipe(
            "name: f\nsteps:\n  - id: a\n    command: x\n    output: out\n",
        )
        .unwrap();
        let backend = ScriptedBackend::replying(vec![Err(failure("x"))]);

        let result = RecipeRunner::new(&backend).execute(&recipe, None, false);

        assert!(!result.context.contains_key("out"));
        assert_eq!(result.step_results[0].output, Value::Null);
    }
}
