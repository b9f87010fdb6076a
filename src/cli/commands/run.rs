//! Run command implementation.
//!
//! `recipe-runner run` loads a recipe, executes it through the CLI backend,
//! and reports each step as it finishes.

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::agents::MarkdownAgentResolver;
use crate::backend::{CliBackend, ExecutionBackend};
use crate::cli::args::RunArgs;
use crate::context::value_to_text;
use crate::error::Result;
use crate::recipe::{parse_recipe, read_recipe_file, validate_yaml, Recipe};
use crate::runner::{
    format_duration, RecipeResult, RecipeRunner, RunProgress, StepResult, StepStatus,
};
use crate::ui::{LiveOutput, SpinnerHandle, UserInterface};

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE, EXIT_PARSE_ERROR};

/// Live output lines kept under a running step's spinner.
const LIVE_OUTPUT_LINES: usize = 3;

/// The run command implementation.
pub struct RunCommand {
    args: RunArgs,
}

impl RunCommand {
    pub fn new(args: RunArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Context overrides from `--context`, later flags winning.
    pub fn user_context(&self) -> Map<String, Value> {
        self.args.context.iter().cloned().collect()
    }

    /// Agent search path: `--agents-dir` values, then `agents/` next to the
    /// recipe file.
    pub fn agent_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.args.agents_dirs.clone();
        if let Some(parent) = self.args.file.parent() {
            dirs.push(parent.join("agents"));
        }
        dirs
    }

    fn load(&self, ui: &mut dyn UserInterface) -> Option<Recipe> {
        let text = match read_recipe_file(&self.args.file) {
            Ok(text) => text,
            Err(e) => {
                ui.error(&e.to_string());
                return None;
            }
        };

        let recipe = match parse_recipe(&text) {
            Ok(recipe) => recipe,
            Err(e) => {
                ui.error(&e.to_string());
                return None;
            }
        };

        if let Ok(warnings) = validate_yaml(&text) {
            for warning in warnings {
                tracing::warn!("{}", warning);
                ui.warning(&warning.to_string());
            }
        }

        Some(recipe)
    }

    /// Execute `recipe` against `backend`, drawing progress on `ui`.
    pub fn run_recipe(
        &self,
        recipe: &Recipe,
        backend: &dyn ExecutionBackend,
        live: &LiveOutput,
        ui: &mut dyn UserInterface,
    ) -> RecipeResult {
        let resolver = MarkdownAgentResolver::new(self.agent_dirs());
        let mut runner = RecipeRunner::new(backend).with_agent_resolver(&resolver);
        if let Some(dir) = &self.args.working_dir {
            runner = runner.with_working_dir(dir);
        }

        let step_label = if recipe.steps.len() == 1 { "step" } else { "steps" };
        let mut detail = format!("{} {}", recipe.steps.len(), step_label);
        if self.args.dry_run {
            detail.push_str(" · dry run");
        }
        ui.show_header(&recipe.name, &detail);

        let context = self.user_context();
        let show_output = ui.output_mode().shows_step_output();
        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

        runner.execute_with_progress(recipe, Some(&context), self.args.dry_run, |event| {
            match event {
                RunProgress::StepStarting { step, index, total } => {
                    let message =
                        format!("[{}/{}] {} ({})", index + 1, total, step.id, step.step_type);
                    let handle = ui.start_spinner(&message);
                    if let Some(bar) = handle.progress_bar() {
                        live.attach(bar, &message);
                    }
                    spinner = Some(handle);
                }
                RunProgress::StepFinished { result } => {
                    live.detach();
                    if let Some(mut handle) = spinner.take() {
                        let line = finish_line(result);
                        match result.status {
                            StepStatus::Failed => handle.finish_error(&line),
                            StepStatus::Skipped => handle.finish_skipped(&line),
                            StepStatus::Completed => handle.finish_success(&line),
                        }
                    }
                    if show_output && result.status == StepStatus::Completed {
                        let text = value_to_text(&result.output);
                        if !text.is_empty() {
                            ui.message(&text);
                        }
                    }
                }
                RunProgress::StepSkipped { result } => {
                    ui.skipped(&finish_line(result));
                }
            }
        })
    }
}

/// Spinner text for a finished step, without the status marker.
fn finish_line(result: &StepResult) -> String {
    match result.status {
        StepStatus::Completed => {
            format!("{} ({})", result.step_id, format_duration(result.duration))
        }
        StepStatus::Failed => result
            .error
            .clone()
            .unwrap_or_else(|| format!("{} failed", result.step_id)),
        StepStatus::Skipped => match &result.skip_reason {
            Some(reason) => format!("{} ({})", result.step_id, reason),
            None => result.step_id.clone(),
        },
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(recipe) = self.load(ui) else {
            return Ok(CommandResult::failure(EXIT_PARSE_ERROR));
        };

        let live = LiveOutput::new(LIVE_OUTPUT_LINES);
        let mut backend = CliBackend::new().with_agent_command(&self.args.agent_command);
        if ui.output_mode().shows_spinners() && ui.is_interactive() {
            backend = backend.with_observer(live.observer());
        }

        let result = self.run_recipe(&recipe, &backend, &live, ui);

        if self.args.json {
            let json = serde_json::to_string_pretty(&result).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }

        if !result.success {
            if let Some(failed) = result.failed_step() {
                ui.error(failed.error.as_deref().unwrap_or("step failed"));
            }
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        ui.success(&format!(
            "Recipe '{}' finished: {} completed, {} skipped in {}",
            result.recipe_name,
            result.count(StepStatus::Completed),
            result.count(StepStatus::Skipped),
            format_duration(result.duration)
        ));
        Ok(CommandResult::success())
    }
}
