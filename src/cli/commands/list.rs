//! List command implementation.
//!
//! `recipe-runner list` prints each step with its inferred type, output
//! variable, and condition.

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::recipe::{load_recipe, Step};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_PARSE_ERROR};

/// The list command implementation.
pub struct ListCommand {
    args: ListArgs,
}

impl ListCommand {
    pub fn new(args: ListArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

/// One listing line: `id  type  [-> output]  [if condition]`.
pub fn format_step_line(step: &Step, id_width: usize) -> String {
    let mut line = format!(
        "{:<width$}  {:<5}",
        step.id,
        step.step_type.to_string(),
        width = id_width
    );
    if let Some(agent) = &step.agent {
        line.push_str(&format!("  @{}", agent));
    }
    if let Some(output) = &step.output {
        line.push_str(&format!("  -> {}", output));
    }
    if let Some(condition) = &step.condition {
        line.push_str(&format!("  if {}", condition));
    }
    line.trim_end().to_string()
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let recipe = match load_recipe(&self.args.file) {
            Ok(recipe) => recipe,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(EXIT_PARSE_ERROR));
            }
        };

        let mut detail = format!("v{}", recipe.version);
        if let Some(description) = &recipe.description {
            detail.push_str(&format!(" · {}", description));
        }
        ui.show_header(&recipe.name, &detail);

        let width = recipe.step_ids().iter().map(|id| id.len()).max().unwrap_or(0);
        for step in &recipe.steps {
            ui.message(&format_step_line(step, width));
        }

        Ok(CommandResult::success())
    }
}
