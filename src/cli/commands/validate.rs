//! Validate command implementation.
//!
//! `recipe-runner validate` parses a recipe and reports advisory warnings
//! without running anything.

use crate::cli::args::ValidateArgs;
use crate::error::Result;
use crate::recipe::{parse_recipe, read_recipe_file, validate_yaml};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE, EXIT_PARSE_ERROR};

/// The validate command implementation.
pub struct ValidateCommand {
    args: ValidateArgs,
}

impl ValidateCommand {
    pub fn new(args: ValidateArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &ValidateArgs {
        &self.args
    }
}

impl Command for ValidateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let parsed = read_recipe_file(&self.args.file)
            .and_then(|text| parse_recipe(&text).map(|recipe| (text, recipe)));
        let (text, recipe) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(EXIT_PARSE_ERROR));
            }
        };

        let warnings = validate_yaml(&text)?;
        for warning in &warnings {
            ui.warning(&warning.to_string());
        }

        if warnings.is_empty() {
            ui.success(&format!(
                "Recipe '{}' is valid ({} steps)",
                recipe.name,
                recipe.steps.len()
            ));
            return Ok(CommandResult::success());
        }

        let noun = if warnings.len() == 1 { "warning" } else { "warnings" };
        if self.args.strict {
            ui.error(&format!("{} {} (strict mode)", warnings.len(), noun));
            Ok(CommandResult::failure(EXIT_FAILURE))
        } else {
            ui.message(&format!(
                "Recipe '{}' parsed with {} {}",
                recipe.name,
                warnings.len(),
                noun
            ));
            Ok(CommandResult::success())
        }
    }
}
