//! Terminal styling.

use console::Style;

use crate::runner::{StepResult, StepStatus};

/// Styles used for run and validation output.
#[derive(Debug, Clone)]
pub struct RecipeTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Running steps and spinners.
    pub info: Style,
    pub dim: Style,
    /// Recipe names and headers.
    pub highlight: Style,
    /// Step ids in listings.
    pub key: Style,
    /// Commands and prompts echoed back to the user.
    pub command: Style,
}

impl Default for RecipeTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeTheme {
    /// Colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            key: Style::new().bold().cyan(),
            command: Style::new().dim().italic(),
        }
    }

    /// Theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            key: Style::new(),
            command: Style::new(),
        }
    }

    /// Pick a theme by color preference.
    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.success.apply_to(format!("✓ {}", msg)).to_string()
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.warning.apply_to(format!("⚠ {}", msg)).to_string()
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.error.apply_to(format!("✗ {}", msg)).to_string()
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        self.dim.apply_to(format!("⊘ {}", msg)).to_string()
    }

    /// Recipe banner: name plus a dim detail line.
    pub fn format_header(&self, title: &str, detail: &str) -> String {
        if detail.is_empty() {
            return self.highlight.apply_to(title).to_string();
        }
        format!(
            "{} {}",
            self.highlight.apply_to(title),
            self.dim.apply_to(format!("· {}", detail))
        )
    }

    /// Styled summary line for a finished step.
    pub fn format_step_result(&self, result: &StepResult) -> String {
        let line = result.summary_line();
        match result.status {
            StepStatus::Completed => self.success.apply_to(line).to_string(),
            StepStatus::Failed => self.error.apply_to(line).to_string(),
            StepStatus::Skipped => self.dim.apply_to(line).to_string(),
        }
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    console::Term::stdout().is_term()
}
