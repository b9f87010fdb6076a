//! User-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait so commands can be tested with [`MockUI`]
//! - [`TerminalUI`] for real terminals, pipes, and CI logs
//! - Spinners with live step output ([`ProgressSpinner`], [`LiveOutput`])
//!
//! # Example
//!
//! ```
//! use recipe_runner::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(OutputMode::Silent, false);
//! ui.show_header("demo", "2 steps");
//! ui.success("Recipe complete");
//! ```

pub mod mock;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, SpinnerOutcome};
pub use spinner::{LiveOutput, ProgressSpinner};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, RecipeTheme};

use indicatif::ProgressBar;

/// Output verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Status plus the output of each step.
    Verbose,
    /// Status and spinners.
    #[default]
    Normal,
    /// Final status lines only, no live output.
    Quiet,
    /// Nothing except errors (used with `--json`).
    Silent,
}

impl OutputMode {
    /// Mode selected by the global `--verbose` / `--quiet` flags.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Self::Quiet,
            (true, false) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    /// Whether step output is printed after each step.
    pub fn shows_step_output(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Whether spinners and live output are drawn.
    pub fn shows_spinners(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Whether status messages are printed.
    pub fn shows_status(&self) -> bool {
        !matches!(self, Self::Silent)
    }
}

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Display a plain message.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Display an error. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Display a skipped-step line.
    fn skipped(&mut self, msg: &str);

    /// Show a banner with a title and a dim detail.
    fn show_header(&mut self, title: &str, detail: &str);

    /// Start a spinner for a running step.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);

    fn finish_skipped(&mut self, msg: &str);

    /// The underlying bar, for routing live output to it.
    fn progress_bar(&self) -> Option<ProgressBar> {
        None
    }
}
