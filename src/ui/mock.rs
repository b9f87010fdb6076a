//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use recipe_runner::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Starting");
//! ui.success("Done!");
//!
//! assert!(ui.has_message("Starting"));
//! assert_eq!(ui.successes(), ["Done!"]);
//! ```

use std::sync::{Arc, Mutex};

use super::{OutputMode, SpinnerHandle, UserInterface};

/// How a mock spinner was finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinnerOutcome {
    Success(String),
    Error(String),
    Skipped(String),
}

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    skipped: Vec<String>,
    headers: Vec<(String, String)>,
    spinners: Vec<String>,
    outcomes: Arc<Mutex<Vec<SpinnerOutcome>>>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Messages passed to `start_spinner`.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// How each spinner finished, in order.
    pub fn spinner_outcomes(&self) -> Vec<SpinnerOutcome> {
        self.outcomes
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default()
    }

    /// Whether any captured message contains `text`.
    pub fn has_message(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.contains(text))
    }

    /// Whether any captured error contains `text`.
    pub fn has_error(&self, text: &str) -> bool {
        self.errors.iter().any(|m| m.contains(text))
    }

    /// Whether any captured warning contains `text`.
    pub fn has_warning(&self, text: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(text))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn skipped(&mut self, msg: &str) {
        self.skipped.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str, detail: &str) {
        self.headers.push((title.to_string(), detail.to_string()));
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            outcomes: Arc::clone(&self.outcomes),
        })
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that records how it finished.
#[derive(Debug)]
pub struct MockSpinner {
    outcomes: Arc<Mutex<Vec<SpinnerOutcome>>>,
}

impl MockSpinner {
    fn record(&self, outcome: SpinnerOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome);
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.record(SpinnerOutcome::Success(msg.to_string()));
    }

    fn finish_error(&mut self, msg: &str) {
        self.record(SpinnerOutcome::Error(msg.to_string()));
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.record(SpinnerOutcome::Skipped(msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_messages_by_kind() {
        let mut ui = MockUI::new();
        ui.message("m");
        ui.warning("w");
        ui.error("e");
        UserInterface::skipped(&mut ui, "s");
        ui.show_header("demo", "2 steps");

        assert_eq!(ui.messages(), ["m"]);
        assert!(ui.has_warning("w"));
        assert!(ui.has_error("e"));
        assert_eq!(ui.skipped(), ["s"]);
        assert_eq!(ui.headers()[0], ("demo".to_string(), "2 steps".to_string()));
    }

    #[test]
    fn records_spinner_outcomes() {
        let mut ui = MockUI::new();
        let mut first = ui.start_spinner("a");
        first.finish_success("a ok");
        let mut second = ui.start_spinner("b");
        second.finish_error("b failed");

        assert_eq!(ui.spinners(), ["a", "b"]);
        assert_eq!(
            ui.spinner_outcomes(),
            vec![
                SpinnerOutcome::Success("a ok".into()),
                SpinnerOutcome::Error("b failed".into())
            ]
        );
    }

    #[test]
    fn with_mode_sets_mode() {
        let ui = MockUI::with_mode(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
        assert!(!ui.is_interactive());
    }
}
