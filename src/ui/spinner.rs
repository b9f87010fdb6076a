//! Step spinners and live output.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::shell::{OutputLine, OutputObserver};

use super::theme::RecipeTheme;
use super::SpinnerHandle;

/// A spinner shown while a step runs.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: RecipeTheme,
}

impl ProgressSpinner {
    pub fn new(message: &str, theme: RecipeTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, theme }
    }

    /// A spinner that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: RecipeTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish_with(line);
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        Some(self.bar.clone())
    }
}

#[derive(Default)]
struct LiveState {
    bar: Option<ProgressBar>,
    base: String,
    lines: VecDeque<String>,
}

/// Shows the last few output lines of the running step under its spinner.
///
/// The backend holds one observer for the whole run, while spinners come and
/// go per step. [`LiveOutput::attach`] points the observer at the current
/// spinner; lines arriving while nothing is attached are dropped.
#[derive(Clone, Default)]
pub struct LiveOutput {
    state: Arc<Mutex<LiveState>>,
    max_lines: usize,
}

impl LiveOutput {
    pub fn new(max_lines: usize) -> Self {
        Self {
            state: Arc::default(),
            max_lines,
        }
    }

    /// Route output to `bar`, keeping `base` as the first message line.
    pub fn attach(&self, bar: ProgressBar, base: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.bar = Some(bar);
            state.base = base.to_string();
            state.lines.clear();
        }
    }

    pub fn detach(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.bar = None;
            state.lines.clear();
        }
    }

    /// Observer to install on the backend.
    pub fn observer(&self) -> OutputObserver {
        let live = self.clone();
        let dim = RecipeTheme::new().dim;

        Arc::new(move |line: OutputLine| {
            let text = match &line {
                OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.trim_end(),
            };
            if text.is_empty() {
                return;
            }

            let display = truncate(text, 72);
            let Ok(mut state) = live.state.lock() else {
                return;
            };
            let Some(bar) = state.bar.clone() else {
                return;
            };

            state.lines.push_back(display);
            while state.lines.len() > live.max_lines {
                state.lines.pop_front();
            }

            let mut msg = state.base.clone();
            for line in &state.lines {
                msg.push_str("\n  ");
                msg.push_str(&dim.apply_to(format!("» {}", line)).to_string());
            }
            bar.set_message(msg);
        })
    }

    #[cfg(test)]
    fn lines(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}
