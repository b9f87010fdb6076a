//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{OutputMode, ProgressSpinner, RecipeTheme, SpinnerHandle, UserInterface};

/// Writes status to stdout and draws spinners when attached to a terminal.
pub struct TerminalUI {
    term: Term,
    theme: RecipeTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, colors: bool) -> Self {
        Self {
            term: Term::stdout(),
            theme: RecipeTheme::for_colors(colors),
            mode,
        }
    }

    pub fn theme(&self) -> &RecipeTheme {
        &self.theme
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        // Errors go to stderr so they survive --json output.
        let mut stderr = Term::stderr();
        writeln!(stderr, "{}", self.theme.format_error(msg)).ok();
    }

    fn skipped(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_skipped(msg)).ok();
        }
    }

    fn show_header(&mut self, title: &str, detail: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title, detail)).ok();
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() && self.term.is_term() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(LineSpinner {
                term: self.term.clone(),
                theme: self.theme.clone(),
                show: self.mode.shows_status(),
            })
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Spinner stand-in for pipes and CI logs: prints only the final line.
struct LineSpinner {
    term: Term,
    theme: RecipeTheme,
    show: bool,
}

impl LineSpinner {
    fn write(&mut self, line: String) {
        if self.show {
            writeln!(self.term, "{}", line).ok();
        }
    }
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.write(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.write(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.write(line);
    }
}

/// Create the UI for the given output mode.
pub fn create_ui(mode: OutputMode, colors: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode, colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(OutputMode::Silent, false);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }

    #[test]
    fn silent_mode_spinner_prints_nothing() {
        let mut ui = TerminalUI::new(OutputMode::Silent, false);
        let mut spinner = ui.start_spinner("step");
        spinner.finish_success("step");
        assert!(spinner.progress_bar().is_none());
    }

    #[test]
    fn plain_theme_when_colors_disabled() {
        let ui = TerminalUI::new(OutputMode::Normal, false);
        assert_eq!(ui.theme().format_success("ok"), "✓ ok");
    }
}
