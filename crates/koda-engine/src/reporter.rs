//! Result reporter: turns an outcome into editor state.
//!
//! The editor's state goes in and comes out explicitly; the engine keeps
//! none of it between runs.

use serde::{Deserialize, Serialize};

use koda_types::ErrorKind;

use crate::config::ReporterConfig;
use crate::outcome::ExecutionOutcome;
use crate::suggest::suggest;

/// Color of the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Success,
    Danger,
}

/// Editor state that the reporter reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub status: String,
    pub tone: Tone,
    /// 0-based line to highlight.
    pub active_error_line: Option<usize>,
    pub scroll_top: f64,
}

impl EditorState {
    /// Interim state while a run is in progress.
    pub fn running() -> Self {
        Self {
            status: "Running...".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reporter {
    line_height: f64,
    viewport_height: f64,
    /// Names offered in "Did you mean" hints.
    known_names: Vec<String>,
}

impl Reporter {
    pub fn new(config: &ReporterConfig) -> Self {
        Self {
            line_height: config.line_height,
            viewport_height: config.viewport_height,
            known_names: Vec::new(),
        }
    }

    /// Offer these names as corrections for undefined identifiers.
    pub fn with_suggestions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn report(&self, previous: EditorState, outcome: &ExecutionOutcome) -> EditorState {
        match outcome {
            ExecutionOutcome::Success => EditorState {
                status: "Code ran without errors.".to_string(),
                tone: Tone::Success,
                active_error_line: None,
                ..previous
            },
            ExecutionOutcome::SecurityRejected {
                violating_identifier,
            } => EditorState {
                status: format!("Security error: you may not use \"{violating_identifier}\""),
                tone: Tone::Danger,
                active_error_line: None,
                ..previous
            },
            ExecutionOutcome::Failed {
                raw_error,
                attributed_line,
            } => {
                let mut status = format!("Error on line {}.", attributed_line + 1);
                if raw_error.kind == ErrorKind::ReferenceError {
                    if let Some(hint) = self.hint(&raw_error.message) {
                        status.push_str(&format!(" Did you mean \"{hint}\"?"));
                    }
                }
                EditorState {
                    status,
                    tone: Tone::Danger,
                    active_error_line: Some(*attributed_line),
                    scroll_top: self.scroll_to(*attributed_line),
                }
            }
        }
    }

    /// Scroll offset that centers `line` in the viewport.
    pub fn scroll_to(&self, line: usize) -> f64 {
        (line as f64 * self.line_height - self.viewport_height / 2.0).max(0.0)
    }

    fn hint(&self, message: &str) -> Option<&str> {
        let name = message.strip_suffix(" is not defined")?;
        suggest(name, self.known_names.iter().map(String::as_str))
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(&ReporterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koda_types::ScriptError;

    fn failed(error: ScriptError, line: usize) -> ExecutionOutcome {
        ExecutionOutcome::Failed {
            raw_error: error,
            attributed_line: line,
        }
    }

    #[test]
    fn test_success_clears_highlight_and_keeps_scroll() {
        let previous = EditorState {
            active_error_line: Some(4),
            scroll_top: 63.0,
            ..EditorState::running()
        };
        let state = Reporter::default().report(previous, &ExecutionOutcome::Success);
        assert_eq!(state.status, "Code ran without errors.");
        assert_eq!(state.tone, Tone::Success);
        assert_eq!(state.active_error_line, None);
        assert_eq!(state.scroll_top, 63.0);
    }

    #[test]
    fn test_rejection_text() {
        let outcome = ExecutionOutcome::SecurityRejected {
            violating_identifier: "window".to_string(),
        };
        let state = Reporter::default().report(EditorState::running(), &outcome);
        assert_eq!(state.status, "Security error: you may not use \"window\"");
        assert_eq!(state.tone, Tone::Danger);
    }

    #[test]
    fn test_failure_highlights_and_scrolls() {
        let reporter = Reporter::default();
        let state = reporter.report(EditorState::running(), &failed(ScriptError::syntax("x"), 30));
        assert_eq!(state.status, "Error on line 31.");
        assert_eq!(state.active_error_line, Some(30));
        assert_eq!(state.scroll_top, 30.0 * 21.0 - 200.0);

        let state = reporter.report(EditorState::running(), &failed(ScriptError::syntax("x"), 2));
        assert_eq!(state.scroll_top, 0.0);
    }

    #[test]
    fn test_reference_error_suggestion() {
        let reporter = Reporter::default().with_suggestions(["clear", "circle", "ring"]);
        let err = ScriptError::reference("cirle is not defined");
        let state = reporter.report(EditorState::running(), &failed(err, 0));
        assert_eq!(state.status, "Error on line 1. Did you mean \"circle\"?");

        let err = ScriptError::reference("spaceship is not defined");
        let state = reporter.report(EditorState::running(), &failed(err, 0));
        assert_eq!(state.status, "Error on line 1.");
    }

    #[test]
    fn test_no_suggestion_for_other_errors() {
        let reporter = Reporter::default().with_suggestions(["circle"]);
        let err = ScriptError::type_error("cirle is not defined");
        let state = reporter.report(EditorState::running(), &failed(err, 0));
        assert_eq!(state.status, "Error on line 1.");
    }

    #[test]
    fn test_running_state() {
        let state = EditorState::running();
        assert_eq!(state.status, "Running...");
        assert_eq!(state.tone, Tone::Neutral);
    }
}
