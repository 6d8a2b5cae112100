//! The result of one run.

use serde::{Deserialize, Serialize};

use koda_types::ScriptError;

/// What happened to one submitted program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The program ran to completion.
    Success,
    /// The access guard found a deny-listed identifier; nothing was compiled.
    SecurityRejected { violating_identifier: String },
    /// Compilation or execution threw.
    Failed {
        raw_error: ScriptError,
        /// 0-based authored line the failure is attributed to.
        attributed_line: usize,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    pub fn attributed_line(&self) -> Option<usize> {
        match self {
            ExecutionOutcome::Failed {
                attributed_line, ..
            } => Some(*attributed_line),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScriptError> {
        match self {
            ExecutionOutcome::Failed { raw_error, .. } => Some(raw_error),
            _ => None,
        }
    }
}
