// Logger error types

use thiserror::Error;

use super::types::{LogId, SharedError};

/// Failures surfaced by `Logger::execute_action`
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("No actions available for log entry {log_id}")]
    NoActions { log_id: LogId },

    #[error("No action found for log entry {log_id}")]
    ActionNotFound { log_id: LogId },

    #[error("Action {action_id} already completed for log entry {log_id}")]
    ActionAlreadyCompleted { log_id: LogId, action_id: String },

    /// The handler failed; `source` is the handler's own error
    #[error("Action {action_id} failed for log entry {log_id}: {source}")]
    ActionFailed {
        log_id: LogId,
        action_id: String,
        #[source]
        source: SharedError,
    },
}

impl LoggerError {
    /// The original handler error, when the handler itself failed
    pub fn handler_error(&self) -> Option<&SharedError> {
        match self {
            LoggerError::ActionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
