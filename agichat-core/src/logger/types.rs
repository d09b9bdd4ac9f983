// Log entry types: levels, details, options, and remediation actions

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{agi_uuid, IdNamespace};

pub type LogId = String;
pub type LogSource = String;

/// Failure returned by an action handler
pub type ActionError = Box<dyn Error + Send + Sync>;
/// An error shared between a log entry's details and the caller that saw it
pub type SharedError = Arc<dyn Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "DEV")]
    Dev,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "critical")]
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Dev => "DEV",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    pub fn triggers_debugger_break(&self) -> bool {
        matches!(self, LogLevel::Dev | LogLevel::Error | LogLevel::Critical)
    }

    /// Levels forwarded to the exception reporter
    pub fn is_reported(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Critical)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured details attached to a log call, kept as-is until serialized for storage
#[derive(Debug, Clone)]
pub enum LogDetails {
    Value(Value),
    Error(SharedError),
    /// An error plus extra context fields
    WithError {
        error: SharedError,
        context: Map<String, Value>,
    },
}

impl LogDetails {
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        LogDetails::Error(Arc::new(error))
    }

    pub fn with_error(error: SharedError, context: Map<String, Value>) -> Self {
        LogDetails::WithError { error, context }
    }

    /// The error worth reporting, if these details are or contain one
    pub fn reportable_error(&self) -> Option<&SharedError> {
        match self {
            LogDetails::Value(_) => None,
            LogDetails::Error(error) | LogDetails::WithError { error, .. } => Some(error),
        }
    }
}

impl From<Value> for LogDetails {
    fn from(value: Value) -> Self {
        LogDetails::Value(value)
    }
}

/// The async work behind a log entry action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(&self) -> Result<(), ActionError>;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    async fn run(&self) -> Result<(), ActionError> {
        (self)().await
    }
}

/// A user-triggerable remediation step attached to a log entry
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAction {
    pub id: String,
    pub label: String,
    #[serde(skip)]
    pub handler: Arc<dyn ActionHandler>,
    pub completed: bool,
}

impl LogAction {
    pub fn new(label: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
        LogAction {
            id: agi_uuid(IdNamespace::LogAction),
            label: label.into(),
            handler: Arc::new(handler),
            completed: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl fmt::Debug for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Storage-safe rendering of the details passed to the log call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub source: LogSource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<LogAction>,
    pub dismissed: bool,
}

impl LogEntry {
    pub fn has_pending_actions(&self) -> bool {
        self.actions.iter().any(|a| !a.completed)
    }
}

/// An entry as handed to the store, before it has an id or timestamp
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub level: LogLevel,
    pub message: String,
    pub details: Option<Value>,
    pub source: LogSource,
    pub actions: Vec<LogAction>,
}

/// Per-call options for `Logger::log`
#[derive(Debug, Default)]
pub struct LogOptions {
    pub source: Option<LogSource>,
    pub details: Option<LogDetails>,
    pub actions: Vec<LogAction>,
    pub skip_debugger_break: bool,
    pub skip_reporting: bool,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<LogSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn details(mut self, details: impl Into<LogDetails>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Append one action
    pub fn action(mut self, action: LogAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Replace the action list
    pub fn actions(mut self, actions: Vec<LogAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn skip_debugger_break(mut self) -> Self {
        self.skip_debugger_break = true;
        self
    }

    pub fn skip_reporting(mut self) -> Self {
        self.skip_reporting = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Oops;

    impl fmt::Display for Oops {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("oops")
        }
    }

    impl Error for Oops {}

    #[test]
    fn test_level_policies() {
        assert!(LogLevel::Dev.triggers_debugger_break());
        assert!(LogLevel::Critical.triggers_debugger_break());
        assert!(!LogLevel::Warn.triggers_debugger_break());

        assert!(LogLevel::Error.is_reported());
        assert!(!LogLevel::Dev.is_reported());
        assert!(!LogLevel::Info.is_reported());
    }

    #[test]
    fn test_level_serde() {
        assert_eq!(serde_json::to_value(LogLevel::Dev).unwrap(), json!("DEV"));
        assert_eq!(serde_json::to_value(LogLevel::Critical).unwrap(), json!("critical"));
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn test_reportable_error() {
        assert!(LogDetails::Value(json!({"a": 1})).reportable_error().is_none());
        assert!(LogDetails::error(Oops).reportable_error().is_some());

        let with = LogDetails::with_error(Arc::new(Oops), Map::new());
        assert_eq!(with.reportable_error().unwrap().to_string(), "oops");
    }

    #[test]
    fn test_options_builder() {
        let noop = || async { Ok::<(), ActionError>(()) };
        let options = LogOptions::new()
            .source("chat")
            .action(LogAction::new("Retry", noop).with_id("a1"))
            .action(LogAction::new("Ignore", noop))
            .skip_reporting();

        assert_eq!(options.source.as_deref(), Some("chat"));
        assert_eq!(options.actions.len(), 2);
        assert_eq!(options.actions[0].id, "a1");
        assert!(options.actions[1].id.starts_with("logger-action-"));
        assert!(options.skip_reporting);
        assert!(!options.skip_debugger_break);

        let replaced = options.actions(Vec::new());
        assert!(replaced.actions.is_empty());
    }
}
