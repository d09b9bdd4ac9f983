// Client logger: records diagnostic entries, reports exceptions, and runs entry actions

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{json, Map};

pub mod config;
pub mod error;
pub mod reporting;
pub mod serialize;
pub mod store;
pub mod types;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use reporting::{BreakpointHook, ExceptionReporter, NoopBreakpoint, NoopReporter, TracingReporter};
pub use serialize::{serialize_details, serialize_error};
pub use store::{LogStoreActions, MemoryLogStore};
pub use types::*;

use reporting::EXCEPTION_DOMAIN;

/// Logger facade over a log store.
/// Construct one at startup and pass it by reference.
pub struct Logger {
    store: Arc<dyn LogStoreActions>,
    reporter: Arc<dyn ExceptionReporter>,
    breakpoint: Arc<dyn BreakpointHook>,
    config: LoggerConfig,
}

impl Logger {
    pub fn new(
        store: Arc<dyn LogStoreActions>,
        reporter: Arc<dyn ExceptionReporter>,
        config: LoggerConfig,
    ) -> Self {
        Self {
            store,
            reporter,
            breakpoint: Arc::new(NoopBreakpoint),
            config,
        }
    }

    /// Logger over a fresh in-memory store sized from the config
    pub fn in_memory(reporter: Arc<dyn ExceptionReporter>, config: LoggerConfig) -> (Self, Arc<MemoryLogStore>) {
        let store = Arc::new(MemoryLogStore::new(config.max_entries));
        let logger = Self::new(store.clone(), reporter, config);
        (logger, store)
    }

    pub fn with_breakpoint_hook(mut self, hook: Arc<dyn BreakpointHook>) -> Self {
        self.breakpoint = hook;
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn dev(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Dev, message, options)
    }

    pub fn debug(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Debug, message, options)
    }

    pub fn info(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Info, message, options)
    }

    pub fn warn(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Warn, message, options)
    }

    pub fn error(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Error, message, options)
    }

    pub fn critical(&self, message: impl Into<String>, options: LogOptions) -> LogId {
        self.log(LogLevel::Critical, message, options)
    }

    /// Record an entry and return its id
    pub fn log(&self, level: LogLevel, message: impl Into<String>, options: LogOptions) -> LogId {
        let message = message.into();
        let LogOptions {
            source,
            details,
            actions,
            skip_debugger_break,
            skip_reporting,
        } = options;

        let source = source.unwrap_or_else(|| self.config.default_source.clone());
        let serialized = details.as_ref().map(serialize_details);

        if level.triggers_debugger_break() && self.config.debugger_break && !skip_debugger_break {
            self.breakpoint.maybe_break(level, &message);
        }

        if level.is_reported() && self.config.reporting && !skip_reporting {
            if let Some(ref details) = details {
                self.report_exception(level, &message, details, &source);
            }
        }

        mirror_to_tracing(level, &source, &message);

        self.store.add_entry(NewLogEntry {
            level,
            message,
            details: serialized,
            source,
            actions,
        })
    }

    /// Run an entry's action: the one named by `action_id`, else the first not yet completed.
    /// A failing handler leaves the action pending, logs an error entry, and hands back its error.
    pub async fn execute_action(&self, log_id: &str, action_id: Option<&str>) -> Result<(), LoggerError> {
        let entry = self
            .store
            .get_entry(log_id)
            .filter(|e| !e.actions.is_empty())
            .ok_or_else(|| LoggerError::NoActions {
                log_id: log_id.to_string(),
            })?;

        let action = entry
            .actions
            .iter()
            .find(|a| match action_id {
                Some(id) => a.id == id,
                None => !a.completed,
            })
            .ok_or_else(|| LoggerError::ActionNotFound {
                log_id: log_id.to_string(),
            })?;

        if action.completed {
            return Err(LoggerError::ActionAlreadyCompleted {
                log_id: log_id.to_string(),
                action_id: action.id.clone(),
            });
        }

        let handler = Arc::clone(&action.handler);
        match handler.run().await {
            Ok(()) => {
                self.store.mark_action_completed(log_id, Some(action.id.as_str()));
                Ok(())
            }
            Err(err) => {
                let err: SharedError = Arc::from(err);

                let mut context = Map::new();
                context.insert("originalLogId".into(), json!(log_id));
                self.error(
                    format!(
                        "Failed to execute action \"{}\" for log: {}",
                        action.label, entry.message
                    ),
                    LogOptions::new()
                        .source(entry.source.clone())
                        .details(LogDetails::with_error(err.clone(), context)),
                );

                Err(LoggerError::ActionFailed {
                    log_id: log_id.to_string(),
                    action_id: action.id.clone(),
                    source: err,
                })
            }
        }
    }

    pub fn mark_action_completed(&self, log_id: &str, action_id: Option<&str>) {
        self.store.mark_action_completed(log_id, action_id);
    }

    pub fn mark_dismissed(&self, log_id: &str) {
        self.store.mark_dismissed(log_id);
    }

    pub fn pending_actions(&self) -> Vec<LogEntry> {
        self.store.pending_action_entries()
    }

    /// Forward an error to the reporter. Never fails: reporter errors and panics are dropped.
    fn report_exception(&self, level: LogLevel, message: &str, details: &LogDetails, source: &str) {
        let Some(error) = details.reportable_error() else {
            return;
        };

        let mut context = Map::new();
        context.insert("$exception_domain".into(), json!(EXCEPTION_DOMAIN));
        context.insert("level".into(), json!(level.as_str()));
        context.insert("source".into(), json!(source));
        context.insert("message".into(), json!(message));
        if let LogDetails::WithError { context: extra, .. } = details {
            for (key, value) in extra {
                context.insert(key.clone(), value.clone());
            }
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.reporter.capture_exception(error.as_ref(), &context)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::debug!(%err, "exception reporter failed"),
            Err(_) => tracing::debug!("exception reporter panicked"),
        }
    }
}

fn mirror_to_tracing(level: LogLevel, source: &str, message: &str) {
    match level {
        LogLevel::Dev => tracing::debug!(target: "agichat::dev", source, "{}", message),
        LogLevel::Debug => tracing::debug!(source, "{}", message),
        LogLevel::Info => tracing::info!(source, "{}", message),
        LogLevel::Warn => tracing::warn!(source, "{}", message),
        LogLevel::Error => tracing::error!(source, "{}", message),
        LogLevel::Critical => tracing::error!(source, critical = true, "{}", message),
    }
}
