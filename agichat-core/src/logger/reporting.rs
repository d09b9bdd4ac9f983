// Side-effect collaborators of the logger: exception reporting and debugger breaks

use std::error::Error;

use color_eyre::Result;
use serde_json::{Map, Value};

use super::types::LogLevel;

/// Domain tag attached to every exception the logger forwards
pub const EXCEPTION_DOMAIN: &str = "client-logger";

/// External sink for exceptions (analytics, crash reporting).
/// The logger ignores both errors and panics coming out of it.
pub trait ExceptionReporter: Send + Sync {
    fn capture_exception(
        &self,
        error: &(dyn Error + Send + Sync + 'static),
        context: &Map<String, Value>,
    ) -> Result<()>;
}

/// Drops every exception
pub struct NoopReporter;

impl ExceptionReporter for NoopReporter {
    fn capture_exception(
        &self,
        _error: &(dyn Error + Send + Sync + 'static),
        _context: &Map<String, Value>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Emits exceptions as tracing events, for runs without an analytics backend
pub struct TracingReporter;

impl ExceptionReporter for TracingReporter {
    fn capture_exception(
        &self,
        error: &(dyn Error + Send + Sync + 'static),
        context: &Map<String, Value>,
    ) -> Result<()> {
        let context = serde_json::to_string(context)?;
        tracing::error!(target: "agichat::exceptions", %error, %context, "captured exception");
        Ok(())
    }
}

/// Hook invoked for DEV, error, and critical entries so a developer can stop on them
pub trait BreakpointHook: Send + Sync {
    fn maybe_break(&self, level: LogLevel, message: &str);
}

pub struct NoopBreakpoint;

impl BreakpointHook for NoopBreakpoint {
    fn maybe_break(&self, _level: LogLevel, _message: &str) {}
}
