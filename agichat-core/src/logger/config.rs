// Logger configuration

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Entries kept by the in-memory store; oldest are evicted first
    pub max_entries: usize,
    /// Call the breakpoint hook for DEV, error, and critical entries
    pub debugger_break: bool,
    /// Forward error and critical entries to the exception reporter
    pub reporting: bool,
    /// Source tag for calls that do not name one
    pub default_source: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            debugger_break: true,
            reporting: true,
            default_source: "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LoggerConfig = serde_json::from_str(r#"{"max_entries": 10}"#).unwrap();
        assert_eq!(config.max_entries, 10);
        assert!(config.reporting);
        assert_eq!(config.default_source, "unknown");
    }
}
