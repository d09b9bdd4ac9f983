// JSONL import/export for messages and log entries
// Writes under $AGICHAT_EXPORT_DIR, or ~/Assistants/agichat-exports, unless a base directory is given

use color_eyre::{
    eyre::{eyre, Context},
    Result,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::logger::LogEntry;
use crate::message::Message;

/// Overrides the default export directory
pub const EXPORT_DIR_ENV: &str = "AGICHAT_EXPORT_DIR";

/// JSONL writer rooted at a base directory
pub struct JsonlWriter {
    base_dir: PathBuf,
}

impl JsonlWriter {
    /// Writer rooted at the export directory taken from the environment
    pub fn from_env() -> Result<Self> {
        let base_dir =
            default_export_dir(std::env::var_os(EXPORT_DIR_ENV), std::env::var_os("HOME"))?;
        Ok(JsonlWriter { base_dir })
    }

    /// Create a new writer with custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        JsonlWriter { base_dir }
    }

    /// File name of the form `<prefix>-YYYY-MM-DD.jsonl` for today
    pub fn dated_file_name(prefix: &str) -> String {
        format!("{}-{}.jsonl", prefix, chrono::Utc::now().format("%Y-%m-%d"))
    }

    /// Write log entries, one per line, replacing the file. Action handlers are not written.
    pub fn write_log_entries(&self, file_name: &str, entries: &[LogEntry]) -> Result<PathBuf> {
        self.write_lines(file_name, entries)
    }

    /// Append log entries to the file, creating it if missing
    pub fn append_log_entries(&self, file_name: &str, entries: &[LogEntry]) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create directory: {}", self.base_dir.display()))?;

        let path = self.base_dir.join(file_name);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)?;
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// Write messages, one per line, replacing the file
    pub fn write_messages(&self, file_name: &str, messages: &[Message]) -> Result<PathBuf> {
        self.write_lines(file_name, messages)
    }

    fn write_lines<T: Serialize>(&self, file_name: &str, items: &[T]) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create directory: {}", self.base_dir.display()))?;

        let path = self.base_dir.join(file_name);
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for item in items {
            serde_json::to_writer(&mut writer, item)?;
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// `explicit` wins; otherwise `<home>/Assistants/agichat-exports`
fn default_export_dir(explicit: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = explicit.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home.ok_or_else(|| eyre!("HOME not set and {} not given", EXPORT_DIR_ENV))?;
    Ok(PathBuf::from(home).join("Assistants").join("agichat-exports"))
}

/// Parse messages from a JSON array or from JSONL, one result per message
pub fn parse_messages(content: &str) -> Result<Vec<Result<Message, serde_json::Error>>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).context("Failed to parse message array")?;
        return Ok(values.into_iter().map(serde_json::from_value::<Message>).collect());
    }

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<Message>)
        .collect())
}

pub fn read_messages(path: &Path) -> Result<Vec<Result<Message, serde_json::Error>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_messages(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogOptions, Logger, LoggerConfig, NoopReporter};
    use crate::message::{create_message_text_content, MessageRole};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_dated_file_name() {
        let name = JsonlWriter::dated_file_name("log");
        assert!(name.starts_with("log-"));
        assert!(name.ends_with(".jsonl"));
        assert_eq!(name.len(), "log-YYYY-MM-DD.jsonl".len());
    }

    #[test]
    fn test_write_and_read_messages() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let writer = JsonlWriter::with_base_dir(temp_dir.path().to_path_buf());

        let messages = vec![
            create_message_text_content(MessageRole::User, "question"),
            create_message_text_content(MessageRole::Assistant, "answer"),
        ];
        let path = writer.write_messages("chat.jsonl", &messages)?;

        let parsed = read_messages(&path)?;
        assert_eq!(parsed.len(), 2);
        let back: Vec<Message> = parsed.into_iter().collect::<Result<_, _>>()?;
        assert_eq!(back, messages);
        Ok(())
    }

    #[test]
    fn test_parse_array_and_bad_lines() -> Result<()> {
        let message = create_message_text_content(MessageRole::User, "hi");
        let array = serde_json::to_string(&vec![message.clone()])?;
        let parsed = parse_messages(&array)?;
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].is_ok());

        let jsonl = format!("{}\n\nnot json\n", serde_json::to_string(&message)?);
        let parsed = parse_messages(&jsonl)?;
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_ok());
        assert!(parsed[1].is_err());
        Ok(())
    }

    #[test]
    fn test_write_log_entries() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let writer = JsonlWriter::with_base_dir(temp_dir.path().join("logs"));
        let (logger, store) = Logger::in_memory(Arc::new(NoopReporter), LoggerConfig::default());
        logger.info("first", LogOptions::new().source("test"));
        logger.warn("second", LogOptions::new());

        let path = writer.write_log_entries("session.jsonl", &store.entries())?;
        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(first["message"], "first");
        assert_eq!(first["level"], "info");
        assert_eq!(first["source"], "test");

        let appended = writer.append_log_entries("session.jsonl", &store.entries()[1..])?;
        assert_eq!(appended, path);
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 3);
        Ok(())
    }

    #[test]
    fn test_append_creates_missing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let writer = JsonlWriter::with_base_dir(temp_dir.path().join("daily"));
        let (logger, store) = Logger::in_memory(Arc::new(NoopReporter), LoggerConfig::default());
        logger.error("broken line", LogOptions::new());

        let name = JsonlWriter::dated_file_name("agichat-log");
        let path = writer.append_log_entries(&name, &store.entries())?;
        writer.append_log_entries(&name, &store.entries())?;
        assert!(path.starts_with(temp_dir.path().join("daily")));
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_default_export_dir() -> Result<()> {
        let dir = default_export_dir(Some("/srv/exports".into()), Some("/home/me".into()))?;
        assert_eq!(dir, PathBuf::from("/srv/exports"));

        let dir = default_export_dir(Some("".into()), Some("/home/me".into()))?;
        assert_eq!(dir, PathBuf::from("/home/me/Assistants/agichat-exports"));

        assert!(default_export_dir(None, None).is_err());
        Ok(())
    }
}
