// Id generation for messages, fragments, and log records
// Every id is a v4 UUID prefixed with its namespace so ids never collide across kinds

use uuid::Uuid;

/// Namespaces for generated ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdNamespace {
    ChatMessage,
    ChatFragment,
    LogEntry,
    LogAction,
}

impl IdNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdNamespace::ChatMessage => "chat-dmessage",
            IdNamespace::ChatFragment => "chat-dfragment",
            IdNamespace::LogEntry => "logger-entry",
            IdNamespace::LogAction => "logger-action",
        }
    }
}

/// Generate a fresh id within a namespace
pub fn agi_uuid(namespace: IdNamespace) -> String {
    format!("{}-{}", namespace.prefix(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_prefixed() {
        let id = agi_uuid(IdNamespace::ChatMessage);
        assert!(id.starts_with("chat-dmessage-"));
        assert_eq!(id.len(), "chat-dmessage-".len() + 32);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..500)
            .map(|_| agi_uuid(IdNamespace::ChatFragment))
            .collect();
        assert_eq!(ids.len(), 500);
    }
}
