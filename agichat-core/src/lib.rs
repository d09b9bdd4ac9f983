// agichat Core Library
// Message fragments, message helpers, the client logger, and JSONL export

pub mod ids;
pub mod fragments;
pub mod message;
pub mod logger;
pub mod export;

// Re-export commonly used types
pub use fragments::{Fragment, FragmentKind, ContentPart, AttachmentPart, VoidPart};
pub use message::*;
pub use logger::{Logger, LoggerConfig, LoggerError, LogLevel, LogOptions, LogDetails, LogAction, LogEntry};
pub use export::JsonlWriter;
