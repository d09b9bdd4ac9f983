// Chat messages: one turn in a conversation, rendered solely from its fragments
// Helpers here are pure: they build new values and never fail

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fragments::{
    create_placeholder_void_fragment, create_text_content_fragment, duplicate_fragments,
    AttachmentPart, ContentPart, Fragment, FragmentKind,
};
use crate::ids::{agi_uuid, IdNamespace};

pub type MessageId = String;

/// Separator used when reducing fragments to plain text
pub const DEFAULT_FRAGMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    /// Render order; the only source of the message's content
    pub fragments: Vec<Fragment>,

    /// True while generation is in flight; never persisted
    #[serde(skip)]
    pub pending_incomplete: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<MessageGenerator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_flags: Vec<MessageUserFlag>,

    /// Cached token count, 0 when not yet computed
    #[serde(default)]
    pub token_count: u32,

    /// Milliseconds since the epoch
    pub created: i64,
    /// None while the message is incomplete
    pub updated: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    /// Text this message was in reply to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reference_to: Option<Vec<MetaReferenceItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entangled: Option<MessageEntangled>,
}

/// A quoted snippet of text, with the role that wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReferenceItem {
    #[serde(default)]
    pub mrt: MetaReferenceType,
    pub m_text: String,
    pub m_role: MessageRole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaReferenceType {
    /// Quoted from another message
    #[default]
    #[serde(rename = "dmsg")]
    Dmsg,
}

/// Membership in a group of messages sent to several chats at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntangled {
    pub id: String,
    /// Hex color shared by the group
    pub color: String,
    /// Number of chats the message was sent to
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageUserFlag {
    /// Not sent to the model during generation
    #[serde(rename = "aix.skip")]
    AixSkip,
    #[serde(rename = "starred")]
    Starred,
    #[serde(rename = "notify.complete")]
    NotifyComplete,
    #[serde(rename = "vnd.ant.cache.auto")]
    VndAntCacheAuto,
    #[serde(rename = "vnd.ant.cache.user")]
    VndAntCacheUser,
}

/// How an assistant message was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageGenerator {
    #[serde(flatten)]
    pub kind: GeneratorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<GenerateMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_stop_reason: Option<TokenStopReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mgt", rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Free-text source label, e.g. "web", "issue", "help"
    Named { name: String },
    /// A model call: the model name plus its stable vendor id
    Aix { name: String, aix: AixRef },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AixRef {
    #[serde(rename = "vId", alias = "vendorId")]
    pub vendor_id: String,
    #[serde(rename = "mId", alias = "modelId")]
    pub model_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStopReason {
    ClientAbort,
    Filter,
    Issue,
    OutOfTokens,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_cache_read: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_cache_write: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_reasoning: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_first_token_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_total_ms: Option<u64>,
}

// creation

pub fn create_message_empty(role: MessageRole) -> Message {
    create_message_from_fragments(role, Vec::new())
}

pub fn create_message_text_content(role: MessageRole, text: impl Into<String>) -> Message {
    create_message_from_fragments(role, vec![create_text_content_fragment(text)])
}

/// A message that is still being generated, showing placeholder text until content arrives
pub fn create_message_placeholder_incomplete(
    role: MessageRole,
    placeholder_text: impl Into<String>,
) -> Message {
    let mut message = create_message_from_fragments(
        role,
        vec![create_placeholder_void_fragment(placeholder_text)],
    );
    message.pending_incomplete = true;
    message
}

pub fn create_message_from_fragments(role: MessageRole, fragments: Vec<Fragment>) -> Message {
    Message {
        id: agi_uuid(IdNamespace::ChatMessage),
        role,
        fragments,
        pending_incomplete: false,
        purpose_id: None,
        metadata: None,
        generator: None,
        user_flags: Vec::new(),
        token_count: 0,
        created: chrono::Utc::now().timestamp_millis(),
        updated: None,
    }
}

// duplication
//
// Destructuring is exhaustive: a new field on Message, MessageMetadata, or
// MessageGenerator must be carried over here before this compiles.

/// Copy a message under a new id, with fresh fragment ids
pub fn duplicate_message(message: &Message, skip_void: bool) -> Message {
    let Message {
        id: _,
        role,
        fragments,
        pending_incomplete,
        purpose_id,
        metadata,
        generator,
        user_flags,
        token_count,
        created,
        updated,
    } = message;

    Message {
        id: agi_uuid(IdNamespace::ChatMessage),
        role: *role,
        fragments: duplicate_fragments(fragments, skip_void),
        pending_incomplete: *pending_incomplete,
        purpose_id: purpose_id.clone(),
        metadata: metadata.as_ref().map(duplicate_metadata),
        generator: generator.as_ref().map(duplicate_generator),
        user_flags: user_flags.clone(),
        token_count: *token_count,
        created: *created,
        updated: *updated,
    }
}

pub fn duplicate_metadata(metadata: &MessageMetadata) -> MessageMetadata {
    let MessageMetadata {
        in_reference_to,
        entangled,
    } = metadata;

    MessageMetadata {
        in_reference_to: in_reference_to.clone(),
        entangled: entangled.clone(),
    }
}

pub fn duplicate_generator(generator: &MessageGenerator) -> MessageGenerator {
    let MessageGenerator {
        kind,
        metrics,
        token_stop_reason,
    } = generator;

    let kind = match kind {
        GeneratorKind::Named { name } => GeneratorKind::Named { name: name.clone() },
        GeneratorKind::Aix { name, aix } => GeneratorKind::Aix {
            name: name.clone(),
            aix: aix.clone(),
        },
    };

    MessageGenerator {
        kind,
        metrics: metrics.clone(),
        token_stop_reason: *token_stop_reason,
    }
}

// status

/// True when the user aborted before the model produced anything
pub fn message_was_interrupted_at_start(message: &Message) -> bool {
    let aborted = message
        .generator
        .as_ref()
        .and_then(|g| g.token_stop_reason)
        == Some(TokenStopReason::ClientAbort);
    aborted && message.fragments.is_empty()
}

// user flags

pub fn user_flag_emoji(flag: MessageUserFlag) -> &'static str {
    match flag {
        MessageUserFlag::Starred => "⭐️",
        MessageUserFlag::AixSkip
        | MessageUserFlag::NotifyComplete
        | MessageUserFlag::VndAntCacheAuto
        | MessageUserFlag::VndAntCacheUser => "",
    }
}

pub fn message_has_user_flag(message: &Message, flag: MessageUserFlag) -> bool {
    message.user_flags.contains(&flag)
}

/// Compute the flag list with `flag` turned on or off.
/// Borrows the current list when nothing changes.
pub fn message_set_user_flag(
    message: &Message,
    flag: MessageUserFlag,
    on: bool,
) -> Cow<'_, [MessageUserFlag]> {
    let present = message.user_flags.contains(&flag);
    match (on, present) {
        (true, true) | (false, false) => Cow::Borrowed(&message.user_flags),
        (true, false) => {
            let mut flags = message.user_flags.clone();
            flags.push(flag);
            Cow::Owned(flags)
        }
        (false, true) => Cow::Owned(
            message
                .user_flags
                .iter()
                .copied()
                .filter(|f| *f != flag)
                .collect(),
        ),
    }
}

impl Message {
    pub fn has_user_flag(&self, flag: MessageUserFlag) -> bool {
        message_has_user_flag(self, flag)
    }

    /// Returns true if the flags changed
    pub fn set_user_flag(&mut self, flag: MessageUserFlag, on: bool) -> bool {
        if let Cow::Owned(flags) = message_set_user_flag(self, flag, on) {
            self.user_flags = flags;
            return true;
        }
        false
    }

    pub fn text(&self) -> String {
        message_fragments_reduce_text(&self.fragments, DEFAULT_FRAGMENT_SEPARATOR, false)
    }
}

// text reduction

/// Join the text carried by the fragments, in order.
/// Text and error content plus document attachments contribute; all other parts are skipped.
pub fn message_fragments_reduce_text(
    fragments: &[Fragment],
    separator: &str,
    exclude_attachments: bool,
) -> String {
    if fragments.is_empty() {
        return String::new();
    }

    fragments
        .iter()
        .filter_map(|fragment| fragment_text(fragment, exclude_attachments))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn fragment_text(fragment: &Fragment, exclude_attachments: bool) -> Option<&str> {
    match &fragment.kind {
        FragmentKind::Content { part } => match part {
            ContentPart::Text { text } => Some(text.as_str()),
            ContentPart::Error { error } => Some(error.as_str()),
            ContentPart::Reference { .. } | ContentPart::ImageRef(_) => None,
            // tool traffic is not conversation text
            ContentPart::ToolInvocation { .. } | ContentPart::ToolResponse { .. } => None,
            ContentPart::Sentinel => {
                tracing::warn!(fid = %fragment.fid, "reduce text: unexpected content part");
                None
            }
        },
        FragmentKind::Attachment { .. } if exclude_attachments => None,
        FragmentKind::Attachment { part, .. } => match part {
            AttachmentPart::Doc(doc) => Some(doc.data.text.as_str()),
            AttachmentPart::Reference { .. } | AttachmentPart::ImageRef(_) => None,
            AttachmentPart::Sentinel => {
                tracing::warn!(fid = %fragment.fid, "reduce text: unexpected attachment part");
                None
            }
        },
        FragmentKind::Void { .. } => None,
        FragmentKind::Sentinel => {
            tracing::warn!(fid = %fragment.fid, "reduce text: unexpected fragment type");
            None
        }
    }
}
