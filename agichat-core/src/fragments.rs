// Message fragments: the ordered content, attachment, and void units of a message
// Fragment families are tagged with `ft`, parts within a family with `pt`

use serde::{Deserialize, Serialize};

use crate::ids::{agi_uuid, IdNamespace};

pub type FragmentId = String;

/// One unit of a message, unique within its owning message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub fid: FragmentId,
    #[serde(flatten)]
    pub kind: FragmentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ft", rename_all = "snake_case")]
pub enum FragmentKind {
    /// Produced by the conversation itself (user typing, model output)
    Content { part: ContentPart },
    /// Supplied alongside a message (documents, images, references)
    Attachment {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        part: AttachmentPart,
    },
    /// Never sent to a model: placeholders and auxiliary output
    Void { part: VoidPart },
    /// Any fragment type this build does not know about
    #[serde(rename = "_ft_sentinel", other)]
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pt", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Error { error: String },
    Reference { reference: ReferenceItem },
    ImageRef(ImageRefPart),
    ToolInvocation {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<String>,
    },
    ToolResponse {
        id: String,
        name: String,
        response: String,
        #[serde(default)]
        error: bool,
    },
    /// Any part type this build does not know about
    #[serde(rename = "_pt_sentinel", other)]
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pt", rename_all = "snake_case")]
pub enum AttachmentPart {
    Doc(DocPart),
    Reference { reference: ReferenceItem },
    ImageRef(ImageRefPart),
    #[serde(rename = "_pt_sentinel", other)]
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pt", rename_all = "snake_case")]
pub enum VoidPart {
    Placeholder { text: String },
    ModelAux {
        #[serde(rename = "auxType")]
        aux_type: ModelAuxType,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelAuxType {
    Reasoning,
}

/// A document attachment: the text is what gets sent, `vdt` is how it is viewed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocPart {
    pub vdt: String,
    pub doc_ref: String,
    pub l1_title: String,
    pub data: DocData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocData {
    pub mime: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRefPart {
    pub data_ref: DataRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reftype", rename_all = "snake_case")]
pub enum DataRef {
    Url { url: String },
    Dblob {
        #[serde(rename = "assetId")]
        asset_id: String,
        mime: String,
    },
}

impl Fragment {
    fn with_kind(kind: FragmentKind) -> Self {
        Fragment {
            fid: agi_uuid(IdNamespace::ChatFragment),
            kind,
        }
    }
}

// creation

pub fn create_text_content_fragment(text: impl Into<String>) -> Fragment {
    Fragment::with_kind(FragmentKind::Content {
        part: ContentPart::Text { text: text.into() },
    })
}

pub fn create_error_content_fragment(error: impl Into<String>) -> Fragment {
    Fragment::with_kind(FragmentKind::Content {
        part: ContentPart::Error { error: error.into() },
    })
}

pub fn create_placeholder_void_fragment(text: impl Into<String>) -> Fragment {
    Fragment::with_kind(FragmentKind::Void {
        part: VoidPart::Placeholder { text: text.into() },
    })
}

pub fn create_model_aux_void_fragment(aux_type: ModelAuxType, text: impl Into<String>) -> Fragment {
    Fragment::with_kind(FragmentKind::Void {
        part: VoidPart::ModelAux { aux_type, text: text.into() },
    })
}

/// Create a document attachment holding plain text
pub fn create_doc_attachment_fragment(
    title: impl Into<String>,
    caption: Option<String>,
    vdt: impl Into<String>,
    data: DocData,
    doc_ref: impl Into<String>,
) -> Fragment {
    let title = title.into();
    Fragment::with_kind(FragmentKind::Attachment {
        title: title.clone(),
        caption,
        part: AttachmentPart::Doc(DocPart {
            vdt: vdt.into(),
            doc_ref: doc_ref.into(),
            l1_title: title,
            data,
        }),
    })
}

// predicates

pub fn is_content_fragment(fragment: &Fragment) -> bool {
    matches!(fragment.kind, FragmentKind::Content { .. })
}

pub fn is_attachment_fragment(fragment: &Fragment) -> bool {
    matches!(fragment.kind, FragmentKind::Attachment { .. })
}

pub fn is_void_fragment(fragment: &Fragment) -> bool {
    matches!(fragment.kind, FragmentKind::Void { .. })
}

// duplication

/// Deep-copy a fragment under a fresh id
pub fn duplicate_fragment(fragment: &Fragment) -> Fragment {
    Fragment::with_kind(fragment.kind.clone())
}

/// Deep-copy a fragment list, optionally dropping void fragments; order is kept
pub fn duplicate_fragments(fragments: &[Fragment], skip_void: bool) -> Vec<Fragment> {
    fragments
        .iter()
        .filter(|f| !(skip_void && is_void_fragment(f)))
        .map(duplicate_fragment)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predicates() {
        let text = create_text_content_fragment("hi");
        let void = create_placeholder_void_fragment("...");
        let doc = create_doc_attachment_fragment(
            "notes.md",
            None,
            "text/markdown",
            DocData { mime: "text/plain".into(), text: "body".into() },
            "notes.md",
        );

        assert!(is_content_fragment(&text));
        assert!(is_void_fragment(&void));
        assert!(is_attachment_fragment(&doc));
        assert!(!is_void_fragment(&text));
    }

    #[test]
    fn test_duplicate_fragments_fresh_ids() {
        let fragments = vec![
            create_text_content_fragment("a"),
            create_placeholder_void_fragment("wait"),
            create_error_content_fragment("boom"),
        ];

        let copies = duplicate_fragments(&fragments, false);
        assert_eq!(copies.len(), 3);
        for (orig, copy) in fragments.iter().zip(&copies) {
            assert_ne!(orig.fid, copy.fid);
            assert_eq!(orig.kind, copy.kind);
        }
    }

    #[test]
    fn test_duplicate_fragments_skip_void() {
        let fragments = vec![
            create_placeholder_void_fragment("wait"),
            create_text_content_fragment("a"),
            create_model_aux_void_fragment(ModelAuxType::Reasoning, "thinking"),
            create_text_content_fragment("b"),
        ];

        let copies = duplicate_fragments(&fragments, true);
        let texts: Vec<_> = copies
            .iter()
            .map(|f| match &f.kind {
                FragmentKind::Content { part: ContentPart::Text { text } } => text.as_str(),
                _ => panic!("unexpected fragment kind"),
            })
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_serde_shape() {
        let fragment = create_text_content_fragment("hello");
        let value = serde_json::to_value(&fragment).unwrap();
        assert_eq!(value["ft"], "content");
        assert_eq!(value["part"]["pt"], "text");
        assert_eq!(value["part"]["text"], "hello");

        let back: Fragment = serde_json::from_value(value).unwrap();
        assert_eq!(back, fragment);
    }

    #[test]
    fn test_unknown_part_becomes_sentinel() {
        let value = json!({
            "fid": "f1",
            "ft": "content",
            "part": { "pt": "hologram", "frames": 3 }
        });
        let fragment: Fragment = serde_json::from_value(value).unwrap();
        assert_eq!(
            fragment.kind,
            FragmentKind::Content { part: ContentPart::Sentinel }
        );
    }

    #[test]
    fn test_unknown_fragment_type_becomes_sentinel() {
        let value = json!({
            "fid": "f2",
            "ft": "sticker",
            "part": { "pt": "emoji", "code": "tada" }
        });
        let fragment: Fragment = serde_json::from_value(value).unwrap();
        assert_eq!(fragment.fid, "f2");
        assert_eq!(fragment.kind, FragmentKind::Sentinel);
        assert!(!is_content_fragment(&fragment));
        assert!(!is_void_fragment(&fragment));
    }

    #[test]
    fn test_part_fields_are_camel_case() {
        let doc = create_doc_attachment_fragment(
            "notes.md",
            None,
            "text/markdown",
            DocData { mime: "text/plain".into(), text: "body".into() },
            "doc-1",
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["part"]["docRef"], "doc-1");
        assert_eq!(value["part"]["l1Title"], "notes.md");

        let aux = create_model_aux_void_fragment(ModelAuxType::Reasoning, "thinking");
        let value = serde_json::to_value(&aux).unwrap();
        assert_eq!(value["part"]["auxType"], "reasoning");

        let image: ImageRefPart = serde_json::from_value(json!({
            "dataRef": { "reftype": "dblob", "assetId": "a1", "mime": "image/png" },
            "altText": "chart"
        }))
        .unwrap();
        assert_eq!(image.alt_text.as_deref(), Some("chart"));
        assert_eq!(
            image.data_ref,
            DataRef::Dblob { asset_id: "a1".into(), mime: "image/png".into() }
        );
    }
}
