use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Get current Unix timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

/// Backend model variants. `api_id` is the provider-facing identifier;
/// `display_name` is the user-facing label recorded on generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    Imagen4,
    Gemini3Pro,
    Gemini25Flash,
}

impl ModelKind {
    pub fn api_id(self) -> &'static str {
        match self {
            ModelKind::Imagen4 => "imagen-4.0-generate-001",
            ModelKind::Gemini3Pro => "gemini-3-pro-image-preview",
            ModelKind::Gemini25Flash => "gemini-2.5-flash-image",
        }
    }

    /// Label stored on `ResultImage::model`. The exact format is contractual:
    /// the professional label must keep a "3" followed by "Pro" because
    /// provenance checks later match on those substrings.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Imagen4 => "Imagen 4",
            ModelKind::Gemini3Pro => "Gemini 3 Pro",
            ModelKind::Gemini25Flash => "Gemini 2.5 Flash",
        }
    }

    pub fn is_conversational(self) -> bool {
        !matches!(self, ModelKind::Imagen4)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Conversation role, serialized with the provider's role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

/// Inline binary payload: media type plus base64-encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Smallest provider payload unit: a text fragment or an inline binary
/// attachment. `thought_signature` is the provider's provenance marker; it
/// stays attached to the part it signs so replaying a turn is byte-faithful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
        #[serde(
            rename = "thoughtSignature",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        thought_signature: Option<String>,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
        #[serde(
            rename = "thoughtSignature",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        thought_signature: Option<String>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought_signature: None,
        }
    }

    pub fn inline(inline_data: InlineData) -> Self {
        Part::Inline {
            inline_data,
            thought_signature: None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Part::Text { .. })
    }

    pub fn as_inline(&self) -> Option<&InlineData> {
        match self {
            Part::Inline { inline_data, .. } => Some(inline_data),
            Part::Text { .. } => None,
        }
    }
}

/// One entry of the provider-bound `contents` sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTurn {
    pub role: Speaker,
    pub parts: Vec<Part>,
}

/// A generated artifact. `model` is the producing-model label and the sole
/// ground truth for provenance checks; `provider_parts` keeps the raw
/// response parts so a refine session seeded from this image can replay the
/// provenance marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultImage {
    pub id: String,
    pub mime_type: String,
    pub data: String,
    pub prompt: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_parts: Option<Vec<Part>>,
    pub created_at_ms: u64,
}

impl ResultImage {
    /// New artifact from an inline response payload.
    pub fn from_inline(inline: InlineData, prompt: &str, model: ModelKind) -> Self {
        ResultImage {
            id: new_id("img"),
            mime_type: inline.mime_type,
            data: inline.data,
            prompt: prompt.to_string(),
            model: model.display_name().to_string(),
            provider_parts: None,
            created_at_ms: now_ms(),
        }
    }

    pub fn inline_data(&self) -> InlineData {
        InlineData {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// One step of a conversation as rendered. `provider_parts`, when present on
/// a model turn, is the provider's own attributable state (it may carry a
/// provenance marker); when absent the turn can only be reconstructed from
/// display data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub role: Speaker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ResultImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_parts: Option<Vec<Part>>,
    pub created_at_ms: u64,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Speaker::User,
            text: Some(text.into()),
            images: Vec::new(),
            provider_parts: None,
            created_at_ms: now_ms(),
        }
    }

    pub fn model_reply(text: Option<String>, images: Vec<ResultImage>, parts: Vec<Part>) -> Self {
        Turn {
            role: Speaker::Model,
            text: text.filter(|t| !t.is_empty()),
            images,
            provider_parts: if parts.is_empty() { None } else { Some(parts) },
            created_at_ms: now_ms(),
        }
    }

    /// Model turn carrying only failure text. Keeps the rendered conversation
    /// alternating after a failed request.
    pub fn model_failure(text: impl Into<String>) -> Self {
        Turn {
            role: Speaker::Model,
            text: Some(text.into()),
            images: Vec::new(),
            provider_parts: None,
            created_at_ms: now_ms(),
        }
    }

    /// Model turn seeded from a previously generated image (create flow
    /// hand-off into refine mode).
    pub fn model_seed(image: ResultImage) -> Self {
        Turn {
            role: Speaker::Model,
            text: None,
            provider_parts: image.provider_parts.clone(),
            created_at_ms: now_ms(),
            images: vec![image],
        }
    }
}

/// Parsed outcome of a conversational generation call.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub images: Vec<InlineData>,
    pub text: String,
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
}

impl ModelResponse {
    /// The provider produced nothing but reported a terminal stop reason.
    /// Surfaced as a soft failure, distinct from a thrown error.
    pub fn is_halted(&self) -> bool {
        self.images.is_empty() && self.text.is_empty() && self.finish_reason.is_some()
    }

    /// Build generated images from the inline parts of this response. Every
    /// image carries the full response parts so its provenance marker
    /// survives persistence and re-seeding.
    pub fn result_images(&self, prompt: &str, model: ModelKind) -> Vec<ResultImage> {
        self.images
            .iter()
            .map(|inline| {
                let mut image = ResultImage::from_inline(inline.clone(), prompt, model);
                if !self.parts.is_empty() {
                    image.provider_parts = Some(self.parts.clone());
                }
                image
            })
            .collect()
    }
}

// Wire shapes for `models/{id}:generateContent`, deserialized with the
// provider's field casing.
#[derive(Debug, Deserialize)]
pub(super) struct GenerateContentResponse {
    pub(super) candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Candidate {
    pub(super) content: Option<CandidateContent>,
    pub(super) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateContent {
    pub(super) parts: Option<Vec<Part>>,
}

impl GenerateContentResponse {
    pub(super) fn into_model_response(self) -> ModelResponse {
        let Some(candidate) = self.candidates.and_then(|mut c| {
            if c.is_empty() {
                None
            } else {
                Some(c.remove(0))
            }
        }) else {
            return ModelResponse::default();
        };

        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();

        let mut images = Vec::new();
        let mut text = String::new();
        for part in &parts {
            match part {
                Part::Inline { inline_data, .. } => images.push(inline_data.clone()),
                Part::Text { text: fragment, .. } => text.push_str(fragment),
            }
        }

        ModelResponse {
            images,
            text,
            parts,
            finish_reason: candidate.finish_reason,
        }
    }
}

// Wire shapes for `models/imagen-*:predict`.
#[derive(Debug, Deserialize)]
pub(super) struct PredictResponse {
    pub(super) predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Prediction {
    pub(super) bytes_base64_encoded: Option<String>,
    pub(super) mime_type: Option<String>,
}
