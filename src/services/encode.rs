//! Reference-payload encoding: user-supplied image bytes in and out of the
//! inline transport representation (media type + base64 payload).

use base64::{engine::general_purpose, Engine as _};

use crate::services::gemini::InlineData;

impl InlineData {
    /// Encode raw attachment bytes for inline transport.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        InlineData {
            mime_type: mime_type.into(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, String> {
        general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| format!("Invalid base64 payload: {}", e))
    }

    /// Self-describing `data:` URL, the format the front-end renders and the
    /// original storage layer persisted.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a `data:{mime};base64,{payload}` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, data) = rest.split_once(";base64,")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(InlineData {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }
}
