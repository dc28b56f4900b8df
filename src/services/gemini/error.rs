use serde::{Deserialize, Serialize};

/// Failure taxonomy for provider calls. Classification inspects the
/// failure's message/status for known markers; anything unmatched surfaces
/// as `Unknown` carrying the raw message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationError {
    SafetyBlocked { message: String },
    Overloaded { message: String },
    InvalidRequest { message: String },
    Timeout { message: String },
    /// The provider finished without producing anything but reported a stop
    /// reason. A soft failure, not a transport error.
    Stopped { reason: String },
    MissingApiKey { message: String },
    Unknown { message: String },
}

impl GenerationError {
    pub fn safety_blocked(message: impl Into<String>) -> Self {
        Self::SafetyBlocked {
            message: message.into(),
        }
    }

    pub fn overloaded(message: impl Into<String>) -> Self {
        Self::Overloaded {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn stopped(reason: impl Into<String>) -> Self {
        Self::Stopped {
            reason: reason.into(),
        }
    }

    pub fn missing_api_key() -> Self {
        Self::MissingApiKey {
            message: "API key is missing. Set LUMINA_API_KEY or GEMINI_API_KEY.".to_string(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::SafetyBlocked { message }
            | Self::Overloaded { message }
            | Self::InvalidRequest { message }
            | Self::Timeout { message }
            | Self::MissingApiKey { message }
            | Self::Unknown { message } => message,
            Self::Stopped { reason } => reason,
        }
    }

    /// Short classification label embedded in user-facing failure text.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::SafetyBlocked { .. } => "content safety block",
            Self::Overloaded { .. } => "provider overloaded, retry later",
            Self::InvalidRequest { .. } => "malformed request",
            Self::Timeout { .. } => "timeout",
            Self::Stopped { .. } => "generation halted",
            Self::MissingApiKey { .. } => "missing API key",
            Self::Unknown { .. } => "unknown error",
        }
    }

    /// Failure text shown in the conversation.
    pub fn user_message(&self) -> String {
        match self {
            Self::Stopped { reason } => format!("Generation halted: {}", reason),
            other => format!("Request failed: {} ({})", other.message(), other.kind_label()),
        }
    }

    /// Map a provider failure onto the taxonomy. The markers mirror what the
    /// backend actually emits: `SAFETY`/`BLOCKED` strings on policy refusals,
    /// HTTP 503 or `overloaded` on capacity, HTTP 400 on bad payloads.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let upper = message.to_ascii_uppercase();

        if upper.contains("SAFETY") || upper.contains("BLOCKED") {
            return Self::SafetyBlocked { message };
        }
        if status == Some(503) || upper.contains("503") || upper.contains("OVERLOADED") || upper.contains("UNAVAILABLE") {
            return Self::Overloaded { message };
        }
        if status == Some(400) || upper.contains("400") || upper.contains("INVALID_ARGUMENT") {
            return Self::InvalidRequest { message };
        }
        if upper.contains("TIMEOUT") {
            return Self::Timeout { message };
        }
        Self::Unknown { message }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SafetyBlocked { message } => write!(f, "SafetyBlocked: {}", message),
            Self::Overloaded { message } => write!(f, "Overloaded: {}", message),
            Self::InvalidRequest { message } => write!(f, "InvalidRequest: {}", message),
            Self::Timeout { message } => write!(f, "Timeout: {}", message),
            Self::Stopped { reason } => write!(f, "Stopped: {}", reason),
            Self::MissingApiKey { message } => write!(f, "MissingApiKey: {}", message),
            Self::Unknown { message } => write!(f, "Unknown: {}", message),
        }
    }
}

impl std::error::Error for GenerationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_safety_markers() {
        assert!(matches!(
            GenerationError::classify(None, "candidate blocked by SAFETY"),
            GenerationError::SafetyBlocked { .. }
        ));
        assert!(matches!(
            GenerationError::classify(None, "request was blocked by content policy"),
            GenerationError::SafetyBlocked { .. }
        ));
    }

    #[test]
    fn test_classify_overloaded() {
        assert!(matches!(
            GenerationError::classify(Some(503), "Service Unavailable"),
            GenerationError::Overloaded { .. }
        ));
        assert!(matches!(
            GenerationError::classify(None, "model is overloaded"),
            GenerationError::Overloaded { .. }
        ));
    }

    #[test]
    fn test_classify_invalid_request() {
        assert!(matches!(
            GenerationError::classify(Some(400), "INVALID_ARGUMENT: bad turn order"),
            GenerationError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn test_classify_timeout_and_unknown() {
        assert!(matches!(
            GenerationError::classify(None, "Timeout: request took longer than 60000ms"),
            GenerationError::Timeout { .. }
        ));
        let err = GenerationError::classify(None, "something odd happened");
        match &err {
            GenerationError::Unknown { message } => {
                assert_eq!(message, "something odd happened")
            }
            other => panic!("expected Unknown, got {}", other),
        }
    }

    #[test]
    fn test_user_message_embeds_classification() {
        let err = GenerationError::classify(Some(503), "overloaded");
        assert!(err.user_message().contains("provider overloaded"));

        let halted = GenerationError::stopped("PROHIBITED_CONTENT");
        assert_eq!(
            halted.user_message(),
            "Generation halted: PROHIBITED_CONTENT"
        );
    }
}
