//! Shared configuration loading for the generation services.
//!
//! The front-end should never receive secrets; `StudioPublicConfig` is safe
//! to expose.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fixed ceiling for every outbound provider call. The wait is raced against
/// this timer; the wire call itself is not guaranteed to be aborted.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Configuration for the generative-image backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    pub api_base: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl StudioConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn normalize_api_base(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Load backend configuration from `.env`/environment.
///
/// Reads:
/// - `LUMINA_API_KEY` (fallback: `GEMINI_API_KEY`, `GOOGLE_API_KEY`)
/// - `LUMINA_API_BASE` (defaults to the public endpoint)
/// - `LUMINA_TIMEOUT_MS`
pub fn load_studio_config() -> StudioConfig {
    let _ = dotenvy::dotenv();

    let api_base = std::env::var("LUMINA_API_BASE")
        .ok()
        .map(|v| normalize_api_base(&v))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let api_key = std::env::var("LUMINA_API_KEY")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let timeout_ms = std::env::var("LUMINA_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    StudioConfig {
        api_base,
        api_key,
        timeout_ms,
    }
}

/// Public configuration returned to the front-end (secrets omitted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioPublicConfig {
    pub api_base: String,
    pub timeout_ms: u64,
    pub has_api_key: bool,
}

pub fn public_config() -> StudioPublicConfig {
    let config = load_studio_config();
    StudioPublicConfig {
        api_base: config.api_base,
        timeout_ms: config.timeout_ms,
        has_api_key: !config.api_key.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_base() {
        assert_eq!(
            normalize_api_base("https://generativelanguage.googleapis.com/v1beta/"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(
            normalize_api_base("  https://proxy.internal/v1beta  "),
            "https://proxy.internal/v1beta"
        );
    }

    #[test]
    fn test_default_config() {
        let config = StudioConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout(), Duration::from_millis(60_000));
        assert!(config.api_key.is_empty());
    }
}
