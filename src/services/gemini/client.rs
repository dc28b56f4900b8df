use std::future::Future;

use serde_json::json;

use crate::services::config::StudioConfig;
use crate::services::prompt::translation_request;

use super::error::GenerationError;
use super::types::{
    GenerateContentResponse, InlineData, ModelKind, ModelResponse, PredictResponse, ProviderTurn,
};

/// Text model used for best-effort prompt translation. Separate from the
/// image-capable variants: translation is plain text in, text out.
const TRANSLATION_MODEL: &str = "gemini-2.5-flash";

/// Per-request configuration for conversational generation. The professional
/// variant additionally supports the web-search tool; the economy variant
/// does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions<'a> {
    pub system_instruction: Option<&'a str>,
    pub aspect_ratio: Option<&'a str>,
    pub enable_search: bool,
}

/// HTTP client for the generative-image backend.
///
/// One instance per session; the inner `reqwest::Client` pools connections.
/// Every call is raced against the configured timeout and surfaces a
/// classified `GenerationError`. No automatic retries: resubmission is a
/// user action.
pub struct GeminiClient {
    http: reqwest::Client,
    config: StudioConfig,
}

impl GeminiClient {
    pub fn new(config: StudioConfig) -> Self {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http, config }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        if self.config.api_key.is_empty() {
            return Err(GenerationError::missing_api_key());
        }
        Ok(&self.config.api_key)
    }

    fn model_url(&self, model_id: &str, action: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            model_id,
            action
        )
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, GenerationError>>,
    {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(format!(
                "Timeout: request took longer than {}ms",
                self.config.timeout_ms
            ))),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, GenerationError> {
        let key = self.api_key()?.to_string();

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GenerationError::timeout(format!("Timeout: {}", err))
                } else {
                    GenerationError::unknown(format!("Request failed to send: {}", err))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::classify(
                Some(status),
                format!("Backend error ({}): {}", status, error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::unknown(format!("Failed to parse response: {}", e)))
    }

    /// Multi-turn conversational generation, optionally producing images.
    pub async fn generate_content(
        &self,
        model: ModelKind,
        contents: Vec<ProviderTurn>,
        options: &GenerateOptions<'_>,
    ) -> Result<ModelResponse, GenerationError> {
        let mut body = json!({ "contents": contents });
        if let Some(instruction) = options.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        if let Some(aspect_ratio) = options.aspect_ratio {
            body["generationConfig"] = json!({ "imageConfig": { "aspectRatio": aspect_ratio } });
        }
        if options.enable_search {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        let url = self.model_url(model.api_id(), "generateContent");
        log::info!("Conversational generation: model={}", model.api_id());

        let raw = self.with_timeout(self.post_json(&url, &body)).await?;
        let parsed: GenerateContentResponse = serde_json::from_value(raw)
            .map_err(|e| GenerationError::unknown(format!("Unexpected response shape: {}", e)))?;

        Ok(parsed.into_model_response())
    }

    /// One-shot image generation on the non-conversational model. Always a
    /// single PNG at the requested aspect ratio.
    pub async fn generate_images(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<Vec<InlineData>, GenerationError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": aspect_ratio,
                "outputMimeType": "image/png"
            }
        });

        let url = self.model_url(ModelKind::Imagen4.api_id(), "predict");
        log::info!("One-shot image generation: aspect_ratio={}", aspect_ratio);

        let raw = self.with_timeout(self.post_json(&url, &body)).await?;
        let parsed: PredictResponse = serde_json::from_value(raw)
            .map_err(|e| GenerationError::unknown(format!("Unexpected response shape: {}", e)))?;

        let images = parsed
            .predictions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|prediction| {
                prediction.bytes_base64_encoded.map(|data| InlineData {
                    mime_type: prediction
                        .mime_type
                        .unwrap_or_else(|| "image/png".to_string()),
                    data,
                })
            })
            .collect();

        Ok(images)
    }

    /// Best-effort prompt translation for the image model. Any failure falls
    /// back silently to the untranslated text; this must never fail the
    /// surrounding request.
    pub async fn translate_prompt(&self, text: &str) -> String {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": translation_request(text) }]
            }]
        });
        let url = self.model_url(TRANSLATION_MODEL, "generateContent");

        let raw = match self.with_timeout(self.post_json(&url, &body)).await {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("Translation failed, using original text: {}", err);
                return text.to_string();
            }
        };

        let translated = serde_json::from_value::<GenerateContentResponse>(raw)
            .map(|parsed| parsed.into_model_response().text)
            .unwrap_or_default();

        if translated.trim().is_empty() {
            text.to_string()
        } else {
            translated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url_building() {
        let client = GeminiClient::new(StudioConfig {
            api_base: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            api_key: "k".to_string(),
            timeout_ms: 1000,
        });

        assert_eq!(
            client.model_url("gemini-3-pro-image-preview", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
        assert_eq!(
            client.model_url("imagen-4.0-generate-001", "predict"),
            "https://generativelanguage.googleapis.com/v1beta/models/imagen-4.0-generate-001:predict"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected_before_the_wire() {
        let client = GeminiClient::new(StudioConfig::default());
        let result = client
            .generate_content(ModelKind::Gemini25Flash, Vec::new(), &GenerateOptions::default())
            .await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey { .. })));
    }

    #[tokio::test]
    async fn test_translation_falls_back_on_failure() {
        // No API key: the call fails locally and the original text survives.
        let client = GeminiClient::new(StudioConfig::default());
        assert_eq!(client.translate_prompt("夕暮れの灯台").await, "夕暮れの灯台");
    }
}
