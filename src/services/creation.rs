//! Creation orchestration: the one-shot first-image flow.

use std::collections::HashMap;

use crate::services::gemini::{
    resolve_model, GeminiClient, GenerateOptions, GenerationError, InlineData, ModelKind, Part,
    ProviderTurn, ResultImage, Speaker, MAX_UPLOAD_ATTACHMENTS,
};
use crate::services::presets::{resolve_aspect_ratio, Preset};
use crate::services::prompt::compose_prompt;

#[derive(Debug)]
pub struct CreationResult {
    pub images: Vec<ResultImage>,
    pub text: String,
}

/// Generate the first image for a preset: compose the prompt, route the
/// model, and run either the one-shot image path or a single-turn
/// conversational request.
pub async fn create_content(
    client: &GeminiClient,
    preset: &Preset,
    form: &HashMap<String, String>,
    references: &[InlineData],
    use_economy: bool,
) -> Result<CreationResult, GenerationError> {
    let prompt = compose_prompt(preset, form);
    let aspect_ratio = resolve_aspect_ratio(preset, form);
    let model = resolve_model(preset, form, use_economy);

    log::info!(
        "Creation request: model={}, aspect_ratio={}",
        model.display_name(),
        aspect_ratio
    );

    if model == ModelKind::Imagen4 {
        // The image model expects English prompts; translation is
        // best-effort and never fails the request.
        let english_prompt = client.translate_prompt(&prompt).await;
        let generated = client.generate_images(&english_prompt, aspect_ratio).await?;

        let images = generated
            .into_iter()
            .map(|inline| ResultImage::from_inline(inline, &prompt, model))
            .collect();

        return Ok(CreationResult {
            images,
            text: String::new(),
        });
    }

    // Conversational path: a single user turn with references first, then
    // the prompt text.
    let mut parts: Vec<Part> = Vec::new();
    for reference in references.iter().take(MAX_UPLOAD_ATTACHMENTS) {
        parts.push(Part::inline(reference.clone()));
    }
    parts.push(Part::text(prompt.as_str()));

    let contents = vec![ProviderTurn {
        role: Speaker::User,
        parts,
    }];

    let options = GenerateOptions {
        system_instruction: preset.system_instruction,
        aspect_ratio: Some(aspect_ratio),
        // Web-search augmentation is a professional-model capability; the
        // economy variant rejects it.
        enable_search: model == ModelKind::Gemini3Pro,
    };

    let response = client.generate_content(model, contents, &options).await?;

    if response.is_halted() {
        return Err(GenerationError::stopped(
            response.finish_reason.unwrap_or_default(),
        ));
    }

    Ok(CreationResult {
        images: response.result_images(&prompt, model),
        text: response.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::StudioConfig;
    use crate::services::presets::{preset_by_id, PresetId};

    #[tokio::test]
    async fn test_missing_key_surfaces_as_error() {
        let client = GeminiClient::new(StudioConfig::default());
        let preset = preset_by_id(PresetId::PortraitPro).unwrap();

        let result = create_content(&client, preset, &HashMap::new(), &[], false).await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey { .. })));
    }
}
