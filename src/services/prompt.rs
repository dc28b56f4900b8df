//! Prompt composition for preset-driven generation.

use std::collections::HashMap;

use crate::services::presets::{Preset, PresetId};

/// Form keys that steer routing/configuration instead of prompt content.
const RESERVED_KEYS: &[&str] = &["aspectRatio", "model"];

/// Build the instruction string for a preset from its filled-in fields.
///
/// Structured presets concatenate `"{Key}: {value}. "` pairs after a short
/// scenario header, in the preset's declared field order; empty values and
/// routing keys are skipped. The custom preset passes its free-form prompt
/// through untouched.
pub fn compose_prompt(preset: &Preset, form: &HashMap<String, String>) -> String {
    if preset.id == PresetId::Custom {
        return form.get("prompt").cloned().unwrap_or_default();
    }

    let mut prompt = format!("{} Generation. ", preset.name);
    for field in preset.fields {
        if RESERVED_KEYS.contains(&field.key) {
            continue;
        }
        let Some(value) = form.get(field.key) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        prompt.push_str(&format!("{}: {}. ", capitalize(field.key), value));
    }
    prompt
}

/// Instruction sent to the text model when a prompt needs translating for
/// the image model. The reply is the translation and nothing else.
pub fn translation_request(text: &str) -> String {
    format!(
        "Translate the following Japanese text to English for an image \
         generation prompt. Only return the English translation, nothing \
         else.\n\nText: {}",
        text
    )
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
