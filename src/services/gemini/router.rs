use std::collections::HashMap;

use crate::services::presets::{Preset, PresetId};

use super::types::ModelKind;

/// Resolve the backend model for a creation request.
///
/// Precedence: an explicit model choice on the custom preset beats the
/// economy flag, which beats the preset's own declared default. Non-custom
/// presets cannot override their model through the form.
pub fn resolve_model(
    preset: &Preset,
    form: &HashMap<String, String>,
    use_economy: bool,
) -> ModelKind {
    let custom_choice = if preset.id == PresetId::Custom {
        form.get("model").map(String::as_str).filter(|m| !m.is_empty())
    } else {
        None
    };

    if preset.model == ModelKind::Imagen4 || custom_choice == Some("Imagen 4") {
        return ModelKind::Imagen4;
    }

    let mut selected = if use_economy {
        ModelKind::Gemini25Flash
    } else {
        ModelKind::Gemini3Pro
    };

    if let Some(choice) = custom_choice {
        if choice.contains("2.5") {
            selected = ModelKind::Gemini25Flash;
        } else if choice.contains("3.0") {
            selected = ModelKind::Gemini3Pro;
        }
    }

    selected
}

/// Refinement always targets a conversational model; the only knob is the
/// quality/cost toggle.
pub fn resolve_refinement_model(use_economy: bool) -> ModelKind {
    if use_economy {
        ModelKind::Gemini25Flash
    } else {
        ModelKind::Gemini3Pro
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::presets::preset_by_id;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_preset_default_routing() {
        let product = preset_by_id(PresetId::ProductStudio).unwrap();
        assert_eq!(resolve_model(product, &form(&[]), false), ModelKind::Imagen4);
        // The economy flag cannot turn an image-model preset conversational.
        assert_eq!(resolve_model(product, &form(&[]), true), ModelKind::Imagen4);

        let portrait = preset_by_id(PresetId::PortraitPro).unwrap();
        assert_eq!(
            resolve_model(portrait, &form(&[]), false),
            ModelKind::Gemini3Pro
        );
        assert_eq!(
            resolve_model(portrait, &form(&[]), true),
            ModelKind::Gemini25Flash
        );
    }

    #[test]
    fn test_custom_choice_beats_economy_flag() {
        let custom = preset_by_id(PresetId::Custom).unwrap();
        assert_eq!(
            resolve_model(custom, &form(&[("model", "Gemini 3.0 Pro")]), true),
            ModelKind::Gemini3Pro
        );
        assert_eq!(
            resolve_model(custom, &form(&[("model", "Gemini 2.5 Flash")]), false),
            ModelKind::Gemini25Flash
        );
        assert_eq!(
            resolve_model(custom, &form(&[("model", "Imagen 4")]), true),
            ModelKind::Imagen4
        );
    }

    #[test]
    fn test_custom_without_choice_follows_economy_flag() {
        let custom = preset_by_id(PresetId::Custom).unwrap();
        assert_eq!(resolve_model(custom, &form(&[]), false), ModelKind::Gemini3Pro);
        assert_eq!(
            resolve_model(custom, &form(&[]), true),
            ModelKind::Gemini25Flash
        );
    }

    #[test]
    fn test_model_override_ignored_on_non_custom_presets() {
        let portrait = preset_by_id(PresetId::PortraitPro).unwrap();
        assert_eq!(
            resolve_model(portrait, &form(&[("model", "Imagen 4")]), false),
            ModelKind::Gemini3Pro
        );
    }

    #[test]
    fn test_refinement_routing() {
        assert_eq!(resolve_refinement_model(false), ModelKind::Gemini3Pro);
        assert_eq!(resolve_refinement_model(true), ModelKind::Gemini25Flash);
    }
}
