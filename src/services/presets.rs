//! Immutable preset catalog: the scenarios offered on the creation screen.
//!
//! Loaded once, never mutated at runtime. Each preset declares its form
//! fields, target aspect ratio, and which backend model family it targets;
//! the custom preset additionally exposes the aspect-ratio and model
//! overrides as form fields.

use std::collections::HashMap;

use crate::services::gemini::ModelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetId {
    ProductStudio,
    LogoDesign,
    PortraitPro,
    Storyboard,
    Infographic,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    Choice,
}

#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub kind: FieldKind,
    pub options: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub id: PresetId,
    pub name: &'static str,
    pub description: &'static str,
    pub model: ModelKind,
    pub aspect_ratio: &'static str,
    pub fields: &'static [FormField],
    pub system_instruction: Option<&'static str>,
}

const fn text_field(key: &'static str, label: &'static str, placeholder: &'static str) -> FormField {
    FormField {
        key,
        label,
        placeholder,
        kind: FieldKind::Text,
        options: &[],
    }
}

const fn multiline_field(
    key: &'static str,
    label: &'static str,
    placeholder: &'static str,
) -> FormField {
    FormField {
        key,
        label,
        placeholder,
        kind: FieldKind::Multiline,
        options: &[],
    }
}

const fn choice_field(
    key: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FormField {
    FormField {
        key,
        label,
        placeholder: "",
        kind: FieldKind::Choice,
        options,
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: PresetId::ProductStudio,
        name: "Product Studio",
        description: "Clean commercial product shots",
        model: ModelKind::Imagen4,
        aspect_ratio: "1:1",
        fields: &[
            text_field("product", "Product", "e.g. a ceramic coffee mug"),
            text_field("background", "Background", "e.g. white marble countertop"),
            choice_field(
                "lighting",
                "Lighting",
                &["Studio softbox", "Natural daylight", "Dramatic rim light"],
            ),
            text_field("mood", "Mood", "e.g. warm and minimal"),
        ],
        system_instruction: None,
    },
    Preset {
        id: PresetId::LogoDesign,
        name: "Logo Design",
        description: "Brand marks and logotypes",
        model: ModelKind::Imagen4,
        aspect_ratio: "1:1",
        fields: &[
            text_field("brand", "Brand name", "e.g. Northwind Coffee"),
            text_field("industry", "Industry", "e.g. specialty coffee roaster"),
            choice_field(
                "style",
                "Style",
                &["Flat minimal", "Vintage badge", "Geometric", "Hand drawn"],
            ),
            text_field("colors", "Colors", "e.g. deep green and cream"),
        ],
        system_instruction: None,
    },
    Preset {
        id: PresetId::PortraitPro,
        name: "Portrait Pro",
        description: "Studio-grade portrait photography",
        model: ModelKind::Gemini3Pro,
        aspect_ratio: "3:4",
        fields: &[
            text_field("subject", "Subject", "e.g. a violinist in her thirties"),
            text_field("outfit", "Outfit", "e.g. charcoal wool coat"),
            text_field("scene", "Scene", "e.g. rainy city street at night"),
            text_field("expression", "Expression", "e.g. quiet confidence"),
        ],
        system_instruction: Some(
            "You are a portrait photographer. Produce photorealistic portraits \
             with natural skin tones and shallow depth of field. Keep framing \
             and lighting consistent when the user asks for small edits.",
        ),
    },
    Preset {
        id: PresetId::Storyboard,
        name: "Storyboard",
        description: "Cinematic frames for scene planning",
        model: ModelKind::Gemini3Pro,
        aspect_ratio: "16:9",
        fields: &[
            multiline_field("scene", "Scene", "What happens in this frame?"),
            text_field("characters", "Characters", "Who is in the frame?"),
            choice_field("shot", "Shot", &["Wide", "Medium", "Close-up", "Over the shoulder"]),
            text_field("style", "Style", "e.g. graphic novel ink wash"),
        ],
        system_instruction: Some(
            "You are a storyboard artist. Compose readable cinematic frames \
             that emphasize staging and camera intent over fine detail.",
        ),
    },
    Preset {
        id: PresetId::Infographic,
        name: "Infographic",
        description: "Labeled explanatory graphics",
        model: ModelKind::Gemini3Pro,
        aspect_ratio: "4:5",
        fields: &[
            text_field("topic", "Topic", "e.g. how espresso extraction works"),
            multiline_field("points", "Key points", "One point per line"),
            choice_field("tone", "Tone", &["Editorial", "Playful", "Technical"]),
        ],
        system_instruction: Some(
            "You design infographics. Render short, legible labels and keep \
             every textual element spelled exactly as given.",
        ),
    },
    Preset {
        id: PresetId::Custom,
        name: "Custom",
        description: "Free-form prompt with full control",
        model: ModelKind::Gemini3Pro,
        aspect_ratio: "1:1",
        fields: &[
            multiline_field("prompt", "Prompt", "Describe the image you want"),
            choice_field(
                "aspectRatio",
                "Aspect ratio",
                &["1:1", "3:4", "4:3", "16:9", "9:16"],
            ),
            choice_field(
                "model",
                "Model",
                &["Gemini 3.0 Pro", "Gemini 2.5 Flash", "Imagen 4"],
            ),
        ],
        system_instruction: None,
    },
];

pub fn preset_by_id(id: PresetId) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Aspect ratio for a request: the form override (custom preset) wins over
/// the preset default.
pub fn resolve_aspect_ratio<'a>(preset: &'a Preset, form: &'a HashMap<String, String>) -> &'a str {
    form.get("aspectRatio")
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(preset.aspect_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        assert_eq!(PRESETS.len(), 6);
        for id in [
            PresetId::ProductStudio,
            PresetId::LogoDesign,
            PresetId::PortraitPro,
            PresetId::Storyboard,
            PresetId::Infographic,
            PresetId::Custom,
        ] {
            assert!(preset_by_id(id).is_some(), "missing preset {:?}", id);
        }
    }

    #[test]
    fn test_resolve_aspect_ratio_override() {
        let custom = preset_by_id(PresetId::Custom).unwrap();
        let mut form = HashMap::new();
        assert_eq!(resolve_aspect_ratio(custom, &form), "1:1");

        form.insert("aspectRatio".to_string(), "16:9".to_string());
        assert_eq!(resolve_aspect_ratio(custom, &form), "16:9");

        form.insert("aspectRatio".to_string(), "  ".to_string());
        assert_eq!(resolve_aspect_ratio(custom, &form), "1:1");
    }

    #[test]
    fn test_choice_fields_have_options() {
        for preset in PRESETS {
            for field in preset.fields {
                if field.kind == FieldKind::Choice {
                    assert!(!field.options.is_empty(), "{}.{}", preset.name, field.key);
                }
            }
        }
    }
}
