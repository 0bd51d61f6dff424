use super::filter::sanitize_custom_text;
use super::vocabulary::{self, lookup};
use super::{PromptPair, Selection, ValidationResult};

const BASE_PROMPT: &str = "full body shot, full body visible, head to toe, complete body in frame, high quality portrait, professional photography, 8k resolution, detailed, realistic";

const NEGATIVE_PROMPT: &str = "nsfw, nude, naked, sexual content, inappropriate, low quality, blurry, distorted, ugly, deformed, bad anatomy, extra limbs, mutated, disfigured, cartoon, anime, illustration, painting";

const SEPARATOR: &str = ", ";

/// Reports the first unset field in form order. Presence only: an unknown
/// label is still valid.
pub fn validate(selection: &Selection) -> ValidationResult {
    let checks = [
        (selection.gender.as_str(), "Please select a gender."),
        (selection.age.as_str(), "Please select an age range."),
        (selection.body_type.as_str(), "Please select a body type."),
        (selection.style.as_str(), "Please select a style."),
        (selection.personality.as_str(), "Please select a personality."),
        (selection.face_type.as_str(), "Please select a face shape."),
    ];

    for (value, message) in checks {
        if value.is_empty() {
            return ValidationResult::invalid(message);
        }
    }
    ValidationResult::ok()
}

pub fn build_prompt(selection: &Selection) -> String {
    let mut parts: Vec<&str> = vec![BASE_PROMPT];

    let fields = [
        (vocabulary::GENDER, selection.gender.as_str()),
        (vocabulary::AGE, selection.age.as_str()),
        (vocabulary::BODY_TYPE, selection.body_type.as_str()),
        (vocabulary::STYLE, selection.style.as_str()),
        (vocabulary::PERSONALITY, selection.personality.as_str()),
        (vocabulary::FACE_TYPE, selection.face_type.as_str()),
    ];
    parts.extend(
        fields
            .into_iter()
            .filter_map(|(table, value)| lookup(table, value)),
    );

    let custom = selection
        .custom_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(sanitize_custom_text)
        .filter(|text| !text.is_empty());
    if let Some(custom) = custom.as_deref() {
        parts.push(custom);
    }

    parts.join(SEPARATOR)
}

pub fn negative_prompt() -> &'static str {
    NEGATIVE_PROMPT
}

pub fn build_pair(selection: &Selection) -> PromptPair {
    PromptPair {
        prompt: build_prompt(selection),
        negative_prompt: negative_prompt().to_string(),
    }
}
