//! Fixed lookup tables from selection labels to English prompt fragments.
//!
//! The canonical labels are the ones the web form submits. Every entry also
//! accepts an English alias so hand-written selections work from the CLI.

#[derive(Debug, Clone, Copy)]
pub struct VocabularyEntry {
    pub label: &'static str,
    pub alias: &'static str,
    pub fragment: &'static str,
}

const fn entry(
    label: &'static str,
    alias: &'static str,
    fragment: &'static str,
) -> VocabularyEntry {
    VocabularyEntry {
        label,
        alias,
        fragment,
    }
}

pub const GENDER: &[VocabularyEntry] = &[
    entry("남성", "masculine", "handsome man, masculine features"),
    entry("여성", "feminine", "beautiful woman, feminine features"),
    entry(
        "중성",
        "androgynous",
        "androgynous person, gender-neutral features",
    ),
];

pub const AGE: &[VocabularyEntry] = &[
    entry("10대", "teens", "teenager, youthful, age 15-19"),
    entry("20대", "twenties", "young adult, age 20-29"),
    entry("30대", "thirties", "adult, age 30-39"),
    entry("40대", "forties", "mature adult, age 40-49"),
];

pub const BODY_TYPE: &[VocabularyEntry] = &[
    entry("마른", "slim", "slim, slender body"),
    entry("보통", "average", "average build, normal body type"),
    entry("탄탄한", "athletic", "athletic, fit body, toned muscles"),
    entry("근육질", "muscular", "muscular, well-built physique"),
];

pub const STYLE: &[VocabularyEntry] = &[
    entry("캐주얼", "casual", "casual style, comfortable clothing"),
    entry("포멀", "formal", "formal attire, elegant suit or dress"),
    entry("스트리트", "streetwear", "streetwear, urban fashion, trendy"),
    entry("스포티", "sporty", "sporty style, athletic wear"),
    entry("빈티지", "vintage", "vintage fashion, retro style"),
    entry(
        "미니멀",
        "minimalist",
        "minimalist fashion, simple elegant clothing",
    ),
];

// Personality is rendered through facial expression.
pub const PERSONALITY: &[VocabularyEntry] = &[
    entry(
        "테토",
        "soft",
        "soft personality, gentle demeanor, warm and approachable, kind expression, friendly eyes",
    ),
    entry(
        "에겐",
        "sharp",
        "sharp personality, confident attitude, intense gaze, strong presence, charismatic expression",
    ),
    entry(
        "혼합",
        "balanced",
        "balanced personality, versatile character, adaptable expression",
    ),
];

pub const FACE_TYPE: &[VocabularyEntry] = &[
    entry("계란형", "oval", "oval face shape, balanced proportions"),
    entry("둥근형", "round", "round face shape, soft curves"),
    entry("각진형", "angular", "angular face shape, defined jawline"),
    entry("긴형", "long", "long face shape, elongated features"),
];

/// Field names paired with their tables, in prompt order.
pub const FIELDS: &[(&str, &[VocabularyEntry])] = &[
    ("gender", GENDER),
    ("age", AGE),
    ("bodyType", BODY_TYPE),
    ("style", STYLE),
    ("personality", PERSONALITY),
    ("faceType", FACE_TYPE),
];

/// Exact, case-sensitive match against either the label or the alias.
pub fn lookup(table: &[VocabularyEntry], value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|entry| entry.label == value || entry.alias == value)
        .map(|entry| entry.fragment)
}
