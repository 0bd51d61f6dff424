//! Banned-word veto for the free-text fragment.
//!
//! This is a plain lexical filter: a banned word anywhere in the lowercased
//! text rejects the whole fragment, including when it sits inside a longer
//! harmless word ("essex" trips "sex"). It knows nothing about synonyms,
//! spacing tricks or Unicode normalization.

pub const CUSTOM_TEXT_MAX_CHARS: usize = 30;

const BANNED_WORDS: &[&str] = &[
    "nude", "naked", "nsfw", "sex", "sexual", "porn", "xxx", "벗은", "나체", "야한", "섹시", "성적",
    "음란",
];

pub fn contains_banned_word(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BANNED_WORDS.iter().any(|word| lowered.contains(word))
}

/// Expects already-trimmed text. Returns an empty string when the text is
/// vetoed, otherwise the original text cut to the first 30 characters.
pub fn sanitize_custom_text(text: &str) -> String {
    if contains_banned_word(text) {
        return String::new();
    }
    text.chars().take(CUSTOM_TEXT_MAX_CHARS).collect()
}
