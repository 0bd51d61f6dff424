pub mod builder;
pub mod filter;
pub mod vocabulary;

use serde::{Deserialize, Deserializer, Serialize};

pub use builder::{build_pair, build_prompt, negative_prompt, validate};

/// Attributes chosen on the form. Values are not checked against the
/// vocabulary here; unknown ones simply contribute nothing to the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub age: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub style: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub personality: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub face_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}

// Forms send `null` for an unselected field; treat it like an empty value.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        ValidationResult {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ValidationResult {
            valid: false,
            error: Some(message.into()),
        }
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.valid {
            Ok(())
        } else {
            Err(self.error.unwrap_or_default())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPair {
    pub prompt: String,
    pub negative_prompt: String,
}
