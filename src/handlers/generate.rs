use reqwest::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::llm::{ImageGenerationError, ImageGenerator, ImageRequest};
use crate::prompt::{self, Selection};

pub const MISSING_TOKEN_MESSAGE: &str =
    "The REPLICATE_API_TOKEN is not configured. Check your environment.";
pub const NO_OUTPUT_MESSAGE: &str = "Image generation failed. Please try again.";

/// Response envelope returned to whoever submitted the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutcome {
    pub status: StatusCode,
    pub body: GenerateResponse,
}

impl GenerateOutcome {
    fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        GenerateOutcome {
            status,
            body: GenerateResponse {
                success: false,
                error: Some(message.into()),
                ..GenerateResponse::default()
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }
}

fn error_message(err: &ImageGenerationError) -> String {
    match err {
        ImageGenerationError::MissingToken => MISSING_TOKEN_MESSAGE.to_string(),
        ImageGenerationError::NoOutput => NO_OUTPUT_MESSAGE.to_string(),
        other => format!("An error occurred during image generation: {other}"),
    }
}

pub async fn generate_image<G: ImageGenerator>(
    generator: &G,
    config: &Config,
    selection: &Selection,
) -> GenerateOutcome {
    if !generator.is_configured() {
        error!("Image generation requested but no Replicate token is configured");
        return GenerateOutcome::failure(StatusCode::INTERNAL_SERVER_ERROR, MISSING_TOKEN_MESSAGE);
    }

    if let Err(message) = prompt::validate(selection).into_result() {
        info!("Rejected selection: {}", message);
        return GenerateOutcome::failure(StatusCode::BAD_REQUEST, message);
    }

    let pair = prompt::build_pair(selection);
    info!("Generated prompt: {}", pair.prompt);
    info!("Negative prompt: {}", pair.negative_prompt);

    let request =
        ImageRequest::from_config(config, pair.prompt.clone(), pair.negative_prompt.clone());
    match generator.generate(&request).await {
        Ok(image_url) => GenerateOutcome {
            status: StatusCode::OK,
            body: GenerateResponse {
                success: true,
                image_url: Some(image_url),
                prompt: Some(pair.prompt),
                negative_prompt: Some(pair.negative_prompt),
                error: None,
            },
        },
        Err(err) => {
            match &err {
                ImageGenerationError::NoOutput => warn!("Image service returned no output"),
                other => error!("Image generation error: {}", other),
            }
            GenerateOutcome::failure(StatusCode::INTERNAL_SERVER_ERROR, error_message(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeGenerator {
        configured: bool,
        result: fn() -> Result<String, ImageGenerationError>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn new(result: fn() -> Result<String, ImageGenerationError>) -> Self {
            FakeGenerator {
                configured: true,
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ImageGenerator for FakeGenerator {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(&self, request: &ImageRequest) -> Result<String, ImageGenerationError> {
            assert_eq!(request.num_outputs, 1);
            assert_eq!((request.width, request.height), (768, 768));
            assert_eq!(request.num_inference_steps, 30);
            assert_eq!(request.scheduler, "K_EULER");
            assert!(request.prompt.starts_with("full body shot"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn test_config() -> Config {
        Config {
            log_level: "info".to_string(),
            replicate_api_token: "r8_test".to_string(),
            replicate_api_base: "https://api.test/v1".to_string(),
            replicate_model_version: "v".to_string(),
            replicate_poll_interval_ms: 200,
            replicate_poll_timeout_seconds: 10,
            http_timeout_seconds: 5,
            image_width: 768,
            image_height: 768,
            image_inference_steps: 30,
            image_guidance_scale: 6.0,
            image_scheduler: "K_EULER".to_string(),
        }
    }

    fn selection() -> Selection {
        Selection {
            gender: "남성".to_string(),
            age: "30대".to_string(),
            body_type: "근육질".to_string(),
            style: "포멀".to_string(),
            personality: "에겐".to_string(),
            face_type: "각진형".to_string(),
            custom_text: Some("short black hair".to_string()),
        }
    }

    #[tokio::test]
    async fn success_returns_url_and_prompt_pair() {
        let generator = FakeGenerator::new(|| Ok("https://cdn.test/out.png".to_string()));
        let outcome = generate_image(&generator, &test_config(), &selection()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.body.image_url.as_deref(), Some("https://cdn.test/out.png"));
        assert_eq!(
            outcome.body.prompt.as_deref(),
            Some(prompt::build_prompt(&selection()).as_str())
        );
        assert_eq!(
            outcome.body.negative_prompt.as_deref(),
            Some(prompt::negative_prompt())
        );
        assert!(outcome.body.prompt.unwrap().ends_with(", short black hair"));
    }

    #[tokio::test]
    async fn invalid_selection_is_a_client_error_without_calling_service() {
        let generator = FakeGenerator::new(|| Ok("https://cdn.test/out.png".to_string()));
        let mut incomplete = selection();
        incomplete.personality.clear();

        let outcome = generate_image(&generator, &test_config(), &incomplete).await;
        assert_eq!(outcome.status, StatusCode::BAD_REQUEST);
        assert_eq!(outcome.body.error.as_deref(), Some("Please select a personality."));
        assert!(!outcome.body.success);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credentials_is_a_server_error() {
        let mut generator = FakeGenerator::new(|| Ok("unused".to_string()));
        generator.configured = false;

        let outcome = generate_image(&generator, &test_config(), &selection()).await;
        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.body.error.as_deref(), Some(MISSING_TOKEN_MESSAGE));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_output_maps_to_retry_message() {
        let generator = FakeGenerator::new(|| Err(ImageGenerationError::NoOutput));
        let outcome = generate_image(&generator, &test_config(), &selection()).await;
        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.body.error.as_deref(), Some(NO_OUTPUT_MESSAGE));
        assert_eq!(outcome.body.image_url, None);
    }

    #[tokio::test]
    async fn service_error_detail_is_surfaced() {
        let generator = FakeGenerator::new(|| {
            Err(ImageGenerationError::Api {
                status: 422,
                message: "Invalid version".to_string(),
            })
        });
        let outcome = generate_image(&generator, &test_config(), &selection()).await;
        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            outcome.body.error.as_deref(),
            Some("An error occurred during image generation: image service returned status 422: Invalid version")
        );
    }

    #[test]
    fn envelope_serializes_camel_case_and_skips_absent_fields() {
        let body = GenerateOutcome::failure(StatusCode::BAD_REQUEST, "Please select a gender.").body;
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"success": false, "error": "Please select a gender."})
        );

        let ok = GenerateResponse {
            success: true,
            image_url: Some("https://cdn.test/a.png".to_string()),
            prompt: Some("p".to_string()),
            negative_prompt: Some("n".to_string()),
            error: None,
        };
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["imageUrl"], "https://cdn.test/a.png");
        assert_eq!(value["negativePrompt"], "n");
        assert!(value.get("error").is_none());
    }
}
