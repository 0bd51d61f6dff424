pub mod replicate;

use std::future::Future;

use serde::Serialize;

use crate::config::Config;

pub use replicate::ReplicateClient;

#[derive(Debug, thiserror::Error)]
pub enum ImageGenerationError {
    #[error("Replicate API token is not configured")]
    MissingToken,
    #[error("request to image service failed: {0}")]
    Request(String),
    #[error("image service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
    #[error("prediction did not finish within {0:.1}s")]
    Timeout(f64),
    #[error("image service returned no output")]
    NoOutput,
}

/// Model input for a single text-to-image run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_outputs: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub scheduler: String,
}

impl ImageRequest {
    pub fn from_config(config: &Config, prompt: String, negative_prompt: String) -> Self {
        ImageRequest {
            prompt,
            negative_prompt,
            width: config.image_width,
            height: config.image_height,
            num_outputs: 1,
            num_inference_steps: config.image_inference_steps,
            guidance_scale: config.image_guidance_scale,
            scheduler: config.image_scheduler.clone(),
        }
    }
}

/// A text-to-image backend that yields the URL of the first generated image.
pub trait ImageGenerator {
    fn is_configured(&self) -> bool;

    fn generate(
        &self,
        request: &ImageRequest,
    ) -> impl Future<Output = Result<String, ImageGenerationError>> + Send;
}
