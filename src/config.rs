use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

const DEFAULT_REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";
const DEFAULT_SDXL_VERSION: &str =
    "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub replicate_api_token: String,
    pub replicate_api_base: String,
    pub replicate_model_version: String,
    pub replicate_poll_interval_ms: u64,
    pub replicate_poll_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    pub image_width: u32,
    pub image_height: u32,
    pub image_inference_steps: u32,
    pub image_guidance_scale: f32,
    pub image_scheduler: String,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_api_base(value: String) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_REPLICATE_API_BASE.to_string();
    }
    trimmed.to_string()
}

// Accepts "owner/model:version" as pasted from the Replicate model page.
fn normalize_model_version(value: String) -> String {
    let trimmed = value.trim();
    let version = trimmed.rsplit(':').next().unwrap_or(trimmed).trim();
    if version.is_empty() {
        warn!("REPLICATE_MODEL_VERSION is empty; falling back to the default SDXL version.");
        return DEFAULT_SDXL_VERSION.to_string();
    }
    version.to_string()
}

fn normalize_dimension(name: &str, value: u32) -> u32 {
    // SDXL needs multiples of 8.
    if value == 0 || value % 8 != 0 {
        warn!("{name}={value} is not a positive multiple of 8; using 1024.");
        return 1024;
    }
    value
}

impl Config {
    pub fn load() -> Result<Self> {
        let replicate_api_token = env::var("REPLICATE_API_TOKEN")
            .or_else(|_| env::var("REPLICATE_API_KEY"))
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let guidance_scale = env_f32("IMAGE_GUIDANCE_SCALE", 7.5);
        if !guidance_scale.is_finite() || guidance_scale <= 0.0 {
            return Err(anyhow::anyhow!(
                "IMAGE_GUIDANCE_SCALE must be a positive number, got {guidance_scale}"
            ));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            replicate_api_token,
            replicate_api_base: normalize_api_base(env_string(
                "REPLICATE_API_BASE",
                DEFAULT_REPLICATE_API_BASE,
            )),
            replicate_model_version: normalize_model_version(env_string(
                "REPLICATE_MODEL_VERSION",
                DEFAULT_SDXL_VERSION,
            )),
            replicate_poll_interval_ms: env_u64("REPLICATE_POLL_INTERVAL_MS", 1000).clamp(200, 5000),
            replicate_poll_timeout_seconds: env_u64("REPLICATE_POLL_TIMEOUT_SECONDS", 120)
                .clamp(10, 600),
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", 90).max(5),
            image_width: normalize_dimension("IMAGE_WIDTH", env_u32("IMAGE_WIDTH", 1024)),
            image_height: normalize_dimension("IMAGE_HEIGHT", env_u32("IMAGE_HEIGHT", 1024)),
            image_inference_steps: env_u32("IMAGE_INFERENCE_STEPS", 50).clamp(1, 500),
            image_guidance_scale: guidance_scale,
            image_scheduler: env_string("IMAGE_SCHEDULER", "DPMSolverMultistep"),
        })
    }
}
