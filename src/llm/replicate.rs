use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::{ImageGenerationError, ImageGenerator, ImageRequest};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const REPLICATE_MAX_RETRY_ATTEMPTS: usize = 2;
const REPLICATE_RETRY_BASE_DELAY_MS: u64 = 900;
const REPLICATE_ERROR_BODY_LIMIT: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: Option<String>,
    status: Option<PredictionStatus>,
    output: Option<Value>,
    error: Option<Value>,
    urls: Option<PredictionUrls>,
}

impl Prediction {
    fn status(&self) -> PredictionStatus {
        self.status.unwrap_or(PredictionStatus::Unknown)
    }

    fn poll_url(&self) -> Option<&str> {
        self.urls
            .as_ref()
            .and_then(|urls| urls.get.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    fn error_detail(&self) -> String {
        match &self.error {
            Some(Value::String(message)) if !message.trim().is_empty() => message.clone(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                format!("status {:?}", self.status())
            }
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplicateClient {
    api_base: String,
    api_token: String,
    version: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

// Prediction creation is not idempotent: POST retries only when the request
// never connected or was rate limited.
fn should_retry_send_failure(method: &Method, timed_out: bool, connect_failed: bool) -> bool {
    if *method == Method::POST {
        return connect_failed;
    }
    timed_out || connect_failed
}

fn should_retry_status(method: &Method, status: StatusCode) -> bool {
    if *method == Method::POST {
        return status == StatusCode::TOO_MANY_REQUESTS;
    }
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(REPLICATE_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(detail) = value
            .get("detail")
            .or_else(|| value.pointer("/error/message"))
            .and_then(Value::as_str)
        {
            return detail.to_string();
        }
    }
    truncate_for_log(trimmed, REPLICATE_ERROR_BODY_LIMIT)
}

/// Collects http(s) URLs from a prediction `output`, which may be a string,
/// a list, or an object carrying `url`, `urls` or `output`.
fn extract_output_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(candidate) => {
            let trimmed = candidate.trim();
            let is_http = url::Url::parse(trimmed)
                .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
                .unwrap_or(false);
            if is_http && !out.iter().any(|existing| existing == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                extract_output_urls(item, out);
            }
        }
        Value::Object(map) => {
            for key in ["url", "urls", "output"] {
                if let Some(nested) = map.get(key) {
                    extract_output_urls(nested, out);
                }
            }
        }
        _ => {}
    }
}

fn first_output_url(prediction: &Prediction) -> Option<String> {
    let mut urls = Vec::new();
    if let Some(output) = &prediction.output {
        extract_output_urls(output, &mut urls);
    }
    urls.into_iter().next()
}

fn build_prediction_payload(version: &str, request: &ImageRequest) -> Value {
    json!({
        "version": version,
        "input": request,
    })
}

impl ReplicateClient {
    pub fn from_config(config: &Config) -> Self {
        ReplicateClient {
            api_base: config.replicate_api_base.clone(),
            api_token: config.replicate_api_token.clone(),
            version: config.replicate_model_version.clone(),
            poll_interval: Duration::from_millis(config.replicate_poll_interval_ms),
            poll_timeout: Duration::from_secs(config.replicate_poll_timeout_seconds),
        }
    }

    fn predictions_endpoint(&self) -> String {
        format!("{}/predictions", self.api_base)
    }

    fn redact(&self, text: &str) -> String {
        if self.api_token.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_token, "[redacted]")
    }

    async fn call_replicate_api(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Prediction, ImageGenerationError> {
        let client = get_http_client();
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let mut builder = client
                .request(method.clone(), url)
                .bearer_auth(&self.api_token);
            if let Some(payload) = payload {
                builder = builder.header("Prefer", "wait").json(payload);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(err) => {
                    let err_text = self.redact(&err.to_string());
                    let should_retry =
                        should_retry_send_failure(&method, err.is_timeout(), err.is_connect())
                            && attempt < REPLICATE_MAX_RETRY_ATTEMPTS;
                    warn!(
                        "Replicate request failed to send: {} (timeout={}, connect={}, url={}, retrying={})",
                        err_text,
                        err.is_timeout(),
                        err.is_connect(),
                        url,
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(ImageGenerationError::Request(err_text));
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = self.redact(&summarize_error_body(&body));
                let should_retry =
                    should_retry_status(&method, status) && attempt < REPLICATE_MAX_RETRY_ATTEMPTS;
                warn!(
                    "Replicate API error: status={}, body={}, retrying={}",
                    status, message, should_retry
                );
                if should_retry {
                    tokio::time::sleep(retry_delay(attempt)).await;
                    continue;
                }
                return Err(ImageGenerationError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let prediction = response
                .json::<Prediction>()
                .await
                .map_err(|err| ImageGenerationError::Request(self.redact(&err.to_string())))?;
            debug!(
                target: "llm.replicate",
                id = ?prediction.id,
                status = ?prediction.status(),
                "prediction response"
            );
            return Ok(prediction);
        }
    }

    async fn wait_for_prediction(
        &self,
        mut prediction: Prediction,
    ) -> Result<Prediction, ImageGenerationError> {
        let started = tokio::time::Instant::now();
        loop {
            match prediction.status() {
                PredictionStatus::Succeeded => return Ok(prediction),
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Err(ImageGenerationError::PredictionFailed(
                        prediction.error_detail(),
                    ));
                }
                PredictionStatus::Starting
                | PredictionStatus::Processing
                | PredictionStatus::Unknown => {}
            }

            let Some(poll_url) = prediction.poll_url().map(str::to_string) else {
                return Err(ImageGenerationError::PredictionFailed(
                    "prediction is still running but has no poll URL".to_string(),
                ));
            };
            if started.elapsed() >= self.poll_timeout {
                return Err(ImageGenerationError::Timeout(
                    self.poll_timeout.as_secs_f64(),
                ));
            }
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.call_replicate_api(Method::GET, &poll_url, None).await?;
        }
    }

    async fn run_prediction(&self, request: &ImageRequest) -> Result<String, ImageGenerationError> {
        let payload = build_prediction_payload(&self.version, request);
        let created = self
            .call_replicate_api(Method::POST, &self.predictions_endpoint(), Some(&payload))
            .await?;
        info!(
            "Replicate prediction created: id={:?} status={:?}",
            created.id,
            created.status()
        );

        let finished = self.wait_for_prediction(created).await?;
        first_output_url(&finished).ok_or(ImageGenerationError::NoOutput)
    }
}

impl ImageGenerator for ReplicateClient {
    fn is_configured(&self) -> bool {
        !self.api_token.is_empty()
    }

    async fn generate(&self, request: &ImageRequest) -> Result<String, ImageGenerationError> {
        if !self.is_configured() {
            return Err(ImageGenerationError::MissingToken);
        }
        let metadata = json!({
            "width": request.width,
            "height": request.height,
            "steps": request.num_inference_steps,
            "scheduler": request.scheduler,
        });
        log_llm_timing(
            "replicate",
            &self.version,
            "generate_image",
            Some(metadata),
            || self.run_prediction(request),
        )
        .await
    }
}
