//! Gemini / Imagen REST client with key rotation and retry
//!
//! This module handles communication with the Gemini text and vision
//! models and the Imagen prediction endpoint. Parameter validation happens
//! before any network call; transient failures are retried by the engine
//! in [`super::retry`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::ValueEnum;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::GeminiSettings;
use crate::schemas::gemini::{
    GeminiErrorResponse, GenerateContentRequest, GenerateContentResponse, PredictRequest,
    PredictResponse,
};

use super::keys::KeyRing;
use super::retry::{self, FailureClass, RetryPolicy};

// ============================================================================
// Constants
// ============================================================================

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEXT_MODEL: &str = "gemini-2.5-flash";
const VISION_MODEL: &str = "gemini-2.0-flash";
const IMAGE_MODEL: &str = "imagen-3.0-generate-002";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the Gemini API
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No Gemini API keys configured")]
    NoCredentialsConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    Api { code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Retry budget exhausted after {attempts} attempts (last failure: {class})")]
    RetryBudgetExhausted { class: FailureClass, attempts: u32 },
}

impl ClientError {
    /// Classify this error for the retry engine. `None` means the error is
    /// not transient and must propagate without retry.
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            ClientError::Api { code: 429, .. } => Some(FailureClass::RateLimited),
            ClientError::Api { code: 503, .. } => Some(FailureClass::ServiceUnavailable),
            ClientError::Api { code, .. } if *code >= 500 => Some(FailureClass::ServerError),
            ClientError::Http(err) if err.is_timeout() => Some(FailureClass::Timeout),
            _ => None,
        }
    }
}

// ============================================================================
// Aspect Ratio
// ============================================================================

/// The fixed set of aspect ratios Imagen accepts. Anything else is an
/// `InvalidParameter` error before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AspectRatio {
    #[default]
    #[value(name = "1:1")]
    Square,
    #[value(name = "3:4")]
    Portrait,
    #[value(name = "4:3")]
    Landscape,
    #[value(name = "9:16")]
    Tall,
    #[value(name = "16:9")]
    Wide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(AspectRatio::Square),
            "3:4" => Ok(AspectRatio::Portrait),
            "4:3" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Tall),
            "16:9" => Ok(AspectRatio::Wide),
            other => Err(ClientError::InvalidParameter(format!(
                "Unsupported aspect ratio '{}'. Expected one of: 1:1, 3:4, 4:3, 9:16, 16:9",
                other
            ))),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Resilient client for the Gemini and Imagen APIs
pub struct GeminiClient {
    /// HTTP client; its timeout is the only timeout the client enforces
    http: Client,

    /// Base URL for API calls
    base_url: Option<String>,

    /// Credential pool shared by all requests through this client
    keys: KeyRing,

    /// Fixed-delay retry policy
    policy: RetryPolicy,
}

impl GeminiClient {
    /// Create a new client from settings
    pub fn new(settings: &GeminiSettings) -> Result<Self, ClientError> {
        let keys = KeyRing::new(settings.api_keys.clone())?;

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let policy = RetryPolicy {
            max_attempts: settings.max_retries,
            rate_limited: Duration::from_millis(settings.retry_delay_rate_limited_ms),
            service_unavailable: Duration::from_millis(settings.retry_delay_unavailable_ms),
            server_error: Duration::from_millis(settings.retry_delay_server_error_ms),
            timeout: Duration::from_millis(settings.retry_delay_server_error_ms),
        };

        tracing::info!(
            key_count = keys.len(),
            max_attempts = policy.max_attempts,
            "Initialized Gemini client"
        );

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            keys,
            policy,
        })
    }

    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(GEMINI_API_BASE)
    }

    /// Number of keys in the pool
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Index of the currently active key
    pub fn active_key_index(&self) -> usize {
        self.keys.current_index()
    }

    /// Generate text from a prompt
    pub async fn generate_text(&self, prompt: &str) -> Result<String, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidParameter(
                "prompt must not be empty".to_string(),
            ));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url(), TEXT_MODEL);
        let body = GenerateContentRequest::text(prompt);

        tracing::debug!(model = TEXT_MODEL, "Calling Gemini generateContent API");

        let response: GenerateContentResponse =
            retry::run(&self.keys, &self.policy, "generate_text", |key| {
                self.post_json(&url, key, &body)
            })
            .await?;

        response.text().ok_or(ClientError::EmptyResponse)
    }

    /// Generate one or more images; returns decoded PNG bytes per sample
    pub async fn generate_image(
        &self,
        prompt: &str,
        sample_count: u32,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<Vec<u8>>, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidParameter(
                "prompt must not be empty".to_string(),
            ));
        }
        if sample_count == 0 {
            return Err(ClientError::InvalidParameter(
                "sample_count must be at least 1".to_string(),
            ));
        }

        let url = format!("{}/models/{}:predict", self.base_url(), IMAGE_MODEL);
        let body = PredictRequest::new(prompt, sample_count, aspect_ratio.as_str());

        tracing::debug!(
            model = IMAGE_MODEL,
            sample_count,
            aspect_ratio = %aspect_ratio,
            "Calling Imagen predict API"
        );

        let response: PredictResponse =
            retry::run(&self.keys, &self.policy, "generate_image", |key| {
                self.post_json(&url, key, &body)
            })
            .await?;

        let mut images = Vec::new();
        for prediction in response.predictions {
            if let Some(encoded) = prediction.bytes_base64_encoded {
                let bytes = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| ClientError::Parse(format!("invalid image payload: {}", e)))?;
                images.push(bytes);
            }
        }

        if images.is_empty() {
            return Err(ClientError::EmptyResponse);
        }

        Ok(images)
    }

    /// Analyze an image against a prompt with the vision model
    pub async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidParameter(
                "prompt must not be empty".to_string(),
            ));
        }
        if image.is_empty() {
            return Err(ClientError::InvalidParameter(
                "image must not be empty".to_string(),
            ));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url(), VISION_MODEL);
        let body =
            GenerateContentRequest::image_with_prompt(mime_type, BASE64.encode(image), prompt);

        tracing::debug!(model = VISION_MODEL, "Calling Gemini vision API");

        let response: GenerateContentResponse =
            retry::run(&self.keys, &self.policy, "analyze_image", |key| {
                self.post_json(&url, key, &body)
            })
            .await?;

        response.text().ok_or(ClientError::EmptyResponse)
    }

    /// Generate a descriptive paragraph about a culture's textile motifs,
    /// colors, and techniques, used to enrich image prompts.
    pub async fn culture_details(&self, culture: &str) -> Result<String, ClientError> {
        if culture.trim().is_empty() {
            return Err(ClientError::InvalidParameter(
                "culture must not be empty".to_string(),
            ));
        }

        let prompt = format!(
            "For the {} culture, provide:\n\
             - 3 to 5 of the most iconic textile motifs or symbols (with names and meanings if possible)\n\
             - The traditional color palette (with color names or hex codes)\n\
             - The typical arrangement style of motifs (e.g., rows, bands, all-over, grid)\n\
             - Notable textile techniques or materials\n\
             - One or two 'do's and don'ts' for authentic design\n\
             Return your answer as a concise, richly descriptive paragraph.",
            title_case(culture)
        );

        self.generate_text(&prompt).await
    }

    /// One attempt: POST the body with the given key and decode the result
    async fn post_json<B, R>(&self, url: &str, key: String, body: &B) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Prefer the structured error message when the body parses
            let message = serde_json::from_str::<GeminiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(ClientError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Gemini response");
            ClientError::Parse(e.to_string())
        })
    }
}

/// Uppercase the first letter of each whitespace-separated word
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct UpstreamState {
        calls: AtomicU32,
        keys_seen: Mutex<Vec<String>>,
    }

    impl UpstreamState {
        fn record_key(&self, headers: &HeaderMap) {
            let key = headers
                .get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            self.keys_seen.lock().unwrap().push(key);
        }
    }

    async fn rate_limit_then_ok(
        State(state): State<Arc<UpstreamState>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        state.record_key(&headers);
        if state.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"code": 429, "message": "quota exceeded"}})),
            )
                .into_response()
        } else {
            Json(json!({
                "candidates": [
                    {"content": {"parts": [{"text": "second key response"}]}}
                ]
            }))
            .into_response()
        }
    }

    async fn always_bad_request(
        State(state): State<Arc<UpstreamState>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        state.record_key(&headers);
        state.calls.fetch_add(1, Ordering::SeqCst);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "unsupported model"}})),
        )
            .into_response()
    }

    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn local_settings(base_url: String, keys: &[&str]) -> GeminiSettings {
        GeminiSettings {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            retry_delay_rate_limited_ms: 1,
            retry_delay_unavailable_ms: 1,
            retry_delay_server_error_ms: 1,
            base_url: Some(base_url),
            ..GeminiSettings::default()
        }
    }

    #[tokio::test]
    async fn test_rate_limited_key_rotates_over_http() {
        let state = Arc::new(UpstreamState::default());
        let app = Router::new()
            .route("/models/:model", post(rate_limit_then_ok))
            .with_state(state.clone());
        let base_url = spawn_upstream(app).await;

        let client = GeminiClient::new(&local_settings(base_url, &["k1", "k2"])).unwrap();
        let text = client.generate_text("a prompt").await.unwrap();

        // K1 rate-limited, K2 succeeded; cursor now points at K2
        assert_eq!(text, "second key response");
        assert_eq!(
            *state.keys_seen.lock().unwrap(),
            vec!["k1".to_string(), "k2".to_string()]
        );
        assert_eq!(client.active_key_index(), 1);
    }

    #[tokio::test]
    async fn test_bad_request_propagates_over_http_without_retry() {
        let state = Arc::new(UpstreamState::default());
        let app = Router::new()
            .route("/models/:model", post(always_bad_request))
            .with_state(state.clone());
        let base_url = spawn_upstream(app).await;

        let client = GeminiClient::new(&local_settings(base_url, &["k1", "k2"])).unwrap();
        let result = client.generate_text("a prompt").await;

        assert_eq!(state.calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.active_key_index(), 0);
        match result {
            Err(ClientError::Api { code: 400, message }) => {
                // The structured upstream message survives error parsing
                assert_eq!(message, "unsupported model");
            }
            other => panic!("expected 400 Api error, got {:?}", other),
        }
    }

    fn test_settings() -> GeminiSettings {
        GeminiSettings {
            api_keys: vec!["test-key".to_string()],
            ..GeminiSettings::default()
        }
    }

    #[test]
    fn test_client_requires_keys() {
        let settings = GeminiSettings::default();
        let result = GeminiClient::new(&settings);
        assert!(matches!(result, Err(ClientError::NoCredentialsConfigured)));
    }

    #[test]
    fn test_aspect_ratio_parsing() {
        assert_eq!("1:1".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Tall);
        assert!(matches!(
            "2:3".parse::<AspectRatio>(),
            Err(ClientError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_failure_classification() {
        let rate_limited = ClientError::Api {
            code: 429,
            message: String::new(),
        };
        assert_eq!(rate_limited.failure_class(), Some(FailureClass::RateLimited));

        let unavailable = ClientError::Api {
            code: 503,
            message: String::new(),
        };
        assert_eq!(
            unavailable.failure_class(),
            Some(FailureClass::ServiceUnavailable)
        );

        let internal = ClientError::Api {
            code: 500,
            message: String::new(),
        };
        assert_eq!(internal.failure_class(), Some(FailureClass::ServerError));

        let bad_request = ClientError::Api {
            code: 400,
            message: String::new(),
        };
        assert_eq!(bad_request.failure_class(), None);

        let invalid = ClientError::InvalidParameter("x".to_string());
        assert_eq!(invalid.failure_class(), None);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_network() {
        let client = GeminiClient::new(&test_settings()).unwrap();

        let result = client.generate_text("   ").await;
        assert!(matches!(result, Err(ClientError::InvalidParameter(_))));

        let result = client.generate_image("", 1, AspectRatio::Square).await;
        assert!(matches!(result, Err(ClientError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_zero_samples_rejected() {
        let client = GeminiClient::new(&test_settings()).unwrap();
        let result = client.generate_image("a pattern", 0, AspectRatio::Square).await;
        assert!(matches!(result, Err(ClientError::InvalidParameter(_))));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("yoruba"), "Yoruba");
        assert_eq!(title_case("new zealand maori"), "New Zealand Maori");
    }
}
