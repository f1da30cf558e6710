/// LLM Client — the single point of entry for all text-generation calls.
///
/// No other module may call the generation endpoint directly. Failures are
/// returned as `GenerationFailure` values, never panics, so callers handle
/// "service said no" and "service unreachable" on one code path.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent";
const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// How many times to call the endpoint and how long each attempt may take.
///
/// Attempts are immediate: there is no backoff between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub timeout: Duration,
    /// When set, 5xx statuses consume the retry budget like transport errors.
    pub retry_server_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_server_errors: false,
        }
    }
}

/// Endpoint, credential and retry settings injected at construction.
#[derive(Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .finish()
    }
}

/// Why a generation call produced no text.
///
/// The `Display` strings are the diagnostics surfaced to callers and logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("Error: No API Key found")]
    CredentialMissing,

    #[error("Error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Error: No response candidates (Possible Safety Block).")]
    SafetyBlock { block_reason: Option<String> },

    #[error("Error connecting to AI: {message} (after {attempts} attempt(s))")]
    Transport { attempts: u32, message: String },

    #[error("Error: Unexpected response from AI: {0}")]
    InvalidEnvelope(String),
}

impl GenerationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::Http { .. } => "SERVICE_HTTP_ERROR",
            Self::SafetyBlock { .. } => "SERVICE_SAFETY_BLOCK",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::InvalidEnvelope(_) => "SERVICE_INVALID_RESPONSE",
        }
    }
}

/// Generated text on success, a tagged failure otherwise.
pub type GenerationOutcome = Result<String, GenerationFailure>;

/// Anything that can turn a prompt into generated text.
///
/// Carried by the analysis pipeline as `Arc<dyn TextGenerator>` so tests can
/// swap in a scripted generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationOutcome;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, returned unmodified.
    fn into_text(self) -> GenerationOutcome {
        let Some(first) = self.candidates.into_iter().next() else {
            return Err(GenerationFailure::SafetyBlock {
                block_reason: self.prompt_feedback.and_then(|f| f.block_reason),
            });
        };

        let text = first
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        match (text, first.finish_reason) {
            (Some(text), _) => Ok(text),
            (None, Some(reason)) if reason == "SAFETY" => Err(GenerationFailure::SafetyBlock {
                block_reason: Some(reason),
            }),
            (None, reason) => Err(GenerationFailure::InvalidEnvelope(format!(
                "first candidate has no text (finish reason: {})",
                reason.as_deref().unwrap_or("none")
            ))),
        }
    }
}

/// Result of a single HTTP attempt.
enum Attempt {
    Done(GenerationOutcome),
    Retryable(GenerationFailure),
}

/// Generation client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn attempt(&self, api_key: &str, body: &GenerateRequest<'_>) -> Attempt {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, api_key)
            .timeout(self.config.retry.timeout)
            .json(body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return Attempt::Retryable(transport(e)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return Attempt::Retryable(transport(e)),
        };

        if !status.is_success() {
            let failure = GenerationFailure::Http {
                status: status.as_u16(),
                body: text,
            };
            if status.is_server_error() && self.config.retry.retry_server_errors {
                return Attempt::Retryable(failure);
            }
            return Attempt::Done(Err(failure));
        }

        let parsed = match serde_json::from_str::<GenerateResponse>(&text) {
            Ok(p) => p,
            Err(e) => return Attempt::Done(Err(GenerationFailure::InvalidEnvelope(e.to_string()))),
        };

        debug!("Generation call succeeded: {} candidate(s)", parsed.candidates.len());
        let outcome = parsed.into_text();
        if let Err(GenerationFailure::SafetyBlock { block_reason }) = &outcome {
            warn!(
                "Generation blocked by provider (reason: {})",
                block_reason.as_deref().unwrap_or("unspecified")
            );
        }
        Attempt::Done(outcome)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(GenerationFailure::CredentialMissing);
        };

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            match self.attempt(api_key, &body).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retryable(failure) => {
                    warn!("Generation attempt {attempt}/{max_attempts} failed: {failure}");
                    last_failure = Some(failure);
                }
            }
        }

        let failure = match last_failure {
            Some(GenerationFailure::Transport { message, .. }) => GenerationFailure::Transport {
                attempts: max_attempts,
                message,
            },
            Some(other) => other,
            None => GenerationFailure::Transport {
                attempts: max_attempts,
                message: "no attempt was made".to_string(),
            },
        };
        Err(failure)
    }
}

fn transport(e: reqwest::Error) -> GenerationFailure {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    GenerationFailure::Transport {
        attempts: 1,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::Router;

    #[derive(Clone)]
    struct MockService {
        calls: Arc<AtomicUsize>,
        status: StatusCode,
        body: &'static str,
        delay: Duration,
        last_request: Arc<Mutex<Option<(Option<String>, serde_json::Value)>>>,
    }

    impl MockService {
        fn new(status: StatusCode, body: &'static str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                status,
                body,
                delay: Duration::ZERO,
                last_request: Arc::new(Mutex::new(None)),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn mock_handler(
        State(mock): State<MockService>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, &'static str) {
        mock.calls.fetch_add(1, Ordering::SeqCst);
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        *mock.last_request.lock().unwrap() = Some((key, json));
        if !mock.delay.is_zero() {
            tokio::time::sleep(mock.delay).await;
        }
        (mock.status, mock.body)
    }

    /// Serves `mock` on an ephemeral local port and returns its endpoint URL.
    async fn spawn(mock: MockService) -> String {
        let app = Router::new().fallback(mock_handler).with_state(mock);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1beta/models/test:generateContent")
    }

    fn client(endpoint: String, retry: RetryPolicy) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            endpoint,
            api_key: Some("test-key".to_string()),
            retry,
        })
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            timeout: Duration::from_millis(300),
            retry_server_errors: false,
        }
    }

    const TWO_CANDIDATES: &str = r#"{
        "candidates": [
            {"content": {"parts": [{"text": "```json\n{\"a\": 1}\n```"}]}, "finishReason": "STOP"},
            {"content": {"parts": [{"text": "second"}]}}
        ]
    }"#;

    #[test]
    fn test_default_policy_is_two_attempts_sixty_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert!(!policy.retry_server_errors);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeminiConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: Some("super-secret".to_string()),
            retry: RetryPolicy::default(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_failure_strings_are_distinct() {
        let http = GenerationFailure::Http {
            status: 500,
            body: "boom".to_string(),
        }
        .to_string();
        let safety = GenerationFailure::SafetyBlock { block_reason: None }.to_string();
        let transport = GenerationFailure::Transport {
            attempts: 2,
            message: "timed out".to_string(),
        }
        .to_string();
        assert_eq!(http, "Error 500: boom");
        assert_ne!(safety, http);
        assert_ne!(safety, transport);
        assert_ne!(http, transport);
    }

    #[tokio::test]
    async fn test_returns_first_candidate_text_unmodified() {
        let mock = MockService::new(StatusCode::OK, TWO_CANDIDATES);
        let endpoint = spawn(mock.clone()).await;
        let out = client(endpoint, fast_policy()).generate("hello").await;
        assert_eq!(out.unwrap(), "```json\n{\"a\": 1}\n```");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_body_and_credential_header() {
        let mock = MockService::new(StatusCode::OK, TWO_CANDIDATES);
        let endpoint = spawn(mock.clone()).await;
        client(endpoint, fast_policy())
            .generate("analyze this")
            .await
            .unwrap();

        let (key, body) = mock.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "analyze this"}]}]})
        );
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_network() {
        let mock = MockService::new(StatusCode::OK, TWO_CANDIDATES);
        let endpoint = spawn(mock.clone()).await;
        let gemini = GeminiClient::new(GeminiConfig {
            endpoint,
            api_key: None,
            retry: fast_policy(),
        });
        assert_eq!(
            gemini.generate("x").await,
            Err(GenerationFailure::CredentialMissing)
        );
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_credential_counts_as_missing() {
        let gemini = GeminiClient::new(GeminiConfig {
            endpoint: "http://127.0.0.1:9/unused".to_string(),
            api_key: Some(String::new()),
            retry: fast_policy(),
        });
        assert_eq!(
            gemini.generate("x").await,
            Err(GenerationFailure::CredentialMissing)
        );
    }

    #[tokio::test]
    async fn test_server_error_returned_verbatim_without_retry() {
        let mock = MockService::new(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        let endpoint = spawn(mock.clone()).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();

        assert_eq!(
            failure,
            GenerationFailure::Http {
                status: 500,
                body: "upstream exploded".to_string()
            }
        );
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_server_error_retried_once_when_policy_allows() {
        let mock = MockService::new(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        let endpoint = spawn(mock.clone()).await;
        let policy = RetryPolicy {
            retry_server_errors: true,
            ..fast_policy()
        };
        let failure = client(endpoint, policy).generate("x").await.unwrap_err();

        let message = failure.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream exploded"));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_client_error_never_retried() {
        let mock = MockService::new(StatusCode::FORBIDDEN, r#"{"error": "API key invalid"}"#);
        let endpoint = spawn(mock.clone()).await;
        let policy = RetryPolicy {
            retry_server_errors: true,
            ..fast_policy()
        };
        let failure = client(endpoint, policy).generate("x").await.unwrap_err();
        assert!(matches!(failure, GenerationFailure::Http { status: 403, .. }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_safety_block() {
        let mock = MockService::new(
            StatusCode::OK,
            r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#,
        );
        let endpoint = spawn(mock.clone()).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();
        assert_eq!(
            failure,
            GenerationFailure::SafetyBlock {
                block_reason: Some("SAFETY".to_string())
            }
        );
        assert_eq!(failure.code(), "SERVICE_SAFETY_BLOCK");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_candidates_key_is_safety_block() {
        let mock = MockService::new(StatusCode::OK, r#"{"usageMetadata": {}}"#);
        let endpoint = spawn(mock).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();
        assert!(matches!(failure, GenerationFailure::SafetyBlock { .. }));
    }

    #[tokio::test]
    async fn test_candidate_stopped_for_safety_without_text() {
        let mock = MockService::new(
            StatusCode::OK,
            r#"{"candidates": [{"finishReason": "SAFETY"}]}"#,
        );
        let endpoint = spawn(mock).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();
        assert!(matches!(failure, GenerationFailure::SafetyBlock { .. }));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_invalid_envelope() {
        let mock = MockService::new(StatusCode::OK, "<html>proxy login</html>");
        let endpoint = spawn(mock.clone()).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();
        assert!(matches!(failure, GenerationFailure::InvalidEnvelope(_)));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_retried_once_then_transport_error() {
        let mock = MockService::new(StatusCode::OK, TWO_CANDIDATES)
            .with_delay(Duration::from_secs(2));
        let endpoint = spawn(mock.clone()).await;
        let failure = client(endpoint, fast_policy())
            .generate("x")
            .await
            .unwrap_err();

        assert!(matches!(
            failure,
            GenerationFailure::Transport { attempts: 2, .. }
        ));
        assert!(failure.to_string().starts_with("Error connecting to AI:"));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_retry() {
        let mock = MockService::new(StatusCode::OK, TWO_CANDIDATES)
            .with_delay(Duration::from_secs(2));
        let endpoint = spawn(mock.clone()).await;
        let policy = RetryPolicy {
            max_attempts: 1,
            ..fast_policy()
        };
        let failure = client(endpoint, policy).generate("x").await.unwrap_err();
        assert!(matches!(
            failure,
            GenerationFailure::Transport { attempts: 1, .. }
        ));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let failure = client(format!("http://{addr}/generate"), fast_policy())
            .generate("x")
            .await
            .unwrap_err();
        assert_eq!(failure.code(), "TRANSPORT_ERROR");
    }
}
