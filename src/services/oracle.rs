use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;

const MOCK_SCORE: i64 = 100;
const MOCK_FEEDBACK: &str = "Great job!";

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn from_env() -> Self {
        let provider = env_string("ORACLE_PROVIDER").unwrap_or_else(|| "mock".to_string());
        let api_key = env_string("ORACLE_API_KEY");
        let model = env_string("ORACLE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_endpoint = normalize_endpoint(
            env_string("ORACLE_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        );
        let timeout =
            Duration::from_millis(env_u64("ORACLE_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS));

        Self {
            provider,
            api_key,
            model,
            api_endpoint,
            timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("empty response")]
    EmptyChoices,
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Schema violations are terminal for the payload; everything else
    /// is a transport-level failure the caller may retry.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}

/// A flashcard candidate proposed by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCandidate {
    pub front: String,
    pub back: String,
}

/// Validated oracle output, plus the raw payload kept verbatim for the
/// audit trail.
#[derive(Debug, Clone)]
pub struct RecallAssessment {
    pub score: i64,
    pub feedback: String,
    pub flashcards: Vec<CardCandidate>,
    pub raw: Value,
}

/// All-or-nothing validation of a raw oracle payload. Rejects a
/// missing or non-integer score, a score outside 0..=100, and any
/// flashcard entry lacking a string front or back. Nothing is
/// persisted from a payload that fails here; the offending payload is
/// logged for diagnosis since a retry would reproduce it.
pub fn parse_assessment(raw: Value) -> Result<RecallAssessment, OracleError> {
    match validate(&raw) {
        Ok((score, feedback, flashcards)) => Ok(RecallAssessment {
            score,
            feedback,
            flashcards,
            raw,
        }),
        Err(reason) => {
            warn!(payload = %raw, %reason, "oracle payload failed validation");
            Err(OracleError::InvalidResponse(reason))
        }
    }
}

fn validate(raw: &Value) -> Result<(i64, String, Vec<CardCandidate>), String> {
    let score = raw
        .get("score")
        .and_then(Value::as_i64)
        .ok_or_else(|| "score missing or not an integer".to_string())?;
    if !(0..=100).contains(&score) {
        return Err(format!("score {score} outside 0..=100"));
    }

    let feedback = raw
        .get("feedback")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut flashcards = Vec::new();
    match raw.get("flashcards") {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            for entry in entries {
                let front = entry.get("front").and_then(Value::as_str);
                let back = entry.get("back").and_then(Value::as_str);
                match (front, back) {
                    (Some(front), Some(back)) => flashcards.push(CardCandidate {
                        front: front.to_string(),
                        back: back.to_string(),
                    }),
                    _ => return Err("flashcard entry missing front or back".to_string()),
                }
            }
        }
        Some(_) => return Err("flashcards is not an array".to_string()),
    }

    Ok((score, feedback, flashcards))
}

/// Scoring oracle selected once at startup. The orchestrator only sees
/// `score(prompt)`, so the mock and the HTTP implementation are fully
/// interchangeable.
#[derive(Clone)]
pub enum ScoringOracle {
    Mock(MockOracle),
    OpenAi(OpenAiOracle),
}

impl ScoringOracle {
    pub fn from_env() -> Self {
        Self::from_config(OracleConfig::from_env())
    }

    pub fn from_config(config: OracleConfig) -> Self {
        match config.provider.to_ascii_lowercase().as_str() {
            "openai" => Self::OpenAi(OpenAiOracle::new(config)),
            _ => Self::Mock(MockOracle::default()),
        }
    }

    pub async fn score(&self, prompt: &str) -> Result<RecallAssessment, OracleError> {
        match self {
            Self::Mock(oracle) => oracle.score(prompt),
            Self::OpenAi(oracle) => oracle.score(prompt).await,
        }
    }
}

/// Deterministic stub oracle. The default mirrors a perfect recall with
/// no proposed cards; tests swap in arbitrary payloads to drive the
/// validation and persistence paths.
#[derive(Debug, Clone)]
pub struct MockOracle {
    payload: Value,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::with_payload(serde_json::json!({
            "score": MOCK_SCORE,
            "feedback": MOCK_FEEDBACK,
            "flashcards": [],
        }))
    }
}

impl MockOracle {
    pub fn with_payload(payload: Value) -> Self {
        Self { payload }
    }

    fn score(&self, _prompt: &str) -> Result<RecallAssessment, OracleError> {
        parse_assessment(self.payload.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatContent {
    content: String,
}

/// OpenAI-style chat-completions client. The request timeout bounds the
/// whole oracle call; a timed-out request surfaces as a transport error
/// with no state written.
#[derive(Clone)]
pub struct OpenAiOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    pub async fn score(&self, prompt: &str) -> Result<RecallAssessment, OracleError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(OracleError::NotConfigured("ORACLE_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.config.api_endpoint.trim_end_matches('/')
        );
        let messages = [ChatMessage {
            role: "user".into(),
            content: prompt.into(),
        }];
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "response_format": { "type": "json_object" },
            "stream": false,
        });

        let response = self.post_with_retry(&url, api_key, &payload).await?;
        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(OracleError::EmptyChoices)?;

        let raw: Value = serde_json::from_str(content)
            .map_err(|e| OracleError::InvalidResponse(format!("payload is not valid JSON: {e}")))?;
        parse_assessment(raw)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<ChatResponse, OracleError> {
        let mut last_error: Option<OracleError> = None;

        for retry in 0..=MAX_RETRIES {
            match self
                .client
                .post(url)
                .bearer_auth(api_key)
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp.json().await?);
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = OracleError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, ?status, "oracle request failed, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = OracleError::Request(e);
                    if retry < MAX_RETRIES {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, "oracle request error, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_error.unwrap_or(OracleError::NotConfigured("unknown")))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn normalize_endpoint(endpoint: String) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
