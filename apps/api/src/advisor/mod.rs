//! Advisor: the single point of entry for generative-AI calls.
//!
//! Nothing else in the crate talks to the model API. Callers go through the
//! [`Advisor`] trait, which never fails: transport and API errors come back as
//! a user-visible placeholder string so the session carries on.
//!
//! Model: gemini-1.5-flash. One attempt per request, no retries.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod handlers;
pub mod prompts;

const API_KEY_HEADER: &str = "x-goog-api-key";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub const ERROR_PREFIX: &str = "⚠️ Error: ";
pub const NO_RESPONSE: &str = "⚠️ No response generated.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyContent,
}

/// Structured profile fields sent alongside the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub education: String,
    pub skills: String,
    pub interests: String,
    pub goal: String,
}

impl From<reqwest::Error> for AdvisorError {
    // Request URLs never reach log lines or user-visible placeholders.
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

#[async_trait]
pub trait Advisor: Send + Sync {
    /// Returns Markdown advice, or a placeholder starting with
    /// [`ERROR_PREFIX`] / equal to [`NO_RESPONSE`] when the call failed.
    async fn advise(&self, user_input: &str, request: &AdvisoryRequest) -> String;
}

/// Folds a model call result into the text shown to the user.
pub fn into_advice(result: Result<String, AdvisorError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) | Err(AdvisorError::EmptyContent) => NO_RESPONSE.to_string(),
        Err(e) => {
            warn!("advisor call failed: {e}");
            format!("{ERROR_PREFIX}{e}")
        }
    }
}

pub fn is_placeholder(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX) || text == NO_RESPONSE
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

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
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: String) -> Result<Self, AdvisorError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Points the client at another models endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Makes one raw call to the model and returns its text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AdvisorError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/{MODEL}:generateContent", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AdvisorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text().ok_or(AdvisorError::EmptyContent)?;
        debug!("advisor call succeeded: {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn advise(&self, user_input: &str, request: &AdvisoryRequest) -> String {
        let prompt = prompts::build_advisor_prompt(user_input, request);
        into_advice(self.generate(&prompt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r###"{"candidates":[{"content":{"parts":[{"text":"## Paths\n"},{"text":"- SRE"}]}}]}"###,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("## Paths\n- SRE"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(parsed.text().is_none());
        let parsed: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn test_into_advice_passes_text_through() {
        assert_eq!(into_advice(Ok("# Plan".into())), "# Plan");
    }

    #[test]
    fn test_into_advice_empty_becomes_placeholder() {
        assert_eq!(into_advice(Ok("  ".into())), NO_RESPONSE);
        assert_eq!(into_advice(Err(AdvisorError::EmptyContent)), NO_RESPONSE);
    }

    #[test]
    fn test_into_advice_error_is_prefixed() {
        let text = into_advice(Err(AdvisorError::Api {
            status: 403,
            message: "API key not valid".into(),
        }));
        assert!(text.starts_with(ERROR_PREFIX));
        assert!(text.contains("API key not valid"));
        assert!(is_placeholder(&text));
        assert!(!is_placeholder("# Real advice"));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_reveal_api_key() {
        let key = "AIza-secret-key-0123456789";
        // Nothing listens on the discard port, so the call fails in transport.
        let advisor = GeminiAdvisor::new(key.to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v1beta/models");

        let text = advisor
            .advise("Plan my career", &AdvisoryRequest::default())
            .await;
        assert!(text.starts_with(ERROR_PREFIX), "got: {text}");
        assert!(!text.contains(key), "key leaked: {text}");
    }

    #[tokio::test]
    async fn test_http_error_drops_request_url() {
        let err = Client::new()
            .get("http://127.0.0.1:9/models?key=AIza-secret")
            .send()
            .await
            .unwrap_err();
        let text = into_advice(Err(AdvisorError::from(err)));
        assert!(!text.contains("AIza-secret"), "url leaked: {text}");
    }
}
