//! Groq provider (OpenAI-compatible chat completions).
//!
//! ## Security
//!
//! The API key lives in an [`ApiCredential`] and is exposed only when the
//! `Authorization` header is built.

use super::{
    factory::ProviderFactory,
    secrets::ApiCredential,
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
    DEFAULT_MODEL,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable name for the Groq API key.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default API root; `/chat/completions` is appended.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GroqProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(ApiCredential::inline(api_key))
    }

    /// Build from provider settings: `api_key` (falls back to `GROQ_API_KEY`)
    /// and an optional `base_url`.
    pub fn from_config(settings: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::resolve(settings, "api_key", GROQ_API_KEY_ENV)?;

        let mut provider = Self::with_credential(credential);
        if let Some(url) = settings["base_url"].as_str() {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }

    fn with_credential(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: GROQ_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map a non-2xx response to a provider error.
fn error_for_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthError,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        _ => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.trim().to_string());
            ProviderError::ApiError {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn into_completion(body: ChatResponse, requested_model: &str) -> CompletionResponse {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    let usage = body
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    CompletionResponse {
        content,
        usage,
        model: body.model.unwrap_or_else(|| requested_model.to_string()),
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model: &config.model,
            messages: &messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(into_completion(body, &config.model))
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_blank()
    }

    fn name(&self) -> &str {
        "groq"
    }
}

/// Factory for Groq providers.
///
/// ## Settings
/// ```json
/// {
///   "api_key": "gsk_...",                          // Optional, falls back to GROQ_API_KEY
///   "base_url": "https://api.groq.com/openai/v1"   // Optional
/// }
/// ```
pub struct GroqProviderFactory;

impl ProviderFactory for GroqProviderFactory {
    fn provider_type(&self) -> &'static str {
        "groq"
    }

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.validate_config(settings)?;
        Ok(Arc::new(GroqProvider::from_config(settings)?))
    }

    fn validate_config(&self, settings: &JsonValue) -> Result<(), ProviderError> {
        ApiCredential::resolve(settings, "api_key", GROQ_API_KEY_ENV)?;

        if let Some(url) = settings["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "base_url": GROQ_BASE_URL,
            "model": DEFAULT_MODEL
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::KeyOrigin;

    #[test]
    fn test_provider_creation() {
        let provider = GroqProvider::new("gsk_test");
        assert_eq!(provider.name(), "groq");
        assert_eq!(
            provider.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let provider = GroqProvider::new("gsk_test").with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            ChatMessage::system("You are THE WITNESS."),
            ChatMessage::user("Does ivermectin cure COVID-19?"),
        ];
        let config = CompletionConfig::default();
        let request = ChatRequest {
            model: &config.model,
            messages: &messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Does ivermectin cure COVID-19?");
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Ivermectin cures it in 48 hours." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 14, "total_tokens": 134 }
        }))
        .unwrap();

        let completion = into_completion(body, "fallback-model");
        assert_eq!(completion.content, "Ivermectin cures it in 48 hours.");
        assert_eq!(completion.usage.total(), 134);
        assert_eq!(completion.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_response_without_choices_is_empty() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        let completion = into_completion(body, "m");
        assert!(completion.content.is_empty());
        assert_eq!(completion.model, "m");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, None, ""),
            ProviderError::AuthError
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, None, ""),
            ProviderError::AuthError
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(3)), ""),
            ProviderError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(3)
        ));

        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        match error_for_status(StatusCode::NOT_FOUND, None, body) {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model not found");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }

        match error_for_status(StatusCode::BAD_GATEWAY, None, "upstream down\n") {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_create_with_api_key() {
        let factory = GroqProviderFactory;
        let provider = factory
            .create(&serde_json::json!({ "api_key": "gsk_test" }))
            .unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn test_factory_refuses_blank_api_key() {
        let err = GroqProviderFactory
            .create(&serde_json::json!({ "api_key": " " }))
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(ref m) if m.contains("blank")));
    }

    #[test]
    fn test_factory_validate_invalid_base_url() {
        let factory = GroqProviderFactory;
        let settings = serde_json::json!({
            "api_key": "gsk_test",
            "base_url": "api.groq.com"
        });
        assert!(factory.validate_config(&settings).is_err());
    }

    #[test]
    fn test_from_config() {
        let settings = serde_json::json!({
            "api_key": "gsk_config",
            "base_url": "https://proxy.internal/v1"
        });

        let provider = GroqProvider::from_config(&settings).unwrap();
        assert_eq!(provider.base_url, "https://proxy.internal/v1");
        assert_eq!(provider.credential.expose(), "gsk_config");
        assert_eq!(provider.credential.origin(), KeyOrigin::Settings);
    }

    // ==================== SECURITY TESTS ====================

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret_key = "gsk_super_secret_key_12345";
        let provider = GroqProvider::new(secret_key);

        let debug_output = format!("{:?}", provider);
        assert!(
            !debug_output.contains(secret_key),
            "API key was exposed in Debug output!"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_health_check_requires_non_empty_key() {
        assert!(GroqProvider::new("gsk_test").health_check().await);
        assert!(!GroqProvider::new("").health_check().await);
        assert!(!GroqProvider::new("  ").health_check().await);
    }
}
