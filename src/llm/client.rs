//! OpenAI-compatible completion client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Default API base when none is configured.
const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

/// A message in a conversation with the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Fixed sampling parameters applied to every request of a stage.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f64,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

/// A single completion request: one prompt plus sampling configuration.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier to use.
    pub model: String,
    /// The templated prompt for this iteration.
    pub prompt: String,
    /// Sampling parameters for this request.
    pub sampling: SamplingParams,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, sampling: SamplingParams) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            sampling,
        }
    }
}

/// Trait for backends that can complete a prompt.
///
/// The reply is the raw text payload of the first choice; parsing it is
/// the caller's responsibility.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete the given prompt and return the reply payload.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// Client for OpenAI-compatible chat-completion APIs.
pub struct CompletionClient {
    /// Base URL for the API.
    api_base: String,
    /// API key for authentication.
    api_key: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl CompletionClient {
    /// Create a new client with explicit configuration.
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            api_base,
            api_key,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Create a client from environment variables.
    ///
    /// Reads `OPENROUTER_API_KEY` (required) and `LLM_API_BASE` (optional,
    /// defaults to OpenRouter).
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("OPENROUTER_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        let api_base = env::var("LLM_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(Self::new(api_base, api_key))
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: Message,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let api_request = ApiRequest {
            model: request.model,
            messages: vec![Message::user(request.prompt)],
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
        };

        let url = format!("{}/chat/completions", self.api_base);

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if status_code == 429 {
                    return Err(LlmError::RateLimited(error_response.error.message));
                }
                return Err(LlmError::ApiError {
                    code: status_code,
                    message: error_response.error.message,
                });
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No choices in API response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are precise.");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "You are precise.");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_api_request_serialization() {
        let request = ApiRequest {
            model: "openai/gpt-3.5-turbo".to_string(),
            messages: vec![Message::user("test")],
            temperature: 0.3,
            max_tokens: 2000,
        };

        let json = serde_json::to_string(&request).expect("serialization should succeed");
        assert!(json.contains("\"model\":\"openai/gpt-3.5-turbo\""));
        assert!(json.contains("\"temperature\":0.3"));
        assert!(json.contains("\"max_tokens\":2000"));
    }

    #[tokio::test]
    async fn test_connection_error_maps_to_request_failed() {
        let client = CompletionClient::new(
            "http://localhost:65535".to_string(),
            "test-key".to_string(),
        );

        let request = CompletionRequest::new(
            "openai/gpt-3.5-turbo",
            "test",
            SamplingParams {
                temperature: 0.3,
                max_tokens: 100,
            },
        );

        let result = client.complete(request).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}
