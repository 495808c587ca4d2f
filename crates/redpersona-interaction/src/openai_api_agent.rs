//! OpenAIApiAgent - Direct REST API implementation for OpenAI GPT.
//!
//! Calls the Chat Completions API with the category's system prompt and the
//! evidence prompt as the user message.
//! Configuration priority: ~/.config/redpersona/secret.json > environment variables

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};

use redpersona_core::PersonaError;
use redpersona_core::agent::{InferenceAgent, InferenceError, InferenceRequest};
use redpersona_core::config::OpenAIConfig;
use redpersona_infrastructure::storage::SecretStorage;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Agent implementation that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAIApiAgent {
    /// Creates a new agent with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: OpenAIConfig) -> Self {
        let model = config
            .model_name
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into());
        Self::new(config.api_key, model)
    }

    /// Loads configuration from ~/.config/redpersona/secret.json or environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/redpersona/secret.json
    /// 2. Environment variables (OPENAI_API_KEY, OPENAI_MODEL_NAME)
    ///
    /// Model name defaults to `gpt-4o-mini` if not specified.
    pub fn try_from_env() -> Result<Self, PersonaError> {
        if let Ok(storage) = SecretStorage::new()
            && let Ok(secret_config) = storage.load()
            && let Some(openai_config) = secret_config.openai
        {
            return Ok(Self::from_config(openai_config));
        }

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            PersonaError::config(
                "OPENAI_API_KEY not found in ~/.config/redpersona/secret.json or environment variables",
            )
        })?;

        let model = env::var("OPENAI_MODEL_NAME").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the agent at an OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: InferenceRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_builder() {
                    InferenceError::Permanent(format!("Invalid OpenAI API request: {err}"))
                } else {
                    InferenceError::transient(format!("OpenAI API request failed: {err}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            InferenceError::Malformed(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl InferenceAgent for OpenAIApiAgent {
    fn expertise(&self) -> &str {
        "OpenAI chat completion"
    }

    async fn execute(&self, request: InferenceRequest) -> Result<String, InferenceError> {
        let body = self.build_request(request);
        tracing::debug!(model = %self.model, "Sending chat completion request");
        self.send_request(&body).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, InferenceError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            InferenceError::Malformed("OpenAI API returned no content in the response".into())
        })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> InferenceError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    let message = format!("{} {}", status.as_u16(), message);

    let is_retryable = matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    if is_retryable {
        InferenceError::Transient {
            message,
            retry_after,
        }
    } else {
        InferenceError::Permanent(message)
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // HTTP-date values are ignored; the exponential schedule applies.
    None
}
