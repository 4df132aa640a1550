use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{check_status, endpoint_url, http_client, ChatMessage, Completion, CompletionRequest, Provider};

/// OpenAI client for the chat completions API
///
/// Also serves OpenAI-compatible local servers such as LM Studio, which
/// accept requests without an API key.
pub struct OpenAI {
    /// Name shown in logs
    name: String,
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (may be empty for local servers)
    api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: Url,
    /// Model identifier
    model: String,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    temperature: f32,

    /// Penalty on frequent tokens
    frequency_penalty: f32,

    /// Penalty on tokens already present
    presence_penalty: f32,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: ChatMessage,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Build the wire request from a provider-neutral one
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: request.chat_messages(),
            temperature: request.temperature,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            max_tokens: None,
        }
    }
}

impl OpenAIResponse {
    /// Total tokens reported by the API, summing parts when the total is missing
    pub fn total_tokens(&self) -> u64 {
        match &self.usage {
            Some(usage) if usage.total_tokens > 0 => usage.total_tokens,
            Some(usage) => usage.prompt_tokens + usage.completion_tokens,
            None => 0,
        }
    }

    /// Text of the first choice
    pub fn extract_text(&self) -> Option<String> {
        self.choices.first().map(|choice| choice.message.content.clone())
    }
}

impl OpenAI {
    /// Create a new OpenAI-compatible client
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: Url,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.into(),
            client: http_client(timeout)?,
            api_key: api_key.into(),
            endpoint,
            model: model.into(),
        })
    }

    async fn send(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let api_url = endpoint_url(&self.endpoint, "chat/completions");

        let mut builder = self.client.post(&api_url).header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.name, e))?;
        let response = check_status(&self.name, response).await?;

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("{} response: {}", self.name, e)))
    }
}

impl fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAI")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let wire = OpenAIRequest::from_completion(&self.model, &request);
        let response = self.send(&wire).await?;

        let total_tokens = response.total_tokens();
        let text = response.extract_text().ok_or(ProviderError::EmptyResponse)?;
        debug!("{} completion: {} tokens", self.name, total_tokens);

        Ok(Completion { text, total_tokens })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let mut wire = OpenAIRequest::from_completion(&self.model, &CompletionRequest::new("").user("Hello"));
        wire.max_tokens = Some(5);
        self.send(&wire).await.map(|_| ())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
