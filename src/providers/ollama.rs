use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{check_status, endpoint_url, http_client, ChatMessage, Completion, CompletionRequest, Provider};

/// Ollama client for interacting with Ollama API
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: Url,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Penalty for repeated tokens (1.0 disables it)
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Build the wire request from a provider-neutral one
    ///
    /// Ollama has a single repetition penalty; the stronger of the two
    /// OpenAI-style penalties is mapped onto it.
    pub fn from_completion(model: &str, request: &CompletionRequest) -> Self {
        let penalty = request.frequency_penalty.max(request.presence_penalty);
        Self {
            model: model.to_string(),
            messages: request.chat_messages(),
            options: Some(GenerationOptions {
                temperature: Some(request.temperature),
                repeat_penalty: Some(1.0 + penalty),
            }),
            stream: false,
        }
    }
}

impl ChatResponse {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_eval_count.unwrap_or(0) + self.eval_count.unwrap_or(0)
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(base_url: Url, model: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url,
            client: http_client(timeout)?,
            model: model.into(),
        })
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/chat");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest("Ollama", e))?;
        let response = check_status("Ollama", response).await?;

        // Get the raw response text first
        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest("Ollama", e))?;

        serde_json::from_str::<ChatResponse>(&response_text).map_err(|e| {
            error!(
                "Failed to parse Ollama API chat response: {}. Raw response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            );
            ProviderError::ParseError(format!("Ollama response: {}", e))
        })
    }

    /// List the models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        #[derive(Deserialize)]
        struct Tags {
            models: Vec<Tag>,
        }
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }

        let url = endpoint_url(&self.base_url, "api/tags");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest("Ollama", e))?;
        let response = check_status("Ollama", response).await?;
        let tags = response
            .json::<Tags>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Ollama tags: {}", e)))?;

        Ok(tags.models.into_iter().map(|t| t.name).collect())
    }
}

impl fmt::Debug for Ollama {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ollama")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let wire = ChatRequest::from_completion(&self.model, &request);
        let response = self.chat(&wire).await?;

        let total_tokens = response.total_tokens();
        if response.message.content.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        debug!("Ollama completion: {} tokens", total_tokens);

        Ok(Completion {
            text: response.message.content,
            total_tokens,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let models = self.list_models().await?;
        let wanted = self.model.as_str();
        if models.iter().any(|m| m == wanted || m.split(':').next() == Some(wanted)) {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: 404,
                message: format!("Model {} is not installed on the Ollama server", wanted),
            })
        }
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
