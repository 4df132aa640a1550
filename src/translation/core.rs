/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which wraps a
 * single line translation: it decides whether a line needs the model at
 * all, masks control codes, calls the provider, cleans and validates the
 * reply, and retries the whole call on failure.
 */

use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, TranslationCommonConfig};
use crate::errors::TranslationError;
use crate::providers::{CompletionRequest, Provider};

use super::context::CharacterGlossary;
use super::formatting::ReplyFormatter;
use super::placeholders::{mask, unmask};
use super::prompts::{PromptKind, PromptTemplate};
use super::retry::RetryPolicy;
use super::usage::{contains_source_text, estimate_tokens};

/// Whether the service calls the model or only estimates cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    #[default]
    Live,
    /// Dry run: no provider call, approximate token count
    Estimate,
}

/// How a translation result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationKind {
    /// Returned by the model
    Translated,
    /// Estimate mode, text unchanged
    Estimated,
    /// Nothing to translate, text unchanged at zero cost
    Untouched,
}

/// Result of a single translation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub tokens: u64,
    pub kind: TranslationKind,
}

impl Translation {
    fn unchanged(text: &str, tokens: u64, kind: TranslationKind) -> Self {
        Self {
            text: text.to_string(),
            tokens,
            kind,
        }
    }
}

/// Translation options for customizing each model call
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Penalty on frequent tokens
    pub frequency_penalty: f32,

    /// Penalty on tokens already present
    pub presence_penalty: f32,

    /// Maximum reply/input length ratio before a reply is rejected
    pub max_reply_ratio: usize,

    /// Retry budget for a whole call
    pub retry: RetryPolicy,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self::from_common(&TranslationCommonConfig::default())
    }
}

impl TranslationOptions {
    pub fn from_common(common: &TranslationCommonConfig) -> Self {
        Self {
            temperature: common.temperature,
            frequency_penalty: common.frequency_penalty,
            presence_penalty: common.presence_penalty,
            max_reply_ratio: common.max_reply_ratio,
            retry: RetryPolicy::new(common.retry_count, Duration::from_millis(common.retry_delay_ms)),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Main translation service for script lines
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Provider implementation
    provider: Arc<dyn Provider>,

    /// Live or estimate
    mode: TranslationMode,

    /// System instructions
    prompts: PromptTemplate,

    /// Character glossary sent with every request
    glossary: CharacterGlossary,

    /// Sampling, validation and retry options
    pub options: TranslationOptions,
}

impl TranslationService {
    /// Create a live translation service around a provider
    pub fn new(provider: Arc<dyn Provider>, prompts: PromptTemplate, glossary: CharacterGlossary, options: TranslationOptions) -> Self {
        Self {
            provider,
            mode: TranslationMode::Live,
            prompts,
            glossary,
            options,
        }
    }

    /// Create a service configured from the application config
    pub fn from_config(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self::new(
            provider,
            PromptTemplate::load(&config.translation.common.prompt_file),
            CharacterGlossary::new(config.script.characters.clone()),
            TranslationOptions::from_common(&config.translation.common),
        )
    }

    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> TranslationMode {
        self.mode
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Test the connection to the provider
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        Ok(self.provider.test_connection().await?)
    }

    /// Translate one piece of text, retrying the whole call on failure
    pub async fn translate(&self, text: &str, context: &str, prompt: PromptKind) -> Result<Translation, TranslationError> {
        self.options
            .retry
            .run(move || self.translate_once(text, context, prompt))
            .await
    }

    async fn translate_once(&self, text: &str, context: &str, prompt: PromptKind) -> Result<Translation, TranslationError> {
        if self.mode == TranslationMode::Estimate {
            let tokens = 2 * estimate_tokens(text) + estimate_tokens(context) + estimate_tokens(self.prompts.full());
            return Ok(Translation::unchanged(text, tokens, TranslationKind::Estimated));
        }

        let (masked, table) = mask(text);
        let masked = masked.replace('\u{3000}', " ");
        if !contains_source_text(&masked) {
            return Ok(Translation::unchanged(text, 0, TranslationKind::Untouched));
        }

        let request = self.build_request(&masked, context, prompt);
        debug!("{} <- {}", self.provider.name(), masked);
        let completion = self.provider.complete(request).await?;
        debug!("{} -> {} ({} tokens)", self.provider.name(), completion.text, completion.total_tokens);

        let restored = unmask(&completion.text, &table);
        let cleaned = ReplyFormatter::clean_reply(&restored);
        ReplyFormatter::validate_reply(&cleaned, text, self.options.max_reply_ratio)?;

        Ok(Translation {
            text: cleaned,
            tokens: completion.total_tokens,
            kind: TranslationKind::Translated,
        })
    }

    /// Assemble system prompt, glossary, context and the masked line
    pub fn build_request(&self, masked: &str, context: &str, prompt: PromptKind) -> CompletionRequest {
        let mut request = CompletionRequest::new(self.prompts.system(prompt))
            .temperature(self.options.temperature)
            .penalties(self.options.frequency_penalty, self.options.presence_penalty);

        if !self.glossary.is_empty() {
            request = request.user(self.glossary.render());
        }
        request.user(context).user(PromptTemplate::line_message(masked))
    }
}
