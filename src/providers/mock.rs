/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with a tagged echo of the line
 * - `MockProvider::fail_first(n)` - Fails `n` times, then succeeds
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::refusing()` / `oversized()` - Replies the gateway must reject
 *
 * Every request is recorded so tests can inspect what the model was sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Completion, CompletionRequest, Provider};
use crate::translation::formatting::REFUSAL_PHRASE;
use crate::translation::prompts::LINE_MARKER;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a translation
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails the first N requests, then works
    FailFirst { failures: usize },
    /// Always fails with an error
    Failing,
    /// Replies with the refusal phrase
    Refusing,
    /// Replies with text far longer than the input
    Oversized,
    /// Simulates slow response (for concurrency testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Custom response generator (optional), given the line to translate
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Tokens reported for every successful completion
    pub const TOKENS_PER_CALL: u64 = 10;

    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a mock that fails `failures` times before working
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that always refuses
    pub fn refusing() -> Self {
        Self::new(MockBehavior::Refusing)
    }

    /// Create a mock whose replies are far too long
    pub fn oversized() -> Self {
        Self::new(MockBehavior::Oversized)
    }

    /// Create a mock that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copies of every request received so far
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// The lines sent for translation, with the line marker removed
    pub fn translated_lines(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|request| request.last_user_message().map(Self::line_of))
            .collect()
    }

    fn line_of(message: &str) -> String {
        message.strip_prefix(LINE_MARKER).unwrap_or(message).to_string()
    }

    fn translate(&self, line: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(line),
            None => format!("Translation: [EN] {}", line),
        }
    }

    fn success(&self, line: &str) -> Result<Completion, ProviderError> {
        Ok(Completion {
            text: self.translate(line),
            total_tokens: Self::TOKENS_PER_CALL,
        })
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let line = request.last_user_message().map(Self::line_of).unwrap_or_default();
        self.requests.lock().push(request);

        match self.behavior {
            MockBehavior::Working => self.success(&line),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.success(&line)
                }
            }

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(ProviderError::Timeout(format!("Simulated timeout (request #{})", count + 1)))
                } else {
                    self.success(&line)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Refusing => Ok(Completion {
                text: format!("{}.", REFUSAL_PHRASE),
                total_tokens: Self::TOKENS_PER_CALL,
            }),

            MockBehavior::Oversized => Ok(Completion {
                text: "la ".repeat(line.chars().count() * 16 + 1),
                total_tokens: Self::TOKENS_PER_CALL,
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.success(&line)
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
