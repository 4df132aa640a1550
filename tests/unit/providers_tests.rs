/*!
 * Tests for provider construction, wire formats and the mock provider
 */

use std::time::Duration;

use lune_translator::app_config::{TranslationConfig, TranslationProvider};
use lune_translator::errors::ProviderError;
use lune_translator::providers::anthropic::{Anthropic, AnthropicRequest};
use lune_translator::providers::mock::MockProvider;
use lune_translator::providers::ollama::{ChatRequest, Ollama};
use lune_translator::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use lune_translator::providers::{build_provider, normalize_endpoint, CompletionRequest, Provider};

fn sample_request() -> CompletionRequest {
    CompletionRequest::new("system prompt")
        .temperature(0.0)
        .penalties(0.2, 0.4)
        .user("Previous Text for Context: ")
        .user("Line to Translate = はい")
}

#[test]
fn test_buildProvider_shouldFollowConfiguredProvider() {
    let mut config = TranslationConfig::default();

    for (provider, name) in [
        (TranslationProvider::OpenAI, "OpenAI"),
        (TranslationProvider::LMStudio, "LM Studio"),
        (TranslationProvider::Ollama, "Ollama"),
        (TranslationProvider::Anthropic, "Anthropic"),
    ] {
        config.provider = provider;
        let built = build_provider(&config).unwrap();
        assert_eq!(built.name(), name);
    }
}

#[test]
fn test_buildProvider_withEmptyEndpoint_shouldFallBackToDefault() {
    let mut config = TranslationConfig::default();
    config.provider = TranslationProvider::Ollama;
    config.active_provider_config_mut().endpoint = String::new();
    assert!(build_provider(&config).is_ok());
}

#[test]
fn test_providerConstructors_withTimeout_shouldReturnClients() {
    let endpoint = normalize_endpoint("localhost:8080").unwrap();
    let timeout = Duration::from_secs(5);

    let openai = OpenAI::new("LM Studio", "", endpoint.clone(), "qwen2.5-7b", timeout).unwrap();
    assert_eq!(openai.name(), "LM Studio");
    assert_eq!(Ollama::new(endpoint.clone(), "llama3", timeout).unwrap().name(), "Ollama");
    assert_eq!(Anthropic::new("sk-ant-test", endpoint, "claude-3-haiku-20240307", timeout).unwrap().name(), "Anthropic");
}

#[test]
fn test_normalizeEndpoint_shouldAssumeHttp() {
    assert_eq!(normalize_endpoint("localhost:11434").unwrap().as_str(), "http://localhost:11434/");
    assert_eq!(normalize_endpoint("https://api.openai.com/v1").unwrap().scheme(), "https");
    assert!(matches!(normalize_endpoint("  "), Err(ProviderError::ConnectionError(_))));
}

#[test]
fn test_openAiRequest_shouldCarrySystemFirstAndPenalties() {
    let wire = OpenAIRequest::from_completion("gpt-3.5-turbo", &sample_request());
    let json = serde_json::to_value(&wire).unwrap();

    assert_eq!(json["model"], "gpt-3.5-turbo");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][0]["content"], "system prompt");
    assert_eq!(json["messages"][2]["content"], "Line to Translate = はい");
    assert!((json["presence_penalty"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    assert!(json.get("max_tokens").is_none());
}

#[test]
fn test_openAiResponse_shouldReadTextAndUsage() {
    let body = r#"{
        "choices": [{ "message": { "role": "assistant", "content": "Translation: Yes" } }],
        "usage": { "prompt_tokens": 30, "completion_tokens": 4, "total_tokens": 34 }
    }"#;
    let response: OpenAIResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.extract_text().as_deref(), Some("Translation: Yes"));
    assert_eq!(response.total_tokens(), 34);
}

#[test]
fn test_ollamaRequest_shouldMapPenaltiesToRepeatPenalty() {
    let wire = ChatRequest::from_completion("llama3", &sample_request());
    let json = serde_json::to_value(&wire).unwrap();

    assert_eq!(json["stream"], false);
    assert_eq!(json["messages"].as_array().unwrap().len(), 3);
    assert!((json["options"]["repeat_penalty"].as_f64().unwrap() - 1.4).abs() < 1e-6);
}

#[test]
fn test_anthropicRequest_shouldMoveSystemOutOfMessages() {
    let wire = AnthropicRequest::from_completion("claude-3-haiku-20240307", &sample_request());
    let json = serde_json::to_value(&wire).unwrap();

    assert_eq!(json["system"], "system prompt");
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Previous Text for Context: \n\nLine to Translate = はい");
    assert!(json.get("frequency_penalty").is_none());
}

#[tokio::test]
async fn test_mockProvider_shouldRecordRequestsAcrossClones() {
    let provider = MockProvider::working();
    let clone = provider.clone();

    let completion = clone.complete(sample_request()).await.unwrap();

    assert_eq!(completion.text, "Translation: [EN] はい");
    assert_eq!(completion.total_tokens, MockProvider::TOKENS_PER_CALL);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.translated_lines(), vec!["はい".to_string()]);
}

#[tokio::test]
async fn test_mockProvider_withIntermittentFailures_shouldFailEveryNth() {
    let provider = MockProvider::intermittent(3);
    let mut outcomes = Vec::new();
    for _ in 0..6 {
        outcomes.push(provider.complete(sample_request()).await.is_ok());
    }
    assert_eq!(outcomes, vec![true, true, false, true, true, false]);
}
