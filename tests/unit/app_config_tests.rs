/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::fs;

use lune_translator::app_config::{Config, LogLevel, TranslationProvider};

use crate::common;

#[test]
fn test_defaultConfig_shouldSerializeAndParseBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    fs::write(&path, serde_json::to_string_pretty(&Config::default())?)?;
    let config: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;

    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.available_providers.len(), 4);
    assert_eq!(config.script.input_dir, "files");
    assert_eq!(config.script.output_dir, "translated");
    assert_eq!(config.script.characters.len(), Config::default().script.characters.len());
    assert_eq!(config.log_level, LogLevel::Info);
    Ok(())
}

#[test]
fn test_config_withCustomValues_shouldOverrideDefaults() -> Result<()> {
    let json = r#"{
        "translation": {
            "provider": "lmstudio",
            "available_providers": [
                { "type": "lmstudio", "model": "qwen2.5-7b", "endpoint": "localhost:1234/v1" }
            ],
            "common": { "retry_count": 2, "max_reply_ratio": 8 }
        },
        "script": {
            "encoding": "utf-8",
            "wrap_width": 52,
            "known_speakers": { "先生": "Teacher" },
            "characters": [ { "source": "山田", "name": "Yamada", "gender": "Male" } ]
        },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.translation.get_model(), "qwen2.5-7b");
    assert_eq!(config.translation.get_endpoint(), "localhost:1234/v1");
    assert_eq!(config.translation.get_timeout_secs(), 30);
    assert_eq!(config.translation.common.retry_count, 2);
    assert!((config.translation.common.frequency_penalty - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.script.wrap_width, 52);
    assert_eq!(config.script.max_history, 10);
    assert_eq!(config.script.known_speakers.len(), 1);
    assert_eq!(config.script.characters[0].nickname, None);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_validate_withZeroWorkersOrWidth_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.script.workers = 0;
    assert!(config.validate().is_err());

    config.script.workers = 1;
    config.script.wrap_width = 0;
    assert!(config.validate().is_err());

    config.script.wrap_width = 40;
    config.translation.common.retry_count = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withAnthropicKey_shouldPass() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    assert!(config.validate().is_err());

    config.translation.active_provider_config_mut().api_key = "sk-ant-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_provider_fromStr_shouldAcceptAnyCase() {
    assert_eq!("LMStudio".parse::<TranslationProvider>().unwrap(), TranslationProvider::LMStudio);
    assert!("bard".parse::<TranslationProvider>().is_err());
}
