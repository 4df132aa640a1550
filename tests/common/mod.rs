/*!
 * Common test utilities for the lune-translator test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use lune_translator::app_config::{Config, TranslationProvider};
use lune_translator::providers::mock::MockProvider;
use lune_translator::translation::context::CharacterGlossary;
use lune_translator::translation::{PromptTemplate, RetryPolicy, TranslationOptions, TranslationService};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes `lines` joined with CRLF, encoded as Shift-JIS
pub fn create_sjis_script(dir: &Path, filename: &str, lines: &[&str]) -> Result<PathBuf> {
    let content = lines.join("\r\n") + "\r\n";
    let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&content);
    assert!(!had_errors, "test script must be representable in Shift-JIS");
    let file_path = dir.join(filename);
    fs::write(&file_path, &bytes)?;
    Ok(file_path)
}

/// Reads a Shift-JIS file back into its lines
pub fn read_sjis_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let (content, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes);
    Ok(content.lines().map(str::to_string).collect())
}

/// Translates a few known phrases; anything else is echoed back
pub fn dictionary_reply(line: &str) -> String {
    let translated = line
        .replace("こんにちは", "Hello")
        .replace("さようなら", "Goodbye")
        .replace("ありがとう", "Thank you")
        .replace("アリア", "Aria.");
    format!("Translation: {}", translated)
}

/// Config whose input and output directories live under `root`
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.common.retry_delay_ms = 0;
    config.script.input_dir = root.join("files").to_string_lossy().to_string();
    config.script.output_dir = root.join("translated").to_string_lossy().to_string();
    config.script.workers = 4;
    config
}

/// Translation service over a mock provider, retrying without delay
pub fn mock_service(provider: &MockProvider) -> TranslationService {
    TranslationService::new(
        Arc::new(provider.clone()),
        PromptTemplate::default(),
        CharacterGlossary::default(),
        TranslationOptions::default().with_retry(RetryPolicy::new(5, Duration::ZERO)),
    )
}
