use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Script file handling and walker settings
    #[serde(default)]
    pub script: ScriptConfig,

    /// Cost reporting
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: Ollama
    Ollama,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    /// Whether the hosted API refuses requests without a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// File holding the full domain prompt; the built-in prompt is used when missing
    #[serde(default = "default_prompt_file")]
    pub prompt_file: String,

    /// Temperature parameter for text generation
    /// Zero keeps translations deterministic
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Frequency penalty sent to providers that support it
    #[serde(default = "default_penalty")]
    pub frequency_penalty: f32,

    /// Presence penalty sent to providers that support it
    #[serde(default = "default_penalty")]
    pub presence_penalty: f32,

    /// Total attempts per translation call
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed delay between attempts (in milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Replies longer than this multiple of the input are rejected
    #[serde(default = "default_max_reply_ratio")]
    pub max_reply_ratio: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            prompt_file: default_prompt_file(),
            temperature: default_temperature(),
            frequency_penalty: default_penalty(),
            presence_penalty: default_penalty(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_reply_ratio: default_max_reply_ratio(),
        }
    }
}

/// A glossary entry describing one game character
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CharacterEntry {
    /// Name as written in the script
    pub source: String,
    /// English rendering of the name
    pub name: String,
    /// Optional short name used in dialogue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Gender hint for pronoun choice
    pub gender: String,
}

impl CharacterEntry {
    fn new(source: &str, name: &str, nickname: Option<&str>, gender: &str) -> Self {
        Self {
            source: source.to_string(),
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
            gender: gender.to_string(),
        }
    }
}

/// Configuration for script processing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScriptConfig {
    /// Directory holding the untranslated scripts
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Directory receiving the translated scripts
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Encoding label of both input and output files
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Column at which translated dialogue is wrapped
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Number of previous lines handed to the model as context
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Number of files translated concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Translate lines that are not introduced by a control marker
    #[serde(default = "default_true")]
    pub translate_unmarked_lines: bool,

    /// Speaker names substituted without a model call
    #[serde(default = "default_known_speakers")]
    pub known_speakers: BTreeMap<String, String>,

    /// Character glossary sent with every request
    #[serde(default = "default_characters")]
    pub characters: Vec<CharacterEntry>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            encoding: default_encoding(),
            wrap_width: default_wrap_width(),
            max_history: default_max_history(),
            workers: default_workers(),
            translate_unmarked_lines: true,
            known_speakers: default_known_speakers(),
            characters: default_characters(),
        }
    }
}

/// Pricing used for the cost column of the run summary
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PricingConfig {
    /// Dollars per 1000 tokens
    #[serde(default = "default_cost_per_1k_tokens")]
    pub cost_per_1k_tokens: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cost_per_1k_tokens: default_cost_per_1k_tokens(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_prompt_file() -> String {
    "prompt.txt".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_penalty() -> f32 {
    0.2
}

fn default_retry_count() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_max_reply_ratio() -> usize {
    15
}

fn default_input_dir() -> String {
    "files".to_string()
}

fn default_output_dir() -> String {
    "translated".to_string()
}

fn default_encoding() -> String {
    "shift_jis".to_string()
}

fn default_wrap_width() -> usize {
    40
}

fn default_max_history() -> usize {
    10
}

fn default_workers() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_cost_per_1k_tokens() -> f64 {
    0.002
}

fn default_known_speakers() -> BTreeMap<String, String> {
    [
        ("John", "John"),
        ("Bob", "Bob"),
        ("Tom", "Tom"),
        ("女教師", "Female Teacher"),
    ]
    .into_iter()
    .map(|(source, name)| (source.to_string(), name.to_string()))
    .collect()
}

fn default_characters() -> Vec<CharacterEntry> {
    vec![
        CharacterEntry::new("如月亜里愛", "Kisaragi Aria", Some("Aria"), "Female"),
        CharacterEntry::new("愛洲美彌子", "Aisu Miyako", None, "Female"),
        CharacterEntry::new("喜遊名心", "Cocoa Kiyuna", None, "Female"),
        CharacterEntry::new("柵瀬愛色", "Ai Sakurai", None, "Female"),
        CharacterEntry::new("陰平小鞠", "Komari Kagehira", None, "Female"),
        CharacterEntry::new("訓覇一縷", "Ichiru Kurube", None, "Female"),
        CharacterEntry::new("緋皇月", "Luna Hisube", None, "Female"),
        CharacterEntry::new("刑事", "Detective", None, "Male"),
    ]
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1".to_string(),
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
    }
}

fn default_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::OpenAI => "gpt-3.5-turbo".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model".to_string(),
        TranslationProvider::Ollama => "llama3".to_string(),
        TranslationProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.validate_with(true)
    }

    /// Validate, optionally skipping the API key check (estimate runs never call the provider)
    pub fn validate_with(&self, require_api_key: bool) -> Result<()> {
        if require_api_key && self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        if encoding_rs::Encoding::for_label(self.script.encoding.as_bytes()).is_none() {
            return Err(anyhow!("Unknown script encoding: {}", self.script.encoding));
        }

        if self.script.workers == 0 {
            return Err(anyhow!("At least one worker is required"));
        }

        if self.script.wrap_width == 0 {
            return Err(anyhow!("Wrap width must be greater than zero"));
        }

        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("Retry count must allow at least one attempt"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            translation: TranslationConfig::default(),
            script: ScriptConfig::default(),
            pricing: PricingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider, inserting defaults when absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter()
            .position(|p| p.provider_type == provider_str);
        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(self.provider),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => default_endpoint(self.provider),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::LMStudio),
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
