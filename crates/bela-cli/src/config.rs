use std::path::Path;

use bela_core::core::{TokenizerOptions, DEFAULT_NON_WORD, DEFAULT_TURN_THRESHOLD_MS};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub linker: LinkerConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub turns: TurnsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    pub allow_empty: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub word_only: bool,
    pub ellipsis: bool,
    pub split_punc: bool,
    pub remove_punc: bool,
    pub nlp_tokenizer: bool,
    pub non_word: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        let defaults = TokenizerOptions::default();
        Self {
            word_only: defaults.word_only,
            ellipsis: defaults.ellipsis,
            split_punc: defaults.split_punc,
            remove_punc: defaults.remove_punc,
            nlp_tokenizer: defaults.nlp_tokenizer,
            non_word: DEFAULT_NON_WORD.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TurnsConfig {
    pub threshold_ms: u64,
}

impl Default for TurnsConfig {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_TURN_THRESHOLD_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "json".to_owned(),
        }
    }
}
