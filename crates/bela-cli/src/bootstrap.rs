use anyhow::{ensure, Context};
use bela_core::core::{LinkOptions, Linker, SegmenterRegistry, Tokenizer, TokenizerOptions};

use crate::config::AppConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];

// ---------------------------------------------------------------------------
// RuntimeConfig — fully validated runtime configuration
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RuntimeConfig {
    pub linker: Linker,
    pub turn_threshold_ms: u64,
    pub log_level: String,
    pub log_format: String,
}

// ---------------------------------------------------------------------------
// into_runtime — converts raw AppConfig into validated RuntimeConfig
// ---------------------------------------------------------------------------

pub fn into_runtime(config: AppConfig) -> Result<RuntimeConfig, anyhow::Error> {
    ensure!(
        LOG_LEVELS.contains(&config.logging.level.as_str()),
        "unknown log level: {}",
        config.logging.level
    );
    ensure!(
        LOG_FORMATS.contains(&config.logging.format.as_str()),
        "unknown log format: {}",
        config.logging.format
    );

    let tok = config.tokenizer;
    let options = TokenizerOptions {
        word_only: tok.word_only,
        ellipsis: tok.ellipsis,
        split_punc: tok.split_punc,
        remove_punc: tok.remove_punc,
        nlp_tokenizer: tok.nlp_tokenizer,
        non_word: tok.non_word,
    };
    let mut tokenizer = Tokenizer::new(options).context("invalid [tokenizer] section")?;
    if tokenizer.options().nlp_tokenizer {
        tokenizer = tokenizer.with_segmenters(SegmenterRegistry::builtin());
    }

    let link_options = LinkOptions {
        allow_empty: config.linker.allow_empty,
    };

    Ok(RuntimeConfig {
        linker: Linker::new(link_options, tokenizer),
        turn_threshold_ms: config.turns.threshold_ms,
        log_level: config.logging.level,
        log_format: config.logging.format,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LinkerConfig, LoggingConfig, TokenizerConfig, TurnsConfig};

    fn make_config() -> AppConfig {
        AppConfig {
            linker: LinkerConfig { allow_empty: true },
            tokenizer: TokenizerConfig::default(),
            turns: TurnsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_conversion() {
        let runtime = into_runtime(make_config()).expect("valid config should convert");

        assert!(runtime.linker.options().allow_empty);
        assert!(runtime.linker.tokenizer().options().word_only);
        assert_eq!(runtime.linker.tokenizer().options().non_word, "XbeepX");
        assert_eq!(runtime.turn_threshold_ms, 1500);
        assert_eq!(runtime.log_level, "info");
        assert_eq!(runtime.log_format, "json");
    }

    #[test]
    fn test_nlp_tokenizer_uses_builtin_segmenters() {
        let mut config = make_config();
        config.tokenizer.nlp_tokenizer = true;

        let runtime = into_runtime(config).expect("nlp config should convert");
        let tokens = runtime
            .linker
            .tokenizer()
            .tokenize("我要", Some("Mandarin"))
            .tokens;
        assert_eq!(tokens, vec!["我", "要"]);
    }

    #[test]
    fn test_invalid_non_word_rejected() {
        let mut config = make_config();
        config.tokenizer.non_word = "beep beep".to_owned();

        match into_runtime(config) {
            Err(e) => {
                assert!(e.to_string().contains("invalid [tokenizer] section"));
                assert!(format!("{e:#}").contains("non-word placeholder"));
            }
            Ok(_) => panic!("expected error for invalid non_word"),
        }
    }

    #[test]
    fn test_zero_threshold_accepted() {
        let mut config = make_config();
        config.turns.threshold_ms = 0;

        let runtime = into_runtime(config).expect("zero threshold is valid");
        assert_eq!(runtime.turn_threshold_ms, 0);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = make_config();
        config.logging.format = "xml".to_owned();

        match into_runtime(config) {
            Err(e) => assert!(e.to_string().contains("unknown log format: xml")),
            Ok(_) => panic!("expected error for unknown log format"),
        }
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = make_config();
        config.logging.level = "loud".to_owned();

        match into_runtime(config) {
            Err(e) => assert!(e.to_string().contains("unknown log level: loud")),
            Ok(_) => panic!("expected error for unknown log level"),
        }
    }
}
