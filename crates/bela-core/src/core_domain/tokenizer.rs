use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::{
    expand, is_special_token, split_punctuation, ConfigError, SegmenterRegistry, DEFAULT_NON_WORD,
    MARKUP_CHARS,
};

static PRETOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s?？؟]+|[?？؟]").expect("valid pretoken pattern"));

/// A stop run followed by non-stop characters up to the end, e.g. `wh..at`.
static INNER_STOP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+[^$.?]+$").expect("valid inner stop pattern"));

const ELLIPSIS: &str = "...";

/// Splits on whitespace; each question-mark variant becomes its own token.
pub fn pretokenize(text: &str) -> Vec<&str> {
    PRETOKEN.find_iter(text).map(|m| m.as_str()).collect()
}

pub fn is_punctuation_token(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_punctuation() || " ，。？（）！؟".contains(c),
        _ => matches!(token, "``" | "''" | ELLIPSIS),
    }
}

// ---------------------------------------------------------------------------
// Invalid characters
// ---------------------------------------------------------------------------

const INVALID_CHARS: &[char] = &[
    '{', '}', '[', ']', '\r', '\n', '\t', ',', 'ɡ', 'ʔ', 'ʲ', '‘', '’',
];
const FULLWIDTH_CHARS: &[char] = &['，', '。', '？', '（', '）', '！', '\u{3000}'];
const HALFWIDTH_CHARS: &[char] = &['(', ')'];

/// Characters not allowed in transcript text for `language`, in order of
/// occurrence. Mandarin rejects half-width brackets, other tagged languages
/// reject full-width punctuation.
pub fn find_invalid_characters(text: &str, language: Option<&str>) -> Vec<char> {
    let extra: &[char] = match language.map(str::trim) {
        None | Some("") => &[],
        Some("Mandarin") => HALFWIDTH_CHARS,
        Some(_) => FULLWIDTH_CHARS,
    };
    text.chars()
        .filter(|c| INVALID_CHARS.contains(c) || extra.contains(c))
        .collect()
}

// ---------------------------------------------------------------------------
// TokenizerOptions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Emit `non_word` placeholders instead of literal markup.
    pub word_only: bool,
    /// Keep elided words (`wor...` → `wor`); drop them when off.
    pub ellipsis: bool,
    /// Detach leading/trailing punctuation from ordinary words.
    pub split_punc: bool,
    pub remove_punc: bool,
    /// Route ordinary words through the language's segmenter.
    pub nlp_tokenizer: bool,
    pub non_word: String,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            word_only: true,
            ellipsis: true,
            split_punc: false,
            remove_punc: true,
            nlp_tokenizer: false,
            non_word: DEFAULT_NON_WORD.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tokenized {
    pub tokens: Vec<String>,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// TokenSink — final token list with marker trimming
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TokenSink {
    tokens: Vec<String>,
}

impl TokenSink {
    fn push(&mut self, token: &str) {
        let token = token.strip_prefix('=').unwrap_or(token);
        let token = token.strip_suffix('~').unwrap_or(token);
        if !token.is_empty() {
            self.tokens.push(token.to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Tokenizer {
    options: TokenizerOptions,
    segmenters: SegmenterRegistry,
}

impl Tokenizer {
    pub fn new(options: TokenizerOptions) -> Result<Self, ConfigError> {
        let non_word = &options.non_word;
        if non_word.chars().any(char::is_whitespace) || non_word.contains(MARKUP_CHARS) {
            return Err(ConfigError::InvalidNonWord(non_word.clone()));
        }
        Ok(Self {
            options,
            segmenters: SegmenterRegistry::new(),
        })
    }

    pub fn with_segmenters(mut self, segmenters: SegmenterRegistry) -> Self {
        self.segmenters = segmenters;
        self
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Converts transcript text into normalized tokens.
    ///
    /// Malformed markup never aborts: each problem is reported in
    /// `errors` (naming the offending token) and processing continues with
    /// the next token.
    pub fn tokenize(&self, text: &str, language: Option<&str>) -> Tokenized {
        let opts = &self.options;
        let mut sink = TokenSink::default();
        let mut errors = Vec::new();

        for token in pretokenize(text) {
            if !is_special_token(token) {
                self.push_plain(&mut sink, &mut errors, token, language);
                continue;
            }
            let pieces = match expand(token, &opts.non_word, opts.word_only) {
                Ok(pieces) => pieces,
                Err(reason) => {
                    errors.push(format!("{reason} ({token})"));
                    continue;
                }
            };
            if pieces.is_empty() {
                errors.push(format!("Invalid token ({token})"));
                continue;
            }
            for piece in pieces.iter().filter(|p| !p.is_empty()) {
                // Literal markup (verbose mode) is kept as is.
                if piece.starts_with(':') || piece == token {
                    sink.push(piece);
                } else if is_special_token(piece.trim_start_matches('=')) {
                    errors.push(format!("Invalid token ({token})"));
                } else {
                    self.push_plain(&mut sink, &mut errors, piece, language);
                }
            }
        }

        let mut tokens = sink.tokens;
        if opts.remove_punc {
            tokens.retain(|t| !is_punctuation_token(t));
        }
        Tokenized { tokens, errors }
    }

    /// Tokenizes and rejoins with single spaces.
    pub fn process_text(&self, text: &str, language: Option<&str>) -> (String, Vec<String>) {
        let Tokenized { tokens, errors } = self.tokenize(text, language);
        (tokens.join(" "), errors)
    }

    /// Tilde and full-stop rules for one ordinary word.
    fn push_plain(
        &self,
        sink: &mut TokenSink,
        errors: &mut Vec<String>,
        token: &str,
        language: Option<&str>,
    ) {
        let word = token.strip_suffix('~').unwrap_or(token);
        if word.contains('~') {
            errors.push(format!("Tildes can only be placed at the end of a token ({token})"));
            self.push_word(sink, token, language);
            return;
        }
        if word == ELLIPSIS {
            errors.push("Ellipsis markers (...) must not follow empty space".to_owned());
            return;
        }
        if word.len() >= 2 && word.chars().all(|c| c == '.') {
            errors.push(format!("Unknown dots ({word})"));
            return;
        }

        let stem = word.trim_end_matches('.');
        let stops = word.len() - stem.len();
        // A single trailing stop stays part of the word (`e.g.`).
        let body = if stops >= 2 { stem } else { word };
        if INNER_STOP.is_match(body) {
            errors.push(format!("Invalid punctuation ({word})"));
        }
        if stops < 2 {
            self.push_word(sink, word, language);
        } else if stops != 3 {
            errors.push(format!(
                "Ellipses are denoted by exact 3 full stops ({word} was found)"
            ));
            self.push_word(sink, word, language);
        } else if self.options.ellipsis {
            self.push_word(sink, stem, language);
        }
    }

    fn push_word(&self, sink: &mut TokenSink, word: &str, language: Option<&str>) {
        let segmented;
        let units: Vec<&str> = if self.options.nlp_tokenizer {
            segmented = self.segmenters.for_language(language).segment(word);
            segmented.iter().map(String::as_str).collect()
        } else {
            vec![word]
        };
        for unit in units {
            if self.options.split_punc {
                for piece in split_punctuation(unit) {
                    sink.push(piece);
                }
            } else {
                sink.push(unit);
            }
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            options: TokenizerOptions::default(),
            segmenters: SegmenterRegistry::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
