use std::sync::LazyLock;

use regex::Regex;

use crate::core::InvalidTokenError;

pub const DEFAULT_NON_WORD: &str = "XbeepX";

/// Characters that route a token through the markup grammar.
pub const MARKUP_CHARS: [char; 5] = ['<', ':', '/', '#', '='];

const VOCAL_CLASSES: &[&str] = &[
    "crying",
    "kissing_sound",
    "tsk",
    "airstream",
    "coughing",
    "animal_sound",
    "flamingo_sound",
    "orangutan_sound",
    "elephant_sound",
    "lightning_sound",
    "splash_sound",
    "thunder_sound",
    "rain_sound",
    "ringing_sound",
    "screaming_sound",
    "shushing_sound",
    "train_sound",
    "gasp",
    "laughter",
    "sigh",
    "vocalizations",
    "whistle",
    "x",
];

/// Three-part vocal sounds carrying words: `:v:r:<words>` / `:v:u:<words>`.
const VOCAL_WORD_CLASSES: &[&str] = &["r", "u"];

/// Markers emitted on their own in verbose mode (`:si:la` → `:si`, `la`).
const BARE_MARKERS: &[&str] = &["m", "si", "d"];

const NON_VOCAL_SOUNDS: &[&str] = &["clapping", "sneeze", "clicking", "sniff", "sync", "x"];

static CLASS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid label pattern"));

pub fn is_special_token(token: &str) -> bool {
    token.contains(MARKUP_CHARS)
}

/// Expands one special token into its normalized pieces.
///
/// In word-only mode sound tags collapse to `non_word` and markup prefixes
/// are dropped; otherwise the literal markup is kept alongside the words.
/// Pieces may be empty (e.g. `a++b`); callers filter them.
///
/// Verbose mode also accepts the bare markers it emits (`:si`, `:m`, `:d`,
/// `:v:r:`, `:v:u:`, `:l:<label>`) so that its output tokenizes back to
/// itself. Word-only mode rejects them.
pub fn expand(token: &str, non_word: &str, word_only: bool) -> Result<Vec<String>, InvalidTokenError> {
    expand_inner(token, non_word, word_only, false)
}

fn expand_inner(
    token: &str,
    non_word: &str,
    word_only: bool,
    mimicked: bool,
) -> Result<Vec<String>, InvalidTokenError> {
    let mut out = Vec::new();
    if mimicked && !word_only {
        out.push(":m".to_owned());
    }
    let sound = |literal: String| {
        if word_only {
            non_word.to_owned()
        } else {
            literal
        }
    };

    if token.starts_with(':') {
        let trimmed = token.trim();
        let parts: Vec<&str> = trimmed.split(':').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [] => return Err(InvalidTokenError::Blank),
            [marker] if !word_only && BARE_MARKERS.contains(marker) => {
                out.push(trimmed.to_owned());
            }
            ["v", class]
                if !word_only && VOCAL_WORD_CLASSES.contains(class) && trimmed.ends_with(':') =>
            {
                out.push(trimmed.to_owned());
            }
            ["v", class] => {
                if !VOCAL_CLASSES.contains(class) {
                    return Err(InvalidTokenError::InvalidVocalSound);
                }
                out.push(sound(trimmed.to_owned()));
            }
            ["v", class, words] if VOCAL_WORD_CLASSES.contains(class) => {
                if !word_only {
                    out.push(format!(":v:{class}:"));
                }
                out.extend(split_words(words));
            }
            ["v", "l", label] => {
                if !CLASS_LABEL.is_match(label) {
                    return Err(InvalidTokenError::InvalidVocalLabel);
                }
                out.push(sound(trimmed.to_owned()));
            }
            ["v", _, _] => return Err(InvalidTokenError::UnclassifiableVocalSound),
            ["m", ..] if mimicked => return Err(InvalidTokenError::RecursiveMimicry),
            ["m", words] => {
                if !word_only {
                    out.push(":m".to_owned());
                }
                out.extend(split_words(words));
            }
            ["m", ..] => {
                let rest = token.find(":m").map_or("", |i| &token[i + 2..]);
                return expand_inner(rest, non_word, word_only, true);
            }
            ["s", name] => {
                if !NON_VOCAL_SOUNDS.contains(name) {
                    return Err(InvalidTokenError::InvalidNonVocalSound);
                }
                out.push(sound(format!(":s:{name}:")));
            }
            ["si", words] => {
                if !word_only {
                    out.push(":si".to_owned());
                }
                out.extend(split_words(words));
            }
            ["d", word] => {
                if !word_only {
                    out.push(":d".to_owned());
                }
                out.push((*word).to_owned());
            }
            ["l", label, words] => {
                if !CLASS_LABEL.is_match(label) {
                    return Err(InvalidTokenError::InvalidLabel);
                }
                if !word_only {
                    out.push(format!(":l:{label}"));
                }
                out.extend(split_words(words));
            }
            ["l", label] if !word_only => {
                if !CLASS_LABEL.is_match(label) {
                    return Err(InvalidTokenError::InvalidLabel);
                }
                out.push(trimmed.to_owned());
            }
            _ => {}
        }
    } else if let Some(rest) = token.strip_prefix('=') {
        if !word_only {
            out.push("=".to_owned());
        }
        out.push(rest.trim().to_owned());
    } else if token == "##" || token == "###" {
        out.push(sound(token.to_owned()));
    } else if token.contains('=') {
        out.extend(token.split('=').map(str::to_owned));
    }
    Ok(out)
}

fn split_words(words: &str) -> impl Iterator<Item = String> + '_ {
    words.split('+').map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
