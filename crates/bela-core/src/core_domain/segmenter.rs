use crate::core::{pretokenize, Segmenter};

const CLITICS: &[&str] = &["n't", "'s", "'m", "'ll", "'re", "'d", "'ve"];

/// Punctuation detached by `split_punc` and the English segmenter.
/// Apostrophes stay attached so clitics can be recognised.
pub fn is_detachable_punctuation(c: char) -> bool {
    (c.is_ascii_punctuation() && c != '\'') || "，。？（）！؟".contains(c)
}

/// Splits leading and trailing punctuation characters off `word`, each as
/// its own piece. A word made only of punctuation splits into characters.
pub fn split_punctuation(word: &str) -> Vec<&str> {
    let core_start = word
        .char_indices()
        .find(|&(_, c)| !is_detachable_punctuation(c))
        .map(|(i, _)| i);
    let Some(core_start) = core_start else {
        return char_pieces(word);
    };
    let core_end = word
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_detachable_punctuation(c))
        .map_or(word.len(), |(i, c)| i + c.len_utf8());

    let mut pieces = char_pieces(&word[..core_start]);
    pieces.push(&word[core_start..core_end]);
    pieces.extend(char_pieces(&word[core_end..]));
    pieces
}

fn char_pieces(text: &str) -> Vec<&str> {
    text.char_indices()
        .map(|(i, c)| &text[i..i + c.len_utf8()])
        .collect()
}

fn split_clitic(word: &str) -> Vec<&str> {
    let lower = word.to_lowercase();
    for clitic in CLITICS {
        if lower.len() == word.len() && lower.len() > clitic.len() && lower.ends_with(clitic) {
            let at = word.len() - clitic.len();
            return vec![&word[..at], &word[at..]];
        }
    }
    vec![word]
}

// ---------------------------------------------------------------------------
// PunctuationSegmenter — English: detach punctuation and clitics
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct PunctuationSegmenter;

impl Segmenter for PunctuationSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        pretokenize(text)
            .into_iter()
            .flat_map(split_punctuation)
            .flat_map(split_clitic)
            .map(str::to_owned)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CjkCharSegmenter — Mandarin: one token per ideograph
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
pub struct CjkCharSegmenter;

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}

impl Segmenter for CjkCharSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for unit in pretokenize(text) {
            let mut run = String::new();
            for c in unit.chars() {
                if is_cjk(c) {
                    if !run.is_empty() {
                        out.push(std::mem::take(&mut run));
                    }
                    out.push(c.to_string());
                } else {
                    run.push(c);
                }
            }
            if !run.is_empty() {
                out.push(run);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
