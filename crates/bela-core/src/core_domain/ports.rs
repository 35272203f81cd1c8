use std::collections::HashMap;

use crate::core::pretokenize;

// ---------------------------------------------------------------------------
// Segmenter — language-aware word segmentation capability
// ---------------------------------------------------------------------------

pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Offline default: the tokenizer's own whitespace / question-mark split.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        pretokenize(text).into_iter().map(str::to_owned).collect()
    }
}

// ---------------------------------------------------------------------------
// SegmenterRegistry — per-language segmenter lookup with a fallback
// ---------------------------------------------------------------------------

pub struct SegmenterRegistry {
    by_language: HashMap<String, Box<dyn Segmenter>>,
    fallback: Box<dyn Segmenter>,
}

impl Default for SegmenterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmenterRegistry {
    pub fn new() -> Self {
        Self {
            by_language: HashMap::new(),
            fallback: Box::new(WhitespaceSegmenter),
        }
    }

    /// Registry with the built-in English and Mandarin segmenters.
    pub fn builtin() -> Self {
        Self::new()
            .with("English", crate::core::PunctuationSegmenter)
            .with("Mandarin", crate::core::CjkCharSegmenter)
    }

    pub fn with(mut self, language: impl Into<String>, segmenter: impl Segmenter + 'static) -> Self {
        self.register(language, segmenter);
        self
    }

    pub fn register(&mut self, language: impl Into<String>, segmenter: impl Segmenter + 'static) {
        self.by_language.insert(language.into(), Box::new(segmenter));
    }

    pub fn for_language(&self, language: Option<&str>) -> &dyn Segmenter {
        language
            .and_then(|l| self.by_language.get(l.trim()))
            .map_or(&*self.fallback, |s| &**s)
    }
}

impl std::fmt::Debug for SegmenterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<&str> = self.by_language.keys().map(String::as_str).collect();
        languages.sort_unstable();
        f.debug_struct("SegmenterRegistry")
            .field("languages", &languages)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Segmenter for Upper {
        fn segment(&self, text: &str) -> Vec<String> {
            vec![text.to_uppercase()]
        }
    }

    #[test]
    fn test_fallback_is_whitespace() {
        let registry = SegmenterRegistry::new();
        assert_eq!(
            registry.for_language(Some("English")).segment("hi there?"),
            vec!["hi", "there", "?"]
        );
        assert_eq!(registry.for_language(None).segment("a b"), vec!["a", "b"]);
    }

    #[test]
    fn test_registered_language_is_used() {
        let registry = SegmenterRegistry::new().with("Malay", Upper);
        assert_eq!(registry.for_language(Some("Malay")).segment("apa"), vec!["APA"]);
        assert_eq!(registry.for_language(Some(" Malay ")).segment("apa"), vec!["APA"]);
        assert_eq!(registry.for_language(Some("Tamil")).segment("apa"), vec!["apa"]);
    }

    #[test]
    fn test_builtin_registry_debug_lists_languages() {
        let debug = format!("{:?}", SegmenterRegistry::builtin());
        assert_eq!(debug, "SegmenterRegistry { languages: [\"English\", \"Mandarin\"] }");
    }
}
