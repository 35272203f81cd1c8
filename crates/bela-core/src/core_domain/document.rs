use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::core::{
    find_turns, Annotation, Diagnostic, Diagnostics, LanguageMix, Millis, MixPart,
    ParticipantCode, Tier, TierClass, Turn,
};

pub const SPECIAL_SPEAKER: &str = ":transcriber:";
pub const SPECIAL_SPEAKER_NAME: &str = "Transcriber";

/// Languages listed first (in this order) by [`Document::sorted_languages`].
pub const KNOWN_LANGUAGES: &[&str] = &[
    "English", "Mandarin", "Tamil", "Cantonese", "Malay", "Javanese", "Arabic", "Hokkien",
];
const RED_DOT: &str = "Red Dot";

// ---------------------------------------------------------------------------
// Person — one participant and the tiers attributed to them
// ---------------------------------------------------------------------------

/// Link data of one utterance, parallel to the annotations of the person's
/// Utterance tier. Chunk indices point into the person's Chunk tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UtteranceLinks {
    pub chunks: Vec<usize>,
    pub translation: Option<String>,
    pub matrix: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Person {
    pub name: String,
    pub code: ParticipantCode,
    /// Tier indices into the document, including duplicate-class tiers.
    pub(crate) tiers: Vec<usize>,
    pub(crate) tier_map: BTreeMap<TierClass, usize>,
    pub(crate) utterances: Vec<UtteranceLinks>,
}

impl Person {
    pub(crate) fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: ParticipantCode::new(code),
            tiers: Vec::new(),
            tier_map: BTreeMap::new(),
            utterances: Vec::new(),
        }
    }

    pub fn is_transcriber(&self) -> bool {
        self.code.as_str() == SPECIAL_SPEAKER
    }

    /// Attaches a tier; the first tier of a class wins the class lookup.
    pub(crate) fn add_tier(&mut self, index: usize, tier: &Tier, diag: &mut Diagnostics) {
        if self.tiers.contains(&index) {
            return;
        }
        match &tier.class {
            None => diag.error(format!("Tier [{}] does not have a tier_class", tier.id)),
            Some(class) if self.tier_map.contains_key(class) => {
                tracing::warn!(code = %self.code, %class, "duplicate tier class");
                diag.error(format!(
                    "User [{}] has more than one [class={class}] tier",
                    self.code
                ));
            }
            Some(class) => {
                self.tier_map.insert(class.clone(), index);
            }
        }
        self.tiers.push(index);
    }

    pub fn tier_index(&self, class: &TierClass) -> Option<usize> {
        self.tier_map.get(class).copied()
    }

    pub fn tier_indices(&self) -> &[usize] {
        &self.tiers
    }
}

// ---------------------------------------------------------------------------
// UtteranceView — borrowed, resolved view of one utterance
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct UtteranceView<'a> {
    pub speaker: &'a ParticipantCode,
    pub annotation: &'a Annotation,
    pub chunks: Vec<&'a Annotation>,
    pub translation: Option<&'a str>,
    pub matrix: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a str>,
    pub persons: Vec<&'a ParticipantCode>,
    pub utterances: usize,
    pub chunks: usize,
    pub languages: Vec<String>,
    pub errors: &'a [Diagnostic],
    pub warnings: &'a [Diagnostic],
}

// ---------------------------------------------------------------------------
// Document — linked, person-centric transcript
// ---------------------------------------------------------------------------

/// Owns every tier and annotation of one linked transcript. Persons refer
/// to tiers by index; the transcriber is always person 0.
#[derive(Clone, Debug)]
pub struct Document {
    pub path: Option<String>,
    pub(crate) tiers: Vec<Tier>,
    pub(crate) persons: Vec<Person>,
    pub(crate) person_index: HashMap<ParticipantCode, usize>,
    pub(crate) diagnostics: Diagnostics,
}

impl Document {
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn person(&self, code: &str) -> Option<&Person> {
        self.person_index
            .get(&ParticipantCode::new(code))
            .map(|&i| &self.persons[i])
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The tier of `class` attributed to `person`, if any.
    pub fn tier_of(&self, person: &Person, class: &TierClass) -> Option<&Tier> {
        person.tier_index(class).map(|i| &self.tiers[i])
    }

    pub fn utterances<'a>(&'a self, person: &'a Person) -> Vec<UtteranceView<'a>> {
        let Some(utterance_tier) = self.tier_of(person, &TierClass::Utterance) else {
            return Vec::new();
        };
        let chunk_tier = self.tier_of(person, &TierClass::Chunk);
        utterance_tier
            .annotations
            .iter()
            .zip(&person.utterances)
            .map(|(annotation, links)| UtteranceView {
                speaker: &person.code,
                annotation,
                chunks: chunk_tier
                    .map(|t| links.chunks.iter().map(|&c| &t.annotations[c]).collect())
                    .unwrap_or_default(),
                translation: links.translation.as_deref(),
                matrix: links.matrix.as_deref(),
            })
            .collect()
    }

    fn count_class(&self, class: &TierClass) -> usize {
        self.tiers
            .iter()
            .filter(|t| t.class.as_ref() == Some(class))
            .map(Tier::len)
            .sum()
    }

    pub fn count_utterances(&self) -> usize {
        self.count_class(&TierClass::Utterance)
    }

    pub fn count_chunks(&self) -> usize {
        self.count_class(&TierClass::Chunk)
    }

    /// Distinct texts of every Language tier annotation.
    pub fn language_set(&self) -> BTreeSet<String> {
        self.tiers
            .iter()
            .filter(|t| t.class == Some(TierClass::Language))
            .flat_map(|t| t.annotations.iter().map(|a| a.text.clone()))
            .collect()
    }

    /// Known languages first, then `Red Dot`, then the rest alphabetically.
    pub fn sorted_languages(&self) -> Vec<String> {
        sort_languages(self.language_set())
    }

    pub fn report(&self) -> Report<'_> {
        Report {
            path: self.path.as_deref(),
            persons: self.persons.iter().map(|p| &p.code).collect(),
            utterances: self.count_utterances(),
            chunks: self.count_chunks(),
            languages: self.sorted_languages(),
            errors: self.diagnostics.errors(),
            warnings: self.diagnostics.warnings(),
        }
    }

    /// Collapses every linked chunk into a language timeline. Untagged
    /// chunks count under the empty language.
    pub fn to_language_mix(&self, to_ts: Option<Millis>) -> LanguageMix {
        let mut mix = LanguageMix::new();
        for person in &self.persons {
            for utterance in self.utterances(person) {
                for chunk in utterance.chunks {
                    if let Some(span) = chunk.span() {
                        mix.add(MixPart::from_span(
                            chunk.language.clone().unwrap_or_default(),
                            span,
                        ));
                    }
                }
            }
        }
        mix.compute(to_ts);
        mix
    }

    pub fn find_turns(&self, threshold_ms: u64) -> Vec<Turn<'_>> {
        find_turns(self, threshold_ms)
    }
}

pub fn sort_languages(languages: impl IntoIterator<Item = String>) -> Vec<String> {
    let rank = |lang: &str| {
        KNOWN_LANGUAGES
            .iter()
            .position(|k| *k == lang)
            .unwrap_or(if lang == RED_DOT {
                KNOWN_LANGUAGES.len()
            } else {
                KNOWN_LANGUAGES.len() + 1
            })
    };
    let mut sorted: Vec<String> = languages.into_iter().collect();
    sorted.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));
    sorted.dedup();
    sorted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
