use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::{
    parse_tier_name, sort_languages, Diagnostics, IdentityError, ParticipantCode, Row,
    RowTranscript, TierClass, ACTIVITY_MARKERS,
};

/// Language assigned by convention to utterances nobody tagged.
pub const UNTAGGED_LANGUAGE: &str = "#!#?";
const TRANSCRIBER_COMMENT: &str = "Transcriber (Comment)";

// ---------------------------------------------------------------------------
// RowSummary — per-person and per-language totals of a row transcript
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonSummary {
    pub name: String,
    pub codes: Vec<String>,
    /// Seconds of utterance and comment rows, rounded to 2 decimals.
    pub duration: f64,
    /// Seconds per language, longest first.
    pub languages: Vec<(String, f64)>,
    pub tiers: Vec<String>,
    pub utterance_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowSummary {
    pub languages: Vec<(String, f64)>,
    pub people: Vec<PersonSummary>,
    pub diagnostics: Diagnostics,
}

#[derive(Default)]
struct PersonTally {
    codes: BTreeSet<String>,
    duration_ms: u64,
    languages: BTreeMap<String, u64>,
    tiers: BTreeSet<String>,
    utterances: usize,
}

fn round2(ms: u64) -> f64 {
    (ms as f64 / 10.0).round() / 100.0
}

/// Utterance and comment rows count towards a person's speaking time.
fn is_speech(class: &TierClass) -> bool {
    matches!(class, TierClass::Utterance) || class.as_str() == "Comment"
}

fn interval_label(row: &Row) -> String {
    format!("[{} -- {}]", row.from_ts, row.to_ts)
}

impl RowTranscript {
    /// Totals durations per person and per language and collects row-level
    /// warnings. A participant code shared by two speaker names is an
    /// identity conflict.
    pub fn summarize(&self) -> Result<RowSummary, IdentityError> {
        let mut diag = Diagnostics::new();
        let mut people: BTreeMap<String, PersonTally> = BTreeMap::new();
        let mut language_ms: BTreeMap<String, u64> = BTreeMap::new();

        for name in self.tier_names() {
            match parse_tier_name(name) {
                Some((person, _)) => {
                    people.entry(person).or_default();
                }
                None if name == ACTIVITY_MARKERS => {}
                None => diag.warning(format!("Invalid tier name: {name}")),
            }
        }

        for row in self.rows() {
            let person = row.speaker_name.as_deref();
            if let (Some(person), Some(class)) = (person, &row.tier_class) {
                let tally = people.entry(person.to_owned()).or_default();
                tally.tiers.insert(class.as_str().to_owned());
                if let Some(code) = &row.speaker {
                    tally.codes.insert(code.clone());
                }
            }
            if row.tier == TRANSCRIBER_COMMENT {
                continue;
            }

            let who = person.unwrap_or(row.tier.as_str());
            let delta = row.from_ts.delta_to(row.to_ts);
            let duration_ms = u64::try_from(delta).unwrap_or_else(|_| {
                tracing::warn!(tier = %row.tier, delta, "row runs backwards");
                diag.warning(format!(
                    "Negative utterance ({:.2}) {who}: {} {}",
                    delta as f64 / 1000.0,
                    row.text,
                    interval_label(row)
                ));
                0
            });
            if row.text.trim().is_empty() {
                diag.warning(format!("Blank: {who} {}", interval_label(row)));
            }

            match &row.tier_class {
                Some(class) if is_speech(class) => {
                    if let Some(tally) = person.and_then(|p| people.get_mut(p)) {
                        if delta != 0 {
                            tally.duration_ms += duration_ms;
                            tally.utterances += 1;
                        }
                    }
                    let language = row.language.as_deref().map(str::trim);
                    if matches!(language, None | Some("") | Some(UNTAGGED_LANGUAGE)) {
                        diag.warning(format!(
                            "Language tag not found: {who} {} {}",
                            interval_label(row),
                            row.text
                        ));
                    }
                }
                Some(TierClass::Language) => {
                    let language = row.text.trim().to_owned();
                    *language_ms.entry(language.clone()).or_default() += duration_ms;
                    if let Some(tally) = person.and_then(|p| people.get_mut(p)) {
                        *tally.languages.entry(language).or_default() += duration_ms;
                    }
                }
                _ => {}
            }
        }

        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, tally) in &people {
            for code in &tally.codes {
                match owners.get(code.as_str()) {
                    Some(&existing) if existing != name.as_str() => {
                        return Err(IdentityError::AmbiguousParticipant {
                            code: ParticipantCode::new(code.as_str()),
                            existing: existing.to_owned(),
                            conflicting: name.clone(),
                        });
                    }
                    _ => {
                        owners.insert(code.as_str(), name.as_str());
                    }
                }
            }
        }

        let languages = sort_languages(language_ms.keys().cloned())
            .into_iter()
            .map(|lang| {
                let ms = language_ms.get(&lang).copied().unwrap_or_default();
                (lang, round2(ms))
            })
            .collect();

        let people = people
            .into_iter()
            .map(|(name, tally)| {
                let mut languages: Vec<(String, u64)> = tally.languages.into_iter().collect();
                languages.sort_by(|a, b| b.1.cmp(&a.1));
                PersonSummary {
                    name,
                    codes: tally.codes.into_iter().collect(),
                    duration: round2(tally.duration_ms),
                    languages: languages.into_iter().map(|(l, ms)| (l, round2(ms))).collect(),
                    tiers: tally.tiers.into_iter().collect(),
                    utterance_count: tally.utterances,
                }
            })
            .collect();

        Ok(RowSummary {
            languages,
            people,
            diagnostics: diag,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
