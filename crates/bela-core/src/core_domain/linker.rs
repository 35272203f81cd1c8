use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{
    find_invalid_characters, match_children, match_single, AnnotationId, Diagnostics, Document,
    IdentityError, Millis, ParticipantCode, Person, RawDocument, Span, Tier, TierClass, Tokenizer,
    SPECIAL_SPEAKER, SPECIAL_SPEAKER_NAME,
};

static TIER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w ]+) +\(([\w ]+)\)").expect("valid tier name pattern"));

pub const ACTIVITY_MARKERS: &str = "ActivityMarkers";
const UNSURE_LANGUAGE: &str = "#!";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Relax empty-text and empty-language errors to warnings.
    pub allow_empty: bool,
}

/// Splits `"<name> (<class>)"` into a trimmed speaker name and tier class.
pub fn parse_tier_name(id: &str) -> Option<(String, TierClass)> {
    let caps = TIER_NAME.captures(id)?;
    Some((caps[1].trim().to_owned(), TierClass::parse(&caps[2])))
}

// ---------------------------------------------------------------------------
// Linker — builds a validated Document from raw tiers
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Linker {
    options: LinkOptions,
    tokenizer: Tokenizer,
}

impl Linker {
    pub fn new(options: LinkOptions, tokenizer: Tokenizer) -> Self {
        Self { options, tokenizer }
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Links a raw document. Structural problems are collected in the
    /// returned document's diagnostics; only an ambiguous participant code
    /// aborts.
    pub fn link(&self, raw: RawDocument) -> Result<Document, IdentityError> {
        let mut diag = Diagnostics::new();
        let mut tiers: Vec<Tier> = raw.tiers.into_iter().map(Tier::from).collect();

        for tier in &mut tiers {
            resolve_name(tier, &mut diag);
        }

        let mut persons = vec![Person::new(SPECIAL_SPEAKER_NAME, SPECIAL_SPEAKER)];
        let mut person_index = HashMap::from([(ParticipantCode::new(SPECIAL_SPEAKER), 0)]);
        register_persons(&tiers, &mut persons, &mut person_index, &mut diag)?;
        attach_tiers(&tiers, &mut persons, &person_index, &mut diag)?;

        for tier in tiers.iter_mut().filter(|t| t.is_time_alignable()) {
            resolve_timestamps(tier, &mut diag);
        }

        for person in persons.iter_mut().filter(|p| !p.is_transcriber()) {
            let mut pass = PersonPass {
                tiers: &mut tiers,
                person,
                diag: &mut diag,
                options: &self.options,
            };
            pass.run();
        }

        self.tokenize_all(&mut tiers, &mut diag);

        tracing::debug!(
            tiers = tiers.len(),
            persons = persons.len(),
            errors = diag.errors().len(),
            warnings = diag.warnings().len(),
            "document linked"
        );
        Ok(Document {
            path: raw.path,
            tiers,
            persons,
            person_index,
            diagnostics: diag,
        })
    }

    fn tokenize_all(&self, tiers: &mut [Tier], diag: &mut Diagnostics) {
        for tier in tiers
            .iter_mut()
            .filter(|t| matches!(t.class, Some(TierClass::Utterance | TierClass::Chunk)))
        {
            let tier_id = tier.id.clone();
            for ann in &mut tier.annotations {
                let language = ann.language.clone();
                let tokenized = self.tokenizer.tokenize(&ann.text, language.as_deref());
                ann.words = tokenized.tokens;
                for error in tokenized.errors {
                    diag.annotation_error(&tier_id, ann, error);
                }
                let invalid = find_invalid_characters(&ann.text, language.as_deref());
                if !invalid.is_empty() {
                    let message = match &language {
                        Some(lang) => format!(
                            "Invalid characters, new line, or tab found ({invalid:?}) (language: {lang})"
                        ),
                        None => format!("Invalid characters, new line, or tab found ({invalid:?})"),
                    };
                    diag.annotation_error(&tier_id, ann, message);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Steps 1-3: names, persons, timestamps
// ---------------------------------------------------------------------------

fn resolve_name(tier: &mut Tier, diag: &mut Diagnostics) {
    if tier.id.as_str() == ACTIVITY_MARKERS {
        tier.class = Some(TierClass::ActivityMarkers);
        tier.speaker_name = Some(SPECIAL_SPEAKER.to_owned());
        return;
    }
    match parse_tier_name(tier.id.as_str()) {
        Some((speaker, class)) => {
            tier.speaker_name = Some(speaker);
            tier.class = Some(class);
        }
        None => {
            tracing::warn!(tier = %tier.id, "invalid tier name");
            diag.warning(format!("Invalid tier name: {}", tier.id));
        }
    }
}

fn ambiguous(code: &ParticipantCode, existing: &Person, conflicting: &str) -> IdentityError {
    IdentityError::AmbiguousParticipant {
        code: code.clone(),
        existing: existing.name.clone(),
        conflicting: conflicting.to_owned(),
    }
}

fn register_persons(
    tiers: &[Tier],
    persons: &mut Vec<Person>,
    index: &mut HashMap<ParticipantCode, usize>,
    diag: &mut Diagnostics,
) -> Result<(), IdentityError> {
    for (i, tier) in tiers.iter().enumerate().filter(|(_, t)| t.parent.is_none()) {
        match &tier.class {
            Some(TierClass::Utterance) => {
                // A missing code is reported when tiers are attached.
                let Some(code) = &tier.participant else {
                    continue;
                };
                let name = tier.speaker_name.clone().unwrap_or_default();
                match index.get(code) {
                    Some(&p) if persons[p].name != name => {
                        return Err(ambiguous(code, &persons[p], &name));
                    }
                    Some(_) => {
                        diag.error(format!("Person [{code}] has more than one utterance tier"));
                    }
                    None => {
                        tracing::debug!(%code, %name, "person registered");
                        let mut person = Person::new(name, code.as_str());
                        person.add_tier(i, tier, diag);
                        index.insert(code.clone(), persons.len());
                        persons.push(person);
                    }
                }
            }
            Some(TierClass::ActivityMarkers) | None => {}
            Some(_) => diag.error(format!("Unknown root tier: {}", tier.id)),
        }
    }
    Ok(())
}

fn attach_tiers(
    tiers: &[Tier],
    persons: &mut [Person],
    index: &HashMap<ParticipantCode, usize>,
    diag: &mut Diagnostics,
) -> Result<(), IdentityError> {
    for (i, tier) in tiers.iter().enumerate() {
        match &tier.class {
            None => continue,
            Some(TierClass::ActivityMarkers) => {
                persons[0].add_tier(i, tier, diag);
                continue;
            }
            Some(_) => {}
        }
        let Some(code) = &tier.participant else {
            diag.error(format!("Tier [{}] does not have participant code", tier.id));
            continue;
        };
        let Some(&p) = index.get(code) else {
            diag.error(format!(
                "Unknown person code [{code}] used in tier [{}]",
                tier.id
            ));
            continue;
        };
        let person = &mut persons[p];
        if let Some(name) = &tier.speaker_name {
            if !person.is_transcriber() && *name != person.name {
                return Err(ambiguous(code, person, name));
            }
        }
        person.add_tier(i, tier, diag);
    }
    Ok(())
}

/// Infers a single missing endpoint; annotations missing both or running
/// backwards stay unresolved.
fn resolve_timestamps(tier: &mut Tier, diag: &mut Diagnostics) {
    let tier_id = tier.id.clone();
    for ann in &mut tier.annotations {
        match (ann.from_ts, ann.to_ts) {
            (Some(from), Some(to)) if to < from => {
                let message = format!(
                    "Annotation with inverted timestamp: {} (Timestamp: {from} -- {to}) | Tier: {tier_id}",
                    ann.text
                );
                diag.annotation_error(&tier_id, ann, message);
            }
            (Some(_), Some(_)) => {}
            (Some(from), None) => {
                ann.to_ts = Some(from);
                let message = format!(
                    "Assumed to_ts value from from_ts: {} (Timestamp: {from}) | Tier: {tier_id}",
                    ann.text
                );
                diag.annotation_warning(&tier_id, ann, message);
            }
            (None, Some(to)) => {
                ann.from_ts = Some(to);
                let message = format!(
                    "Assumed from_ts value from to_ts: {} (Timestamp: {to}) | Tier: {tier_id}",
                    ann.text
                );
                diag.annotation_warning(&tier_id, ann, message);
            }
            (None, None) => {
                let message = format!(
                    "Annotation with corrupted timestamp: {} (Timestamp: None -- None) | Tier: {tier_id}",
                    ann.text
                );
                diag.annotation_error(&tier_id, ann, message);
            }
        }
    }
}

/// Annotation indices and spans of the resolved annotations of a tier.
fn resolved(tier: &Tier) -> (Vec<usize>, Vec<Span>) {
    tier.annotations
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.span().map(|s| (i, s)))
        .unzip()
}

// ---------------------------------------------------------------------------
// Steps 4-6: per-person linking and cross-validation
// ---------------------------------------------------------------------------

enum Note {
    Error(String),
    Warning(String),
}

struct PersonPass<'a> {
    tiers: &'a mut [Tier],
    person: &'a mut Person,
    diag: &'a mut Diagnostics,
    options: &'a LinkOptions,
}

impl PersonPass<'_> {
    fn run(&mut self) {
        let Some(utterances) = self.person.tier_index(&TierClass::Utterance) else {
            return;
        };
        self.person.utterances = vec![Default::default(); self.tiers[utterances].len()];
        let chunks = self.person.tier_index(&TierClass::Chunk);
        let languages = self.person.tier_index(&TierClass::Language);

        match chunks {
            Some(chunks) => self.link_chunks(utterances, chunks),
            None => self.missing_tier("chunk"),
        }
        if let Some(matrix) = self.person.tier_index(&TierClass::Matrix) {
            self.link_matrix(utterances, matrix);
        }
        match self.person.tier_index(&TierClass::Translation) {
            Some(translations) => self.link_translations(utterances, translations),
            None => self.missing_tier("translation"),
        }
        match (chunks, languages) {
            (Some(chunks), Some(languages)) => self.link_languages(chunks, languages),
            (_, None) => self.missing_tier("language"),
            _ => {}
        }
        self.cross_validate(utterances, chunks);
    }

    fn missing_tier(&mut self, kind: &str) {
        self.diag.error(format!(
            "Person {} ({}) does not have a {kind} tier",
            self.person.name, self.person.code
        ));
    }

    fn orphan(&mut self, tier: usize, ann: usize) {
        let tier = &mut self.tiers[tier];
        let ann = &mut tier.annotations[ann];
        tracing::warn!(tier = %tier.id, annotation = %ann.id, "orphaned annotation");
        let message = format!("Orphaned annotation found -- (#{}) {}", ann.id, ann.text);
        self.diag.annotation_error(&tier.id, ann, message);
    }

    fn link_chunks(&mut self, utterances: usize, chunks: usize) {
        let (u_idx, u_spans) = resolved(&self.tiers[utterances]);
        let (c_idx, c_spans) = resolved(&self.tiers[chunks]);
        let result = match_children(&u_spans, &c_spans);

        for (p, linked) in result.links.into_iter().enumerate() {
            self.person.utterances[u_idx[p]].chunks = linked.into_iter().map(|c| c_idx[c]).collect();
        }
        for c in result.orphans {
            self.orphan(chunks, c_idx[c]);
        }
    }

    fn link_matrix(&mut self, utterances: usize, matrix: usize) {
        let (u_idx, u_spans) = resolved(&self.tiers[utterances]);
        let (m_idx, m_spans) = resolved(&self.tiers[matrix]);
        let result = match_single(&u_spans, &m_spans);

        for (p, linked) in result.links.into_iter().enumerate() {
            if let Some(m) = linked {
                let text = self.tiers[matrix].annotations[m_idx[m]].text.clone();
                self.person.utterances[u_idx[p]].matrix = Some(text);
            }
        }
        for (_, m) in result.conflicts {
            let tier = &mut self.tiers[matrix];
            let ann = &mut tier.annotations[m_idx[m]];
            tracing::warn!(tier = %tier.id, annotation = %ann.id, "conflicting child annotation");
            self.diag.annotation_error(
                &tier.id,
                ann,
                "Conflicting child annotations were found".to_owned(),
            );
        }
        for m in result.orphans {
            self.orphan(matrix, m_idx[m]);
        }
    }

    fn link_translations(&mut self, utterances: usize, translations: usize) {
        let by_id: HashMap<AnnotationId, usize> = self.tiers[utterances]
            .annotations
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();

        for t in 0..self.tiers[translations].len() {
            let translation = &self.tiers[translations].annotations[t];
            let target = translation.reference.as_ref().and_then(|r| by_id.get(r)).copied();
            let text = translation.text.clone();
            let Some(u) = target else {
                let tier = &mut self.tiers[translations];
                let ann = &mut tier.annotations[t];
                let message = format!(
                    "Orphaned translation annotation found -- (#{}) {}",
                    ann.id, ann.text
                );
                self.diag.annotation_error(&tier.id, ann, message);
                continue;
            };
            let links = &mut self.person.utterances[u];
            if links.translation.is_none() {
                links.translation = Some(text);
                continue;
            }
            let tier = &mut self.tiers[utterances];
            let ann = &mut tier.annotations[u];
            let message = format!(
                "Conflicted translation for [{}] Time: {}",
                self.person.code,
                ann.time_label()
            );
            self.diag.annotation_error(&tier.id, ann, message);
        }
    }

    /// Exact-interval lookup of each chunk's language annotation.
    fn link_languages(&mut self, chunks: usize, languages: usize) {
        let mut by_interval: HashMap<(Millis, Millis), usize> = HashMap::new();
        for (i, ann) in self.tiers[languages].annotations.iter().enumerate() {
            if let (Some(from), Some(to)) = (ann.from_ts, ann.to_ts) {
                by_interval.insert((from, to), i);
            }
        }

        let mut consumed = vec![false; self.tiers[languages].len()];
        for c in 0..self.tiers[chunks].len() {
            let chunk = &self.tiers[chunks].annotations[c];
            let (Some(from), Some(to)) = (chunk.from_ts, chunk.to_ts) else {
                continue;
            };
            if let Some(&l) = by_interval.get(&(from, to)) {
                let language = self.tiers[languages].annotations[l].text.clone();
                self.tiers[chunks].annotations[c].language = Some(language);
                consumed[l] = true;
            }
        }

        let tier = &mut self.tiers[languages];
        for (ann, _) in tier
            .annotations
            .iter_mut()
            .zip(consumed)
            .filter(|(_, used)| !used)
        {
            let message = format!(
                "Orphaned language annotation could not be linked: {} {}",
                ann.text,
                ann.time_label()
            );
            self.diag.annotation_error(&tier.id, ann, message);
        }
    }

    fn cross_validate(&mut self, utterances: usize, chunks: Option<usize>) {
        let allow_empty = self.options.allow_empty;
        let mut notes: Vec<(usize, Note)> = Vec::new();
        {
            let utterance_tier = &self.tiers[utterances];
            let chunk_tier = chunks.map(|c| &self.tiers[c]);

            for (u, (utterance, links)) in utterance_tier
                .annotations
                .iter()
                .zip(&self.person.utterances)
                .enumerate()
            {
                let utterance_blank = utterance.is_blank();
                if utterance_blank {
                    let message = format!("Empty annotation '' found at {}", utterance.time_label());
                    notes.push((u, if allow_empty { Note::Warning(message) } else { Note::Error(message) }));
                }

                let linked: Vec<_> = chunk_tier
                    .map(|t| links.chunks.iter().map(|&c| &t.annotations[c]).collect())
                    .unwrap_or_default();
                for chunk in &linked {
                    let label = chunk.time_label();
                    let chunk_blank = chunk.is_blank();
                    if chunk_blank && !utterance_blank {
                        let message = format!("Empty chunk annotation '' found at {label}");
                        notes.push((u, if allow_empty { Note::Warning(message) } else { Note::Error(message) }));
                    }
                    let text = chunk.text.trim();
                    match chunk.language.as_deref().map(str::trim) {
                        None | Some("") => {
                            let message = format!("Language tag not found in the chunk `{text}` {label}");
                            if allow_empty && chunk_blank && utterance_blank {
                                notes.push((u, Note::Warning(message)));
                            } else {
                                notes.push((u, Note::Error(message)));
                            }
                        }
                        Some(lang) if lang.contains(UNSURE_LANGUAGE) => {
                            notes.push((
                                u,
                                Note::Error(format!(
                                    "Unsure language tag ({lang}) was used for chunk `{text}` {label}"
                                )),
                            ));
                        }
                        Some(_) => {}
                    }
                }

                let expected = strip_whitespace(&utterance.text);
                let joined = strip_whitespace(&linked.iter().map(|c| c.text.as_str()).collect::<String>());
                if expected != joined {
                    notes.push((
                        u,
                        Note::Error(format!(
                            "Utterance text and chunks are mismatched ({expected:?} != {joined:?})"
                        )),
                    ));
                }
            }
        }

        let tier = &mut self.tiers[utterances];
        for (u, note) in notes {
            let ann = &mut tier.annotations[u];
            match note {
                Note::Error(message) => self.diag.annotation_error(&tier.id, ann, message),
                Note::Warning(message) => self.diag.annotation_warning(&tier.id, ann, message),
            }
        }
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
