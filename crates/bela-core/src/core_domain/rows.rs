use serde::Serialize;

use crate::core::{parse_tier_name, LanguageMix, Millis, MixPart, RowError, Span, TierClass};

/// Maximum gap between two same-speaker rows joined into one group.
pub const UTTERANCE_GAP_THRESHOLD_MS: u64 = 50;

// ---------------------------------------------------------------------------
// Row — one line of a flat tier export
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub tier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub from_ts: Millis,
    pub to_ts: Millis,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Parsed from `tier` when it follows the `"<name> (<class>)"` convention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_class: Option<TierClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

impl Row {
    /// Builds a row from decimal-second fields. A duration, when given,
    /// must agree with `to - from` to the millisecond.
    pub fn parse(
        tier: &str,
        speaker: Option<&str>,
        from: &str,
        to: &str,
        duration: Option<&str>,
        text: &str,
    ) -> Result<Self, RowError> {
        let from_secs = parse_secs(tier, "start", from)?;
        let to_secs = parse_secs(tier, "end", to)?;
        if let Some(duration) = duration.filter(|d| !d.trim().is_empty()) {
            let duration = parse_secs(tier, "duration", duration)?;
            let expected = round3(to_secs - from_secs);
            if expected != round3(duration) {
                return Err(RowError::InconsistentDuration {
                    from: from_secs,
                    to: to_secs,
                    duration,
                    expected,
                });
            }
        }
        let (speaker_name, tier_class) = parse_tier_name(tier).unzip();
        Ok(Self {
            tier: tier.to_owned(),
            speaker: speaker.map(str::to_owned).filter(|s| !s.is_empty()),
            from_ts: to_millis(tier, "start", from, from_secs)?,
            to_ts: to_millis(tier, "end", to, to_secs)?,
            text: text.to_owned(),
            language: None,
            tier_class,
            speaker_name,
        })
    }

    /// `None` when the row runs backwards.
    pub fn span(&self) -> Option<Span> {
        (self.to_ts >= self.from_ts).then(|| Span::new(self.from_ts, self.to_ts))
    }
}

fn parse_secs(tier: &str, field: &'static str, value: &str) -> Result<f64, RowError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowError::InvalidTimestamp {
            tier: tier.to_owned(),
            field,
            value: value.to_owned(),
        })
}

fn to_millis(tier: &str, field: &'static str, raw: &str, secs: f64) -> Result<Millis, RowError> {
    Millis::from_secs_f64(secs).ok_or_else(|| RowError::InvalidTimestamp {
        tier: tier.to_owned(),
        field,
        value: raw.to_owned(),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// RowTranscript — flat, row-based transcript
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize)]
pub struct RowTranscript {
    rows: Vec<Row>,
}

impl RowTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `(tier, start, end, duration, text)` or
    /// `(tier, speaker, start, end, duration, text)` rows. Rows of any
    /// other width are skipped.
    pub fn from_rows<I, R, S>(rows: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut transcript = Self::new();
        for row in rows {
            let fields: Vec<&str> = row.as_ref().iter().map(AsRef::as_ref).collect();
            let parsed = match *fields.as_slice() {
                [tier, from, to, duration, text] => {
                    Row::parse(tier, None, from, to, Some(duration), text)?
                }
                [tier, speaker, from, to, duration, text] => {
                    Row::parse(tier, Some(speaker), from, to, Some(duration), text)?
                }
                _ => {
                    tracing::warn!(width = fields.len(), ?fields, "skipping row with unexpected width");
                    continue;
                }
            };
            transcript.insert(parsed);
        }
        Ok(transcript)
    }

    pub fn insert(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort of all rows by `(start, end)`.
    pub fn sort(&mut self) {
        self.rows.sort_by_key(|r| (r.from_ts, r.to_ts));
    }

    /// Distinct tier names in first-seen order.
    pub fn tier_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.contains(&row.tier.as_str()) {
                names.push(&row.tier);
            }
        }
        names
    }

    pub fn tier(&self, name: &str) -> Vec<&Row> {
        self.rows.iter().filter(|r| r.tier == name).collect()
    }

    /// Tags each row of `utterance_tier` with the trimmed text of the
    /// `language_tier` row it overlaps most; the first wins a tie. Rows
    /// without any overlap keep their language, or get `default`.
    pub fn tag_language(&mut self, utterance_tier: &str, language_tier: &str, default: &str) {
        let languages: Vec<(Span, String)> = self
            .rows
            .iter()
            .filter(|r| r.tier == language_tier)
            .filter_map(|r| Some((r.span()?, r.text.trim().to_owned())))
            .collect();

        for row in self.rows.iter_mut().filter(|r| r.tier == utterance_tier) {
            let best = row.span().and_then(|span| {
                languages
                    .iter()
                    .map(|(l, text)| (span.overlap_ms(l), text))
                    .filter(|(overlap, _)| *overlap > 0)
                    .fold(None, |best: Option<(u64, &String)>, cand| match best {
                        Some(b) if b.0 >= cand.0 => Some(b),
                        _ => Some(cand),
                    })
            });
            match best {
                Some((_, language)) => row.language = Some(language.clone()),
                None if row.language.as_deref().map_or(true, str::is_empty) => {
                    row.language = Some(default.to_owned());
                }
                None => {}
            }
        }
    }

    /// Tags every `"<name> (Utterance)"` and `"<name> (Chunk)"` tier from
    /// its `"<name> (Language)"` sibling, when both exist.
    pub fn auto_tag(&mut self, default: &str) {
        let pairs: Vec<(String, String)> = self
            .tier_names()
            .into_iter()
            .filter_map(|name| match parse_tier_name(name)? {
                (speaker, TierClass::Utterance | TierClass::Chunk) => {
                    Some((name.to_owned(), format!("{speaker} (Language)")))
                }
                _ => None,
            })
            .filter(|(_, language)| self.rows.iter().any(|r| &r.tier == language))
            .collect();
        for (utterances, languages) in pairs {
            self.tag_language(&utterances, &languages, default);
        }
    }

    /// Groups consecutive rows of the same speaker whose gap is under
    /// [`UTTERANCE_GAP_THRESHOLD_MS`]. Rows of other classes are skipped when
    /// `tier_class` is given.
    pub fn join_utterances(&self, tier_class: Option<&TierClass>) -> Vec<Vec<&Row>> {
        let mut groups: Vec<Vec<&Row>> = Vec::new();
        let mut current: Vec<&Row> = Vec::new();
        for row in self
            .rows
            .iter()
            .filter(|r| tier_class.map_or(true, |c| r.tier_class.as_ref() == Some(c)))
        {
            let joins = current.last().is_some_and(|prev| {
                prev.speaker == row.speaker
                    && prev.to_ts.delta_to(row.from_ts).unsigned_abs() < UTTERANCE_GAP_THRESHOLD_MS
            });
            if !joins && !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.push(row);
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Language timeline using the languages assigned by
    /// [`tag_language`](Self::tag_language). Each utterance contributes the
    /// chunk rows of the same speaker inside its span, or itself when it
    /// has none.
    pub fn to_language_mix(&self, to_ts: Option<Millis>) -> LanguageMix {
        let chunks: Vec<(&Row, Span)> = self
            .rows
            .iter()
            .filter(|r| r.tier_class == Some(TierClass::Chunk))
            .filter_map(|r| Some((r, r.span()?)))
            .collect();

        let mut mix = LanguageMix::new();
        for row in self
            .rows
            .iter()
            .filter(|r| r.tier_class == Some(TierClass::Utterance))
        {
            let Some(span) = row.span() else {
                tracing::warn!(tier = %row.tier, from = %row.from_ts, to = %row.to_ts, "skipping backward row in language mix");
                continue;
            };
            let mut parts: Vec<(&Row, Span)> = chunks
                .iter()
                .filter(|(chunk, chunk_span)| {
                    chunk.speaker_name == row.speaker_name && span.contains(chunk_span)
                })
                .copied()
                .collect();
            if parts.is_empty() {
                parts.push((row, span));
            }
            for (part, part_span) in parts {
                mix.add(MixPart::from_span(part.language.clone().unwrap_or_default(), part_span));
            }
        }
        mix.compute(to_ts);
        mix
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
