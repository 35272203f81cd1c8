use serde::Serialize;

use crate::core::{Millis, Span};

/// One language-tagged stretch fed into the builder.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MixPart {
    pub language: String,
    pub from_ts: Option<Millis>,
    pub to_ts: Option<Millis>,
    /// Seconds.
    pub duration: f64,
}

impl MixPart {
    pub fn new(language: impl Into<String>, from_ts: Option<Millis>, to_ts: Option<Millis>, duration: f64) -> Self {
        Self {
            language: language.into(),
            from_ts,
            to_ts,
            duration,
        }
    }

    /// A part whose duration is the length of `span`.
    pub fn from_span(language: impl Into<String>, span: Span) -> Self {
        Self::new(language, Some(span.start), Some(span.end), span.duration_secs())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LanguageMixEntry {
    pub language: String,
    pub duration: f64,
}

// ---------------------------------------------------------------------------
// LanguageMix — run-length timeline of spoken languages
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize)]
pub struct LanguageMix {
    #[serde(skip)]
    parts: Vec<MixPart>,
    entries: Vec<LanguageMixEntry>,
    length: f64,
}

impl LanguageMix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, part: MixPart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[MixPart] {
        &self.parts
    }

    /// Rebuilds the timeline from every part added so far.
    ///
    /// Parts missing an endpoint are ignored, as are parts starting after
    /// `to_ts` when a bound is given. The rest are ordered by `(start, end)`
    /// and adjacent same-language parts merge into one entry.
    pub fn compute(&mut self, to_ts: Option<Millis>) -> &[LanguageMixEntry] {
        let mut included: Vec<(Millis, Millis, &MixPart)> = self
            .parts
            .iter()
            .filter_map(|p| Some((p.from_ts?, p.to_ts?, p)))
            .filter(|(start, _, _)| to_ts.map_or(true, |bound| *start <= bound))
            .collect();
        included.sort_by_key(|&(start, end, _)| (start, end));

        let mut entries: Vec<LanguageMixEntry> = Vec::new();
        let mut length = 0.0;
        for (_, _, part) in included {
            length += part.duration;
            match entries.last_mut() {
                Some(last) if last.language == part.language => last.duration += part.duration,
                _ => entries.push(LanguageMixEntry {
                    language: part.language.clone(),
                    duration: part.duration,
                }),
            }
        }
        tracing::debug!(entries = entries.len(), length, "language mix computed");

        self.entries = entries;
        self.length = length;
        &self.entries
    }

    pub fn entries(&self) -> &[LanguageMixEntry] {
        &self.entries
    }

    /// Total seconds of the parts included by the last [`compute`](Self::compute).
    pub fn length(&self) -> f64 {
        self.length
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn part(language: &str, start_s: u64, end_s: u64) -> MixPart {
        MixPart::from_span(
            language,
            Span::new(Millis::new(start_s * 1000), Millis::new(end_s * 1000)),
        )
    }

    fn summary(mix: &LanguageMix) -> Vec<(&str, f64)> {
        mix.entries()
            .iter()
            .map(|e| (e.language.as_str(), e.duration))
            .collect()
    }

    #[test]
    fn test_adjacent_languages_merge() {
        let mut mix = LanguageMix::new();
        mix.add(part("En", 0, 2));
        mix.add(part("En", 2, 3));
        mix.add(part("Cn", 3, 5));
        mix.compute(None);

        assert_eq!(summary(&mix), vec![("En", 3.0), ("Cn", 2.0)]);
        assert!((mix.length() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parts_are_ordered_before_merging() {
        let mut mix = LanguageMix::new();
        mix.add(part("Cn", 3, 5));
        mix.add(part("En", 2, 3));
        mix.add(part("En", 0, 2));
        mix.add(part("Cn", 5, 6));
        mix.compute(None);

        assert_eq!(summary(&mix), vec![("En", 3.0), ("Cn", 3.0)]);
    }

    #[test]
    fn test_unresolved_parts_are_skipped() {
        let mut mix = LanguageMix::new();
        mix.add(part("En", 0, 1));
        mix.add(MixPart::new("Cn", Some(Millis::new(1000)), None, 4.0));
        mix.compute(None);

        assert_eq!(summary(&mix), vec![("En", 1.0)]);
        assert!((mix.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bound_excludes_parts_starting_after_it() {
        let mut mix = LanguageMix::new();
        mix.add(part("En", 0, 2));
        mix.add(part("Cn", 2, 4));
        mix.add(part("Ms", 5, 6));
        mix.compute(Some(Millis::new(3000)));

        assert_eq!(summary(&mix), vec![("En", 2.0), ("Cn", 2.0)]);
        assert!((mix.length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut mix = LanguageMix::new();
        mix.add(part("En", 0, 2));
        mix.add(part("Cn", 2, 3));
        let first = mix.compute(None).to_vec();
        let second = mix.compute(None).to_vec();
        assert_eq!(first, second);
        assert_eq!(mix.parts().len(), 2);
    }

    #[test]
    fn test_alternating_languages_stay_separate() {
        let mut mix = LanguageMix::new();
        mix.add(part("En", 0, 1));
        mix.add(part("Cn", 1, 2));
        mix.add(part("En", 2, 3));
        mix.compute(None);

        assert_eq!(summary(&mix), vec![("En", 1.0), ("Cn", 1.0), ("En", 1.0)]);
    }
}
