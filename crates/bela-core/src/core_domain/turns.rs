use serde::Serialize;

use crate::core::{Annotation, Document, ParticipantCode, Span};

pub const DEFAULT_TURN_THRESHOLD_MS: u64 = 1500;

/// Two consecutive utterances by different speakers.
#[derive(Clone, Debug, Serialize)]
pub struct Turn<'a> {
    pub speaker: &'a ParticipantCode,
    pub utterance: &'a Annotation,
    pub next_speaker: &'a ParticipantCode,
    pub next_utterance: &'a Annotation,
    /// `next.from - prev.to`; negative when the utterances overlap.
    pub gap_ms: i64,
}

/// Pairs each utterance with the one starting next (across all persons)
/// when the speakers differ and the gap is within `threshold_ms` either way.
/// Utterances without a resolved interval are ignored.
pub fn find_turns(doc: &Document, threshold_ms: u64) -> Vec<Turn<'_>> {
    let mut timeline: Vec<(Span, &ParticipantCode, &Annotation)> = Vec::new();
    for person in doc.persons() {
        for view in doc.utterances(person) {
            if let Some(span) = view.annotation.span() {
                timeline.push((span, view.speaker, view.annotation));
            }
        }
    }
    timeline.sort_by_key(|(span, _, _)| span.start);

    timeline
        .windows(2)
        .filter_map(|pair| {
            let (prev_span, speaker, utterance) = pair[0];
            let (next_span, next_speaker, next_utterance) = pair[1];
            let gap_ms = prev_span.end.delta_to(next_span.start);
            (speaker != next_speaker && gap_ms.unsigned_abs() <= threshold_ms).then_some(Turn {
                speaker,
                utterance,
                next_speaker,
                next_utterance,
                gap_ms,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
