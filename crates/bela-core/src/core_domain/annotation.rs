use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{AnnotationId, BelaError, Millis, ParticipantCode, Span, TierId};

// ---------------------------------------------------------------------------
// TierClass — semantic role of a tier
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TierClass {
    Utterance,
    Chunk,
    Language,
    Translation,
    Matrix,
    SensitiveMasking,
    ActivityMarkers,
    /// Any class outside the linked set (e.g. `Target_EL`, `Comment`).
    Other(String),
}

impl TierClass {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "Utterance" => Self::Utterance,
            "Chunk" => Self::Chunk,
            "Language" => Self::Language,
            "Translation" => Self::Translation,
            "Matrix" => Self::Matrix,
            "Sensitive_Masking" => Self::SensitiveMasking,
            "ActivityMarkers" => Self::ActivityMarkers,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Utterance => "Utterance",
            Self::Chunk => "Chunk",
            Self::Language => "Language",
            Self::Translation => "Translation",
            Self::Matrix => "Matrix",
            Self::SensitiveMasking => "Sensitive_Masking",
            Self::ActivityMarkers => "ActivityMarkers",
            Self::Other(name) => name,
        }
    }

    /// Translations hang off their utterance by reference id; every other
    /// class carries its own time slots.
    pub fn is_time_alignable(&self) -> bool {
        !matches!(self, Self::Translation)
    }
}

impl From<String> for TierClass {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TierClass> for String {
    fn from(value: TierClass) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for TierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw input — an already-parsed annotation document
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub path: Option<String>,
    pub tiers: Vec<RawTier>,
}

impl RawDocument {
    pub fn from_json(json: &str) -> Result<Self, BelaError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTier {
    pub id: String,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub from_ts: Option<u64>,
    #[serde(default)]
    pub to_ts: Option<u64>,
    #[serde(default)]
    pub reference: Option<String>,
}

// ---------------------------------------------------------------------------
// Annotation — atomic unit of text on a tier
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub text: String,
    pub from_ts: Option<Millis>,
    pub to_ts: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<AnnotationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub words: Vec<String>,
}

impl Annotation {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: AnnotationId::new(id),
            text: text.into(),
            from_ts: None,
            to_ts: None,
            reference: None,
            language: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            words: Vec::new(),
        }
    }

    pub fn with_span(mut self, from_ms: u64, to_ms: u64) -> Self {
        self.from_ts = Some(Millis::new(from_ms));
        self.to_ts = Some(Millis::new(to_ms));
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(AnnotationId::new(reference));
        self
    }

    /// The resolved interval, if both endpoints are known and ordered.
    pub fn span(&self) -> Option<Span> {
        match (self.from_ts, self.to_ts) {
            (Some(start), Some(end)) if end >= start => Some(Span::new(start, end)),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub(crate) fn time_label(&self) -> String {
        format!("[{} :: {}]", fmt_ts(self.from_ts), fmt_ts(self.to_ts))
    }
}

impl From<RawAnnotation> for Annotation {
    fn from(raw: RawAnnotation) -> Self {
        Self {
            id: AnnotationId::new(raw.id),
            text: raw.text,
            from_ts: raw.from_ts.map(Millis::new),
            to_ts: raw.to_ts.map(Millis::new),
            reference: raw.reference.map(AnnotationId::new),
            language: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            words: Vec::new(),
        }
    }
}

pub(crate) fn fmt_ts(ts: Option<Millis>) -> String {
    ts.map_or_else(|| "None".to_owned(), |t| t.to_string())
}

// ---------------------------------------------------------------------------
// Tier — ordered track of annotations sharing one role
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct Tier {
    pub id: TierId,
    /// `None` until the tier name has been resolved (or when it is invalid).
    pub class: Option<TierClass>,
    pub speaker_name: Option<String>,
    pub participant: Option<ParticipantCode>,
    pub parent: Option<TierId>,
    pub annotations: Vec<Annotation>,
}

impl Tier {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TierId::new(id),
            class: None,
            speaker_name: None,
            participant: None,
            parent: None,
            annotations: Vec::new(),
        }
    }

    pub fn is_time_alignable(&self) -> bool {
        self.class.as_ref().is_some_and(TierClass::is_time_alignable)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl From<RawTier> for Tier {
    fn from(raw: RawTier) -> Self {
        Self {
            id: TierId::new(raw.id),
            class: None,
            speaker_name: None,
            participant: raw
                .participant
                .filter(|p| !p.trim().is_empty())
                .map(ParticipantCode::new),
            parent: raw.parent.map(TierId::new),
            annotations: raw.annotations.into_iter().map(Annotation::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
