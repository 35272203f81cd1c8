use std::fmt;

// ---------------------------------------------------------------------------
// String-based identity newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(ParticipantCode);
string_newtype!(TierId);
string_newtype!(AnnotationId);

// ---------------------------------------------------------------------------
// Millis — canonical timestamp value (milliseconds from media start)
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Millis(u64);

impl Millis {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Converts a decimal seconds value, rounding to the nearest millisecond.
    /// Negative and non-finite inputs yield `None`.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some(Self((secs * 1000.0).round() as u64))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Signed distance `other - self` in milliseconds, saturating at the
    /// `i64` bounds.
    pub fn delta_to(&self, other: Millis) -> i64 {
        let delta = i128::from(other.0) - i128::from(self.0);
        i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0;
        let hours = total / 3_600_000;
        let minutes = (total / 60_000) % 60;
        let seconds = (total / 1000) % 60;
        let millis = total % 1000;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

// ---------------------------------------------------------------------------
// Span — a resolved, closed time interval
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: Millis,
    pub end: Millis,
}

impl Span {
    pub fn new(start: Millis, end: Millis) -> Self {
        Self { start, end }
    }

    /// Closed-interval containment: both ends inclusive.
    pub fn contains(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn duration_secs(&self) -> f64 {
        self.end.value().saturating_sub(self.start.value()) as f64 / 1000.0
    }

    /// Length of the overlap with `other` in milliseconds (0 when disjoint).
    pub fn overlap_ms(&self, other: &Span) -> u64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.value().saturating_sub(start.value())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
