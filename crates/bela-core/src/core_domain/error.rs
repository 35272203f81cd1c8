use crate::core::ParticipantCode;

// ---------------------------------------------------------------------------
// Sub-error types
// ---------------------------------------------------------------------------

/// Reasons a special (markup) token is rejected by the markup grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTokenError {
    #[error("Token text is blank")]
    Blank,
    #[error("Invalid vocal sounds tag")]
    InvalidVocalSound,
    #[error("This labelled vocal sound token contains invalid character(s)")]
    InvalidVocalLabel,
    #[error("invalid unclassifiable vocal sound token")]
    UnclassifiableVocalSound,
    #[error("Recursive mimicking is not allowed")]
    RecursiveMimicry,
    #[error("Invalid non vocal sound, closed class token")]
    InvalidNonVocalSound,
    #[error("This labelled token contains invalid character(s)")]
    InvalidLabel,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("participant code {code} is used by both {existing:?} and {conflicting:?}")]
    AmbiguousParticipant {
        code: ParticipantCode,
        existing: String,
        conflicting: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("invalid {field} value {value:?} in tier {tier}")]
    InvalidTimestamp {
        tier: String,
        field: &'static str,
        value: String,
    },
    #[error(
        "inconsistent values for from ({from}), to ({to}) and duration ({duration}); expected duration {expected}"
    )]
    InconsistentDuration {
        from: f64,
        to: f64,
        duration: f64,
        expected: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("non-word placeholder {0:?} must not contain whitespace or markup characters")]
    InvalidNonWord(String),
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BelaError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
