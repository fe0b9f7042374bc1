use std::fmt;
use uuid::Uuid;

/// One in-flight enrichment attempt
///
/// Lives only for the duration of a retry cycle and is never persisted. A
/// manual retry starts over with a fresh value whose counter is back at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentAttempt {
    pub bookmark_id: Uuid,
    pub url: String,
    pub attempt_number: u32,
}

impl EnrichmentAttempt {
    /// Creates the first attempt of a new cycle
    pub fn first(bookmark_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            bookmark_id,
            url: url.into(),
            attempt_number: 1,
        }
    }

    /// Returns the attempt that follows this one
    pub fn next(&self) -> Self {
        Self {
            bookmark_id: self.bookmark_id,
            url: self.url.clone(),
            attempt_number: self.attempt_number + 1,
        }
    }
}

/// State of a retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Running the given attempt (1-based)
    Attempting(u32),

    /// Enrichment succeeded and was written back
    Succeeded,

    /// Every attempt failed and the failure was written back
    ExhaustedFailure,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Attempting(_))
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempting(n) => write!(f, "attempting({})", n),
            Self::Succeeded => write!(f, "succeeded"),
            Self::ExhaustedFailure => write!(f, "exhausted_failure"),
        }
    }
}
