/// Bookmark status definitions
///
/// A bookmark's status is derived from its `enriched_at` and `failed` columns
/// rather than stored, so it can never disagree with them.
use std::fmt;
use std::str::FromStr;

/// Logical enrichment status of a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookmarkStatus {
    /// Never enriched and not failed: waiting for (or inside) an attempt cycle
    Pending,

    /// The latest attempt cycle exhausted its retries
    Failed,

    /// Enriched at least once and the latest cycle did not fail
    Completed,
}

impl BookmarkStatus {
    /// Derives the status from the two persisted columns
    ///
    /// `failed` takes precedence, so a bookmark that was once enriched and
    /// then failed a later cycle reads as `Failed`.
    pub fn derive(enriched: bool, failed: bool) -> Self {
        if failed {
            Self::Failed
        } else if enriched {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    /// Returns true if no further automatic attempt will happen
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Completed => "completed",
        }
    }

    /// Returns all possible statuses
    pub fn all() -> [Self; 3] {
        [Self::Pending, Self::Failed, Self::Completed]
    }
}

impl fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BookmarkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown status '{}' (expected pending, failed or completed)",
                other
            )),
        }
    }
}
