//! The two non-fatal failure kinds: a period that cannot be resolved and a
//! category mapping that cannot be used.

use std::path::PathBuf;

/// A week label (or label + point pair) that does not describe a valid period.
///
/// The `Display` text is phrased for a transient warning shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unresolved {
    #[error("no week label to resolve")]
    NoLabel,
    #[error("could not read a week from \"{0}\"")]
    NoMatch(String),
    #[error("year {0} is before 1970")]
    YearOutOfRange(i32),
    #[error("week {0} is outside 1-53")]
    WeekOutOfRange(u32),
    #[error("\"{0}\" is not a calendar date")]
    InvalidDate(String),
}

/// The category-mapping resource is absent or unusable.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("category mapping not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("reading category mapping {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("category mapping is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("category mapping is inconsistent: {0}")]
    Invalid(String),
}
