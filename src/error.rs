use thiserror::Error;

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Statistics engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Race record could not be normalized into a [`crate::core::Race`]
    #[error("Malformed race {id}: {reason}")]
    MalformedRace { id: String, reason: String },

    /// Same race appended twice to one mouse (upstream dedup failure)
    #[error("Race {race_id} already associated with {mouse}")]
    DuplicateRace { race_id: String, mouse: String },

    /// Win/loss/completed counters no longer agree
    #[error("Integrity violation for {mouse}: wins ({wins}) + losses ({losses}) != completed ({completed})")]
    Integrity {
        mouse: String,
        wins: usize,
        losses: usize,
        completed: usize,
    },

    /// Lane-relative query on a mouse without races
    #[error("Mouse {mouse} has no race history")]
    NoHistory { mouse: String },

    #[error("Unknown mouse color: {0}")]
    UnknownColor(String),

    #[error("Invalid participant {name}: {reason}")]
    InvalidParticipant { name: String, reason: String },

    #[error("Participant {0} registered more than once")]
    DuplicateParticipant(String),

    #[error("Invalid window label: {0}")]
    InvalidWindow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl Error {
    pub(crate) fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRace {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Query-time errors a caller can recover from by skipping the mouse
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NoHistory { .. })
    }
}
