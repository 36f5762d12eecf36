//! Error types
//!
//! Only loading and booting are fatal. Persistence and unlock failures are
//! logged and swallowed by the attempt machine; protocol violations (a submit
//! with no open question, a consumed block, ...) are not errors at all.

/// A level could not be loaded; the attempt cannot start.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("network error fetching {path}: {message}")]
    Network { path: String, message: String },

    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question bank for {level_id} is empty")]
    EmptyQuestionBank { level_id: String },

    #[error("question {index} is malformed: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

/// The results store or key-value storage rejected a read or write.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage operation failed: {0}")]
    Storage(String),

    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The level-progression host could not record an unlock.
#[derive(Debug, thiserror::Error)]
pub enum UnlockError {
    #[error("unknown level {0}")]
    UnknownLevel(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// The session boot record is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("session boot is missing {0}; start the game from the level select screen")]
    MissingField(&'static str),
}
