use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("STORAGE_FAILURE: {0}")]
    Storage(String),
    #[error("SERIALIZE_FAILURE: {0}")]
    Serialize(String),
    #[error("QUOTA_EXCEEDED: writing {key} needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { key: String, needed: usize, quota: usize },
    #[error("INVALID_KEY: {0}")]
    InvalidKey(String),
    #[error("WATCH_FAILURE: {0}")]
    Watch(String),
    #[error("LOCK_POISONED: {0}")]
    LockPoisoned(&'static str),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}

impl From<notify::Error> for StoreError {
    fn from(value: notify::Error) -> Self {
        Self::Watch(value.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected user input at the entry-creation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("VALIDATION_FAILED: progress must be between 0 and 100, got {0}")]
    ProgressOutOfRange(i64),
    #[error("VALIDATION_FAILED: {0} is required")]
    EmptyField(&'static str),
}
