use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl TrackerError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        TrackerError::NotFound { kind, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        TrackerError::Storage {
            message: message.into(),
        }
    }
}

#[cfg(feature = "db")]
impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Storage {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Returns a validation error when `condition` does not hold.
pub(crate) fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(TrackerError::validation(message))
    }
}
