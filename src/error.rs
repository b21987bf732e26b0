use thiserror::Error;

/// Input rejected before anything touches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("note content is empty")]
    EmptyContent,
}

/// Failure reading, writing or decoding a persisted record.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted record under `{key}`: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum MemoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A modal message shown to the user in place of a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl MemoError {
    /// User-facing alert for a failed action. `action` completes the sentence
    /// "Failed to ... Please try again."
    pub fn alert(&self, action: &str) -> Alert {
        match self {
            MemoError::Validation(ValidationError::EmptyContent) => {
                Alert::new("Empty Note", "Please write something before saving.")
            }
            MemoError::Storage(_) => {
                Alert::new("Error", format!("Failed to {}. Please try again.", action))
            }
        }
    }
}
