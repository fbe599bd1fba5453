//! Persistent store error types.

use thiserror::Error;

/// Persistent store error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum StoreError {
    /// The store could not be opened. Terminal for the store's lifetime.
    #[error("failed to open store: {message}")]
    Open { message: String },

    /// A single read or write failed; the write was rolled back.
    #[error("store operation failed: {message}")]
    Operation { message: String },

    /// The store worker stopped before the operation ran.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates open failure.
    #[must_use]
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Creates operation failure.
    #[must_use]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    /// Returns whether the error is the terminal open failure.
    #[must_use]
    pub const fn is_open_failure(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::operation(error.to_string())
    }
}
