//! Error types for the core library.

use thiserror::Error;

use crate::draft::{DraftId, UserId};

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The draft is not tracked for this user.
    #[error("Draft {draft_id} not found for user {user_id}")]
    DraftNotFound {
        /// Owner of the draft.
        user_id: UserId,
        /// Identifier of the missing draft.
        draft_id: DraftId,
    },

    /// A stored row holds a value this version does not understand.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
