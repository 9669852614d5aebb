//! Draft synchronization state tracking.
//!
//! This module defines the draft state model, the store contract every
//! observer reads from, and two stores: an in-memory one and a durable
//! `SQLite` one.

mod memory;
mod model;
mod repository;
mod sqlite;

pub use memory::InMemoryDraftStateRepository;
pub use model::{DraftAction, DraftId, DraftState, DraftSyncState, SendingError, UserId};
pub use repository::DraftStateRepository;
pub use sqlite::{DEFAULT_POLL_INTERVAL, SqliteDraftStateRepository};
