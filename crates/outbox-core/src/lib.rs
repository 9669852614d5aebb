//! # outbox-core
//!
//! Draft sending-state tracking for the `Outbox` email client.
//!
//! This crate provides:
//! - Draft sync state models
//! - The draft state store contract, with in-memory and `SQLite` stores
//! - **Sending-state observation** - a filtered, de-duplicated view of drafts
//!   that just finished sending or failed to send
//! - **Sending status** - the single outcome a user interface surfaces, and
//!   its confirmation
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use outbox_core::{InMemoryDraftStateRepository, ObserveSendingDraftStates, UserId};
//!
//! let repository = Arc::new(InMemoryDraftStateRepository::new());
//! let observe = ObserveSendingDraftStates::new(repository);
//! let mut states = observe.observe(&UserId::new("user"));
//! while let Some(sent_or_failed) = states.next().await {
//!     println!("{:?}", sent_or_failed?);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod draft;
mod error;
pub mod sending;
pub mod stream;

pub use draft::{
    DraftAction, DraftId, DraftState, DraftStateRepository, DraftSyncState,
    InMemoryDraftStateRepository, SendingError, SqliteDraftStateRepository, UserId,
};
pub use error::{Error, Result};
pub use sending::{
    ConfirmSendingStatus, MessageSendingStatus, ObserveSendingDraftStates, ObserveSendingStatus,
    SendingStatusUpdate,
};
