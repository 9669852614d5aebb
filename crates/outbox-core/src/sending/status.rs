//! User-facing sending status derived from draft states.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::debug;

use super::observer::ObserveSendingDraftStates;
use crate::Result;
use crate::draft::{DraftId, DraftState, DraftStateRepository, DraftSyncState, SendingError, UserId};
use crate::stream::distinct_until_changed;

/// The sending outcome a user interface should surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageSendingStatus {
    /// Nothing to report.
    #[default]
    None,
    /// A message was sent.
    MessageSent,
    /// A message could not be sent.
    SendMessageError(SendingError),
}

impl MessageSendingStatus {
    /// Derive the status from drafts in a sending outcome state.
    ///
    /// Confirmed drafts are ignored. A failure takes precedence over a success.
    #[must_use]
    pub fn from_states(states: &[DraftState]) -> Self {
        let mut unconfirmed = states.iter().filter(|state| !state.sending_status_confirmed);

        if let Some(failed) = unconfirmed
            .clone()
            .find(|state| state.state == DraftSyncState::ErrorSending)
        {
            let error = failed
                .sending_error
                .clone()
                .unwrap_or_else(|| SendingError::Other(String::new()));
            return Self::SendMessageError(error);
        }

        if unconfirmed.any(|state| state.state == DraftSyncState::Sent) {
            Self::MessageSent
        } else {
            Self::None
        }
    }

    /// Short text for a notification or snackbar.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::MessageSent => Some("Message sent".to_string()),
            Self::SendMessageError(error) => {
                Some(format!("Message could not be sent: {}", error.description()))
            }
        }
    }
}

/// A sending status together with the drafts it accounts for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendingStatusUpdate {
    /// Status to show.
    pub status: MessageSendingStatus,
    /// Unconfirmed drafts whose outcome is the status, to confirm once shown.
    ///
    /// A failure covers only the failed drafts: unconfirmed sent drafts stay
    /// pending and surface as `MessageSent` once the failures are confirmed.
    pub draft_ids: Vec<DraftId>,
}

impl SendingStatusUpdate {
    /// Build the update for one emission of [`ObserveSendingDraftStates`].
    #[must_use]
    pub fn from_states(states: &[DraftState]) -> Self {
        let status = MessageSendingStatus::from_states(states);
        let covered = match status {
            MessageSendingStatus::None => None,
            MessageSendingStatus::MessageSent => Some(DraftSyncState::Sent),
            MessageSendingStatus::SendMessageError(_) => Some(DraftSyncState::ErrorSending),
        };

        Self {
            draft_ids: states
                .iter()
                .filter(|state| !state.sending_status_confirmed && Some(state.state) == covered)
                .map(|state| state.draft_id.clone())
                .collect(),
            status,
        }
    }
}

/// Observes the sending status of a user's drafts.
pub struct ObserveSendingStatus<R> {
    observe_sending: ObserveSendingDraftStates<R>,
}

impl<R: DraftStateRepository> ObserveSendingStatus<R> {
    /// Creates the status observer on top of a draft state store.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self {
            observe_sending: ObserveSendingDraftStates::new(repository),
        }
    }

    /// Starts a new subscription for `user_id`, distinct until changed.
    pub fn observe(&self, user_id: &UserId) -> BoxStream<'static, Result<SendingStatusUpdate>> {
        let updates = self
            .observe_sending
            .observe(user_id)
            .map(|states| states.map(|states| SendingStatusUpdate::from_states(&states)));
        distinct_until_changed(updates).boxed()
    }
}

/// Marks sending outcomes as shown to the user.
pub struct ConfirmSendingStatus<R> {
    repository: Arc<R>,
}

impl<R: DraftStateRepository> ConfirmSendingStatus<R> {
    /// Creates the use case on top of a draft state store.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Confirm the sending status of `draft_ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to persist the confirmation.
    pub async fn confirm(&self, user_id: &UserId, draft_ids: &[DraftId]) -> Result<()> {
        if draft_ids.is_empty() {
            return Ok(());
        }
        debug!(
            "Confirming sending status of {} draft(s) for user {user_id}",
            draft_ids.len()
        );
        self.repository
            .confirm_sending_status(user_id, draft_ids)
            .await
    }
}
