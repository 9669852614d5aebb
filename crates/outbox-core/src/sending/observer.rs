//! Observation of drafts that just finished sending or failed to send.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::debug;

use crate::Result;
use crate::draft::{DraftState, DraftStateRepository, UserId};
use crate::stream::distinct_until_changed;

/// Observes the drafts of a user whose send attempt reached an outcome.
///
/// Each emission holds the user's drafts in state `Sent` or `ErrorSending`,
/// in store order. An emission structurally equal to the previous one is
/// suppressed, so a store re-publishing for an unrelated draft does not
/// reach the consumer twice. Store errors are forwarded as they are.
pub struct ObserveSendingDraftStates<R> {
    repository: Arc<R>,
}

impl<R: DraftStateRepository> ObserveSendingDraftStates<R> {
    /// Creates the observer on top of a draft state store.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Starts a new subscription for `user_id`.
    ///
    /// Every call has its own de-duplication memory and starts from the
    /// store's current snapshot. Dropping the stream ends the subscription.
    pub fn observe(&self, user_id: &UserId) -> BoxStream<'static, Result<Vec<DraftState>>> {
        debug!("Observing sending draft states of user {user_id}");
        let sending = self.repository.observe_all(user_id).map(|snapshot| {
            snapshot.map(|states| {
                states
                    .into_iter()
                    .filter(|state| state.state.is_sending_outcome())
                    .collect::<Vec<_>>()
            })
        });
        distinct_until_changed(sending).boxed()
    }
}

impl<R> Clone for ObserveSendingDraftStates<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
