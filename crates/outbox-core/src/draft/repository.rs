//! Draft state store contract.

use std::future::Future;

use futures::StreamExt;
use futures::stream::BoxStream;

use super::model::{DraftId, DraftState, DraftSyncState, SendingError, UserId};
use crate::Result;
use crate::stream::distinct_until_changed;

/// Store holding the synchronization state of every tracked draft.
///
/// The store owns all draft states; observers only read snapshots. Writers
/// (the compose and send pipelines) drive state transitions through the
/// mutating methods.
pub trait DraftStateRepository: Send + Sync {
    /// Observe every draft state of a user.
    ///
    /// The stream yields the current snapshot as soon as it is polled, then a
    /// fresh snapshot after each write that may have changed the user's drafts.
    /// Writes that land in quick succession may be folded into one snapshot.
    /// Entries are in the order their drafts first entered tracking.
    fn observe_all(&self, user_id: &UserId) -> BoxStream<'static, Result<Vec<DraftState>>>;

    /// Observe the state of a single draft, `None` while it is not tracked.
    fn observe(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
    ) -> BoxStream<'static, Result<Option<DraftState>>> {
        let draft_id = draft_id.clone();
        let single = self.observe_all(user_id).map(move |snapshot| {
            snapshot.map(|states| {
                states
                    .into_iter()
                    .find(|state| state.draft_id == draft_id)
            })
        });
        distinct_until_changed(single).boxed()
    }

    /// Insert a draft state, or replace the one with the same key.
    ///
    /// A replaced draft keeps its position in snapshots.
    fn upsert(&self, state: DraftState) -> impl Future<Output = Result<()>> + Send;

    /// Move a draft to a new sync state.
    ///
    /// Leaving `ErrorSending` clears the recorded sending error; entering
    /// `Sending` clears the confirmation flag.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DraftNotFound`] if the draft is not tracked.
    fn update_sync_state(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        state: DraftSyncState,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Record a failed send: the draft moves to `ErrorSending` with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DraftNotFound`] if the draft is not tracked.
    fn update_sending_error(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        error: SendingError,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Mark the sending outcome of the given drafts as shown to the user.
    ///
    /// Only drafts currently `Sent` or `ErrorSending` are affected. Unknown
    /// drafts are ignored.
    fn confirm_sending_status(
        &self,
        user_id: &UserId,
        draft_ids: &[DraftId],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stop tracking a draft. Deleting an unknown draft is not an error.
    fn delete(&self, user_id: &UserId, draft_id: &DraftId)
    -> impl Future<Output = Result<()>> + Send;
}
