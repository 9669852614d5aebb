//! In-memory draft state store.

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::model::{DraftId, DraftState, DraftSyncState, SendingError, UserId};
use super::repository::DraftStateRepository;
use crate::{Error, Result};

/// Draft state store kept in memory.
///
/// All users share one snapshot vector published through a `watch` channel.
/// Each observer filters it down to its user.
pub struct InMemoryDraftStateRepository {
    states: watch::Sender<Vec<DraftState>>,
}

impl InMemoryDraftStateRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (states, _) = watch::channel(Vec::new());
        Self { states }
    }

    /// Apply `change` to one draft, publishing only if the draft exists.
    fn modify_draft(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        change: impl FnOnce(&mut DraftState),
    ) -> Result<()> {
        let found = self.states.send_if_modified(|states| {
            match states.iter_mut().find(|state| state.is(user_id, draft_id)) {
                Some(state) => {
                    change(state);
                    true
                }
                None => false,
            }
        });

        if found {
            Ok(())
        } else {
            Err(Error::DraftNotFound {
                user_id: user_id.clone(),
                draft_id: draft_id.clone(),
            })
        }
    }
}

impl Default for InMemoryDraftStateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStateRepository for InMemoryDraftStateRepository {
    fn observe_all(&self, user_id: &UserId) -> BoxStream<'static, Result<Vec<DraftState>>> {
        debug!("Observing draft states of user {user_id}");
        let user_id = user_id.clone();
        WatchStream::new(self.states.subscribe())
            .map(move |states| {
                Ok(states
                    .into_iter()
                    .filter(|state| state.user_id == user_id)
                    .collect())
            })
            .boxed()
    }

    async fn upsert(&self, state: DraftState) -> Result<()> {
        debug!(
            "Upserting draft {} of user {} as {}",
            state.draft_id,
            state.user_id,
            state.state.as_str()
        );
        self.states.send_modify(|states| {
            match states
                .iter_mut()
                .find(|existing| existing.is(&state.user_id, &state.draft_id))
            {
                Some(existing) => *existing = state,
                None => states.push(state),
            }
        });
        Ok(())
    }

    async fn update_sync_state(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        state: DraftSyncState,
    ) -> Result<()> {
        self.modify_draft(user_id, draft_id, |draft| draft.transition(state))
    }

    async fn update_sending_error(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        error: SendingError,
    ) -> Result<()> {
        self.modify_draft(user_id, draft_id, |draft| {
            draft.transition(DraftSyncState::ErrorSending);
            draft.sending_error = Some(error);
        })
    }

    async fn confirm_sending_status(&self, user_id: &UserId, draft_ids: &[DraftId]) -> Result<()> {
        self.states.send_if_modified(|states| {
            let mut confirmed = false;
            for state in states.iter_mut().filter(|state| {
                &state.user_id == user_id
                    && draft_ids.contains(&state.draft_id)
                    && state.state.is_sending_outcome()
                    && !state.sending_status_confirmed
            }) {
                state.sending_status_confirmed = true;
                confirmed = true;
            }
            confirmed
        });
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, draft_id: &DraftId) -> Result<()> {
        self.states.send_if_modified(|states| {
            let before = states.len();
            states.retain(|state| !state.is(user_id, draft_id));
            states.len() != before
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::draft::DraftAction;

    fn draft(user: &str, id: &str) -> DraftState {
        DraftState::new(UserId::new(user), DraftId::new(id), DraftAction::Compose)
    }

    #[tokio::test]
    async fn test_observe_all_starts_with_current_snapshot() {
        let repo = InMemoryDraftStateRepository::new();
        repo.upsert(draft("alice", "a")).await.unwrap();
        repo.upsert(draft("bob", "b")).await.unwrap();

        let mut states = repo.observe_all(&UserId::new("alice"));
        let snapshot = states.next().await.unwrap().unwrap();

        assert_eq!(snapshot, vec![draft("alice", "a")]);
    }

    #[tokio::test]
    async fn test_upsert_keeps_insertion_order() {
        let repo = InMemoryDraftStateRepository::new();
        repo.upsert(draft("alice", "a")).await.unwrap();
        repo.upsert(draft("alice", "b")).await.unwrap();
        repo.upsert(draft("alice", "a").with_state(DraftSyncState::Sent))
            .await
            .unwrap();

        let snapshot = repo
            .observe_all(&UserId::new("alice"))
            .next()
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<_> = snapshot.iter().map(|s| s.draft_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot[0].state, DraftSyncState::Sent);
    }

    #[tokio::test]
    async fn test_update_missing_draft_fails() {
        let repo = InMemoryDraftStateRepository::new();
        let result = repo
            .update_sync_state(
                &UserId::new("alice"),
                &DraftId::new("ghost"),
                DraftSyncState::Sent,
            )
            .await;

        assert!(matches!(result, Err(Error::DraftNotFound { .. })));
    }

    #[tokio::test]
    async fn test_sending_error_then_retry() {
        let repo = InMemoryDraftStateRepository::new();
        let user = UserId::new("alice");
        let id = DraftId::new("a");
        repo.upsert(draft("alice", "a")).await.unwrap();

        repo.update_sending_error(&user, &id, SendingError::Other("quota".into()))
            .await
            .unwrap();
        let failed = repo.observe(&user, &id).next().await.unwrap().unwrap();
        let failed = failed.unwrap();
        assert_eq!(failed.state, DraftSyncState::ErrorSending);
        assert_eq!(failed.sending_error, Some(SendingError::Other("quota".into())));

        repo.update_sync_state(&user, &id, DraftSyncState::Sending)
            .await
            .unwrap();
        let retrying = repo.observe(&user, &id).next().await.unwrap().unwrap();
        assert_eq!(retrying.unwrap().sending_error, None);
    }

    #[tokio::test]
    async fn test_confirm_only_touches_outcomes() {
        let repo = InMemoryDraftStateRepository::new();
        let user = UserId::new("alice");
        repo.upsert(draft("alice", "a").with_state(DraftSyncState::Sent))
            .await
            .unwrap();
        repo.upsert(draft("alice", "b").with_state(DraftSyncState::Sending))
            .await
            .unwrap();

        repo.confirm_sending_status(&user, &[DraftId::new("a"), DraftId::new("b")])
            .await
            .unwrap();

        let snapshot = repo.observe_all(&user).next().await.unwrap().unwrap();
        assert!(snapshot[0].sending_status_confirmed);
        assert!(!snapshot[1].sending_status_confirmed);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryDraftStateRepository::new();
        let user = UserId::new("alice");
        let id = DraftId::new("a");
        repo.upsert(draft("alice", "a")).await.unwrap();

        repo.delete(&user, &id).await.unwrap();
        repo.delete(&user, &id).await.unwrap();

        let single = repo.observe(&user, &id).next().await.unwrap().unwrap();
        assert_eq!(single, None);
    }
}
