//! Integration tests for sending-state observation.
//!
//! These tests drive the observer with a scripted store that replays a fixed
//! sequence of snapshots, so every upstream emission is seen exactly once.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use proptest::prelude::*;

use outbox_core::{
    DraftAction, DraftId, DraftState, DraftStateRepository, DraftSyncState, Error,
    ObserveSendingDraftStates, SendingError, UserId,
};

/// Store replaying a fixed list of snapshots, optionally failing at one index.
struct ScriptedRepository {
    script: Vec<Vec<DraftState>>,
    fail_at: Option<usize>,
}

impl ScriptedRepository {
    fn new(script: Vec<Vec<DraftState>>) -> Self {
        Self {
            script,
            fail_at: None,
        }
    }
}

impl DraftStateRepository for ScriptedRepository {
    fn observe_all(
        &self,
        _user_id: &UserId,
    ) -> BoxStream<'static, outbox_core::Result<Vec<DraftState>>> {
        let fail_at = self.fail_at;
        let items: Vec<_> = self
            .script
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, snapshot)| {
                if Some(index) == fail_at {
                    Err(Error::Decode("store unavailable".into()))
                } else {
                    Ok(snapshot)
                }
            })
            .collect();
        stream::iter(items).boxed()
    }

    async fn upsert(&self, _state: DraftState) -> outbox_core::Result<()> {
        Ok(())
    }

    async fn update_sync_state(
        &self,
        _user_id: &UserId,
        _draft_id: &DraftId,
        _state: DraftSyncState,
    ) -> outbox_core::Result<()> {
        Ok(())
    }

    async fn update_sending_error(
        &self,
        _user_id: &UserId,
        _draft_id: &DraftId,
        _error: SendingError,
    ) -> outbox_core::Result<()> {
        Ok(())
    }

    async fn confirm_sending_status(
        &self,
        _user_id: &UserId,
        _draft_ids: &[DraftId],
    ) -> outbox_core::Result<()> {
        Ok(())
    }

    async fn delete(&self, _user_id: &UserId, _draft_id: &DraftId) -> outbox_core::Result<()> {
        Ok(())
    }
}

fn draft(id: &str, state: DraftSyncState) -> DraftState {
    DraftState::new(UserId::new("alice"), DraftId::new(id), DraftAction::Compose).with_state(state)
}

async fn observe_all(repo: ScriptedRepository) -> Vec<outbox_core::Result<Vec<DraftState>>> {
    let observe = ObserveSendingDraftStates::new(Arc::new(repo));
    observe.observe(&UserId::new("alice")).collect().await
}

async fn observe_ok(repo: ScriptedRepository) -> Vec<Vec<DraftState>> {
    observe_all(repo)
        .await
        .into_iter()
        .map(|emission| emission.unwrap())
        .collect()
}

#[tokio::test]
async fn test_no_outcome_emits_empty_once() {
    let repo = ScriptedRepository::new(vec![
        vec![draft("a", DraftSyncState::Local)],
        vec![
            draft("a", DraftSyncState::Synchronized),
            draft("b", DraftSyncState::Sending),
        ],
        vec![draft("a", DraftSyncState::ErrorUploadAttachments)],
    ]);

    assert_eq!(observe_ok(repo).await, vec![Vec::<DraftState>::new()]);
}

#[tokio::test]
async fn test_pending_then_sent_then_identical() {
    let repo = ScriptedRepository::new(vec![
        vec![draft("a", DraftSyncState::Local)],
        vec![draft("a", DraftSyncState::Sent)],
        vec![draft("a", DraftSyncState::Sent)],
    ]);

    assert_eq!(
        observe_ok(repo).await,
        vec![vec![], vec![draft("a", DraftSyncState::Sent)]]
    );
}

#[tokio::test]
async fn test_keeps_upstream_order() {
    let repo = ScriptedRepository::new(vec![vec![
        draft("a", DraftSyncState::Sent),
        draft("c", DraftSyncState::Local),
        draft("b", DraftSyncState::ErrorSending),
    ]]);

    assert_eq!(
        observe_ok(repo).await,
        vec![vec![
            draft("a", DraftSyncState::Sent),
            draft("b", DraftSyncState::ErrorSending)
        ]]
    );
}

#[tokio::test]
async fn test_non_empty_to_empty_is_emitted() {
    let repo = ScriptedRepository::new(vec![
        vec![draft("a", DraftSyncState::ErrorSending)],
        vec![draft("a", DraftSyncState::Sending)],
        vec![draft("a", DraftSyncState::Sending)],
    ]);

    assert_eq!(
        observe_ok(repo).await,
        vec![vec![draft("a", DraftSyncState::ErrorSending)], vec![]]
    );
}

#[tokio::test]
async fn test_structural_equality_covers_every_field() {
    let mut failed_again = draft("a", DraftSyncState::ErrorSending);
    failed_again.sending_error = Some(SendingError::Other("timeout".into()));

    let repo = ScriptedRepository::new(vec![
        vec![draft("a", DraftSyncState::ErrorSending)],
        vec![failed_again.clone()],
    ]);

    assert_eq!(
        observe_ok(repo).await,
        vec![vec![draft("a", DraftSyncState::ErrorSending)], vec![failed_again]]
    );
}

#[tokio::test]
async fn test_store_errors_pass_through() {
    let mut repo = ScriptedRepository::new(vec![
        vec![draft("a", DraftSyncState::Sent)],
        vec![],
        vec![draft("a", DraftSyncState::Sent)],
        vec![],
    ]);
    repo.fail_at = Some(1);

    let emissions = observe_all(repo).await;

    assert_eq!(emissions.len(), 3);
    assert_eq!(
        emissions[0].as_ref().unwrap(),
        &vec![draft("a", DraftSyncState::Sent)]
    );
    assert!(matches!(emissions[1], Err(Error::Decode(_))));
    assert!(emissions[2].as_ref().unwrap().is_empty());
}

fn arb_state() -> impl Strategy<Value = DraftSyncState> {
    prop::sample::select(DraftSyncState::ALL.to_vec())
}

fn arb_snapshot() -> impl Strategy<Value = Vec<DraftState>> {
    prop::collection::vec(arb_state(), 0..4).prop_map(|states| {
        states
            .into_iter()
            .enumerate()
            .map(|(index, state)| draft(&format!("draft-{index}"), state))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_emissions_are_filtered_and_distinct(
        script in prop::collection::vec(arb_snapshot(), 0..12)
    ) {
        let mut expected: Vec<Vec<DraftState>> = Vec::new();
        for snapshot in &script {
            let filtered: Vec<_> = snapshot
                .iter()
                .filter(|state| state.state.is_sending_outcome())
                .cloned()
                .collect();
            if expected.last() != Some(&filtered) {
                expected.push(filtered);
            }
        }

        let emitted = tokio_test::block_on(observe_ok(ScriptedRepository::new(script)));

        prop_assert_eq!(&emitted, &expected);
        prop_assert!(emitted.windows(2).all(|pair| pair[0] != pair[1]));
        prop_assert!(emitted
            .iter()
            .flatten()
            .all(|state| state.state.is_sending_outcome()));
    }
}
