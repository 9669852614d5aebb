//! Draft state storage backed by `SQLite`.

use std::future;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use super::model::{DraftAction, DraftId, DraftState, DraftSyncState, SendingError, UserId};
use super::repository::DraftStateRepository;
use crate::{Error, Result};

/// How often observers re-read the database for writes made by other handles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What made an observer re-read the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A write through this handle.
    Write,
    /// The poll timer, for writes through other handles or processes.
    Poll,
}

/// Durable draft state store.
///
/// Every write bumps a change counter published through a `watch` channel;
/// observers re-read the user's drafts whenever it moves. Writes made through
/// another handle on the same file are picked up by polling, and a polled
/// snapshot is only emitted when it differs from the previous one.
pub struct SqliteDraftStateRepository {
    pool: SqlitePool,
    changes: watch::Sender<u64>,
    poll_interval: Duration,
}

impl SqliteDraftStateRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    /// Set how often observers poll for writes made outside this handle.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let (changes, _) = watch::channel(0);
        let repo = Self {
            pool,
            changes,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS draft_states (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                draft_id TEXT NOT NULL,
                api_message_id TEXT,
                state TEXT NOT NULL DEFAULT 'local',
                action TEXT NOT NULL DEFAULT 'compose',
                action_parent_id TEXT,
                sending_error TEXT,
                sending_status_confirmed INTEGER NOT NULL DEFAULT 0,
                UNIQUE(user_id, draft_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Wake every observer.
    fn notify(&self) {
        self.changes
            .send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Fetch every draft state of a user, in insertion order.
    async fn fetch_all(pool: &SqlitePool, user_id: &UserId) -> Result<Vec<DraftState>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, draft_id, api_message_id, state, action, action_parent_id,
                   sending_error, sending_status_confirmed
            FROM draft_states
            WHERE user_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(pool)
        .await?;

        rows.iter().map(row_to_state).collect()
    }

    fn not_found(user_id: &UserId, draft_id: &DraftId) -> Error {
        Error::DraftNotFound {
            user_id: user_id.clone(),
            draft_id: draft_id.clone(),
        }
    }
}

impl DraftStateRepository for SqliteDraftStateRepository {
    fn observe_all(&self, user_id: &UserId) -> BoxStream<'static, Result<Vec<DraftState>>> {
        debug!("Observing stored draft states of user {user_id}");
        let pool = self.pool.clone();
        let user_id = user_id.clone();
        let poll_interval = self.poll_interval;

        let writes = WatchStream::new(self.changes.subscribe()).map(|_| Trigger::Write);
        // Timer is created on first poll, inside the consumer's runtime
        let polls = stream::unfold((), move |()| async move {
            tokio::time::sleep(poll_interval).await;
            Some((Trigger::Poll, ()))
        });

        stream::select(writes, polls)
            .then(move |trigger| {
                let pool = pool.clone();
                let user_id = user_id.clone();
                async move { (trigger, Self::fetch_all(&pool, &user_id).await) }
            })
            .scan(None::<Vec<DraftState>>, |last, (trigger, snapshot)| {
                let passed = match snapshot {
                    Ok(states) if trigger == Trigger::Poll && last.as_ref() == Some(&states) => {
                        None
                    }
                    Ok(states) => {
                        *last = Some(states.clone());
                        Some(Ok(states))
                    }
                    Err(e) => Some(Err(e)),
                };
                future::ready(Some(passed))
            })
            .filter_map(future::ready)
            .boxed()
    }

    async fn upsert(&self, state: DraftState) -> Result<()> {
        let sending_error = state
            .sending_error
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO draft_states
                (user_id, draft_id, api_message_id, state, action, action_parent_id,
                 sending_error, sending_status_confirmed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, draft_id) DO UPDATE SET
                api_message_id = excluded.api_message_id,
                state = excluded.state,
                action = excluded.action,
                action_parent_id = excluded.action_parent_id,
                sending_error = excluded.sending_error,
                sending_status_confirmed = excluded.sending_status_confirmed
            ",
        )
        .bind(state.user_id.as_str())
        .bind(state.draft_id.as_str())
        .bind(state.api_message_id.as_deref())
        .bind(state.state.as_str())
        .bind(state.action.kind())
        .bind(state.action.parent().map(DraftId::as_str))
        .bind(sending_error)
        .bind(state.sending_status_confirmed)
        .execute(&self.pool)
        .await?;

        debug!(
            "Stored draft {} of user {} as {}",
            state.draft_id,
            state.user_id,
            state.state.as_str()
        );
        self.notify();
        Ok(())
    }

    async fn update_sync_state(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        state: DraftSyncState,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE draft_states SET
                state = ?1,
                sending_error = CASE WHEN ?1 = 'error_sending' THEN sending_error ELSE NULL END,
                sending_status_confirmed =
                    CASE WHEN ?1 = 'sending' THEN 0 ELSE sending_status_confirmed END
            WHERE user_id = ?2 AND draft_id = ?3
            ",
        )
        .bind(state.as_str())
        .bind(user_id.as_str())
        .bind(draft_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(user_id, draft_id));
        }

        debug!("Draft {draft_id} of user {user_id} is now {}", state.as_str());
        self.notify();
        Ok(())
    }

    async fn update_sending_error(
        &self,
        user_id: &UserId,
        draft_id: &DraftId,
        error: SendingError,
    ) -> Result<()> {
        let json = serde_json::to_string(&error)?;

        let result = sqlx::query(
            r"
            UPDATE draft_states SET state = ?, sending_error = ?
            WHERE user_id = ? AND draft_id = ?
            ",
        )
        .bind(DraftSyncState::ErrorSending.as_str())
        .bind(json)
        .bind(user_id.as_str())
        .bind(draft_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(user_id, draft_id));
        }

        debug!("Draft {draft_id} of user {user_id} failed to send: {error:?}");
        self.notify();
        Ok(())
    }

    async fn confirm_sending_status(&self, user_id: &UserId, draft_ids: &[DraftId]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut confirmed = 0;

        for draft_id in draft_ids {
            let result = sqlx::query(
                r"
                UPDATE draft_states SET sending_status_confirmed = 1
                WHERE user_id = ? AND draft_id = ?
                  AND state IN ('sent', 'error_sending')
                  AND sending_status_confirmed = 0
                ",
            )
            .bind(user_id.as_str())
            .bind(draft_id.as_str())
            .execute(&mut *tx)
            .await?;
            confirmed += result.rows_affected();
        }

        tx.commit().await?;

        if confirmed > 0 {
            debug!("Confirmed sending status of {confirmed} draft(s) for user {user_id}");
            self.notify();
        }
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, draft_id: &DraftId) -> Result<()> {
        let result = sqlx::query(
            r"
            DELETE FROM draft_states
            WHERE user_id = ? AND draft_id = ?
            ",
        )
        .bind(user_id.as_str())
        .bind(draft_id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.notify();
        }
        Ok(())
    }
}

/// Convert a database row to a `DraftState`.
fn row_to_state(row: &SqliteRow) -> Result<DraftState> {
    let state: String = row.get("state");
    let state = DraftSyncState::parse(&state)
        .ok_or_else(|| Error::Decode(format!("unknown draft sync state '{state}'")))?;

    let kind: String = row.get("action");
    let parent: Option<String> = row.get("action_parent_id");
    let action = DraftAction::from_parts(&kind, parent.map(DraftId))
        .ok_or_else(|| Error::Decode(format!("invalid draft action '{kind}'")))?;

    let sending_error = row
        .get::<Option<String>, _>("sending_error")
        .map(|json| serde_json::from_str(&json))
        .transpose()?;

    Ok(DraftState {
        user_id: UserId(row.get("user_id")),
        draft_id: DraftId(row.get("draft_id")),
        api_message_id: row.get("api_message_id"),
        state,
        action,
        sending_error,
        sending_status_confirmed: row.get("sending_status_confirmed"),
    })
}
