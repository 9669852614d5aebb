//! `Outbox` - headless watcher for outgoing email drafts
//!
//! Follows the draft state store of one user and reports every draft that
//! finishes sending, or fails to, exactly once.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod feedback;
mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use outbox_core::{
    ConfirmSendingStatus, DraftStateRepository, ObserveSendingStatus, SqliteDraftStateRepository,
    UserId,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedback::Feedback;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outbox=info,outbox_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Outbox");

    let settings = settings::load().await?;
    let user_id = settings.user_id.clone().map(UserId).with_context(|| {
        format!(
            "no user_id configured in {}",
            settings::path().display()
        )
    })?;

    let database_path = settings.database_path();
    if let Some(parent) = database_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let repository = SqliteDraftStateRepository::new(&database_path)
        .await
        .with_context(|| format!("opening {}", database_path.display()))?
        .with_poll_interval(settings.poll_interval());

    watch(
        Arc::new(repository),
        &user_id,
        Feedback::new(settings.desktop_notifications),
    )
    .await
}

/// Report sending outcomes until Ctrl-C or the end of the stream.
///
/// Every reported outcome is confirmed so it is not reported again.
async fn watch<R: DraftStateRepository>(
    repository: Arc<R>,
    user_id: &UserId,
    feedback: Feedback,
) -> Result<()> {
    let observe = ObserveSendingStatus::new(Arc::clone(&repository));
    let confirm = ConfirmSendingStatus::new(repository);
    let mut updates = observe.observe(user_id);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Watching outgoing drafts of user {user_id}");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
            update = updates.next() => match update {
                Some(Ok(update)) => {
                    if feedback.report(&update.status) {
                        confirm.confirm(user_id, &update.draft_ids).await?;
                    }
                }
                Some(Err(e)) => {
                    warn!("Draft state stream failed: {e}");
                    return Err(e.into());
                }
                None => {
                    info!("Draft state stream ended");
                    return Ok(());
                }
            }
        }
    }
}
