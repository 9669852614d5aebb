//! User feedback for sending outcomes.

use notify_rust::Notification;
use outbox_core::MessageSendingStatus;
use tracing::{info, warn};

/// Reports sending outcomes through the log and, optionally, the desktop.
#[derive(Debug, Clone, Copy)]
pub struct Feedback {
    desktop_notifications: bool,
}

impl Feedback {
    /// Creates the reporter.
    pub const fn new(desktop_notifications: bool) -> Self {
        Self {
            desktop_notifications,
        }
    }

    /// Report `status`. Returns false when there was nothing to report.
    pub fn report(self, status: &MessageSendingStatus) -> bool {
        let Some(summary) = status.summary() else {
            return false;
        };

        match status {
            MessageSendingStatus::SendMessageError(_) => warn!("{summary}"),
            _ => info!("{summary}"),
        }

        if self.desktop_notifications {
            // D-Bus round trip, keep it off the runtime threads
            tokio::task::spawn_blocking(move || {
                if let Err(e) = Notification::new()
                    .summary("Outbox")
                    .body(&summary)
                    .show()
                {
                    warn!("Failed to show desktop notification: {e}");
                }
            });
        }

        true
    }
}
