//! Draft state models.

use serde::{Deserialize, Serialize};

/// Identifier of the user owning a set of drafts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local identifier of a draft message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

impl DraftId {
    /// Create a new draft ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle stage of a draft's outbound synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DraftSyncState {
    /// Only stored locally, not yet uploaded.
    #[default]
    Local,
    /// Uploaded and in sync with the server.
    Synchronized,
    /// The last upload failed.
    ErrorSyncing,
    /// A send request is in flight.
    Sending,
    /// The server accepted the message.
    Sent,
    /// Sending failed.
    ErrorSending,
    /// Attachments could not be uploaded before sending.
    ErrorUploadAttachments,
}

impl DraftSyncState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Local,
        Self::Synchronized,
        Self::ErrorSyncing,
        Self::Sending,
        Self::Sent,
        Self::ErrorSending,
        Self::ErrorUploadAttachments,
    ];

    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Synchronized => "synchronized",
            Self::ErrorSyncing => "error_syncing",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::ErrorSending => "error_sending",
            Self::ErrorUploadAttachments => "error_upload_attachments",
        }
    }

    /// Returns true for the terminal outcomes of a send attempt.
    #[must_use]
    pub const fn is_sending_outcome(&self) -> bool {
        matches!(self, Self::Sent | Self::ErrorSending)
    }
}

/// How a draft came into existence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DraftAction {
    /// A brand new message.
    #[default]
    Compose,
    /// Reply to the sender of the parent message.
    Reply(DraftId),
    /// Reply to every recipient of the parent message.
    ReplyAll(DraftId),
    /// Forward of the parent message.
    Forward(DraftId),
}

impl DraftAction {
    /// Database string representation of the action kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::Reply(_) => "reply",
            Self::ReplyAll(_) => "reply_all",
            Self::Forward(_) => "forward",
        }
    }

    /// The message this draft answers or forwards, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&DraftId> {
        match self {
            Self::Compose => None,
            Self::Reply(parent) | Self::ReplyAll(parent) | Self::Forward(parent) => Some(parent),
        }
    }

    /// Rebuild an action from its stored kind and parent.
    ///
    /// Returns `None` for unknown kinds and for reply/forward kinds without a parent.
    #[must_use]
    pub fn from_parts(kind: &str, parent: Option<DraftId>) -> Option<Self> {
        match (kind, parent) {
            ("compose", _) => Some(Self::Compose),
            ("reply", Some(parent)) => Some(Self::Reply(parent)),
            ("reply_all", Some(parent)) => Some(Self::ReplyAll(parent)),
            ("forward", Some(parent)) => Some(Self::Forward(parent)),
            _ => None,
        }
    }
}

/// Why the server refused to send a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SendingError {
    /// The message had already been sent.
    MessageAlreadySent,
    /// Sending to this external address is disabled for the account.
    ExternalAddressSendDisabled(String),
    /// Any other failure, with the server's message.
    Other(String),
}

impl SendingError {
    /// Human-readable description of the failure.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MessageAlreadySent => "This message has already been sent".to_string(),
            Self::ExternalAddressSendDisabled(address) => {
                format!("Sending to {address} is disabled for this account")
            }
            Self::Other(message) if message.is_empty() => "Unknown error".to_string(),
            Self::Other(message) => message.clone(),
        }
    }
}

/// Synchronization state of one draft.
///
/// Owned by the draft state store. Observers only ever see snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    /// Owner of the draft.
    pub user_id: UserId,
    /// Local draft identifier.
    pub draft_id: DraftId,
    /// Server-side message identifier, once the draft has been uploaded.
    pub api_message_id: Option<String>,
    /// Current sync state.
    pub state: DraftSyncState,
    /// How the draft was created.
    pub action: DraftAction,
    /// Failure recorded by the last send attempt.
    pub sending_error: Option<SendingError>,
    /// Whether the sending outcome has been shown to the user.
    pub sending_status_confirmed: bool,
}

impl DraftState {
    /// Creates a freshly tracked, local-only draft state.
    #[must_use]
    pub const fn new(user_id: UserId, draft_id: DraftId, action: DraftAction) -> Self {
        Self {
            user_id,
            draft_id,
            api_message_id: None,
            state: DraftSyncState::Local,
            action,
            sending_error: None,
            sending_status_confirmed: false,
        }
    }

    /// Returns a copy in the given state.
    #[must_use]
    pub fn with_state(mut self, state: DraftSyncState) -> Self {
        self.state = state;
        self
    }

    /// Returns true if this is the key `(user_id, draft_id)`.
    #[must_use]
    pub fn is(&self, user_id: &UserId, draft_id: &DraftId) -> bool {
        &self.user_id == user_id && &self.draft_id == draft_id
    }

    /// Moves to `state`, keeping the error and confirmation fields consistent.
    pub(crate) fn transition(&mut self, state: DraftSyncState) {
        if state != DraftSyncState::ErrorSending {
            self.sending_error = None;
        }
        if state == DraftSyncState::Sending {
            self.sending_status_confirmed = false;
        }
        self.state = state;
    }
}
