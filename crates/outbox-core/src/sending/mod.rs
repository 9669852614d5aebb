//! Sending-state observation.
//!
//! Turns the draft state store's snapshots into the sending outcomes a user
//! should hear about, and lets the consumer confirm them once shown.

mod observer;
mod status;

pub use observer::ObserveSendingDraftStates;
pub use status::{
    ConfirmSendingStatus, MessageSendingStatus, ObserveSendingStatus, SendingStatusUpdate,
};
