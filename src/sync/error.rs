//! Errors surfaced by the sync controller to its callers.

use crate::clients::TransportError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// The order backend failed; the snapshot was left untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The controller's mailbox is closed.
    #[error("sync controller closed")]
    ControllerClosed,

    /// The controller went away without answering.
    #[error("sync controller dropped response channel")]
    ControllerDropped,

    /// The controller was disposed while the request was waiting.
    #[error("sync controller disposed")]
    Disposed,

    /// The controller task ended abnormally.
    #[error("sync controller task failed: {0}")]
    TaskFailed(String),
}
