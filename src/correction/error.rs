//! Error types for the correction coordinator.

use crate::clients::TransportError;
use crate::model::{OrderId, StatusError};
use crate::sync::SyncError;
use thiserror::Error;

/// Errors that can occur while submitting a correction or a status change.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrectionError {
    /// The correction text produced no items. Nothing was sent.
    #[error("Correction text contains no items")]
    ParseEmpty,

    /// The order is not in the current snapshot, so its status cannot be compared.
    #[error("Order not in current view: {0}")]
    UnknownOrder(OrderId),

    /// The requested status cannot be set from the client.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The order service rejected or failed the write.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The sync controller could not be reached.
    #[error(transparent)]
    Sync(#[from] SyncError),
}
