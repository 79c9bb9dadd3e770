//! Messages understood by the [`SyncActor`](super::SyncActor).

use crate::clients::TransportError;
use crate::model::{Order, StatusFilter};
use crate::sync::{RefreshMode, RefreshOutcome, SyncError};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the controller.
pub type Response<T> = oneshot::Sender<Result<T, SyncError>>;

#[derive(Debug)]
pub enum SyncRequest {
    /// Fetch the order list. Without a responder the request is fire-and-forget.
    Refresh {
        mode: RefreshMode,
        respond_to: Option<Response<RefreshOutcome>>,
    },
    /// Poll timer fired.
    Tick,
    /// Switch the status filter: invalidate, restart polling, hard refresh.
    SetFilter {
        filter: StatusFilter,
        respond_to: Response<RefreshOutcome>,
    },
    /// Write one order returned by the backend into its snapshot entry.
    ApplyServerOrder { order: Order },
    /// Stop polling, drop outstanding results and end the actor loop.
    Dispose { respond_to: Response<()> },
    /// Sent by the controller's own fetch task when `list` returns.
    FetchCompleted {
        epoch: u64,
        result: Result<Vec<Order>, TransportError>,
    },
}
