//! # Sync Client
//!
//! Cheap, cloneable handle to a running [`SyncActor`](super::SyncActor). Requests go
//! over the controller's mailbox; state is read from a watch channel that always holds
//! the latest published [`SyncState`].

use crate::model::{Order, StatusFilter};
use crate::sync::{RefreshMode, RefreshOutcome, SyncError, SyncRequest, SyncState};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct SyncClient {
    sender: mpsc::Sender<SyncRequest>,
    state: watch::Receiver<Arc<SyncState>>,
}

impl SyncClient {
    pub fn new(sender: mpsc::Sender<SyncRequest>, state: watch::Receiver<Arc<SyncState>>) -> Self {
        Self { sender, state }
    }

    /// Refreshes and waits until the resulting snapshot is published.
    ///
    /// If a fetch is already running, this joins the single follow-up refresh queued
    /// behind it instead of starting another one.
    #[instrument(skip(self))]
    pub async fn refresh(&self, mode: RefreshMode) -> Result<RefreshOutcome, SyncError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(SyncRequest::Refresh {
            mode,
            respond_to: Some(respond_to),
        })
        .await?;
        response.await.map_err(|_| SyncError::ControllerDropped)?
    }

    /// Asks for a refresh without waiting for it.
    #[instrument(skip(self))]
    pub async fn request_refresh(&self, mode: RefreshMode) -> Result<(), SyncError> {
        debug!("Sending request");
        self.send(SyncRequest::Refresh {
            mode,
            respond_to: None,
        })
        .await
    }

    /// Switches the status filter and waits for the hard refresh it triggers.
    #[instrument(skip(self))]
    pub async fn set_filter(&self, filter: StatusFilter) -> Result<RefreshOutcome, SyncError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(SyncRequest::SetFilter { filter, respond_to }).await?;
        response.await.map_err(|_| SyncError::ControllerDropped)?
    }

    /// Hands an order returned by the backend to the controller for its snapshot entry.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn apply_server_order(&self, order: Order) -> Result<(), SyncError> {
        debug!("Sending request");
        self.send(SyncRequest::ApplyServerOrder { order }).await
    }

    /// Stops the controller. Results still in flight are dropped when they arrive.
    #[instrument(skip(self))]
    pub async fn dispose(&self) -> Result<(), SyncError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(SyncRequest::Dispose { respond_to }).await?;
        response.await.map_err(|_| SyncError::ControllerDropped)?
    }

    /// Latest published state.
    pub fn current(&self) -> Arc<SyncState> {
        self.state.borrow().clone()
    }

    /// A receiver that wakes on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SyncState>> {
        self.state.clone()
    }

    async fn send(&self, request: SyncRequest) -> Result<(), SyncError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| SyncError::ControllerClosed)
    }
}
