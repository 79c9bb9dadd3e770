//! # Correction Coordinator
//!
//! Orchestrates the two human write paths:
//!
//! - **corrections**: parse the text, submit the new item list, then ask the sync
//!   controller for a soft refresh so the server's interpretation comes back.
//! - **status changes**: compare against the snapshot, write only real changes, then
//!   hand the server's order to the controller and resync.
//!
//! The coordinator never edits the snapshot itself. Everything it learns from the
//! server goes through the [`SyncClient`].

use crate::clients::OrderSink;
use crate::correction::{parse, CorrectionError};
use crate::model::{transition, Correction, Order, OrderId, OrderStatus, Transition};
use crate::sync::{RefreshMode, SyncClient};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What a status request turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusChange {
    /// The order already had that status. Nothing was sent.
    Unchanged,
    /// The server accepted the change and returned this order.
    Applied(Order),
}

#[derive(Clone)]
pub struct CorrectionCoordinator {
    sink: Arc<dyn OrderSink>,
    sync: SyncClient,
}

impl CorrectionCoordinator {
    pub fn new(sink: Arc<dyn OrderSink>, sync: SyncClient) -> Self {
        Self { sink, sync }
    }

    /// Submits `raw_text` as the new item list of `order_id`.
    ///
    /// Fails with [`CorrectionError::ParseEmpty`] before any network call when the
    /// text has no items. Returns the order as the server stored it.
    #[instrument(skip(self, order_id, raw_text), fields(order_id = %order_id))]
    pub async fn submit(
        &self,
        order_id: &OrderId,
        raw_text: &str,
        reason: Option<&str>,
    ) -> Result<Order, CorrectionError> {
        let items = parse(raw_text);
        if items.is_empty() {
            return Err(CorrectionError::ParseEmpty);
        }
        let correction = Correction::new(order_id.clone(), items, reason);
        debug!(?correction, "submit called");

        let order = self.sink.apply_correction(&correction).await?;
        info!(items = order.items.len(), reason = %correction.reason, "Correction applied");

        self.resync().await;
        Ok(order)
    }

    /// Moves `order_id` to `target`.
    ///
    /// The current status is read from the controller's snapshot. Setting the same
    /// status is answered locally with [`StatusChange::Unchanged`].
    #[instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn set_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<StatusChange, CorrectionError> {
        let current = self
            .sync
            .current()
            .snapshot
            .get(order_id)
            .map(|order| order.status)
            .ok_or_else(|| CorrectionError::UnknownOrder(order_id.clone()))?;

        let target = match transition(current, target)? {
            Transition::Unchanged => {
                debug!(status = %current, "Status unchanged, nothing to send");
                return Ok(StatusChange::Unchanged);
            }
            Transition::Apply(target) => target,
        };

        let order = self.sink.set_status(order_id, target).await?;
        info!(from = %current, to = %order.status, "Status updated");

        if let Err(e) = self.sync.apply_server_order(order.clone()).await {
            warn!(error = %e, "Could not write status back to snapshot");
        }
        self.resync().await;
        Ok(StatusChange::Applied(order))
    }

    /// The write is already committed, so a missing controller is only logged.
    async fn resync(&self) {
        if let Err(e) = self.sync.request_refresh(RefreshMode::Soft).await {
            warn!(error = %e, "Resync request failed");
        }
    }
}
