//! # Mock Sync Controller
//!
//! Lets code that talks to a [`SyncClient`] be tested without a running actor.
//!
//! [`create_mock_sync_client`] returns the client, the receiving end of its mailbox
//! and the sender of its state channel. The test seeds whatever state it needs,
//! drives the code under test, then pulls requests off the mailbox and asserts on them:
//!
//! ```ignore
//! let (client, mut mailbox, state) = create_mock_sync_client(8);
//! state.send_replace(Arc::new(state_with(vec![order])));
//!
//! coordinator.submit(&id, "3 kg flour", None).await?;
//!
//! let (mode, _) = expect_refresh(&mut mailbox).await.expect("refresh requested");
//! assert_eq!(mode, RefreshMode::Soft);
//! ```

use crate::model::{Order, StatusFilter};
use crate::sync::{
    RefreshMode, RefreshOutcome, Response, Snapshot, SyncClient, SyncRequest, SyncState,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Creates a client whose requests land in the returned receiver.
pub fn create_mock_sync_client(
    buffer_size: usize,
) -> (
    SyncClient,
    mpsc::Receiver<SyncRequest>,
    watch::Sender<Arc<SyncState>>,
) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (state_tx, state_rx) = watch::channel(Arc::new(SyncState::default()));
    (SyncClient::new(sender, state_rx), receiver, state_tx)
}

/// A settled state holding `orders` under the `All` filter.
pub fn state_with(orders: Vec<Order>) -> SyncState {
    SyncState {
        snapshot: Snapshot::new(orders, 1, None),
        filter: StatusFilter::All,
        ..SyncState::default()
    }
}

/// Helper to verify that the next message is a Refresh request.
pub async fn expect_refresh(
    receiver: &mut mpsc::Receiver<SyncRequest>,
) -> Option<(RefreshMode, Option<Response<RefreshOutcome>>)> {
    match receiver.recv().await {
        Some(SyncRequest::Refresh { mode, respond_to }) => Some((mode, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an ApplyServerOrder request.
pub async fn expect_apply_server_order(
    receiver: &mut mpsc::Receiver<SyncRequest>,
) -> Option<Order> {
    match receiver.recv().await {
        Some(SyncRequest::ApplyServerOrder { order }) => Some(order),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncError;

    #[tokio::test]
    async fn test_mock_sync_client() {
        let (client, mut mailbox, _state) = create_mock_sync_client(4);

        let refresh = tokio::spawn(async move { client.refresh(RefreshMode::Hard).await });

        let (mode, responder) = expect_refresh(&mut mailbox).await.expect("Expected Refresh request");
        assert_eq!(mode, RefreshMode::Hard);
        responder
            .expect("refresh waits for an answer")
            .send(Ok(RefreshOutcome::Applied { version: 3 }))
            .unwrap();

        let outcome = refresh.await.unwrap();
        assert_eq!(outcome, Ok(RefreshOutcome::Applied { version: 3 }));
    }

    #[tokio::test]
    async fn closed_mailbox_reports_controller_closed() {
        let (client, mailbox, _state) = create_mock_sync_client(4);
        drop(mailbox);
        assert_eq!(
            client.request_refresh(RefreshMode::Soft).await,
            Err(SyncError::ControllerClosed)
        );
    }
}
