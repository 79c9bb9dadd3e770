//! # Sync Controller Actor
//!
//! The server half of the controller. It owns the snapshot and the receiver end of
//! the mailbox and processes messages sequentially, so the snapshot needs no lock.
//!
//! Network calls never run inside the loop. A fetch is spawned as its own task and
//! reports back with [`SyncRequest::FetchCompleted`], which keeps the mailbox
//! responsive while a slow `list` call is outstanding.
//!
//! ## Epochs
//!
//! Each fetch is tagged with the epoch current when it started. Changing the filter
//! or disposing bumps the epoch, so a completion that belongs to an older epoch is
//! recognised and dropped instead of overwriting the newer view.

use crate::clients::{OrderSource, TransportError};
use crate::model::{Order, OrgId, StatusFilter};
use crate::sync::{
    PollTask, RefreshMode, RefreshOutcome, Response, SyncClient, SyncError, SyncRequest,
    Snapshot, SyncState,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// Callers waiting for a particular fetch to land.
type Waiters = Vec<Response<RefreshOutcome>>;

struct InFlight {
    mode: RefreshMode,
    waiters: Waiters,
    task: JoinHandle<()>,
}

struct Pending {
    mode: RefreshMode,
    waiters: Waiters,
}

/// Owns one organization's snapshot and its refresh lifecycle.
pub struct SyncActor {
    org_id: OrgId,
    source: Arc<dyn OrderSource>,
    receiver: mpsc::Receiver<SyncRequest>,
    // weak so that dropping every SyncClient still closes the mailbox
    mailbox: mpsc::WeakSender<SyncRequest>,
    published: watch::Sender<Arc<SyncState>>,
    state: SyncState,
    epoch: u64,
    in_flight: Option<InFlight>,
    pending: Option<Pending>,
    poll_every: Duration,
    poller: Option<PollTask>,
}

impl SyncActor {
    /// Creates the controller and its client.
    ///
    /// The actor does nothing until [`SyncActor::run`] is spawned. `buffer_size` is
    /// the mailbox capacity; senders wait when it is full.
    pub fn new(
        org_id: OrgId,
        source: Arc<dyn OrderSource>,
        filter: StatusFilter,
        poll_every: Duration,
        buffer_size: usize,
    ) -> (Self, SyncClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let state = SyncState {
            filter,
            loading: true,
            ..SyncState::default()
        };
        let (published, observed) = watch::channel(Arc::new(state.clone()));
        let actor = Self {
            org_id,
            source,
            receiver,
            mailbox: sender.downgrade(),
            published,
            state,
            epoch: 0,
            in_flight: None,
            pending: None,
            poll_every,
            poller: None,
        };
        (actor, SyncClient::new(sender, observed))
    }

    /// Runs the controller until it is disposed or every client is dropped.
    ///
    /// Starts with a hard refresh (the initial load) and the poll timer.
    pub async fn run(mut self) {
        info!(org = %self.org_id, filter = %self.state.filter, "Sync controller started");
        self.restart_poller();
        self.start_fetch(RefreshMode::Hard, Vec::new());
        self.publish();

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SyncRequest::Refresh { mode, respond_to } => {
                    self.request_refresh(mode, respond_to.into_iter().collect());
                }
                SyncRequest::Tick => {
                    self.state.ticks += 1;
                    debug!(org = %self.org_id, ticks = self.state.ticks, "Poll tick");
                    self.request_refresh(RefreshMode::Soft, Vec::new());
                }
                SyncRequest::SetFilter { filter, respond_to } => {
                    self.change_filter(filter, respond_to);
                }
                SyncRequest::ApplyServerOrder { order } => {
                    self.apply_server_order(order);
                }
                SyncRequest::FetchCompleted { epoch, result } => {
                    self.complete_fetch(epoch, result);
                }
                SyncRequest::Dispose { respond_to } => {
                    self.dispose();
                    let _ = respond_to.send(Ok(()));
                    break;
                }
            }
            self.publish();
        }

        // every client dropped without an explicit dispose
        if self.poller.is_some() {
            self.dispose();
        }
        info!(org = %self.org_id, version = self.state.snapshot.version, "Sync controller stopped");
    }

    fn publish(&self) {
        let next = &self.state;
        self.published.send_if_modified(|current| {
            if current.as_ref() == next {
                return false;
            }
            *current = Arc::new(next.clone());
            true
        });
    }

    fn request_refresh(&mut self, mode: RefreshMode, waiters: Waiters) {
        if self.in_flight.is_none() {
            self.start_fetch(mode, waiters);
            return;
        }
        debug!(org = %self.org_id, ?mode, "Refresh in flight, coalescing");
        let pending = self.pending.get_or_insert(Pending {
            mode,
            waiters: Vec::new(),
        });
        pending.mode = pending.mode.max(mode);
        pending.waiters.extend(waiters);
        if mode == RefreshMode::Hard {
            self.state.loading = true;
        }
    }

    fn start_fetch(&mut self, mode: RefreshMode, waiters: Waiters) {
        let Some(mailbox) = self.mailbox.upgrade() else {
            // no client left to deliver the result to
            fail_all(waiters, SyncError::ControllerClosed);
            return;
        };
        match mode {
            RefreshMode::Hard => self.state.loading = true,
            RefreshMode::Soft => self.state.refreshing = true,
        }

        let epoch = self.epoch;
        let source = self.source.clone();
        let org_id = self.org_id.clone();
        let filter = self.state.filter;
        debug!(org = %org_id, %filter, ?mode, epoch, "Fetching orders");

        let task = tokio::spawn(async move {
            // every fetch reports back, even when `list` panics
            let list_org = org_id.clone();
            let listing = tokio::spawn(async move { source.list(&list_org, filter).await });
            let _abort_listing = AbortOnDrop(listing.abort_handle());
            let result = match listing.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(org = %org_id, epoch, error = %e, "Order source task failed");
                    Err(TransportError::Unavailable(format!("order source failed: {e}")))
                }
            };
            if mailbox
                .send(SyncRequest::FetchCompleted { epoch, result })
                .await
                .is_err()
            {
                debug!(org = %org_id, epoch, "Refresh result discarded, controller gone");
            }
        });
        self.in_flight = Some(InFlight {
            mode,
            waiters,
            task,
        });
    }

    fn complete_fetch(&mut self, epoch: u64, result: Result<Vec<Order>, TransportError>) {
        if epoch != self.epoch {
            debug!(org = %self.org_id, epoch, current = self.epoch, "Stale refresh result discarded");
            return;
        }
        let Some(done) = self.in_flight.take() else {
            warn!(org = %self.org_id, epoch, "Refresh result without a fetch in flight");
            return;
        };

        match result {
            Ok(orders) => {
                let version = self.state.snapshot.version + 1;
                self.state.snapshot = Snapshot::new(orders, version, Some(Utc::now()));
                self.state.last_error = None;
                info!(org = %self.org_id, version, size = self.state.snapshot.len(), mode = ?done.mode, "Snapshot replaced");
                respond_all(done.waiters, RefreshOutcome::Applied { version });
            }
            Err(e) => {
                warn!(org = %self.org_id, error = %e, mode = ?done.mode, "Refresh failed");
                self.state.last_error = Some(e.to_string());
                fail_all(done.waiters, SyncError::Transport(e));
            }
        }
        self.state.loading = false;
        self.state.refreshing = false;

        if let Some(next) = self.pending.take() {
            self.start_fetch(next.mode, next.waiters);
        }
    }

    fn change_filter(&mut self, filter: StatusFilter, respond_to: Response<RefreshOutcome>) {
        if filter == self.state.filter {
            // same filter: behave like an ordinary hard refresh request
            self.request_refresh(RefreshMode::Hard, vec![respond_to]);
            return;
        }
        info!(org = %self.org_id, from = %self.state.filter, to = %filter, "Filter changed");

        self.epoch += 1;
        if let Some(old) = self.in_flight.take() {
            old.task.abort();
            respond_all(old.waiters, RefreshOutcome::Discarded);
        }
        if let Some(old) = self.pending.take() {
            respond_all(old.waiters, RefreshOutcome::Discarded);
        }

        let version = self.state.snapshot.version + 1;
        self.state.snapshot = Snapshot::new(Vec::new(), version, None);
        self.state.filter = filter;
        self.state.refreshing = false;
        self.state.last_error = None;

        self.restart_poller();
        self.start_fetch(RefreshMode::Hard, vec![respond_to]);
    }

    fn apply_server_order(&mut self, order: Order) {
        let keep = self.state.filter.matches(order.status);
        let id = order.id.clone();
        match self.state.snapshot.with_entry(order, keep) {
            Some(next) => {
                info!(org = %self.org_id, order_id = %id, keep, version = next.version, "Order entry updated");
                self.state.snapshot = next;
            }
            None => debug!(org = %self.org_id, order_id = %id, "Order not in snapshot, ignored"),
        }
    }

    fn restart_poller(&mut self) {
        // dropping the old task aborts it before the new one exists
        self.poller = None;
        self.poller = Some(PollTask::spawn(self.poll_every, self.mailbox.clone()));
    }

    fn dispose(&mut self) {
        info!(org = %self.org_id, "Disposing sync controller");
        self.poller = None;
        self.epoch += 1;
        if let Some(old) = self.in_flight.take() {
            // the fetch keeps running; its result is dropped on arrival
            fail_all(old.waiters, SyncError::Disposed);
        }
        if let Some(old) = self.pending.take() {
            fail_all(old.waiters, SyncError::Disposed);
        }
        self.receiver.close();
    }
}

/// Aborts the inner `list` task when the fetch task itself is aborted.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn respond_all(waiters: Waiters, outcome: RefreshOutcome) {
    for waiter in waiters {
        let _ = waiter.send(Ok(outcome));
    }
}

fn fail_all(waiters: Waiters, error: SyncError) {
    for waiter in waiters {
        let _ = waiter.send(Err(error.clone()));
    }
}
