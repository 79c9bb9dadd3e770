//! Periodic soft refresh.

use crate::sync::SyncRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// A running poll timer. Dropping the handle aborts the timer task.
///
/// The task holds only a weak sender, so it never keeps a controller alive on its own,
/// and it stops by itself once the controller's mailbox is gone.
#[derive(Debug)]
pub struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Sends [`SyncRequest::Tick`] every `every`, starting one period from now.
    pub fn spawn(every: Duration, mailbox: mpsc::WeakSender<SyncRequest>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(sender) = mailbox.upgrade() else {
                    break;
                };
                if sender.send(SyncRequest::Tick).await.is_err() {
                    break;
                }
            }
            debug!("Poll task finished");
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
