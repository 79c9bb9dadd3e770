//! # Order Synchronization
//!
//! Keeps one organization's order list fresh. The controller is an actor: a single
//! task ([`SyncActor`]) owns the [`Snapshot`] and processes [`SyncRequest`] messages
//! one at a time, so it is the only writer. Everyone else holds a cheap
//! [`SyncClient`] and reads published [`SyncState`] values.
//!
//! ## Guarantees
//!
//! - At most one `OrderSource::list` call is in flight. Requests that arrive while
//!   one is running are folded into a single follow-up refresh.
//! - Every refresh result replaces the whole order mapping; readers never see a
//!   half-applied snapshot.
//! - Results that belong to an older filter, or that land after [`SyncClient::dispose`],
//!   are dropped.
//! - Polling is a [`PollTask`] that is aborted on drop. Changing the filter replaces
//!   it, so only one timer is ever alive.

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod poller;
pub mod snapshot;

pub use actor::SyncActor;
pub use client::SyncClient;
pub use error::SyncError;
pub use message::{Response, SyncRequest};
pub use poller::PollTask;
pub use snapshot::{RefreshMode, RefreshOutcome, Snapshot, SyncState};
