//! # Order Desk
//!
//! Client-side engine for reviewing and correcting orders that were captured from
//! free-text and voice messages.
//!
//! It keeps one organization's order list fresh, turns a human's multi-line correction
//! into structured items, and writes corrections and status changes back to the order
//! service while staying consistent with it.
//!
//! ## Architecture Notes
//!
//! ### 1. One writer per snapshot
//! The [`sync`] controller is an actor. It owns the [`Snapshot`](sync::Snapshot) and is
//! the only code that replaces it. Readers get an `Arc<SyncState>` from a watch channel,
//! so they always see a whole snapshot, never a half-applied one.
//!
//! ### 2. Submit, then resync
//! The [`correction`] coordinator never guesses what the server will store. After a
//! correction is accepted it asks the controller for a soft refresh, and the
//! server's own answer flows back through the snapshot.
//!
//! ### 3. No overlapping refresh
//! At most one `list` call is in flight per controller. Requests that arrive meanwhile
//! are folded into a single follow-up fetch. Filter changes and disposal bump an epoch
//! so late results are dropped instead of resurrecting an old view.
//!
//! ### 4. Observability
//! `tracing` with structured fields everywhere. See [`lifecycle::tracing`].
//!
//! ## Module Tour
//!
//! - [`model`]: orders, items, corrections, statuses and the status transition rule.
//! - [`correction`]: the line-item parser and the [`CorrectionCoordinator`](correction::CorrectionCoordinator).
//! - [`sync`]: the controller actor, its client handle, poller and test helpers.
//! - [`search`]: query filtering and status counts over a snapshot.
//! - [`clients`]: the backend traits, the HTTP adapter and an in-memory mock.
//! - [`lifecycle`]: settings, logging and the [`OrderDesk`](lifecycle::OrderDesk) orchestrator.
//!
//! ## Quick Start
//!
//! ```bash
//! ORDER_DESK_TOKEN=... RUST_LOG=info cargo run -- list --status pending
//! ```

pub mod clients;
pub mod correction;
pub mod lifecycle;
pub mod model;
pub mod search;
pub mod sync;
