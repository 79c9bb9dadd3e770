//! # Logging
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG` (default `info`).
//!
//! ## What Gets Logged
//!
//! - **Controller lifecycle**: start, filter changes, dispose, stop
//! - **Snapshots**: every replacement with its version and size
//! - **Writes**: corrections and status changes with the order id
//! - **Failures**: refresh and transport errors at `warn`
//! - **Discarded results**: stale fetches at `debug`
//!
//! ```bash
//! RUST_LOG=debug order-desk watch
//! RUST_LOG=order_desk::sync=debug order-desk list
//! ```
//!
//! A soft poll at `RUST_LOG=info` looks like:
//!
//! ```text
//! INFO Snapshot replaced org=org_1 version=4 size=17 mode=Soft
//! ```
//!
//! With `debug`, the poll tick and fetch that produced it appear first:
//!
//! ```text
//! DEBUG Poll tick org=org_1 ticks=3
//! DEBUG Fetching orders org=org_1 filter=all mode=Soft epoch=0
//! INFO Snapshot replaced org=org_1 version=4 size=17 mode=Soft
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
