//! Collaborators that talk to the order backend.
//!
//! The engine only sees the [`OrderSource`], [`OrderSink`] and [`OrgInfo`] traits.
//! [`HttpOrderService`] implements all three over HTTP+JSON; [`mock::MockOrderService`]
//! implements them in memory for tests.

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;

pub use error::*;
pub use http::*;
pub use traits::*;
