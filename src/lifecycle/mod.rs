//! Wiring and process-level concerns: configuration, logging and the
//! [`OrderDesk`] orchestrator that owns the running controller.

pub mod order_desk;
pub mod settings;
pub mod tracing;

pub use order_desk::OrderDesk;
pub use settings::{ConfigError, Settings, DEFAULT_CONFIG_FILE};
pub use self::tracing::setup_tracing;
