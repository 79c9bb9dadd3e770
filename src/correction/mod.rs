//! Human corrections: the line-item parser and the coordinator that submits
//! corrections and status changes, then asks the sync controller to catch up.

pub mod coordinator;
pub mod error;
pub mod parser;

pub use coordinator::{CorrectionCoordinator, StatusChange};
pub use error::CorrectionError;
pub use parser::parse;
