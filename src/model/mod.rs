//! Pure data structures shared by every layer of the engine.
//!
//! Nothing in here performs I/O. Orders are owned by the backend; the client only
//! reads them, renders them and submits corrections against them.

pub mod order;
pub mod status;

pub use order::*;
pub use status::*;
