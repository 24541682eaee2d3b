//! Scheduling and broadcast engine.
//!
//! This crate drives the periodic digest: a named-job scheduler and the
//! dispatcher that runs one fetch-format-deliver tick.

pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::*;
pub use scheduler::*;
