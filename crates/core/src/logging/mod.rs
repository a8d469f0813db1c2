//! Bootstrap logging.
//!
//! Registration runs before the application has installed a subscriber, so
//! bootstrap code writes to a [`DeferredLogger`] that is flushed into
//! `tracing` once logging is up.

pub mod config;
pub mod deferred;

pub use config::*;
pub use deferred::*;
