//! Application bootstrap and the provider registration gate.

pub mod builder;
pub mod markers;
pub mod registration;

pub use builder::{HostApplication, HostApplicationBuilder};
pub use markers::RegistrationMarkers;
pub use registration::RegistrationOutcome;
