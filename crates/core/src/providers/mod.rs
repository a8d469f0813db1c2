//! Provider registrar contract and the settings shapes registrars bind.

pub mod provider;
pub mod settings;

pub use provider::*;
pub use settings::*;
