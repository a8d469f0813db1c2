//! Hierarchical application configuration.
//!
//! Sources are layered with the `config` crate and merged into one tree.
//! Sections are addressed with `:` separated paths
//! (`Cirreum:Persistence:Providers:Sql`) and keys are matched without regard
//! to ASCII case, both when looking sections up and when binding them.

mod binder;
pub mod builder;
pub mod error;
pub mod section;
pub mod sources;

pub use builder::*;
pub use error::*;
pub use section::*;
pub use sources::*;

/// Separator between the segments of a configuration path
pub const KEY_DELIMITER: char = ':';

/// Combine two configuration paths
pub fn combine_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", parent, KEY_DELIMITER, key)
    }
}
