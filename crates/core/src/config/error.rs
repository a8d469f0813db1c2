use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    MissingFile { path: String },

    #[error("Configuration section '{path}' does not exist")]
    SectionNotFound { path: String },

    #[error("Configuration section '{path}' cannot be bound: {message}")]
    Binding { path: String, message: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

impl ConfigError {
    /// Create a missing file error
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    /// Create a section not found error
    pub fn section_not_found(path: impl Into<String>) -> Self {
        Self::SectionNotFound { path: path.into() }
    }

    /// Create a binding error
    pub fn binding(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Binding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error reports a section that could not be bound
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding { .. })
    }
}
