use crate::config::ConfigurationRoot;
use crate::container::ServiceCollection;
use crate::errors::CoreError;
use crate::providers::ProviderSettings;

/// Root namespace of every provider configuration section
pub const CONFIG_NAMESPACE: &str = "Cirreum";

/// Provider error type
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing configuration for '{registrar}': section '{path}' does not exist")]
    ConfigurationMissing { registrar: String, path: String },

    #[error(
        "Invalid configuration for '{registrar}' - section '{path}' exists but cannot be bound to settings ({reason}). Found keys: {}",
        .found.join(", ")
    )]
    ConfigurationInvalid {
        registrar: String,
        path: String,
        reason: String,
        found: Vec<String>,
    },

    #[error("Registration failed for '{registrar}': {source}")]
    RegistrationFailed {
        registrar: String,
        source: CoreError,
    },
}

impl ProviderError {
    /// Name of the registrar that produced this error
    pub fn registrar(&self) -> &str {
        match self {
            ProviderError::ConfigurationMissing { registrar, .. }
            | ProviderError::ConfigurationInvalid { registrar, .. }
            | ProviderError::RegistrationFailed { registrar, .. } => registrar,
        }
    }

    /// Check if the error reports an absent required section
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, ProviderError::ConfigurationMissing { .. })
    }

    /// Check if the error reports a section that could not be bound
    pub fn is_configuration_invalid(&self) -> bool {
        matches!(self, ProviderError::ConfigurationInvalid { .. })
    }
}

/// Category of an external provider integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Authorization,
    Caching,
    Communications,
    Messaging,
    Persistence,
    Secrets,
    Storage,
    /// Any other category, displayed verbatim
    Custom(&'static str),
}

impl ProviderKind {
    /// Get the kind name as used in configuration paths
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Authorization => "Authorization",
            ProviderKind::Caching => "Caching",
            ProviderKind::Communications => "Communications",
            ProviderKind::Messaging => "Messaging",
            ProviderKind::Persistence => "Persistence",
            ProviderKind::Secrets => "Secrets",
            ProviderKind::Storage => "Storage",
            ProviderKind::Custom(name) => *name,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration path read by a provider:
/// `Cirreum:<provider-kind>:Providers:<provider-name>`
pub fn provider_config_path(kind: ProviderKind, name: &str) -> String {
    format!("{}:{}:Providers:{}", CONFIG_NAMESPACE, kind, name)
}

/// Registers the services of one external provider integration.
///
/// Implementations are stateless descriptors; a fresh value is created
/// through [`Default`] every time the registration gate runs.
pub trait ServiceProviderRegistrar: Default + Send + Sync + 'static {
    /// Shape the provider section is bound into
    type Settings: ProviderSettings;

    /// Provider category, the second segment of the configuration path
    fn provider_kind(&self) -> ProviderKind;

    /// Provider name, the last segment of the configuration path
    fn provider_name(&self) -> &str;

    /// Register services for every configured instance
    fn register(
        &self,
        settings: &Self::Settings,
        services: &mut ServiceCollection,
        configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError>;

    /// Configuration path this registrar reads
    fn config_path(&self) -> String {
        provider_config_path(self.provider_kind(), self.provider_name())
    }
}

/// Type name without its module path or generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
