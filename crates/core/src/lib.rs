//! Bootstrap runtime for registering external service providers.
//!
//! A [`ServiceProviderRegistrar`] names a provider section under
//! `Cirreum:<kind>:Providers:<name>`. [`HostApplicationBuilder`] binds that
//! section to the registrar's settings and lets it add services to the
//! [`ServiceCollection`], once per registrar type.

pub mod config;
pub mod container;
pub mod errors;
pub mod hosting;
pub mod logging;
pub mod providers;

// Re-export key types for convenience
pub use config::{ConfigError, ConfigSource, ConfigurationBuilder, ConfigurationRoot, ConfigurationSection};
pub use container::{ServiceCollection, ServiceScope};
pub use errors::CoreError;
pub use hosting::{HostApplication, HostApplicationBuilder, RegistrationMarkers, RegistrationOutcome};
pub use logging::{DeferredLogger, LoggingConfig};
pub use providers::{
    provider_config_path, ProviderError, ProviderKind, ProviderSettings, ServiceProviderHealthCheckOptions,
    ServiceProviderInstanceSettings, ServiceProviderRegistrar, ServiceProviderSettings, CONFIG_NAMESPACE,
};
