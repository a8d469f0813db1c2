use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings bound from a provider configuration section
pub trait ProviderSettings: DeserializeOwned + Send + Sync + 'static {
    /// Number of configured provider instances
    fn instance_count(&self) -> usize;
}

/// Provider settings holding named instances:
///
/// ```yaml
/// Cirreum:
///   Persistence:
///     Providers:
///       SqlServer:
///         Instances:
///           Default:
///             ConnectionString: Server=.;Database=app
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceProviderSettings<I> {
    #[serde(default = "BTreeMap::new")]
    pub instances: BTreeMap<String, I>,
}

impl<I> ServiceProviderSettings<I> {
    /// Look up an instance by name
    pub fn instance(&self, name: &str) -> Option<&I> {
        self.instances.get(name)
    }

    /// Instance names, in key order
    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }
}

impl<I> Default for ServiceProviderSettings<I> {
    fn default() -> Self {
        Self {
            instances: BTreeMap::new(),
        }
    }
}

impl<I> ProviderSettings for ServiceProviderSettings<I>
where
    I: DeserializeOwned + Send + Sync + 'static,
{
    fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Settings of one provider instance.
///
/// Registrars that need more per-instance keys define their own instance
/// type and use it with [`ServiceProviderSettings`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceProviderInstanceSettings<H = ServiceProviderHealthCheckOptions> {
    #[serde(default)]
    pub connection_string: Option<String>,

    #[serde(default = "default_health_checks")]
    pub health_checks: bool,

    #[serde(default)]
    pub health_options: Option<H>,
}

fn default_health_checks() -> bool {
    true
}

impl<H> ServiceProviderInstanceSettings<H> {
    /// Health options, when health checks are enabled for this instance
    pub fn enabled_health_options(&self) -> Option<&H> {
        if self.health_checks {
            self.health_options.as_ref()
        } else {
            None
        }
    }
}

/// Status reported when a provider health check fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum HealthStatus {
    Degraded,
    #[default]
    Unhealthy,
}

/// Default health check options for provider instances.
///
/// What the values mean is up to the health check the registrar adds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceProviderHealthCheckOptions {
    pub timeout_seconds: Option<u64>,
    pub cached_result_seconds: Option<u64>,
    pub failure_status: HealthStatus,
    pub tags: Vec<String>,
}

impl Default for ServiceProviderHealthCheckOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            cached_result_seconds: Some(60),
            failure_status: HealthStatus::Unhealthy,
            tags: Vec::new(),
        }
    }
}

impl ServiceProviderHealthCheckOptions {
    /// Check timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// How long a result is reused before the check runs again
    pub fn cached_result_timeout(&self) -> Option<Duration> {
        self.cached_result_seconds.map(Duration::from_secs)
    }
}
