//! Example: registering service providers from layered configuration
//!
//! Builds configuration from a YAML document plus in-memory overrides,
//! then runs two registrars through the host builder. The cache provider
//! is configured and registers one client per instance; the mail provider
//! has no configuration and is skipped.

use cirreum_core::logging::init_logging;
use cirreum_core::{
    ConfigurationBuilder, ConfigurationRoot, CoreError, HostApplicationBuilder, LoggingConfig,
    ProviderKind, ServiceCollection, ServiceProviderHealthCheckOptions,
    ServiceProviderInstanceSettings, ServiceProviderRegistrar, ServiceProviderSettings,
};
use serde::Deserialize;

const APPSETTINGS: &str = r#"
Logging:
  Level: debug
  PrettyPrint: false

Cirreum:
  Caching:
    Providers:
      Redis:
        Instances:
          Default:
            ConnectionString: localhost:6379
            HealthChecks: true
            HealthOptions:
              TimeoutSeconds: 5
              Tags: [cache, ready]
          Sessions:
            ConnectionString: localhost:6380
            Database: 2
"#;

/// Redis instance settings: the common keys plus the database index
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedisInstanceSettings {
    pub connection_string: Option<String>,
    #[serde(default)]
    pub database: u64,
    #[serde(default = "enabled")]
    pub health_checks: bool,
    pub health_options: Option<ServiceProviderHealthCheckOptions>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug)]
pub struct RedisClient {
    pub instance: String,
    pub endpoint: String,
    pub database: u64,
}

#[derive(Default)]
pub struct RedisRegistrar;

impl ServiceProviderRegistrar for RedisRegistrar {
    type Settings = ServiceProviderSettings<RedisInstanceSettings>;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Caching
    }

    fn provider_name(&self) -> &str {
        "Redis"
    }

    fn register(
        &self,
        settings: &Self::Settings,
        services: &mut ServiceCollection,
        _configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        for (name, instance) in &settings.instances {
            let endpoint = instance.connection_string.clone().ok_or_else(|| {
                CoreError::configuration(format!("Redis instance '{}' has no connection string", name))
            })?;
            if let Some(health) = instance.health_options.as_ref().filter(|_| instance.health_checks) {
                println!("  health check for '{}' with tags {:?}", name, health.tags);
            }

            services.add_keyed_singleton(
                name.clone(),
                RedisClient {
                    instance: name.clone(),
                    endpoint,
                    database: instance.database,
                },
            );
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SmtpClient;

#[derive(Default)]
pub struct SmtpRegistrar;

impl ServiceProviderRegistrar for SmtpRegistrar {
    type Settings = ServiceProviderSettings<ServiceProviderInstanceSettings>;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Communications
    }

    fn provider_name(&self) -> &str {
        "Smtp"
    }

    fn register(
        &self,
        settings: &Self::Settings,
        services: &mut ServiceCollection,
        _configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        for name in settings.instance_names() {
            services.add_keyed_singleton(name, SmtpClient);
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let configuration = ConfigurationBuilder::new()
        .add_yaml_str(APPSETTINGS)
        .add_in_memory([(
            "Cirreum:Caching:Providers:Redis:Instances:Sessions:ConnectionString",
            "sessions.internal:6379",
        )])
        .add_prefixed_environment_variables("CIRREUM_")
        .build()?;

    init_logging(&LoggingConfig::from_configuration(&configuration)?)?;

    let mut builder = HostApplicationBuilder::new(configuration);

    println!("Registering providers:");
    for (name, outcome) in [
        ("Redis", builder.register_service_provider::<RedisRegistrar>(true)?),
        ("Smtp", builder.register_service_provider::<SmtpRegistrar>(false)?),
        ("Redis (again)", builder.register_service_provider::<RedisRegistrar>(true)?),
    ] {
        println!("  {:<14} {:?}", name, outcome);
    }

    let app = builder.build();

    println!("Registered Redis clients:");
    for key in app.services().keys_of::<RedisClient>() {
        let client = app.services().resolve_keyed::<RedisClient>(key)?;
        println!(
            "  {} -> {} (database {})",
            client.instance, client.endpoint, client.database
        );
    }

    Ok(())
}
