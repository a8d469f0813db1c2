use crate::config::ConfigError;
use crate::hosting::HostApplicationBuilder;
use crate::providers::{short_type_name, ProviderError, ProviderSettings, ServiceProviderRegistrar};

/// Result of running a registrar through the registration gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The registrar type already went through the gate; nothing was done
    Duplicate,
    /// The provider section is absent and was not required
    MissingConfiguration,
    /// The provider section bound but configures no instances
    NoInstances,
    /// The registrar ran for `instances` configured instances
    Registered { instances: usize },
}

impl RegistrationOutcome {
    /// Check if the registrar ran
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }
}

impl HostApplicationBuilder {
    /// Bind the provider section of `R` and let it register its services.
    ///
    /// Each registrar type passes the gate once per marker set. The type is
    /// marked before its configuration is read, so a later call is skipped
    /// even when the first one found no configuration or failed.
    pub fn register_service_provider<R>(
        &mut self,
        required: bool,
    ) -> Result<RegistrationOutcome, ProviderError>
    where
        R: ServiceProviderRegistrar,
    {
        let name = short_type_name::<R>();
        let logger = self.logger.clone();
        let _scope = logger.begin_scope(format!("Registrar {}", name));

        if !self.markers.mark::<R>() {
            logger.debug(format!("Duplicate request for '{}' and will be skipped.", name));
            return Ok(RegistrationOutcome::Duplicate);
        }

        let registrar = R::default();
        let path = registrar.config_path();
        let section = self.configuration.section(&path);

        if !section.exists() {
            if required {
                logger.error(format!(
                    "Required configuration for '{}' not found at '{}'.",
                    name, path
                ));
                return Err(ProviderError::ConfigurationMissing {
                    registrar: name.to_string(),
                    path,
                });
            }
            logger.debug(format!(
                "No configuration settings found for '{}' at '{}'.",
                name, path
            ));
            return Ok(RegistrationOutcome::MissingConfiguration);
        }

        let settings: R::Settings = match section.bind() {
            Ok(settings) => settings,
            Err(error) => {
                let found = section.flatten_children();
                logger.error(format!(
                    "Invalid configuration for '{}' - section exists but cannot be bound to settings. Found keys: {}",
                    name,
                    found.join(", ")
                ));
                let reason = match error {
                    ConfigError::Binding { message, .. } => message,
                    other => other.to_string(),
                };
                return Err(ProviderError::ConfigurationInvalid {
                    registrar: name.to_string(),
                    path,
                    reason,
                    found,
                });
            }
        };

        let instances = settings.instance_count();
        if instances == 0 {
            logger.warning(format!("0 instances found to register for '{}'.", name));
            return Ok(RegistrationOutcome::NoInstances);
        }

        registrar
            .register(&settings, &mut self.services, &self.configuration)
            .map_err(|source| {
                logger.error(format!("Registration failed for '{}': {}", name, source));
                ProviderError::RegistrationFailed {
                    registrar: name.to_string(),
                    source,
                }
            })?;

        logger.debug(format!(
            "Registered {} provider instances for '{}' of type '{}'.",
            instances,
            name,
            registrar.provider_kind()
        ));

        Ok(RegistrationOutcome::Registered { instances })
    }

    /// Register `R` if its provider section is configured
    pub fn with_service_provider<R>(mut self) -> Result<Self, ProviderError>
    where
        R: ServiceProviderRegistrar,
    {
        self.register_service_provider::<R>(false)?;
        Ok(self)
    }

    /// Register `R`, failing if its provider section is absent
    pub fn with_required_service_provider<R>(mut self) -> Result<Self, ProviderError>
    where
        R: ServiceProviderRegistrar,
    {
        self.register_service_provider::<R>(true)?;
        Ok(self)
    }
}
