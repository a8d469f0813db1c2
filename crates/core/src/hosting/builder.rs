use crate::config::{ConfigError, ConfigurationBuilder, ConfigurationRoot};
use crate::container::ServiceCollection;
use crate::hosting::RegistrationMarkers;
use crate::logging::DeferredLogger;

/// Collects configuration and services while an application boots.
///
/// Buffered bootstrap logs are flushed by [`build`](Self::build), or when the
/// builder is dropped after a failed registration.
#[derive(Debug, Default)]
pub struct HostApplicationBuilder {
    pub(crate) configuration: ConfigurationRoot,
    pub(crate) services: ServiceCollection,
    pub(crate) markers: RegistrationMarkers,
    pub(crate) logger: DeferredLogger,
}

impl HostApplicationBuilder {
    /// Create a builder over an already built configuration
    pub fn new(configuration: ConfigurationRoot) -> Self {
        Self {
            configuration,
            services: ServiceCollection::new(),
            markers: RegistrationMarkers::new(),
            logger: DeferredLogger::new(),
        }
    }

    /// Build the configuration from `sources` and create a builder over it
    pub fn from_sources(sources: ConfigurationBuilder) -> Result<Self, ConfigError> {
        Ok(Self::new(sources.build()?))
    }

    /// Share a marker set with other builders
    pub fn with_markers(mut self, markers: RegistrationMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Use `logger` for bootstrap logging
    pub fn with_logger(mut self, logger: DeferredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Application configuration
    pub fn configuration(&self) -> &ConfigurationRoot {
        &self.configuration
    }

    /// Services registered so far
    pub fn services(&self) -> &ServiceCollection {
        &self.services
    }

    /// Mutable access to the service collection
    pub fn services_mut(&mut self) -> &mut ServiceCollection {
        &mut self.services
    }

    /// Types that already went through registration
    pub fn markers(&self) -> &RegistrationMarkers {
        &self.markers
    }

    /// Bootstrap logger
    pub fn logger(&self) -> &DeferredLogger {
        &self.logger
    }

    /// Finish bootstrapping. Buffered bootstrap logs are flushed.
    pub fn build(mut self) -> HostApplication {
        let flushed = self.logger.flush();
        tracing::debug!(
            "Application built with {} services ({} bootstrap log entries)",
            self.services.len(),
            flushed
        );
        HostApplication {
            configuration: std::mem::take(&mut self.configuration),
            services: std::mem::take(&mut self.services),
        }
    }
}

impl Drop for HostApplicationBuilder {
    fn drop(&mut self) {
        self.logger.flush();
    }
}

/// A bootstrapped application
#[derive(Debug)]
pub struct HostApplication {
    configuration: ConfigurationRoot,
    services: ServiceCollection,
}

impl HostApplication {
    /// Application configuration
    pub fn configuration(&self) -> &ConfigurationRoot {
        &self.configuration
    }

    /// Registered services
    pub fn services(&self) -> &ServiceCollection {
        &self.services
    }
}
