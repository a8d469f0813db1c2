//! Integration tests for the provider registration gate
//!
//! Registrars record every `register` call into the service collection they
//! are given, so each test can observe invocations without shared state.

use cirreum_core::{
    ConfigurationBuilder, ConfigurationRoot, CoreError, HostApplicationBuilder, ProviderError,
    ProviderKind, ProviderSettings, RegistrationMarkers, RegistrationOutcome, ServiceCollection,
    ServiceProviderInstanceSettings, ServiceProviderRegistrar, ServiceProviderSettings,
};
use serde::Deserialize;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

type InstanceSettings = ServiceProviderInstanceSettings;
type Settings = ServiceProviderSettings<InstanceSettings>;

/// Recorded `register` call
#[derive(Debug)]
struct Invocation {
    instance_names: Vec<String>,
    connection_strings: Vec<Option<String>>,
    saw_configuration: bool,
}

/// Client registered per configured instance
#[derive(Debug)]
struct DatabaseClient {
    connection_string: Option<String>,
}

fn record(services: &mut ServiceCollection, settings: &Settings, configuration: &ConfigurationRoot) {
    let call = services.keys_of::<Invocation>().len();
    services.add_keyed_singleton(
        call.to_string(),
        Invocation {
            instance_names: settings.instance_names().map(str::to_string).collect(),
            connection_strings: settings
                .instances
                .values()
                .map(|instance| instance.connection_string.clone())
                .collect(),
            saw_configuration: configuration.exists("Cirreum"),
        },
    );
}

fn invocations(services: &ServiceCollection) -> usize {
    services.keys_of::<Invocation>().len()
}

#[derive(Default)]
struct SqlServerRegistrar;

impl ServiceProviderRegistrar for SqlServerRegistrar {
    type Settings = Settings;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Persistence
    }

    fn provider_name(&self) -> &str {
        "SqlServer"
    }

    fn register(
        &self,
        settings: &Self::Settings,
        services: &mut ServiceCollection,
        configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        record(services, settings, configuration);
        for (name, instance) in &settings.instances {
            services.add_keyed_singleton(
                name.clone(),
                DatabaseClient {
                    connection_string: instance.connection_string.clone(),
                },
            );
        }
        Ok(())
    }
}

#[derive(Default)]
struct FooRegistrar;

impl ServiceProviderRegistrar for FooRegistrar {
    type Settings = Settings;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Custom("Foo")
    }

    fn provider_name(&self) -> &str {
        "bar"
    }

    fn register(
        &self,
        settings: &Self::Settings,
        services: &mut ServiceCollection,
        configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        record(services, settings, configuration);
        Ok(())
    }
}

#[derive(Default)]
struct BrokenRegistrar;

impl ServiceProviderRegistrar for BrokenRegistrar {
    type Settings = Settings;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Storage
    }

    fn provider_name(&self) -> &str {
        "Blob"
    }

    fn register(
        &self,
        _settings: &Self::Settings,
        _services: &mut ServiceCollection,
        _configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        Err(CoreError::registration_failed("BlobClient", "account key is not base64"))
    }
}

/// Caller-defined settings shape
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MailSettings {
    sender: String,
    relays: Vec<String>,
}

impl ProviderSettings for MailSettings {
    fn instance_count(&self) -> usize {
        self.relays.len()
    }
}

#[derive(Debug)]
struct MailRelays(Vec<String>);

#[derive(Default)]
struct SmtpRegistrar;

impl ServiceProviderRegistrar for SmtpRegistrar {
    type Settings = MailSettings;

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
        assert_eq!(settings.sender, "noreply@example.com");
        services.add_singleton(MailRelays(settings.relays.clone()));
        Ok(())
    }
}

fn builder_from_yaml(yaml: &str) -> HostApplicationBuilder {
    HostApplicationBuilder::from_sources(ConfigurationBuilder::new().add_yaml_str(yaml))
        .expect("configuration should load")
}

const SQL_SERVER_YAML: &str = r#"
Cirreum:
  Persistence:
    Providers:
      SqlServer:
        Instances:
          Default:
            ConnectionString: Server=primary;Database=app
          Reporting:
            ConnectionString: Server=reporting;Database=app
            HealthChecks: false
"#;

#[test]
fn test_happy_path_invokes_register_once_with_bound_settings() {
    let mut builder = builder_from_yaml(SQL_SERVER_YAML);

    let outcome = builder
        .register_service_provider::<SqlServerRegistrar>(false)
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::Registered { instances: 2 });
    assert!(outcome.is_registered());

    let services = builder.services();
    assert_eq!(invocations(services), 1);

    let invocation = services.resolve_keyed::<Invocation>("0").unwrap();
    assert_eq!(invocation.instance_names, vec!["Default", "Reporting"]);
    assert_eq!(
        invocation.connection_strings,
        vec![
            Some("Server=primary;Database=app".to_string()),
            Some("Server=reporting;Database=app".to_string()),
        ]
    );
    assert!(invocation.saw_configuration);

    let reporting = services.resolve_keyed::<DatabaseClient>("Reporting").unwrap();
    assert_eq!(
        reporting.connection_string.as_deref(),
        Some("Server=reporting;Database=app")
    );
}

#[test]
fn test_second_call_is_a_no_op() {
    let mut builder = builder_from_yaml(SQL_SERVER_YAML);

    builder
        .register_service_provider::<SqlServerRegistrar>(false)
        .unwrap();
    let services_after_first = builder.services().len();

    let outcome = builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::Duplicate);
    assert_eq!(invocations(builder.services()), 1);
    assert_eq!(builder.services().len(), services_after_first);
}

#[test]
fn test_required_missing_configuration_fails() {
    let mut builder = builder_from_yaml(SQL_SERVER_YAML);

    let error = builder
        .register_service_provider::<FooRegistrar>(true)
        .unwrap_err();

    match &error {
        ProviderError::ConfigurationMissing { registrar, path } => {
            assert_eq!(registrar, "FooRegistrar");
            assert_eq!(path, "Cirreum:Foo:Providers:bar");
        }
        other => panic!("expected missing configuration, got {:?}", other),
    }
    assert!(error.to_string().contains("FooRegistrar"));
    assert!(error.to_string().contains("Cirreum:Foo:Providers:bar"));
    assert!(builder.services().is_empty());
}

#[test]
fn test_optional_missing_configuration_is_skipped() {
    let mut builder = builder_from_yaml(SQL_SERVER_YAML);

    let outcome = builder
        .register_service_provider::<FooRegistrar>(false)
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::MissingConfiguration);
    assert!(builder.services().is_empty());
}

#[test]
fn test_missing_configuration_still_marks_the_registrar() {
    let mut builder = builder_from_yaml("Cirreum: {}");

    builder
        .register_service_provider::<FooRegistrar>(false)
        .unwrap();
    assert!(builder.markers().is_marked::<FooRegistrar>());

    // Even a required request is skipped once the type is marked
    let outcome = builder
        .register_service_provider::<FooRegistrar>(true)
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Duplicate);
}

#[test]
fn test_invalid_configuration_lists_every_child_key() {
    let mut builder = builder_from_yaml(
        r#"
Cirreum:
  Persistence:
    Providers:
      SqlServer:
        Instances:
          - Server=primary
        Mode: fast
        Pool:
          Size: 10
"#,
    );

    let error = builder
        .register_service_provider::<SqlServerRegistrar>(false)
        .unwrap_err();

    match &error {
        ProviderError::ConfigurationInvalid {
            registrar,
            path,
            found,
            ..
        } => {
            assert_eq!(registrar, "SqlServerRegistrar");
            assert_eq!(path, "Cirreum:Persistence:Providers:SqlServer");
            assert_eq!(
                found,
                &vec![
                    "Instances=[section]".to_string(),
                    "Mode=fast".to_string(),
                    "Pool=[section]".to_string(),
                ]
            );
        }
        other => panic!("expected invalid configuration, got {:?}", other),
    }
    assert!(error
        .to_string()
        .contains("Found keys: Instances=[section], Mode=fast, Pool=[section]"));
    assert!(builder.services().is_empty());

    // The failed attempt still counts as processed
    assert_eq!(
        builder
            .register_service_provider::<SqlServerRegistrar>(false)
            .unwrap(),
        RegistrationOutcome::Duplicate
    );
}

#[test]
fn test_scalar_provider_section_is_invalid() {
    let mut builder = builder_from_yaml(
        "Cirreum:\n  Persistence:\n    Providers:\n      SqlServer: Server=.\n",
    );

    let error = builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap_err();
    assert!(error.is_configuration_invalid());
}

#[test]
fn test_zero_instances_skips_register() {
    let mut builder = builder_from_yaml(
        r#"
Cirreum:
  Persistence:
    Providers:
      SqlServer:
        Instances: {}
        Mode: fast
"#,
    );

    let outcome = builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::NoInstances);
    assert_eq!(invocations(builder.services()), 0);
    assert!(builder.services().is_empty());
}

#[test]
fn test_lowercase_yaml_section_registers() {
    let mut builder = builder_from_yaml(
        r#"
cirreum:
  persistence:
    providers:
      sqlserver:
        instances:
          Default:
            connectionString: Server=lower;Database=app
            healthchecks: "false"
"#,
    );

    let outcome = builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered { instances: 1 });

    let client = builder
        .services()
        .resolve_keyed::<DatabaseClient>("Default")
        .unwrap();
    assert_eq!(
        client.connection_string.as_deref(),
        Some("Server=lower;Database=app")
    );
}

#[test]
#[serial]
fn test_uppercase_environment_section_registers() {
    const VARIABLE: &str =
        "GATE_TEST_CIRREUM__PERSISTENCE__PROVIDERS__SQLSERVER__INSTANCES__DEFAULT__CONNECTIONSTRING";
    std::env::set_var(VARIABLE, "Server=env");

    let built = HostApplicationBuilder::from_sources(
        ConfigurationBuilder::new().add_prefixed_environment_variables("GATE_TEST_"),
    );
    std::env::remove_var(VARIABLE);
    let mut builder = built.unwrap();

    let outcome = builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered { instances: 1 });

    let invocation = builder.services().resolve_keyed::<Invocation>("0").unwrap();
    assert_eq!(
        invocation.connection_strings,
        vec![Some("Server=env".to_string())]
    );
}

#[test]
fn test_numeric_override_binds_to_connection_string() {
    let mut builder = HostApplicationBuilder::from_sources(
        ConfigurationBuilder::new()
            .add_yaml_str(SQL_SERVER_YAML)
            .add_in_memory([(
                "Cirreum:Persistence:Providers:SqlServer:Instances:Default:ConnectionString",
                "8080",
            )]),
    )
    .unwrap();

    builder
        .register_service_provider::<SqlServerRegistrar>(true)
        .unwrap();

    let client = builder
        .services()
        .resolve_keyed::<DatabaseClient>("Default")
        .unwrap();
    assert_eq!(client.connection_string.as_deref(), Some("8080"));
}

#[test]
fn test_path_construction() {
    assert_eq!(FooRegistrar.config_path(), "Cirreum:Foo:Providers:bar");

    let mut builder = HostApplicationBuilder::from_sources(
        ConfigurationBuilder::new()
            .add_in_memory([("Cirreum:Foo:Providers:bar:Instances:One:ConnectionString", "one")]),
    )
    .unwrap();

    let outcome = builder
        .register_service_provider::<FooRegistrar>(true)
        .unwrap();
    assert_eq!(outcome, RegistrationOutcome::Registered { instances: 1 });
    assert_eq!(invocations(builder.services()), 1);
}

#[test]
fn test_registrar_failure_propagates() {
    let mut builder = builder_from_yaml(
        r#"
Cirreum:
  Storage:
    Providers:
      Blob:
        Instances:
          Images:
            ConnectionString: DefaultEndpointsProtocol=https
"#,
    );

    let error = builder
        .register_service_provider::<BrokenRegistrar>(false)
        .unwrap_err();

    match error {
        ProviderError::RegistrationFailed { registrar, source } => {
            assert_eq!(registrar, "BrokenRegistrar");
            assert!(source.to_string().contains("account key is not base64"));
        }
        other => panic!("expected registration failure, got {:?}", other),
    }
}

#[test]
fn test_caller_defined_settings_shape() {
    let mut builder = builder_from_yaml(
        r#"
Cirreum:
  Communications:
    Providers:
      Smtp:
        Sender: noreply@example.com
        Relays: [smtp1.example.com, smtp2.example.com]
"#,
    );

    let outcome = builder
        .register_service_provider::<SmtpRegistrar>(true)
        .unwrap();

    assert_eq!(outcome, RegistrationOutcome::Registered { instances: 2 });
    let relays = builder.services().resolve::<MailRelays>().unwrap();
    assert_eq!(relays.0, vec!["smtp1.example.com", "smtp2.example.com"]);
}

#[test]
fn test_builder_chain() {
    let app = builder_from_yaml(SQL_SERVER_YAML)
        .with_required_service_provider::<SqlServerRegistrar>()
        .and_then(HostApplicationBuilder::with_service_provider::<FooRegistrar>)
        .unwrap()
        .build();

    assert!(app.services().contains_keyed::<DatabaseClient>("Default"));
    assert_eq!(invocations(app.services()), 1);

    let missing = builder_from_yaml(SQL_SERVER_YAML).with_required_service_provider::<FooRegistrar>();
    assert!(missing.unwrap_err().is_configuration_missing());
}

#[test]
fn test_isolated_builders_do_not_share_markers() {
    let mut first = builder_from_yaml(SQL_SERVER_YAML);
    let mut second = builder_from_yaml(SQL_SERVER_YAML);

    assert!(first
        .register_service_provider::<SqlServerRegistrar>(false)
        .unwrap()
        .is_registered());
    assert!(second
        .register_service_provider::<SqlServerRegistrar>(false)
        .unwrap()
        .is_registered());
}

static CONCURRENT_REGISTRATIONS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct ConcurrentRegistrar;

impl ServiceProviderRegistrar for ConcurrentRegistrar {
    type Settings = Settings;

    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Caching
    }

    fn provider_name(&self) -> &str {
        "Redis"
    }

    fn register(
        &self,
        _settings: &Self::Settings,
        _services: &mut ServiceCollection,
        _configuration: &ConfigurationRoot,
    ) -> Result<(), CoreError> {
        CONCURRENT_REGISTRATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_concurrent_bootstrap_registers_once() {
    const THREADS: usize = 8;

    let configuration = ConfigurationBuilder::new()
        .add_in_memory([("Cirreum:Caching:Providers:Redis:Instances:Default:ConnectionString", "localhost")])
        .build()
        .unwrap();
    let markers = RegistrationMarkers::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let configuration = configuration.clone();
            let markers = markers.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut builder = HostApplicationBuilder::new(configuration).with_markers(markers);
                barrier.wait();
                builder
                    .register_service_provider::<ConcurrentRegistrar>(true)
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<RegistrationOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(CONCURRENT_REGISTRATIONS.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcomes.iter().filter(|outcome| outcome.is_registered()).count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| **outcome == RegistrationOutcome::Duplicate)
            .count(),
        THREADS - 1
    );
}
