use crate::config::{ConfigError, ConfigSource, ConfigurationRoot, FoldedLayer, KeySpellings};
use ::config::Config;
use serde_json::Value;
use std::path::PathBuf;

/// Builder that layers configuration sources into a [`ConfigurationRoot`].
///
/// Sources added later take precedence over sources added earlier.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    sources: Vec<ConfigSource>,
}

impl ConfigurationBuilder {
    /// Create a new, empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a YAML file that must exist
    pub fn add_yaml_file(self, path: impl Into<PathBuf>) -> Self {
        self.add_source(ConfigSource::YamlFile {
            path: path.into(),
            optional: false,
        })
    }

    /// Add a YAML file that is skipped when absent
    pub fn add_optional_yaml_file(self, path: impl Into<PathBuf>) -> Self {
        self.add_source(ConfigSource::YamlFile {
            path: path.into(),
            optional: true,
        })
    }

    /// Add a JSON file that must exist
    pub fn add_json_file(self, path: impl Into<PathBuf>) -> Self {
        self.add_source(ConfigSource::JsonFile {
            path: path.into(),
            optional: false,
        })
    }

    /// Add a JSON file that is skipped when absent
    pub fn add_optional_json_file(self, path: impl Into<PathBuf>) -> Self {
        self.add_source(ConfigSource::JsonFile {
            path: path.into(),
            optional: true,
        })
    }

    /// Add an inline YAML document
    pub fn add_yaml_str(self, content: impl Into<String>) -> Self {
        self.add_source(ConfigSource::Yaml(content.into()))
    }

    /// Add an inline JSON document
    pub fn add_json_str(self, content: impl Into<String>) -> Self {
        self.add_source(ConfigSource::Json(content.into()))
    }

    /// Add flat `A:B:C = value` pairs
    pub fn add_in_memory<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.add_source(ConfigSource::InMemory(pairs))
    }

    /// Add every environment variable
    pub fn add_environment_variables(self) -> Self {
        self.add_source(ConfigSource::Environment { prefix: None })
    }

    /// Add environment variables starting with `prefix`, prefix removed
    pub fn add_prefixed_environment_variables(self, prefix: impl Into<String>) -> Self {
        self.add_source(ConfigSource::Environment {
            prefix: Some(prefix.into()),
        })
    }

    /// Get the number of sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Load and merge every source.
    ///
    /// Keys from different sources are merged without regard to case; the
    /// first source to use a key decides how it is spelled.
    pub fn build(self) -> Result<ConfigurationRoot, ConfigError> {
        let spellings = KeySpellings::default();
        let mut builder = Config::builder();
        for source in &self.sources {
            builder = builder.add_source(FoldedLayer::new(source.to_layer()?, spellings.clone()));
            tracing::trace!("Added {}", source);
        }

        let merged: Value = builder.build()?.try_deserialize()?;
        Ok(ConfigurationRoot::with_sources(
            spellings.restore(merged),
            self.sources,
        ))
    }
}
