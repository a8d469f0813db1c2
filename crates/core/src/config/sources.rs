use crate::config::{ConfigError, KEY_DELIMITER};
use ::config::{Environment, File, FileFormat, Map, Source, Value as LayerValue, ValueKind};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Separator used by environment variables in place of `:`
pub const ENV_DELIMITER: &str = "__";

// Path separator understood by the `config` crate
const LAYER_DELIMITER: char = '.';

/// A single layer of configuration
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// YAML document loaded from a file
    YamlFile { path: PathBuf, optional: bool },
    /// JSON document loaded from a file
    JsonFile { path: PathBuf, optional: bool },
    /// Inline YAML document
    Yaml(String),
    /// Inline JSON document
    Json(String),
    /// Flat `path = value` pairs provided programmatically
    InMemory(Vec<(String, String)>),
    /// Process environment variables, optionally filtered by prefix
    Environment { prefix: Option<String> },
}

impl ConfigSource {
    /// Check if source is backed by a file
    pub fn is_file(&self) -> bool {
        matches!(
            self,
            ConfigSource::YamlFile { .. } | ConfigSource::JsonFile { .. }
        )
    }

    /// Check if source reads the process environment
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::Environment { .. })
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::YamlFile { path, .. } => {
                format!("YAML configuration file: {}", path.display())
            }
            ConfigSource::JsonFile { path, .. } => {
                format!("JSON configuration file: {}", path.display())
            }
            ConfigSource::Yaml(_) => "Inline YAML configuration".to_string(),
            ConfigSource::Json(_) => "Inline JSON configuration".to_string(),
            ConfigSource::InMemory(pairs) => format!("In-memory configuration ({} keys)", pairs.len()),
            ConfigSource::Environment { prefix: Some(prefix) } => {
                format!("Environment variables with prefix '{}'", prefix)
            }
            ConfigSource::Environment { prefix: None } => "Environment variables".to_string(),
        }
    }

    /// Convert into a `config` layer. Required files must exist.
    ///
    /// Flat values (in-memory pairs and environment variables) stay strings;
    /// binding converts them to the target type.
    pub(crate) fn to_layer(&self) -> Result<Box<dyn Source + Send + Sync>, ConfigError> {
        let layer: Box<dyn Source + Send + Sync> = match self {
            ConfigSource::YamlFile { path, optional } => {
                file_layer(path, FileFormat::Yaml, *optional)?
            }
            ConfigSource::JsonFile { path, optional } => {
                file_layer(path, FileFormat::Json, *optional)?
            }
            ConfigSource::Yaml(content) => Box::new(File::from_str(content, FileFormat::Yaml)),
            ConfigSource::Json(content) => Box::new(File::from_str(content, FileFormat::Json)),
            ConfigSource::InMemory(pairs) => Box::new(InMemoryLayer(pairs.clone())),
            ConfigSource::Environment { prefix } => Box::new(
                Environment::default()
                    .separator(ENV_DELIMITER)
                    .source(Some(environment_variables(std::env::vars_os(), prefix.as_deref()))),
            ),
        };
        Ok(layer)
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn file_layer(
    path: &Path,
    format: FileFormat,
    optional: bool,
) -> Result<Box<dyn Source + Send + Sync>, ConfigError> {
    if !path.exists() {
        if !optional {
            return Err(ConfigError::missing_file(path.display().to_string()));
        }
        tracing::debug!(
            "Optional configuration file '{}' not found, skipping",
            path.display()
        );
    }
    Ok(Box::new(File::from(path).format(format).required(!optional)))
}

/// Collect environment variables, stripping `prefix` (ASCII case-insensitive).
///
/// Entries that are not valid UTF-8 are skipped; `std::env::vars` would panic
/// on them.
pub(crate) fn environment_variables<I>(vars: I, prefix: Option<&str>) -> Map<String, String>
where
    I: IntoIterator<Item = (std::ffi::OsString, std::ffi::OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .filter_map(|(name, value)| {
            let key = match prefix {
                Some(prefix) => strip_prefix_ignore_case(&name, prefix)?.to_string(),
                None => name,
            };
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        name.get(prefix.len()..)
    } else {
        None
    }
}

/// Flat `A:B:C = value` pairs as a `config` layer
#[derive(Debug, Clone)]
struct InMemoryLayer(Vec<(String, String)>);

impl Source for InMemoryLayer {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, LayerValue>, ::config::ConfigError> {
        let origin = "in-memory configuration".to_string();
        Ok(self
            .0
            .iter()
            .map(|(path, value)| {
                (
                    path.replace(KEY_DELIMITER, &LAYER_DELIMITER.to_string()),
                    LayerValue::new(Some(&origin), value.clone()),
                )
            })
            .collect())
    }
}

/// Original spelling of each key, by lowercased path. The first layer to
/// use a key decides its spelling.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeySpellings(Arc<Mutex<HashMap<String, String>>>);

impl KeySpellings {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Returns the lowercased path of `key` under `parent`.
    fn record(&self, parent: &str, key: &str) -> String {
        let path = join(parent, &key.to_ascii_lowercase());
        self.lock()
            .entry(path.clone())
            .or_insert_with(|| key.to_string());
        path
    }

    fn record_path(&self, dotted: &str) -> String {
        dotted
            .split(LAYER_DELIMITER)
            .fold(String::new(), |parent, key| self.record(&parent, key))
    }

    /// Put the recorded spelling back on every key of a merged tree
    pub(crate) fn restore(&self, merged: Value) -> Value {
        let spellings = self.lock();
        respell(merged, "", &spellings)
    }
}

fn respell(value: Value, path: &str, spellings: &HashMap<String, String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| {
                    let child_path = join(path, &key.to_ascii_lowercase());
                    let child = respell(child, &child_path, spellings);
                    (spellings.get(&child_path).cloned().unwrap_or(key), child)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| respell(item, &join(path, &index.to_string()), spellings))
                .collect(),
        ),
        other => other,
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", parent, LAYER_DELIMITER, key)
    }
}

/// Layer wrapper that lowercases every key so `config` merges layers without
/// regard to case. Spellings are kept in [`KeySpellings`].
#[derive(Debug)]
pub(crate) struct FoldedLayer {
    inner: Box<dyn Source + Send + Sync>,
    spellings: KeySpellings,
}

impl FoldedLayer {
    pub(crate) fn new(inner: Box<dyn Source + Send + Sync>, spellings: KeySpellings) -> Self {
        Self { inner, spellings }
    }

    fn fold(&self, mut value: LayerValue, path: &str) -> LayerValue {
        value.kind = match std::mem::replace(&mut value.kind, ValueKind::Nil) {
            ValueKind::Table(table) => ValueKind::Table(
                table
                    .into_iter()
                    .map(|(key, child)| {
                        let child_path = self.spellings.record(path, &key);
                        let child = self.fold(child, &child_path);
                        (key.to_ascii_lowercase(), child)
                    })
                    .collect(),
            ),
            ValueKind::Array(items) => ValueKind::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| self.fold(item, &join(path, &index.to_string())))
                    .collect(),
            ),
            other => other,
        };
        value
    }
}

impl Source for FoldedLayer {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(FoldedLayer {
            inner: self.inner.clone_into_box(),
            spellings: self.spellings.clone(),
        })
    }

    fn collect(&self) -> Result<Map<String, LayerValue>, ::config::ConfigError> {
        Ok(self
            .inner
            .collect()?
            .into_iter()
            .map(|(key, value)| {
                let path = self.spellings.record_path(&key);
                let value = self.fold(value, &path);
                (path, value)
            })
            .collect())
    }
}
