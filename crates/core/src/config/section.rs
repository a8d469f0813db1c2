use crate::config::{binder, combine_path, ConfigError, ConfigSource, KEY_DELIMITER};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Marker rendered in place of a value for keys that hold nested sections
pub const SECTION_MARKER: &str = "[section]";

/// Merged, read-only application configuration
#[derive(Debug, Clone)]
pub struct ConfigurationRoot {
    data: Arc<Value>,
    sources: Vec<ConfigSource>,
}

impl ConfigurationRoot {
    /// Create a configuration root from an already merged tree
    pub fn new(data: Value) -> Self {
        Self::with_sources(data, Vec::new())
    }

    pub(crate) fn with_sources(data: Value, sources: Vec<ConfigSource>) -> Self {
        Self {
            data: Arc::new(data),
            sources,
        }
    }

    /// Create an empty configuration
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// Get the section at `path`. The section may not exist.
    pub fn section(&self, path: &str) -> ConfigurationSection<'_> {
        let value = if path.is_empty() {
            Some(self.data.as_ref())
        } else {
            path.split(KEY_DELIMITER)
                .try_fold(self.data.as_ref(), |node, segment| child_value(node, segment))
        };
        ConfigurationSection {
            path: path.to_string(),
            value,
        }
    }

    /// Get the scalar value at `path` as a string
    pub fn get(&self, path: &str) -> Option<String> {
        self.section(path).value()
    }

    /// Check whether a section exists at `path`
    pub fn exists(&self, path: &str) -> bool {
        self.section(path).exists()
    }

    /// Bind the section at `path` to a typed value
    pub fn bind<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        self.section(path).bind()
    }

    /// Top level sections
    pub fn children(&self) -> Vec<ConfigurationSection<'_>> {
        self.section("").children()
    }

    /// Sources this configuration was built from, in precedence order
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// The merged configuration tree
    pub fn as_value(&self) -> &Value {
        &self.data
    }
}

impl Default for ConfigurationRoot {
    fn default() -> Self {
        Self::empty()
    }
}

/// A view into one node of a [`ConfigurationRoot`]
#[derive(Debug, Clone)]
pub struct ConfigurationSection<'a> {
    path: String,
    value: Option<&'a Value>,
}

impl<'a> ConfigurationSection<'a> {
    /// Full path of this section
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path
    pub fn key(&self) -> &str {
        self.path
            .rsplit(KEY_DELIMITER)
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// A section exists when it holds a scalar or at least one child
    pub fn exists(&self) -> bool {
        match self.value {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Scalar value of this section; `None` for missing or nested sections
    pub fn value(&self) -> Option<String> {
        self.value.and_then(scalar_to_string)
    }

    /// Raw tree under this section
    pub fn raw(&self) -> Option<&'a Value> {
        self.value
    }

    /// Get a sub-section relative to this one
    pub fn section(&self, path: &str) -> ConfigurationSection<'a> {
        let value = self.value.and_then(|node| {
            path.split(KEY_DELIMITER)
                .try_fold(node, |node, segment| child_value(node, segment))
        });
        ConfigurationSection {
            path: combine_path(&self.path, path),
            value,
        }
    }

    /// Immediate children, ordered by key
    pub fn children(&self) -> Vec<ConfigurationSection<'a>> {
        match self.value {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| ConfigurationSection {
                    path: combine_path(&self.path, key),
                    value: Some(value),
                })
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, value)| ConfigurationSection {
                    path: combine_path(&self.path, &index.to_string()),
                    value: Some(value),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Immediate children rendered as `key=value`, or `key=[section]` for
    /// children that hold nested sections
    pub fn flatten_children(&self) -> Vec<String> {
        self.children()
            .iter()
            .map(|child| {
                let rendered = match child.value {
                    Some(Value::Object(_) | Value::Array(_)) => SECTION_MARKER.to_string(),
                    Some(value) => scalar_to_string(value).unwrap_or_default(),
                    None => String::new(),
                };
                format!("{}={}", child.key(), rendered)
            })
            .collect()
    }

    /// Deserialize this section into `T`.
    ///
    /// Field names match keys in any case, and string values are parsed
    /// into numeric or boolean fields.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::section_not_found(&self.path));
        }
        let value = self
            .value
            .cloned()
            .ok_or_else(|| ConfigError::section_not_found(&self.path))?;
        binder::bind(value).map_err(|e| ConfigError::binding(&self.path, e.to_string()))
    }
}

// Section paths address array elements by index, like object keys.
fn child_value<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Object(map) => map.get(segment).or_else(|| {
            map.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value)
        }),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}
