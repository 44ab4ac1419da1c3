//! User-supplied config values

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A config object as supplied by the user, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigValue(Map<String, Value>);

impl ConfigValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config object from JSON text.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Failed to parse config JSON: {}", e))?;
        Self::try_from(value)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Field value if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `other` onto this config; keys in `other` win.
    pub fn merge(&mut self, other: ConfigValue) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    /// Render a field for substitution into a command line or environment.
    ///
    /// Strings are used verbatim, other values as compact JSON, and absent
    /// fields as the empty string.
    pub fn render(&self, name: &str) -> String {
        match self.0.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for ConfigValue {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ConfigValue {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => anyhow::bail!(
                "Config must be a JSON object, got {}",
                super::json_type_name(&other)
            ),
        }
    }
}
