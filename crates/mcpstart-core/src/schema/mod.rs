//! Config schema
//!
//! The `configSchema` block of a launch manifest: a draft-07 subset restricted
//! to a top-level object with `required` and `properties`.

mod validate;
mod value;

pub use validate::{EmptyStringPolicy, ValidationOptions};
pub use value::ConfigValue;

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ManifestError;

/// Primitive JSON Schema type tags accepted in `properties.<name>.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl SchemaType {
    /// Check whether a JSON value satisfies this type tag.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;

        match (self, value) {
            (SchemaType::String, Value::String(_)) => true,
            (SchemaType::Number, Value::Number(_)) => true,
            (SchemaType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (SchemaType::Boolean, Value::Bool(_)) => true,
            (SchemaType::Object, Value::Object(_)) => true,
            (SchemaType::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaType::String => write!(f, "string"),
            SchemaType::Number => write!(f, "number"),
            SchemaType::Integer => write!(f, "integer"),
            SchemaType::Boolean => write!(f, "boolean"),
            SchemaType::Object => write!(f, "object"),
            SchemaType::Array => write!(f, "array"),
        }
    }
}

impl TryFrom<&str> for SchemaType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "string" => Ok(SchemaType::String),
            "number" => Ok(SchemaType::Number),
            "integer" => Ok(SchemaType::Integer),
            "boolean" => Ok(SchemaType::Boolean),
            "object" => Ok(SchemaType::Object),
            "array" => Ok(SchemaType::Array),
            _ => anyhow::bail!(
                "Invalid schema type: '{}'. Valid values: string, number, integer, boolean, object, array",
                value
            ),
        }
    }
}

impl TryFrom<String> for SchemaType {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Name of the JSON type a value actually has, as reported in type mismatches.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declaration of a single config field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Declared primitive type
    #[serde(rename = "type")]
    pub property_type: SchemaType,

    /// Help text shown to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Value used when the config omits this field. `Some(Null)` is an
    /// explicit `default: null`, kept apart from an absent keyword.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,

    /// Keywords this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PropertySchema {
    /// Create a property of the given type with no description.
    pub fn new(property_type: SchemaType) -> Self {
        Self {
            property_type,
            description: None,
            title: None,
            default: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Title if present, otherwise the field name.
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(name)
    }
}

// Any present value, `null` included, is `Some`. Absence falls back to
// `#[serde(default)]`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// The `configSchema` object of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Top-level type tag, must be "object"
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,

    /// Fields that must be present, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Declared fields, in declaration order
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,

    /// Keywords this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_schema_type() -> String {
    "object".to_string()
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            required: Vec::new(),
            properties: IndexMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl ConfigSchema {
    /// Declare a field.
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Mark a field as required.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Check the structural invariants of the schema itself.
    pub fn check(&self) -> Result<(), ManifestError> {
        if self.schema_type != "object" {
            return Err(ManifestError::SchemaNotObject(self.schema_type.clone()));
        }

        let mut seen = HashSet::new();
        for name in &self.required {
            if !seen.insert(name.as_str()) {
                return Err(ManifestError::DuplicateRequired(name.clone()));
            }
            if !self.properties.contains_key(name) {
                return Err(ManifestError::UndeclaredRequired(name.clone()));
            }
        }

        Ok(())
    }
}
