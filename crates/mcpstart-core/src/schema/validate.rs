//! Config validation against a `ConfigSchema`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConfigSchema, ConfigValue, SchemaType, json_type_name};
use crate::error::ValidationError;

/// How an empty string in a required field is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyStringPolicy {
    /// `""` is a present string value (JSON Schema semantics)
    #[default]
    #[serde(rename = "accept")]
    Accept,
    /// `""` or whitespace in a required field counts as missing
    #[serde(rename = "missing", alias = "treat-as-missing")]
    TreatAsMissing,
}

impl TryFrom<&str> for EmptyStringPolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "accept" => Ok(EmptyStringPolicy::Accept),
            "missing" | "treat-as-missing" => Ok(EmptyStringPolicy::TreatAsMissing),
            _ => anyhow::bail!(
                "Invalid empty-string policy: '{}'. Valid values: accept, missing",
                value
            ),
        }
    }
}

/// Knobs for `ConfigSchema::validate_with`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationOptions {
    pub empty_string: EmptyStringPolicy,
}

impl ValidationOptions {
    pub fn with_empty_string(mut self, policy: EmptyStringPolicy) -> Self {
        self.empty_string = policy;
        self
    }
}

impl ConfigSchema {
    /// Validate with default options, stopping at the first error.
    pub fn validate(&self, config: &ConfigValue) -> Result<(), ValidationError> {
        self.validate_with(config, &ValidationOptions::default())
    }

    /// Validate, stopping at the first error.
    pub fn validate_with(
        &self,
        config: &ConfigValue,
        options: &ValidationOptions,
    ) -> Result<(), ValidationError> {
        match self.collect_errors(config, options).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Validate and report every problem at once.
    pub fn validate_all(
        &self,
        config: &ConfigValue,
        options: &ValidationOptions,
    ) -> Result<(), Vec<ValidationError>> {
        let errors = self.collect_errors(config, options);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    // Required fields first, in `required` order, then type checks in
    // property order. A field produces at most one error.
    fn collect_errors(
        &self,
        config: &ConfigValue,
        options: &ValidationOptions,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut reported = Vec::new();

        for name in &self.required {
            let missing = match config.get(name) {
                None => true,
                Some(Value::String(s)) => {
                    options.empty_string == EmptyStringPolicy::TreatAsMissing
                        && s.trim().is_empty()
                }
                Some(_) => false,
            };
            if missing {
                errors.push(ValidationError::MissingRequiredField(name.clone()));
                reported.push(name.as_str());
            }
        }

        for (name, property) in &self.properties {
            if reported.contains(&name.as_str()) {
                continue;
            }
            let Some(value) = config.get(name) else {
                continue;
            };
            if !property.property_type.matches(value) {
                errors.push(ValidationError::TypeMismatch {
                    name: name.clone(),
                    expected: property.property_type,
                    actual: json_type_name(value).to_string(),
                });
            }
        }

        errors
    }

    /// Fill absent declared fields from their `default`, leaving present
    /// fields untouched. A `default: null` fills nothing.
    pub fn apply_defaults(&self, config: &ConfigValue) -> ConfigValue {
        let mut filled = config.clone();
        for (name, property) in &self.properties {
            if let Some(default) = &property.default
                && !default.is_null()
                && !filled.contains_key(name)
            {
                filled.insert(name.clone(), default.clone());
            }
        }
        filled
    }

    /// Convert a raw command-line string into a JSON value of the field's
    /// declared type. Undeclared fields stay strings.
    pub fn coerce(&self, name: &str, raw: &str) -> Result<Value, ValidationError> {
        let Some(property) = self.property(name) else {
            return Ok(Value::String(raw.to_string()));
        };

        let expected = property.property_type;
        let mismatch = || ValidationError::TypeMismatch {
            name: name.to_string(),
            expected,
            actual: format!("'{}'", raw),
        };

        let value = match expected {
            SchemaType::String => Value::String(raw.to_string()),
            SchemaType::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Bool(true),
                "false" | "no" | "0" => Value::Bool(false),
                _ => return Err(mismatch()),
            },
            SchemaType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| mismatch())?,
            SchemaType::Number | SchemaType::Object | SchemaType::Array => {
                serde_json::from_str::<Value>(raw.trim()).map_err(|_| mismatch())?
            }
        };

        if expected.matches(&value) {
            Ok(value)
        } else {
            Err(mismatch())
        }
    }
}
