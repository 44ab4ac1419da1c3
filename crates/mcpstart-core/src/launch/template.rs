//! Declarative launch templates
//!
//! A manifest may describe its launch command as data instead of relying on
//! a compiled derivation:
//!
//! ```yaml
//! launch:
//!   command: python
//!   args: ["-m", "my_server", "--model", "${config.model}"]
//!   env:
//!     OPENAI_API_KEY: "${config.openaiApiKey}"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CommandDerivation, LaunchDescriptor};
use crate::error::ManifestError;
use crate::schema::{ConfigSchema, ConfigValue};

const PLACEHOLDER_OPEN: &str = "${config.";

/// `{command, args, env}` with `${config.<field>}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTemplate {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl LaunchTemplate {
    /// Every field name referenced by a placeholder, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(self.env.values().map(String::as_str))
            .flat_map(placeholders_in)
            .collect()
    }

    /// Check the command is non-empty and every placeholder names a field
    /// declared in `schema`.
    pub fn check(&self, schema: &ConfigSchema) -> Result<(), ManifestError> {
        if self.command.trim().is_empty() {
            return Err(ManifestError::EmptyTemplateCommand);
        }
        match self
            .placeholders()
            .into_iter()
            .find(|field| schema.property(field).is_none())
        {
            Some(unknown) => Err(ManifestError::UnknownPlaceholder(unknown.to_string())),
            None => Ok(()),
        }
    }
}

/// Derivation backed by a `LaunchTemplate`.
#[derive(Debug, Clone)]
pub struct TemplateDerivation {
    template: LaunchTemplate,
}

impl TemplateDerivation {
    pub fn new(template: LaunchTemplate) -> Self {
        Self { template }
    }
}

impl CommandDerivation for TemplateDerivation {
    fn name(&self) -> &str {
        "template"
    }

    fn derive(&self, config: &ConfigValue) -> LaunchDescriptor {
        LaunchDescriptor {
            command: substitute(&self.template.command, config),
            args: self
                .template
                .args
                .iter()
                .map(|arg| substitute(arg, config))
                .collect(),
            env: self
                .template
                .env
                .iter()
                .map(|(key, value)| (key.clone(), substitute(value, config)))
                .collect(),
        }
    }
}

fn placeholders_in(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        let after = &rest[start + PLACEHOLDER_OPEN.len()..];
        let Some(end) = after.find('}') else {
            break;
        };
        found.push(&after[..end]);
        rest = &after[end + 1..];
    }
    found
}

/// Replace every `${config.<field>}` with the field's rendered value.
/// Unterminated placeholders are left as written.
fn substitute(text: &str, config: &ConfigValue) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        let after = &rest[start + PLACEHOLDER_OPEN.len()..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&config.render(&after[..end]));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
