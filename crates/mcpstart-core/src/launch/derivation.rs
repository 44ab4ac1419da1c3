//! Compiled derivations from config to launch descriptor

use super::LaunchDescriptor;
use crate::schema::{ConfigSchema, ConfigValue, PropertySchema, SchemaType};

/// Maps a validated config to a launch descriptor.
///
/// Implementations must be pure: the same config always yields the same
/// descriptor. Calling `derive` on a config that failed validation is not an
/// error, but the result is unspecified.
pub trait CommandDerivation: Send + Sync {
    /// Short identifier used in logs and `check` output.
    fn name(&self) -> &str;

    fn derive(&self, config: &ConfigValue) -> LaunchDescriptor;
}

/// Runs `<interpreter> -m <module>` with config fields copied into
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonModuleDerivation {
    name: String,
    interpreter: String,
    module: String,
    /// (config field, environment variable) pairs
    env_bindings: Vec<(String, String)>,
}

impl PythonModuleDerivation {
    pub fn new(module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            name: module.clone(),
            interpreter: "python".to_string(),
            module,
            env_bindings: Vec::new(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Copy config field `field` into environment variable `var`.
    pub fn bind_env(mut self, field: impl Into<String>, var: impl Into<String>) -> Self {
        self.env_bindings.push((field.into(), var.into()));
        self
    }

    /// The simple OpenAI assistant MCP server.
    pub fn openai_assistant() -> Self {
        Self::new("mcp_simple_openai_assistant").bind_env("openaiApiKey", "OPENAI_API_KEY")
    }

    /// Config schema this derivation consumes: every bound field as a
    /// required string.
    pub fn config_schema(&self) -> ConfigSchema {
        self.env_bindings
            .iter()
            .fold(ConfigSchema::default(), |schema, (field, var)| {
                schema
                    .with_property(
                        field.clone(),
                        PropertySchema::new(SchemaType::String)
                            .with_description(format!("Exported to the server as {}.", var)),
                    )
                    .with_required(field.clone())
            })
    }
}

impl CommandDerivation for PythonModuleDerivation {
    fn name(&self) -> &str {
        &self.name
    }

    fn derive(&self, config: &ConfigValue) -> LaunchDescriptor {
        let descriptor = LaunchDescriptor::new(&self.interpreter)
            .with_args(["-m".to_string(), self.module.clone()]);

        self.env_bindings
            .iter()
            .fold(descriptor, |descriptor, (field, var)| {
                descriptor.with_env(var.clone(), config.render(field))
            })
    }
}
