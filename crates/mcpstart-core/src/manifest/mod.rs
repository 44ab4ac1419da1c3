//! Launch manifest support
//!
//! Loads `smithery.yaml` manifests, checks their structure, validates user
//! config against the embedded schema and derives launch descriptors.
//!
//! A manifest's `commandFunction` is host-language source text. It is kept
//! for round-tripping but never evaluated: descriptors come from a compiled
//! derivation selected by transport tag, or from a declarative `launch`
//! template when the manifest provides one.

pub mod parser;
pub mod types;

pub use parser::{
    ManifestFormat, parse_manifest, parse_manifest_json, parse_manifest_yaml, to_json, to_yaml,
};
pub use types::{BuildConfig, Manifest, StartCommand, TransportType};

use std::path::Path;
use std::sync::Arc;

use crate::error::{LaunchError, ManifestError, ValidationError};
use crate::launch::{CommandDerivation, DerivationRegistry, LaunchDescriptor, TemplateDerivation};
use crate::schema::{ConfigSchema, ConfigValue, ValidationOptions};

/// The reference manifest: the simple OpenAI assistant MCP server.
pub const REFERENCE_MANIFEST: &str = include_str!("../../assets/smithery.yaml");

impl Manifest {
    /// Parse a YAML manifest
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        parse_manifest_yaml(yaml)
    }

    /// Parse a JSON manifest
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        parse_manifest_json(json)
    }

    /// Load a manifest file; `.json` files are JSON, everything else YAML
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        parse_manifest(path)
    }

    /// The embedded reference manifest
    pub fn reference() -> anyhow::Result<Self> {
        parse_manifest_yaml(REFERENCE_MANIFEST)
    }

    pub fn transport(&self) -> TransportType {
        self.start_command.transport
    }

    pub fn config_schema(&self) -> &ConfigSchema {
        &self.start_command.config_schema
    }

    /// Check structural invariants: the schema is well formed and a launch
    /// template only references declared fields.
    pub fn check(&self) -> Result<(), ManifestError> {
        let start = &self.start_command;
        start.config_schema.check()?;
        if let Some(template) = &start.launch {
            template.check(&start.config_schema)?;
        }
        Ok(())
    }

    /// Validate a config against the manifest's schema with default options.
    pub fn validate(&self, config: &ConfigValue) -> Result<(), ValidationError> {
        self.config_schema().validate(config)
    }

    /// Pick the derivation for this manifest: its launch template if present,
    /// otherwise the registry entry for its transport.
    pub fn derivation(
        &self,
        registry: &DerivationRegistry,
    ) -> Result<Arc<dyn CommandDerivation>, LaunchError> {
        let start = &self.start_command;

        if let Some(template) = &start.launch {
            return Ok(Arc::new(TemplateDerivation::new(template.clone())));
        }

        let derivation = registry
            .get(start.transport)
            .ok_or_else(|| LaunchError::UnsupportedTransport(start.transport.to_string()))?;

        if start.command_function.is_some() {
            tracing::debug!(
                derivation = derivation.name(),
                "commandFunction is not evaluated; using compiled derivation"
            );
        }

        Ok(derivation)
    }

    /// Derive a descriptor from a config that has already been validated.
    pub fn derive(
        &self,
        config: &ConfigValue,
        registry: &DerivationRegistry,
    ) -> Result<LaunchDescriptor, LaunchError> {
        Ok(self.derivation(registry)?.derive(config))
    }

    /// Fill defaults, validate, derive and check the resulting descriptor.
    pub fn launch(
        &self,
        config: &ConfigValue,
        registry: &DerivationRegistry,
        options: &ValidationOptions,
    ) -> Result<LaunchDescriptor, LaunchError> {
        let schema = self.config_schema();
        let config = schema.apply_defaults(config);
        schema
            .validate_all(&config, options)
            .map_err(LaunchError::Validation)?;

        let derivation = self.derivation(registry)?;
        let descriptor = derivation.derive(&config);
        descriptor.check()?;

        tracing::debug!(
            derivation = derivation.name(),
            command = %descriptor.command,
            args = descriptor.args.len(),
            env = descriptor.env.len(),
            "derived launch descriptor"
        );

        Ok(descriptor)
    }
}
