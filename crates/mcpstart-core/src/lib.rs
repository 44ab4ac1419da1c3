//! mcpstart Core Library
//!
//! Loads MCP server launch manifests (`smithery.yaml`), validates user
//! config against the manifest's config schema and derives the
//! `{command, args, env}` descriptor a host launcher spawns.

pub mod error;
pub mod launch;
pub mod manifest;
pub mod schema;
pub mod settings;

/// Re-exports of commonly used types
pub mod prelude {
    // Errors
    pub use crate::error::{DescriptorError, LaunchError, ManifestError, ValidationError};

    // Manifest
    pub use crate::manifest::{BuildConfig, Manifest, StartCommand, TransportType};

    // Schema
    pub use crate::schema::{
        ConfigSchema, ConfigValue, EmptyStringPolicy, PropertySchema, SchemaType,
        ValidationOptions,
    };

    // Launch
    pub use crate::launch::{
        CommandDerivation, DerivationRegistry, LaunchDescriptor, LaunchTemplate,
        PythonModuleDerivation, TemplateDerivation,
    };

    // Settings
    pub use crate::settings::{ManifestSource, Settings};
}
