//! Launch manifest schema
//!
//! Defines the structure of `smithery.yaml` launch manifests.

use serde::{Deserialize, Serialize};

use crate::launch::LaunchTemplate;
use crate::schema::ConfigSchema;

/// Launch manifest - the root structure of smithery.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// How to start the server
    pub start_command: StartCommand,

    /// Container build settings (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
}

/// The `startCommand` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCommand {
    /// Transport tag: "stdio" or "http"
    #[serde(rename = "type")]
    pub transport: TransportType,

    /// JSON Schema for the user-supplied config
    #[serde(default)]
    pub config_schema: ConfigSchema,

    /// Host-language source of the launch function. Kept verbatim, never
    /// evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_function: Option<String>,

    /// Declarative launch command (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch: Option<LaunchTemplate>,
}

/// Transport types for launched servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TransportType {
    /// Server speaks MCP over stdin/stdout (default)
    #[default]
    Stdio,
    /// Server speaks MCP over HTTP
    Http,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Stdio => write!(f, "stdio"),
            TransportType::Http => write!(f, "http"),
        }
    }
}

impl TryFrom<&str> for TransportType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "stdio" => Ok(TransportType::Stdio),
            "http" => Ok(TransportType::Http),
            _ => anyhow::bail!("Invalid transport: '{}'. Valid values: stdio, http", value),
        }
    }
}

impl TryFrom<String> for TransportType {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Container build settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Path to the Dockerfile, relative to the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,

    /// Docker build context, relative to the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_build_path: Option<String>,
}
