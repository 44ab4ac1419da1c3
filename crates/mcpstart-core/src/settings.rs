//! User settings
//!
//! Read from `<config dir>/mcpstart/settings.toml`:
//!
//! ```toml
//! empty-string = "missing"   # or "accept" (default)
//! reveal-secrets = false
//! manifest = "/path/to/smithery.yaml"
//! ```
//!
//! A relative `manifest` is resolved against the directory holding the
//! settings file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;
use crate::manifest::parser::get_line_context;
use crate::schema::{EmptyStringPolicy, ValidationOptions};

/// Manifest file name looked up in the working directory
pub const MANIFEST_FILE_NAME: &str = "smithery.yaml";

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Persistent user preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Empty-string handling for required fields
    pub empty_string: EmptyStringPolicy,

    /// Print environment values unmasked
    pub reveal_secrets: bool,

    /// Manifest used when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    /// Directory of the file these settings were loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Settings {
    /// `<config dir>/mcpstart/settings.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("mcpstart");
        Ok(dir.join(SETTINGS_FILE_NAME))
    }

    /// Load from the default location. A missing file yields defaults.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let mut settings = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        settings.base_dir = path.parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))
    }

    /// Serialize settings to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize settings to TOML")
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::default().with_empty_string(self.empty_string)
    }

    /// Decide which manifest to load.
    ///
    /// Order: `explicit`, the `manifest` setting (relative paths from the
    /// settings file's directory, else `working_dir`), `smithery.yaml` in
    /// `working_dir`, then the embedded reference manifest. A configured
    /// manifest that does not exist is skipped with a warning.
    pub fn resolve_manifest(&self, explicit: Option<&Path>, working_dir: &Path) -> ManifestSource {
        if let Some(path) = explicit {
            return ManifestSource::Path(path.to_path_buf());
        }

        if let Some(configured) = &self.manifest {
            let base = self.base_dir.as_deref().unwrap_or(working_dir);
            let path = base.join(configured);
            if path.exists() {
                return ManifestSource::Path(path);
            }
            tracing::warn!(
                path = %path.display(),
                "configured manifest does not exist, falling back"
            );
        }

        let local = working_dir.join(MANIFEST_FILE_NAME);
        if local.exists() {
            return ManifestSource::Path(local);
        }

        ManifestSource::Reference
    }
}

/// Where a manifest comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// A file on disk
    Path(PathBuf),
    /// The embedded reference manifest
    Reference,
}

impl ManifestSource {
    pub fn load(&self) -> Result<Manifest> {
        match self {
            ManifestSource::Path(path) => Manifest::from_path(path),
            ManifestSource::Reference => Manifest::reference(),
        }
    }
}

impl std::fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestSource::Path(path) => write!(f, "{}", path.display()),
            ManifestSource::Reference => write!(f, "<built-in reference manifest>"),
        }
    }
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let offset = span.start.min(content.len());
            let line_num = content[..offset].matches('\n').count() + 1;
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}
