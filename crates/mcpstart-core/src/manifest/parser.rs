//! Manifest parser with helpful error messages

use std::path::Path;

use anyhow::{Context, Result};

use super::Manifest;

/// Serialization format of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// `.json` is JSON; everything else is treated as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// Read, parse and check a manifest file
pub fn parse_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

    let manifest = match ManifestFormat::from_path(path) {
        ManifestFormat::Yaml => parse_manifest_yaml(&content),
        ManifestFormat::Json => parse_manifest_json(&content),
    };

    manifest.with_context(|| format!("Failed to load manifest: {}", path.display()))
}

/// Parse and check a YAML manifest
pub fn parse_manifest_yaml(content: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_yaml::from_str(content).map_err(|e| enhance_yaml_error(e, content))?;
    finish(manifest)
}

/// Parse and check a JSON manifest
pub fn parse_manifest_json(content: &str) -> Result<Manifest> {
    let manifest: Manifest =
        serde_json::from_str(content).map_err(|e| enhance_json_error(e, content))?;
    finish(manifest)
}

fn finish(manifest: Manifest) -> Result<Manifest> {
    manifest.check()?;

    let start = &manifest.start_command;
    tracing::debug!(
        transport = %start.transport,
        fields = start.config_schema.properties.len(),
        required = start.config_schema.required.len(),
        has_template = start.launch.is_some(),
        has_command_function = start.command_function.is_some(),
        "loaded launch manifest"
    );

    Ok(manifest)
}

/// Serialize a manifest to YAML
pub fn to_yaml(manifest: &Manifest) -> Result<String> {
    serde_yaml::to_string(manifest).with_context(|| "Failed to serialize manifest to YAML")
}

/// Serialize a manifest to pretty JSON
pub fn to_json(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).with_context(|| "Failed to serialize manifest to JSON")
}

fn enhance_yaml_error(error: serde_yaml::Error, content: &str) -> anyhow::Error {
    match error.location() {
        Some(location) => anyhow::anyhow!(
            "YAML parsing error at line {}:\n{}\n\nError: {}",
            location.line(),
            get_line_context(content, location.line()),
            error
        ),
        None => anyhow::anyhow!("YAML parsing error: {}", error),
    }
}

fn enhance_json_error(error: serde_json::Error, content: &str) -> anyhow::Error {
    if error.line() == 0 {
        return anyhow::anyhow!("JSON parsing error: {}", error);
    }
    anyhow::anyhow!(
        "JSON parsing error at line {}:\n{}\n\nError: {}",
        error.line(),
        get_line_context(content, error.line()),
        error
    )
}

/// Get context lines around an error
pub(crate) fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TransportType;
    use std::path::PathBuf;

    const MINIMAL: &str = r#"
startCommand:
  type: stdio
  configSchema:
    type: object
    required: [openaiApiKey]
    properties:
      openaiApiKey:
        type: string
        description: The API key for accessing OpenAI's API.
"#;

    #[test]
    fn test_parse_minimal_yaml() {
        let manifest = parse_manifest_yaml(MINIMAL).unwrap();
        let start = &manifest.start_command;
        assert_eq!(start.transport, TransportType::Stdio);
        assert_eq!(start.config_schema.required, vec!["openaiApiKey"]);
        assert!(start.command_function.is_none());
        assert!(start.launch.is_none());
        assert!(manifest.build.is_none());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "startCommand": {
                "type": "http",
                "configSchema": { "type": "object", "properties": {} }
            },
            "build": { "dockerfile": "Dockerfile" }
        }"#;

        let manifest = parse_manifest_json(json).unwrap();
        assert_eq!(manifest.start_command.transport, TransportType::Http);
        assert_eq!(
            manifest.build.unwrap().dockerfile.as_deref(),
            Some("Dockerfile")
        );
    }

    #[test]
    fn test_yaml_error_has_line_context() {
        let broken = "startCommand:\n  type: stdio\n  configSchema: [unclosed\n";
        let err = parse_manifest_yaml(broken).unwrap_err().to_string();
        assert!(err.starts_with("YAML parsing error"));
    }

    #[test]
    fn test_unknown_transport_is_rejected() {
        let yaml = "startCommand:\n  type: websocket\n";
        assert!(parse_manifest_yaml(yaml).is_err());
    }

    #[test]
    fn test_structural_check_runs_after_parse() {
        let yaml = r#"
startCommand:
  type: stdio
  configSchema:
    type: object
    required: [openaiApiKey]
    properties: {}
"#;
        let err = parse_manifest_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("openaiApiKey"));
    }

    #[test]
    fn test_json_error_has_line_context() {
        let err = parse_manifest_json("{\n  \"startCommand\": \n}")
            .unwrap_err()
            .to_string();
        assert!(err.contains("JSON parsing error at line 3"));
        assert!(err.contains(">>>    3 | }"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ManifestFormat::from_path(&PathBuf::from("smithery.yaml")),
            ManifestFormat::Yaml
        );
        assert_eq!(
            ManifestFormat::from_path(&PathBuf::from("manifest.JSON")),
            ManifestFormat::Json
        );
        assert_eq!(
            ManifestFormat::from_path(&PathBuf::from("smithery")),
            ManifestFormat::Yaml
        );
    }

    #[test]
    fn test_line_context_marks_line() {
        let context = get_line_context("a\nb\nc\nd\ne", 3);
        assert_eq!(
            context,
            "       2 | b\n>>>    3 | c\n       4 | d\n       5 | e"
        );
    }
}
