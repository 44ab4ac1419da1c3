//! Launch descriptors and the derivations that produce them
//!
//! A launch descriptor is the `{command, args, env}` triple a host launcher
//! spawns. Descriptors are derived from a validated config by a compiled
//! `CommandDerivation`, selected by transport tag or by a manifest's
//! declarative `launch` template.

mod derivation;
mod registry;
mod template;

pub use derivation::{CommandDerivation, PythonModuleDerivation};
pub use registry::DerivationRegistry;
pub use template::{LaunchTemplate, TemplateDerivation};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

/// Command, arguments and environment for spawning a server process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchDescriptor {
    /// Program to execute
    pub command: String,

    /// Arguments, in order
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables to add to the inherited environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl LaunchDescriptor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Check descriptor invariants: non-empty command and identifier-shaped
    /// environment variable names.
    pub fn check(&self) -> Result<(), DescriptorError> {
        if self.command.trim().is_empty() {
            return Err(DescriptorError::EmptyCommand);
        }
        if let Some(bad) = self.env.keys().find(|k| !is_env_name(k)) {
            return Err(DescriptorError::InvalidEnvName(bad.clone()));
        }
        Ok(())
    }

    /// Copy with environment values masked for display.
    pub fn redacted(&self) -> Self {
        Self {
            command: self.command.clone(),
            args: self.args.clone(),
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), mask(v)))
                .collect(),
        }
    }

    /// `command arg...` with arguments quoted when they contain whitespace
    /// or quotes. For display only.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count > 8 {
        let tail: String = value.chars().skip(count - 4).collect();
        format!("****{}", tail)
    } else {
        "****".to_string()
    }
}

fn quote(part: &str) -> String {
    if !part.is_empty() && !part.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return part.to_string();
    }
    format!("'{}'", part.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_valid_descriptor() {
        let descriptor = LaunchDescriptor::new("python")
            .with_args(["-m", "mcp_simple_openai_assistant"])
            .with_env("OPENAI_API_KEY", "sk-test-123");
        assert_eq!(descriptor.check(), Ok(()));
    }

    #[test]
    fn test_check_rejects_empty_command() {
        assert_eq!(
            LaunchDescriptor::new("  ").check(),
            Err(DescriptorError::EmptyCommand)
        );
    }

    #[test]
    fn test_check_rejects_bad_env_name() {
        let descriptor = LaunchDescriptor::new("python").with_env("OPENAI-KEY", "x");
        assert_eq!(
            descriptor.check(),
            Err(DescriptorError::InvalidEnvName("OPENAI-KEY".to_string()))
        );
    }

    #[test]
    fn test_is_env_name() {
        assert!(is_env_name("OPENAI_API_KEY"));
        assert!(is_env_name("_private"));
        assert!(is_env_name("a1"));
        assert!(!is_env_name(""));
        assert!(!is_env_name("1ABC"));
        assert!(!is_env_name("A B"));
        assert!(!is_env_name("A=B"));
    }

    #[test]
    fn test_redacted_masks_env_only() {
        let descriptor = LaunchDescriptor::new("python")
            .with_args(["-m", "srv"])
            .with_env("OPENAI_API_KEY", "sk-proj-abcdef1234")
            .with_env("SHORT", "abc");

        let redacted = descriptor.redacted();
        assert_eq!(redacted.command, "python");
        assert_eq!(redacted.args, descriptor.args);
        assert_eq!(redacted.env["OPENAI_API_KEY"], "****1234");
        assert_eq!(redacted.env["SHORT"], "****");
    }

    #[test]
    fn test_command_line_quotes_when_needed() {
        let descriptor = LaunchDescriptor::new("python")
            .with_args(["-m", "mcp_simple_openai_assistant", "--name", "My Bot", ""]);
        assert_eq!(
            descriptor.command_line(),
            "python -m mcp_simple_openai_assistant --name 'My Bot' ''"
        );
    }

    #[test]
    fn test_serializes_to_launcher_shape() {
        let descriptor = LaunchDescriptor::new("python")
            .with_args(["-m", "mcp_simple_openai_assistant"])
            .with_env("OPENAI_API_KEY", "sk-test-123");

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "command": "python",
                "args": ["-m", "mcp_simple_openai_assistant"],
                "env": { "OPENAI_API_KEY": "sk-test-123" }
            })
        );
    }
}
