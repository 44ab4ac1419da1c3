//! Error types for manifest loading, config validation and launch derivation.

use thiserror::Error;

use crate::schema::SchemaType;

/// A config value that does not satisfy the manifest's config schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("field '{name}' must be of type {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: SchemaType,
        actual: String,
    },
}

impl ValidationError {
    /// Name of the offending config field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequiredField(name) => name,
            ValidationError::TypeMismatch { name, .. } => name,
        }
    }
}

/// Structural problems found in a manifest after it parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("configSchema must have type \"object\", found \"{0}\"")]
    SchemaNotObject(String),

    #[error("required field '{0}' is not declared in configSchema.properties")]
    UndeclaredRequired(String),

    #[error("required field '{0}' is listed more than once")]
    DuplicateRequired(String),

    #[error("launch template references undeclared field '{0}'")]
    UnknownPlaceholder(String),

    #[error("launch template has an empty command")]
    EmptyTemplateCommand,
}

/// Invariant violations on a derived launch descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("launch command is empty")]
    EmptyCommand,

    #[error("'{0}' is not a valid environment variable name")]
    InvalidEnvName(String),
}

/// Failure to turn a config value into a launch descriptor.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("no derivation registered for transport '{0}'")]
    UnsupportedTransport(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl From<ValidationError> for LaunchError {
    fn from(err: ValidationError) -> Self {
        LaunchError::Validation(vec![err])
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
