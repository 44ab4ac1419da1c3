//! Interactive prompts for missing config fields.
//!
//! Used by `derive --interactive`. Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use mcpstart_core::prelude::*;

/// Words that mark a field as secret: its value is read without echo.
const SENSITIVE_HINTS: &[&str] = &["key", "token", "secret", "password"];

/// Prompts for required config fields the user has not supplied.
pub struct ConfigPrompter<W: Write = io::Stderr> {
    /// Validation options deciding what counts as missing
    options: ValidationOptions,
    /// Output writer (for testing)
    writer: W,
    /// Theme for dialoguer prompts
    theme: ColorfulTheme,
}

impl ConfigPrompter<io::Stderr> {
    /// Create a prompter writing its header to stderr.
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            writer: io::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> ConfigPrompter<W> {
    /// Create a prompter with a custom writer (for testing).
    #[cfg(test)]
    pub fn with_writer(options: ValidationOptions, writer: W) -> Self {
        Self {
            options,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for every required field that is missing from `config`, and
    /// return the completed config.
    pub fn fill_missing(
        &mut self,
        schema: &ConfigSchema,
        mut config: ConfigValue,
    ) -> Result<ConfigValue> {
        let missing = missing_fields(schema, &config, &self.options);
        if missing.is_empty() {
            return Ok(config);
        }

        self.print_header(missing.len())?;

        for name in missing {
            let Some(property) = schema.property(&name) else {
                continue;
            };
            let raw = self.prompt_field(&name, property)?;
            config.insert(name.clone(), schema.coerce(&name, &raw)?);
        }

        writeln!(self.writer)?;
        Ok(config)
    }

    fn print_header(&mut self, count: usize) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}",
            style(format!("  {} required field(s) missing", count)).bold().cyan()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_field(&self, name: &str, property: &PropertySchema) -> Result<String> {
        let prompt = match &property.description {
            Some(description) => format!("{} ({})", property.display_name(name), description),
            None => property.display_name(name).to_string(),
        };

        if is_sensitive(name, property) {
            let value = Password::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty_password(self.options.empty_string == EmptyStringPolicy::Accept)
                .interact()?;
            return Ok(value);
        }

        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(self.options.empty_string == EmptyStringPolicy::Accept)
            .interact_text()?;
        Ok(value)
    }
}

/// Required fields that would fail validation as missing, in `required` order.
pub fn missing_fields(
    schema: &ConfigSchema,
    config: &ConfigValue,
    options: &ValidationOptions,
) -> Vec<String> {
    match schema.validate_all(config, options) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .into_iter()
            .filter_map(|error| match error {
                ValidationError::MissingRequiredField(name) => Some(name),
                ValidationError::TypeMismatch { .. } => None,
            })
            .collect(),
    }
}

/// Whether a field's value should be read without echo.
pub fn is_sensitive(name: &str, property: &PropertySchema) -> bool {
    let name = name.to_lowercase();
    let description = property
        .description
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    SENSITIVE_HINTS
        .iter()
        .any(|hint| name.contains(hint) || description.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ConfigSchema {
        ConfigSchema::default()
            .with_property(
                "openaiApiKey",
                PropertySchema::new(SchemaType::String)
                    .with_description("The API key for accessing OpenAI's API."),
            )
            .with_property("region", PropertySchema::new(SchemaType::String))
            .with_property("model", PropertySchema::new(SchemaType::String))
            .with_required("openaiApiKey")
            .with_required("region")
    }

    #[test]
    fn missing_fields_in_required_order() {
        let options = ValidationOptions::default();
        assert_eq!(
            missing_fields(&schema(), &ConfigValue::new(), &options),
            vec!["openaiApiKey", "region"]
        );

        let partial = ConfigValue::new().with("region", "eu");
        assert_eq!(
            missing_fields(&schema(), &partial, &options),
            vec!["openaiApiKey"]
        );
    }

    #[test]
    fn missing_fields_ignore_type_mismatches() {
        let config = ConfigValue::new().with("openaiApiKey", 5).with("region", "eu");
        assert!(missing_fields(&schema(), &config, &ValidationOptions::default()).is_empty());
    }

    #[test]
    fn missing_fields_follow_empty_string_policy() {
        let config = ConfigValue::new().with("openaiApiKey", "").with("region", "eu");
        assert!(missing_fields(&schema(), &config, &ValidationOptions::default()).is_empty());

        let strict =
            ValidationOptions::default().with_empty_string(EmptyStringPolicy::TreatAsMissing);
        assert_eq!(
            missing_fields(&schema(), &config, &strict),
            vec!["openaiApiKey"]
        );
    }

    #[test]
    fn sensitive_detection() {
        let schema = schema();
        assert!(is_sensitive("openaiApiKey", &schema.properties["openaiApiKey"]));
        assert!(!is_sensitive("region", &schema.properties["region"]));

        let described = PropertySchema::new(SchemaType::String).with_description("Bearer token");
        assert!(is_sensitive("auth", &described));
    }

    #[test]
    fn complete_config_is_returned_without_prompting() {
        let config = ConfigValue::new()
            .with("openaiApiKey", "sk")
            .with("region", "eu");
        let mut output = Vec::new();
        let filled = {
            let mut prompter =
                ConfigPrompter::with_writer(ValidationOptions::default(), &mut output);
            prompter.fill_missing(&schema(), config.clone()).unwrap()
        };
        assert_eq!(filled, config);
        assert!(output.is_empty());
    }
}
