//! mcpstart - launch manifest validator and command deriver
//!
//! Usage:
//!   mcpstart check [MANIFEST]                  # Load and check a manifest
//!   mcpstart schema [MANIFEST]                 # Print the config schema
//!   mcpstart validate [MANIFEST] --set k=v     # Validate a config
//!   mcpstart derive [MANIFEST] --set k=v       # Print the launch descriptor

mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpstart_core::prelude::*;

use crate::interactive::ConfigPrompter;

#[derive(Parser)]
#[command(name = "mcpstart")]
#[command(about = "MCP server launch manifest tool", long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/mcpstart/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a manifest and check its structure
    Check {
        /// Manifest file (default: settings, then ./smithery.yaml, then built-in)
        manifest: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the manifest's config schema
    Schema {
        /// Manifest file (default: settings, then ./smithery.yaml, then built-in)
        manifest: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "yaml")]
        format: SchemaFormat,
    },

    /// Validate a config against the manifest's schema
    Validate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Validate a config and print the derived launch descriptor
    Derive {
        #[command(flatten)]
        config: ConfigArgs,

        /// Prompt for missing required fields
        #[arg(short, long)]
        interactive: bool,

        /// Print environment values unmasked
        #[arg(long)]
        reveal: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Manifest file (default: settings, then ./smithery.yaml, then built-in)
    manifest: Option<PathBuf>,

    /// Config as a JSON object
    #[arg(long, value_name = "JSON")]
    config: Option<String>,

    /// Config file (JSON, or YAML by extension)
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,

    /// Set a single config field (KEY=VALUE), typed by the schema
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Empty-string handling for required fields (accept, missing)
    #[arg(long, value_name = "POLICY")]
    empty_string: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output; exit status only
    Quiet,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum SchemaFormat {
    #[default]
    Yaml,
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcpstart=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };

    run_cli(cli.command, &settings)
}

fn run_cli(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Check { manifest, format } => run_check(manifest.as_deref(), format, settings),
        Commands::Schema { manifest, format } => run_schema(manifest.as_deref(), format, settings),
        Commands::Validate { config, format } => run_validate(&config, format, settings),
        Commands::Derive {
            config,
            interactive,
            reveal,
            format,
        } => run_derive(&config, interactive, reveal, format, settings),
    }
}

fn load_manifest(
    explicit: Option<&Path>,
    settings: &Settings,
) -> Result<(Manifest, ManifestSource)> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let source = settings.resolve_manifest(explicit, &working_dir);
    tracing::debug!(source = %source, "loading manifest");
    let manifest = source.load()?;
    Ok((manifest, source))
}

fn run_check(manifest: Option<&Path>, format: OutputFormat, settings: &Settings) -> Result<()> {
    let (manifest, source) = load_manifest(manifest, settings)?;
    let registry = DerivationRegistry::builtin();
    let derivation = manifest
        .derivation(&registry)
        .map(|d| d.name().to_string())
        .ok();
    let schema = manifest.config_schema();

    match format {
        OutputFormat::Table => {
            println!("{} {}", style("✓").green(), source);
            println!("  Transport:  {}", manifest.transport());
            println!(
                "  Fields:     {} ({} required)",
                schema.properties.len(),
                schema.required.len()
            );
            match &derivation {
                Some(name) => println!("  Derivation: {}", name),
                None => println!(
                    "  Derivation: {}",
                    style(format!("none for transport '{}'", manifest.transport())).yellow()
                ),
            }
            if manifest.start_command.command_function.is_some() {
                println!("  Note:       commandFunction is ignored");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "source": source.to_string(),
                "transport": manifest.transport().to_string(),
                "fields": schema.properties.keys().collect::<Vec<_>>(),
                "required": schema.required,
                "derivation": derivation,
                "build": manifest.build,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }

    Ok(())
}

fn run_schema(manifest: Option<&Path>, format: SchemaFormat, settings: &Settings) -> Result<()> {
    let (manifest, _) = load_manifest(manifest, settings)?;
    let schema = manifest.config_schema();

    match format {
        SchemaFormat::Yaml => print!("{}", serde_yaml::to_string(schema)?),
        SchemaFormat::Json => println!("{}", serde_json::to_string_pretty(schema)?),
    }

    Ok(())
}

fn run_validate(args: &ConfigArgs, format: OutputFormat, settings: &Settings) -> Result<()> {
    let (manifest, _) = load_manifest(args.manifest.as_deref(), settings)?;
    let options = validation_options(args, settings)?;
    let schema = manifest.config_schema();
    let config = schema.apply_defaults(&build_config(args, schema)?);

    let errors = match schema.validate_all(&config, &options) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    match format {
        OutputFormat::Table => {
            if errors.is_empty() {
                println!("{} configuration is valid", style("✓").green());
            }
            for error in &errors {
                eprintln!("{} {}", style("✗").red(), error);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": errors.is_empty(),
                "errors": errors.iter().map(|e| serde_json::json!({
                    "field": e.field(),
                    "message": e.to_string(),
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }

    if !errors.is_empty() {
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }
    Ok(())
}

fn run_derive(
    args: &ConfigArgs,
    interactive: bool,
    reveal: bool,
    format: OutputFormat,
    settings: &Settings,
) -> Result<()> {
    let (manifest, _) = load_manifest(args.manifest.as_deref(), settings)?;
    let options = validation_options(args, settings)?;
    let schema = manifest.config_schema();
    let mut config = build_config(args, schema)?;

    if interactive {
        config = ConfigPrompter::new(options).fill_missing(schema, config)?;
    }

    let registry = DerivationRegistry::builtin();
    let descriptor = match manifest.launch(&config, &registry, &options) {
        Ok(descriptor) => descriptor,
        Err(LaunchError::Validation(errors)) if matches!(format, OutputFormat::Table) => {
            for error in &errors {
                eprintln!("{} {}", style("✗").red(), error);
            }
            anyhow::bail!("configuration has {} error(s)", errors.len());
        }
        Err(err) => return Err(err.into()),
    };

    let shown = displayed_descriptor(descriptor, reveal, settings);

    match format {
        OutputFormat::Table => print_descriptor(&shown),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Quiet => {}
    }

    Ok(())
}

/// Env values are masked unless `--reveal` or `reveal-secrets` asks otherwise.
fn displayed_descriptor(
    descriptor: LaunchDescriptor,
    reveal: bool,
    settings: &Settings,
) -> LaunchDescriptor {
    if reveal || settings.reveal_secrets {
        descriptor
    } else {
        descriptor.redacted()
    }
}

fn print_descriptor(descriptor: &LaunchDescriptor) {
    println!("{:<10} {}", "Command", style(descriptor.command_line()).green());
    if descriptor.env.is_empty() {
        return;
    }
    println!("{:<10}", "Env");
    for (key, value) in &descriptor.env {
        println!("  {}={}", key, value);
    }
}

fn validation_options(args: &ConfigArgs, settings: &Settings) -> Result<ValidationOptions> {
    let mut options = settings.validation_options();
    if let Some(policy) = &args.empty_string {
        options = options.with_empty_string(EmptyStringPolicy::try_from(policy.as_str())?);
    }
    Ok(options)
}

/// Assemble a config from, in increasing precedence: `--config-file`,
/// `--config`, then each `--set`.
fn build_config(args: &ConfigArgs, schema: &ConfigSchema) -> Result<ConfigValue> {
    let mut config = ConfigValue::new();

    if let Some(path) = &args.config_file {
        config.merge(read_config_file(path)?);
    }

    if let Some(json) = &args.config {
        config.merge(ConfigValue::from_json(json).context("Invalid --config value")?);
    }

    for pair in &args.set {
        let (key, raw) = split_key_value(pair)?;
        let value = schema.coerce(key, raw)?;
        config.insert(key, value);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ConfigValue> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let value: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?
    };

    ConfigValue::try_from(value).with_context(|| format!("Invalid config file: {}", path.display()))
}

fn split_key_value(pair: &str) -> Result<(&str, &str)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid --set '{}': expected KEY=VALUE", pair))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid --set '{}': key is empty", pair);
    }
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mcpstart_core::manifest::REFERENCE_MANIFEST;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn config_args(set: &[&str]) -> ConfigArgs {
        ConfigArgs {
            manifest: None,
            config: None,
            config_file: None,
            set: set.iter().map(|s| s.to_string()).collect(),
            empty_string: None,
        }
    }

    fn reference_schema() -> ConfigSchema {
        Manifest::reference().unwrap().config_schema().clone()
    }

    /// Reference manifest written to a temp dir, with args pointing at it.
    fn manifest_args(temp: &TempDir, set: &[&str]) -> ConfigArgs {
        let path = temp.path().join("smithery.yaml");
        std::fs::write(&path, REFERENCE_MANIFEST).unwrap();
        let mut args = config_args(set);
        args.manifest = Some(path);
        args
    }

    #[test]
    fn validate_fails_on_invalid_config() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::default();

        let missing = manifest_args(&temp, &[]);
        let err = run_validate(&missing, OutputFormat::Quiet, &settings).unwrap_err();
        assert_eq!(err.to_string(), "configuration has 1 error(s)");

        let mut mistyped = manifest_args(&temp, &[]);
        mistyped.config = Some(r#"{"openaiApiKey": 42}"#.to_string());
        assert!(run_validate(&mistyped, OutputFormat::Json, &settings).is_err());
    }

    #[test]
    fn validate_accepts_valid_config() {
        let temp = TempDir::new().unwrap();
        let args = manifest_args(&temp, &["openaiApiKey=sk-test-123"]);
        assert!(run_validate(&args, OutputFormat::Quiet, &Settings::default()).is_ok());
    }

    #[test]
    fn validate_applies_empty_string_flag() {
        let temp = TempDir::new().unwrap();
        let mut args = manifest_args(&temp, &["openaiApiKey="]);
        assert!(run_validate(&args, OutputFormat::Quiet, &Settings::default()).is_ok());

        args.empty_string = Some("missing".to_string());
        assert!(run_validate(&args, OutputFormat::Quiet, &Settings::default()).is_err());
    }

    #[test]
    fn derive_succeeds_for_valid_config() {
        let temp = TempDir::new().unwrap();
        let args = manifest_args(&temp, &["openaiApiKey=sk-test-123456"]);
        let settings = Settings::default();
        assert!(run_derive(&args, false, false, OutputFormat::Quiet, &settings).is_ok());
        assert!(run_derive(&args, false, true, OutputFormat::Json, &settings).is_ok());
    }

    #[test]
    fn derive_fails_for_invalid_config() {
        let temp = TempDir::new().unwrap();
        let args = manifest_args(&temp, &[]);
        let settings = Settings::default();

        let err = run_derive(&args, false, false, OutputFormat::Table, &settings).unwrap_err();
        assert_eq!(err.to_string(), "configuration has 1 error(s)");
        assert!(run_derive(&args, false, false, OutputFormat::Quiet, &settings).is_err());
    }

    #[test]
    fn derived_env_is_masked_by_default() {
        let descriptor = Manifest::reference()
            .unwrap()
            .derive(
                &ConfigValue::new().with("openaiApiKey", "sk-test-123456"),
                &DerivationRegistry::builtin(),
            )
            .unwrap();

        let masked = displayed_descriptor(descriptor.clone(), false, &Settings::default());
        assert_eq!(masked.env["OPENAI_API_KEY"], "****3456");
        assert_eq!(masked.command, "python");

        let revealed = displayed_descriptor(descriptor.clone(), true, &Settings::default());
        assert_eq!(revealed.env["OPENAI_API_KEY"], "sk-test-123456");

        let settings = Settings::from_toml_str("reveal-secrets = true").unwrap();
        let from_settings = displayed_descriptor(descriptor, false, &settings);
        assert_eq!(from_settings.env["OPENAI_API_KEY"], "sk-test-123456");
    }

    #[test]
    fn split_key_value_pairs() {
        assert_eq!(split_key_value("a=b").unwrap(), ("a", "b"));
        assert_eq!(split_key_value("a=b=c").unwrap(), ("a", "b=c"));
        assert_eq!(split_key_value("a=").unwrap(), ("a", ""));
        assert!(split_key_value("novalue").is_err());
        assert!(split_key_value("=value").is_err());
    }

    #[test]
    fn build_config_from_set_pairs() {
        let args = config_args(&["openaiApiKey=sk-test-123", "extra=1"]);
        let config = build_config(&args, &reference_schema()).unwrap();
        assert_eq!(config.get_str("openaiApiKey"), Some("sk-test-123"));
        assert_eq!(config.get("extra"), Some(&json!("1")));
    }

    #[test]
    fn set_overrides_config_json() {
        let mut args = config_args(&["openaiApiKey=from-set"]);
        args.config = Some(r#"{"openaiApiKey": "from-json", "other": true}"#.to_string());
        let config = build_config(&args, &reference_schema()).unwrap();
        assert_eq!(config.get_str("openaiApiKey"), Some("from-set"));
        assert_eq!(config.get("other"), Some(&json!(true)));
    }

    #[test]
    fn config_file_yaml_and_json() {
        let mut yaml = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(yaml, "openaiApiKey: sk-yaml").unwrap();
        let mut args = config_args(&[]);
        args.config_file = Some(yaml.path().to_path_buf());
        let config = build_config(&args, &reference_schema()).unwrap();
        assert_eq!(config.get_str("openaiApiKey"), Some("sk-yaml"));

        let mut json_file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(json_file, r#"{{"openaiApiKey": 7}}"#).unwrap();
        args.config_file = Some(json_file.path().to_path_buf());
        let config = build_config(&args, &reference_schema()).unwrap();
        assert_eq!(config.get("openaiApiKey"), Some(&json!(7)));
    }

    #[test]
    fn config_file_must_be_object() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "[1, 2]").unwrap();
        let mut args = config_args(&[]);
        args.config_file = Some(file.path().to_path_buf());
        assert!(build_config(&args, &reference_schema()).is_err());
    }

    #[test]
    fn empty_string_flag_overrides_settings() {
        let mut args = config_args(&[]);
        args.empty_string = Some("missing".to_string());
        let options = validation_options(&args, &Settings::default()).unwrap();
        assert_eq!(options.empty_string, EmptyStringPolicy::TreatAsMissing);

        args.empty_string = Some("bogus".to_string());
        assert!(validation_options(&args, &Settings::default()).is_err());
    }

    #[test]
    fn derive_command_parses() {
        let cli = Cli::try_parse_from([
            "mcpstart",
            "derive",
            "smithery.yaml",
            "--set",
            "openaiApiKey=sk",
            "--reveal",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Derive {
                config,
                interactive,
                reveal,
                format,
            } => {
                assert_eq!(config.manifest, Some(PathBuf::from("smithery.yaml")));
                assert_eq!(config.set, vec!["openaiApiKey=sk"]);
                assert!(!interactive);
                assert!(reveal);
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected derive"),
        }
    }

    #[test]
    fn global_settings_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["mcpstart", "check", "--settings", "/tmp/s.toml"]).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.toml")));
        assert!(matches!(cli.command, Commands::Check { manifest: None, .. }));
    }

    #[test]
    fn schema_format_defaults_to_yaml() {
        let cli = Cli::try_parse_from(["mcpstart", "schema"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Schema {
                format: SchemaFormat::Yaml,
                ..
            }
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["mcpstart", "spawn"]).is_err());
    }
}
