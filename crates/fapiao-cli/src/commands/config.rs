//! Config command - manage the JSON configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use fapiao_core::FapiaoConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Output path for configuration file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Get a configuration value by dotted key
    Get {
        /// Configuration key (e.g., "extraction.seller_strategy")
        key: String,
    },

    /// Set a configuration value by dotted key
    Set {
        /// Configuration key
        key: String,
        /// New value, parsed as JSON when possible
        value: String,
    },

    /// Show configuration file path
    Path,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let path = default_config_path();

    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                println!("{} No config file found, showing defaults.", style("ℹ").blue());
            }
            let config = load_or_default(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { output, force } => {
            let output = output.unwrap_or(path);
            if output.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    output.display()
                );
            }
            save(&FapiaoConfig::default(), &output)?;
            println!("{} Created configuration file at {}", style("✓").green(), output.display());
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_or_default(&path)?)?;
            let value = lookup(&json, &key)
                .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Set { key, value } => {
            let parsed: Value =
                serde_json::from_str(&value).unwrap_or_else(|_| Value::String(value.clone()));

            let mut json = serde_json::to_value(load_or_default(&path)?)?;
            assign(&mut json, &key, parsed.clone())?;

            // Round-trip through the typed config so bad values are rejected
            let config: FapiaoConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            save(&config, &path)?;

            println!("{} Set {} = {}", style("✓").green(), key, parsed);
        }
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!();
                println!("Run 'fapiao config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fapiao")
        .join("config.json")
}

/// Load configuration from an explicit path, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    match config_path {
        Some(path) => Ok(FapiaoConfig::from_file(Path::new(path))?),
        None => load_or_default(&default_config_path()),
    }
}

fn load_or_default(path: &Path) -> anyhow::Result<FapiaoConfig> {
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(FapiaoConfig::from_file(path)?)
    } else {
        Ok(FapiaoConfig::default())
    }
}

fn save(config: &FapiaoConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn lookup<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |current, part| current.get(part))
}

fn assign(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent_key, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, key),
    };

    let mut current = json;
    for part in parent_key.into_iter().flat_map(|p| p.split('.')) {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    let obj = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path: {}", key))?;
    if !obj.contains_key(last) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    obj.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_key() {
        let json = serde_json::to_value(FapiaoConfig::default()).unwrap();
        assert_eq!(lookup(&json, "batch.jobs"), Some(&json!(4)));
        assert_eq!(lookup(&json, "extraction.seller_strategy"), Some(&json!("ordinal")));
        assert_eq!(lookup(&json, "batch.nope"), None);
    }

    #[test]
    fn test_assign_then_parse() {
        let mut json = serde_json::to_value(FapiaoConfig::default()).unwrap();
        assign(&mut json, "extraction.seller_strategy", json!("labeled_region")).unwrap();
        assign(&mut json, "batch.jobs", json!(8)).unwrap();

        let config: FapiaoConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.batch.jobs, 8);
        assert_eq!(
            config.extraction.seller_strategy,
            fapiao_core::SellerStrategy::LabeledRegion
        );
    }

    #[test]
    fn test_assign_unknown_key() {
        let mut json = serde_json::to_value(FapiaoConfig::default()).unwrap();
        assert!(assign(&mut json, "batch.unknown", json!(1)).is_err());
        assert!(assign(&mut json, "missing.jobs", json!(1)).is_err());
        assert!(assign(&mut json, "batch.jobs.inner", json!(1)).is_err());
    }
}
