use crate::config::ValidatorConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a validator config from a JSON file.
///
/// A missing path (or `None`) yields the defaults. The result is always
/// validated before it is returned.
pub fn load_config(config_path: Option<&Path>) -> Result<ValidatorConfig> {
    let config = match config_path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: ValidatorConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
            debug!("loaded validator config from {}", path.display());
            config
        }
        Some(path) => {
            debug!(
                "config file {} not found, using defaults",
                path.display()
            );
            ValidatorConfig::default()
        }
        None => ValidatorConfig::default(),
    };

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}
