//! Loading the configuration document from disk.

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::organization::FullConfig;

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

/// Serialization format of a configuration document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension; anything unrecognized is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
            ConfigFormat::Toml => "TOML",
        }
    }
}

/// Reads and parses the configuration document at `path`.
///
/// # Errors
///
/// - `ConfigurationError::FileNotFound` when the file does not exist
/// - `ConfigurationError::FileAccessError` when it cannot be read
/// - `ConfigurationError::ParseError` when it is not a valid document
pub fn load_config(path: &Path) -> ConfigurationResult<FullConfig> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigurationError::FileNotFound {
            path: shown.clone(),
        },
        _ => ConfigurationError::FileAccessError {
            path: shown.clone(),
            reason: e.to_string(),
        },
    })?;

    let format = ConfigFormat::from_path(path);
    debug!(path = %shown, format = format.name(), "Parsing configuration file");

    let config = parse_config(&content, format)?;
    info!(
        path = %shown,
        orgs = config.orgs.len(),
        "Loaded organization configuration"
    );
    Ok(config)
}

/// Parses a configuration document held in memory.
pub fn parse_config(content: &str, format: ConfigFormat) -> ConfigurationResult<FullConfig> {
    let parse_error = |reason: String| ConfigurationError::ParseError {
        format: format.name().to_string(),
        reason,
    };

    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}
