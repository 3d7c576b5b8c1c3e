use std::path::Path;

use serde_json::Value;

use super::{document::ConfigDocument, types::Config, ConfigError};

/// Read a JSON configuration file and expand environment placeholders.
pub fn load_document(path: &Path) -> Result<ConfigDocument, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
    let root: Value =
        serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(ConfigDocument::new(root))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_document(path)?.extract()
}

/// Load configuration from a JSON string (useful for testing)
pub fn load_config_from_str(json: &str) -> Result<Config, ConfigError> {
    let root: Value =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    ConfigDocument::new(root).extract()
}
