use crate::torrent_client::TorrentState;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - qBittorrent port is not 0
/// - At least one eligible state is configured, and all of them are known
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.qbittorrent.port == 0 {
        return Err(ConfigError::ValidationError(
            "qbittorrent.port cannot be 0".to_string(),
        ));
    }

    if config.cleanup.states.is_empty() {
        return Err(ConfigError::ValidationError(
            "cleanup.states cannot be empty".to_string(),
        ));
    }

    if config.cleanup.states.contains(&TorrentState::Unknown) {
        return Err(ConfigError::ValidationError(
            "cleanup.states contains an unrecognised state".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.qbittorrent.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_states_fails() {
        let mut config = Config::default();
        config.cleanup.states = BTreeSet::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_unknown_state_fails() {
        let mut config = Config::default();
        config.cleanup.states.insert(TorrentState::Unknown);
        assert!(validate_config(&config).is_err());
    }
}
