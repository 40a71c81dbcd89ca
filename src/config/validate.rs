// src/config/validate.rs

use reqwest::Url;

use crate::config::model::{ConsoleConfig, RawConsoleConfig};
use crate::errors::{ConsoleError, Result};

impl TryFrom<RawConsoleConfig> for ConsoleConfig {
    type Error = ConsoleError;

    fn try_from(raw: RawConsoleConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConsoleConfig::new_unchecked(raw.server, raw.connection, raw.logs))
    }
}

fn validate_raw_config(cfg: &RawConsoleConfig) -> Result<()> {
    validate_url("[server].api_url", &cfg.server.api_url, &["http", "https"])?;
    validate_url("[server].ws_url", &cfg.server.ws_url, &["ws", "wss"])?;
    validate_capacities(cfg)?;
    Ok(())
}

fn validate_url(field: &str, value: &str, schemes: &[&str]) -> Result<()> {
    let url = Url::parse(value).map_err(|e| {
        ConsoleError::ConfigError(format!("{field} is not a valid URL ({value}): {e}"))
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConsoleError::ConfigError(format!(
            "{field} must use one of {:?} (got '{}')",
            schemes,
            url.scheme()
        )));
    }
    Ok(())
}

fn validate_capacities(cfg: &RawConsoleConfig) -> Result<()> {
    if cfg.logs.capacity == 0 {
        return Err(ConsoleError::ConfigError(
            "[logs].capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.connection.event_capacity == 0 {
        return Err(ConsoleError::ConfigError(
            "[connection].event_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.connection.connect_timeout_ms == 0 {
        return Err(ConsoleError::ConfigError(
            "[connection].connect_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
