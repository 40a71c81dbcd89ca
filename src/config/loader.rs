// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConsoleConfig, RawConsoleConfig};
use crate::errors::Result;

/// Env var overriding `[server].api_url`.
pub const API_URL_ENV: &str = "PIPELINE_CONSOLE_API_URL";
/// Env var overriding `[server].ws_url`.
pub const WS_URL_ENV: &str = "PIPELINE_CONSOLE_WS_URL";

/// Load a configuration file from a given path and return the raw config.
///
/// This only performs TOML deserialization; it does **not** validate URLs or
/// capacities. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConsoleConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConsoleConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, apply env overrides and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConsoleConfig> {
    let mut raw = load_from_path(&path)?;
    apply_env_overrides(&mut raw);
    ConsoleConfig::try_from(raw)
}

/// Like [`load_and_validate`], but a missing file yields the defaults
/// (still subject to env overrides and validation).
///
/// Used for the implicit default path; an explicitly requested file that
/// does not exist should go through [`load_and_validate`] instead.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConsoleConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_and_validate(path);
    }

    info!(path = %path.display(), "no config file found; using defaults");
    let mut raw = RawConsoleConfig::default();
    apply_env_overrides(&mut raw);
    ConsoleConfig::try_from(raw)
}

fn apply_env_overrides(raw: &mut RawConsoleConfig) {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        debug!(%url, "api_url overridden from environment");
        raw.server.api_url = url;
    }
    if let Ok(url) = std::env::var(WS_URL_ENV) {
        debug!(%url, "ws_url overridden from environment");
        raw.server.ws_url = url;
    }
}

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Console.toml")
}
