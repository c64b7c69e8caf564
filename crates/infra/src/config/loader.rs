//! Configuration loader
//!
//! Loads gateway configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `SHIPGATE_CARRIER_URL`: Carrier API base URL
//! - `SHIPGATE_CARRIER_EMAIL`: Carrier login email
//! - `SHIPGATE_CARRIER_PASSWORD`: Carrier login password
//!
//! Optional (defaults in `shipgate_domain::constants`):
//! - `SHIPGATE_REQUEST_TIMEOUT_SECS`, `SHIPGATE_LOGIN_TIMEOUT_SECS`
//! - `SHIPGATE_TOKEN_LIFETIME_SECS`, `SHIPGATE_TOKEN_CACHE_TTL_SECS`
//! - `SHIPGATE_REFRESH_BUFFER_SECS`, `SHIPGATE_REFRESH_CHECK_SECS`
//! - `SHIPGATE_LOGIN_MAX_ATTEMPTS`, `SHIPGATE_LOGIN_BACKOFF_MS`
//! - `SHIPGATE_STORE_URL`, `SHIPGATE_STORE_PREFIX`, `SHIPGATE_STORE_TIMEOUT_SECS`
//! - `SHIPGATE_BIND_ADDR`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./shipgate.json` or `./shipgate.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use shipgate_domain::{
    CarrierConfig, Config, CredentialConfig, Result, ServerConfig, ShipgateError, StoreConfig,
};

const REQUIRED_ENV: [&str; 3] =
    ["SHIPGATE_CARRIER_URL", "SHIPGATE_CARRIER_EMAIL", "SHIPGATE_CARRIER_PASSWORD"];

/// Load configuration with automatic fallback strategy
///
/// Uses environment variables when all required ones are set; only then
/// are their values validated. If any required variable is missing, falls
/// back to loading from a config file.
///
/// # Errors
/// Returns `ShipgateError::Config` if:
/// - An environment value cannot be parsed
/// - No config file is found when the environment is incomplete
/// - File format is invalid
pub fn load() -> Result<Config> {
    let missing: Vec<&str> =
        REQUIRED_ENV.into_iter().filter(|key| env_optional(key).is_none()).collect();

    if missing.is_empty() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!(?missing, "Required environment variables missing, trying file");
    load_from_file(None)
}

/// Load configuration from environment variables
///
/// The carrier URL and login must be present; everything else falls back
/// to its default.
///
/// # Errors
/// Returns `ShipgateError::Config` if required variables are missing
/// or a value is invalid.
pub fn load_from_env() -> Result<Config> {
    let defaults = CredentialConfig::default();
    let store_defaults = StoreConfig::default();

    let carrier = CarrierConfig {
        base_url: env_var("SHIPGATE_CARRIER_URL")?,
        email: env_var("SHIPGATE_CARRIER_EMAIL")?,
        password: env_var("SHIPGATE_CARRIER_PASSWORD")?,
        request_timeout_secs: env_parse(
            "SHIPGATE_REQUEST_TIMEOUT_SECS",
            shipgate_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        )?,
        login_timeout_secs: env_parse(
            "SHIPGATE_LOGIN_TIMEOUT_SECS",
            shipgate_domain::constants::DEFAULT_LOGIN_TIMEOUT_SECS,
        )?,
    };

    let credentials = CredentialConfig {
        lifetime_secs: env_parse("SHIPGATE_TOKEN_LIFETIME_SECS", defaults.lifetime_secs)?,
        cache_ttl_secs: env_parse("SHIPGATE_TOKEN_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
        refresh_buffer_secs: env_parse(
            "SHIPGATE_REFRESH_BUFFER_SECS",
            defaults.refresh_buffer_secs,
        )?,
        check_interval_secs: env_parse("SHIPGATE_REFRESH_CHECK_SECS", defaults.check_interval_secs)?,
        max_login_attempts: env_parse("SHIPGATE_LOGIN_MAX_ATTEMPTS", defaults.max_login_attempts)?,
        login_backoff_ms: env_parse("SHIPGATE_LOGIN_BACKOFF_MS", defaults.login_backoff_ms)?,
    };

    let store = StoreConfig {
        url: env_optional("SHIPGATE_STORE_URL"),
        key_prefix: env_optional("SHIPGATE_STORE_PREFIX").unwrap_or(store_defaults.key_prefix),
        timeout_secs: env_parse("SHIPGATE_STORE_TIMEOUT_SECS", store_defaults.timeout_secs)?,
    };

    let server = ServerConfig {
        bind_addr: env_optional("SHIPGATE_BIND_ADDR")
            .unwrap_or_else(|| ServerConfig::default().bind_addr),
    };

    Ok(Config { carrier, credentials, store, server })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ShipgateError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ShipgateError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ShipgateError::Config(
                "No configuration in environment and no config file in any standard location"
                    .to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ShipgateError::Config(format!("Failed to read config file: {e}")))?;

    let mut config = parse_config(&contents, &config_path)?;

    // Keep the password out of config files when possible.
    if config.carrier.password.is_empty() {
        if let Some(password) = env_optional("SHIPGATE_CARRIER_PASSWORD") {
            config.carrier.password = password;
        }
    }

    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ShipgateError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ShipgateError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ShipgateError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent, and the
/// executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "shipgate.json", "shipgate.toml"];

    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        ShipgateError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable, if set
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional environment variable, falling back to `default`
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ShipgateError::Config(format!("Invalid value for {key} ('{raw}'): {e}"))),
        None => Ok(default),
    }
}
