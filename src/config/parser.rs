use crate::config::types::{Config, Credentials};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML override file
pub const CONFIG_PATH_VAR: &str = "LEVEROS_CONFIG";

/// Environment variable holding the portal login identifier
pub const USERNAME_VAR: &str = "LEVEROS_USERNAME";

/// Environment variable holding the portal password
pub const PASSWORD_VAR: &str = "LEVEROS_PASSWORD";

/// Loads and parses a configuration override file from the given path
///
/// Keys missing from the file keep their built-in defaults. The result is
/// not validated here because credentials are attached afterwards.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run can be traced back to the overrides it used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads credentials through the given variable lookup
///
/// Both variables must be present and non-blank.
pub fn credentials_from<F>(lookup: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredentials(name.to_string()))
    };

    Ok(Credentials {
        username: read(USERNAME_VAR)?,
        password: read(PASSWORD_VAR)?,
    })
}

/// The override file a configuration was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// SHA-256 of the file content
    pub hash: String,
}

/// Builds the run configuration from the process environment
///
/// Nothing is logged here; the caller reports the source once its log
/// subscriber is installed.
///
/// # Returns
///
/// * `Ok((Config, Option<ConfigSource>))` - The configuration and the
///   override file it came from, if any
/// * `Err(ConfigError)` - Missing credentials, unreadable overrides or a
///   validation failure
pub fn load_from_env() -> Result<(Config, Option<ConfigSource>), ConfigError> {
    load_from(|name| std::env::var(name).ok())
}

/// Builds the run configuration through the given variable lookup
///
/// Starts from the built-in defaults, applies the override file named by
/// `LEVEROS_CONFIG` when set, attaches credentials and validates the result.
pub fn load_from<F>(lookup: F) -> Result<(Config, Option<ConfigSource>), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, source) = match lookup(CONFIG_PATH_VAR) {
        Some(path) => {
            let path = PathBuf::from(path);
            let (config, hash) = load_config_with_hash(&path)?;
            (config, Some(ConfigSource { path, hash }))
        }
        None => (Config::default(), None),
    };

    config.credentials = credentials_from(&lookup)?;
    validate(&config)?;

    Ok((config, source))
}
