//! Configuration module for Leveros Harvest
//!
//! Every setting has a built-in default. An optional TOML file named by the
//! `LEVEROS_CONFIG` environment variable overrides individual keys, and the
//! portal credentials are injected through `LEVEROS_USERNAME` and
//! `LEVEROS_PASSWORD`.
//!
//! # Example
//!
//! ```no_run
//! use leveros_harvest::config::load_from_env;
//!
//! let (config, _source) = load_from_env().unwrap();
//! println!("Crawling {} categories", config.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_categories, Config, Credentials, DriverConfig, OutputConfig, SiteConfig, TimingConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, credentials_from, load_config, load_config_with_hash, load_from,
    load_from_env, ConfigSource,
    CONFIG_PATH_VAR, PASSWORD_VAR, USERNAME_VAR,
};
pub use validation::validate;
