use crate::config::types::{Config, Credentials, DriverConfig, OutputConfig, SiteConfig, TimingConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Longest accepted bounded wait, in seconds
const MAX_WAIT_SECS: u64 = 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_driver_config(&config.driver)?;
    validate_timing_config(&config.timing)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    validate_credentials(&config.credentials)?;
    Ok(())
}

/// Validates storefront URLs
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("login-url", &config.login_url)?;
    validate_http_url("public-image-base", &config.public_image_base)?;
    Ok(())
}

/// Validates driver acquisition settings
fn validate_driver_config(config: &DriverConfig) -> Result<(), ConfigError> {
    validate_http_url("remote-url", &config.remote_url)?;

    if config.port == 0 {
        return Err(ConfigError::Validation("driver port must be non-zero".to_string()));
    }

    validate_wait("startup-timeout-secs", config.startup_timeout_secs)?;

    if config.implicit_wait_secs > MAX_WAIT_SECS {
        return Err(ConfigError::Validation(format!(
            "implicit-wait-secs must be <= {}, got {}",
            MAX_WAIT_SECS, config.implicit_wait_secs
        )));
    }

    if let Some(path) = &config.chromedriver_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chromedriver-path cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates that every explicit wait is bounded
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    validate_wait("login-timeout-secs", config.login_timeout_secs)?;
    validate_wait("card-wait-timeout-secs", config.card_wait_timeout_secs)?;

    if config.max_pages_per_category < 1 {
        return Err(ConfigError::Validation(
            "max-pages-per-category must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.diagnostics_directory.is_empty() {
        return Err(ConfigError::Validation(
            "diagnostics directory cannot be empty".to_string(),
        ));
    }

    if config.log_file.is_empty() {
        return Err(ConfigError::Validation("log file cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates the category list: non-empty, no blanks, no duplicates
fn validate_categories(categories: &[String]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for category in categories {
        if category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category names cannot be blank".to_string(),
            ));
        }

        if !seen.insert(category.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' is listed more than once",
                category
            )));
        }
    }

    Ok(())
}

fn validate_credentials(credentials: &Credentials) -> Result<(), ConfigError> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(ConfigError::Validation(
            "credentials must be provided".to_string(),
        ));
    }
    Ok(())
}

fn validate_wait(name: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 || secs > MAX_WAIT_SECS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_WAIT_SECS, secs
        )));
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
