mod init;
mod schema;

pub use init::{prompt_yes_no, run_init_wizard};
pub use schema::{ApiSettings, ColorMode, Config, OutputSettings, ReportSettings};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::YearFilter;

/// Get the config directory path (~/.config/scorebook/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("scorebook")
}

/// Get the default config file path (~/.config/scorebook/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be read, or is not
/// valid YAML for [`Config`].
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `scorebook init` to create one.",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Parse the configured request timeout.
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|e| format!("invalid duration '{}': {}", value, e))?;
    if duration.is_zero() {
        return Err("must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Validate a loaded configuration.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push("api.base_url: must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(format!(
            "api.base_url: '{}' must start with http:// or https://",
            base_url
        ));
    }

    if let Err(e) = parse_timeout(&config.api.timeout) {
        errors.push(format!("api.timeout: {}", e));
    }

    if config.api.retries == 0 {
        errors.push("api.retries: must be at least 1".to_string());
    }

    if let Err(e) = config.report.default_year.parse::<YearFilter>() {
        errors.push(format!("report.default_year: {}", e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
