use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::schema::{DEFAULT_API_URL, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use super::{get_config_path, parse_timeout, validate_config, ApiSettings, ColorMode, Config};
use crate::config::{OutputSettings, ReportSettings};
use crate::scoring::YearFilter;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
pub fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn parse_color_mode(input: &str) -> Option<ColorMode> {
    match input.trim().to_lowercase().as_str() {
        "auto" => Some(ColorMode::Auto),
        "always" => Some(ColorMode::Always),
        "never" => Some(ColorMode::Never),
        _ => None,
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Scorebook Configuration Wizard");
    println!("==============================");
    println!();

    println!("Scorebook talks to a score service over HTTP. Enter the base URL of its API,");
    println!("including any path prefix (e.g. https://scores.example.org/api).");
    let base_url = loop {
        let input = prompt_with_default("API base URL", DEFAULT_API_URL)?;
        if input.starts_with("http://") || input.starts_with("https://") {
            break input.trim_end_matches('/').to_string();
        }
        println!("  Invalid: must start with http:// or https://. Try again.");
    };

    println!();
    let timeout = loop {
        let input = prompt_with_default("Request timeout (e.g. 10s, 1m)", DEFAULT_TIMEOUT)?;
        match parse_timeout(&input) {
            Ok(_) => break input,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    let retries = loop {
        let input = prompt_with_default("Attempts for failed reads", &DEFAULT_RETRIES.to_string())?;
        match input.parse::<usize>() {
            Ok(n) if n >= 1 => break n,
            _ => println!("  Invalid: must be a whole number of at least 1. Try again."),
        }
    };

    println!();
    let color = loop {
        let input = prompt_with_default("Color output (auto, always, never)", "auto")?;
        match parse_color_mode(&input) {
            Some(mode) => break mode,
            None => println!("  Invalid: expected auto, always or never. Try again."),
        }
    };

    println!();
    println!("Shooter reports can default to a single season. Use 'all' for every year.");
    let default_year = loop {
        let input = prompt_with_default("Default report year", "all")?;
        match input.parse::<YearFilter>() {
            Ok(filter) => break filter.to_string(),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    let config = Config {
        api: ApiSettings {
            base_url,
            timeout,
            retries,
        },
        output: OutputSettings { color },
        report: ReportSettings { default_year },
    };

    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Generated config is invalid:\n  {}", errors.join("\n  "));
    }

    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `scorebook login` to sign in.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_mode() {
        assert_eq!(parse_color_mode("Always"), Some(ColorMode::Always));
        assert_eq!(parse_color_mode(" never "), Some(ColorMode::Never));
        assert_eq!(parse_color_mode("auto"), Some(ColorMode::Auto));
        assert_eq!(parse_color_mode("sometimes"), None);
    }
}
