use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: &str = "10s";
pub const DEFAULT_RETRIES: usize = 3;

/// Top-level configuration file.
///
/// Example YAML:
/// ```yaml
/// api:
///   base_url: "https://scores.example.org/api"
///   timeout: "15s"
///   retries: 3
/// output:
///   color: auto
/// report:
///   default_year: "2024"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    /// Base URL of the score service, including any path prefix
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout as a human duration ("10s", "1m")
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Attempts for idempotent requests that fail transiently
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_retries() -> usize {
    DEFAULT_RETRIES
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout: default_timeout(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// Year used by `report shooter` when `--year` is not given: "all" or YYYY
    #[serde(default = "default_year")]
    pub default_year: String,
}

fn default_year() -> String {
    "all".to_string()
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            default_year: default_year(),
        }
    }
}
