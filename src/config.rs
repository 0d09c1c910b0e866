use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::analysis::PollProfiles;
use crate::cli::Cli;
use crate::models::AnalysisMode;

pub const DEFAULT_API_BASE_URL: &str = "https://api.dataforseo.com/v3";
pub const DEFAULT_PAGESPEED_BASE_URL: &str = "https://www.googleapis.com/pagespeedonline/v5";
pub const DEFAULT_MAX_PAGES: u64 = 10;
pub const DEFAULT_OUTPUT: &str = "text";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u64 = 30;
pub const DEFAULT_ADVANCED_MAX_POLL_ATTEMPTS: u64 = 999_999_999_999_999;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration file structure. Every field is optional so files and
/// environment layers can be partial.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Base URL of the on-page crawling API
    pub api_base_url: Option<String>,

    /// On-page API login
    pub api_login: Option<String>,

    /// On-page API password
    pub api_password: Option<String>,

    /// Base URL of the page-speed API
    pub pagespeed_base_url: Option<String>,

    /// Page-speed API key
    pub pagespeed_api_key: Option<String>,

    /// Maximum number of pages to crawl
    pub max_pages: Option<u64>,

    /// Delay between two status polls, in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Poll attempt ceiling for free mode
    pub max_poll_attempts: Option<u64>,

    /// Poll attempt ceiling for advanced mode
    pub advanced_max_poll_attempts: Option<u64>,

    /// Per-request timeout, in seconds
    pub request_timeout_secs: Option<u64>,

    /// Analysis mode: free or advanced
    pub mode: Option<AnalysisMode>,

    /// Output format: text or json
    pub output: Option<String>,

    /// Save report to file
    pub save: Option<String>,

    /// Verbose output
    pub verbose: Option<bool>,
}

/// Configuration file format based on file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                _ => None,
            })
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a valid number, got '{}'", name, v))
        })
        .transpose()
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let format = ConfigFormat::from_path(path)
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;

        let config = match format {
            ConfigFormat::Json => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            ConfigFormat::Toml => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    /// Get the default configuration file paths to check (in order of priority)
    /// Returns paths in order: current directory, user config directory
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
            for ext in format.extensions() {
                paths.push(PathBuf::from(format!("siteaudit.{}", ext)));
            }
        }

        // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
        let config_home = env::var("XDG_CONFIG_HOME")
            .ok()
            .and_then(|p| {
                if p.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(p))
                }
            })
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        if let Some(config_home) = config_home {
            let app_config_dir = config_home.join("siteaudit");
            for format in &[ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml] {
                for ext in format.extensions() {
                    paths.push(app_config_dir.join(format!("config.{}", ext)));
                }
            }
        }

        paths
    }

    /// Try to load configuration from default paths
    /// Returns the first configuration file found, or None if no config exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        for path in Self::default_paths() {
            if path.exists() {
                return Ok(Some(Self::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Read the `SITEAUDIT_*` environment variables. Empty values count as unset.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: env_string("SITEAUDIT_API_BASE_URL"),
            api_login: env_string("SITEAUDIT_API_LOGIN"),
            api_password: env_string("SITEAUDIT_API_PASSWORD"),
            pagespeed_base_url: env_string("SITEAUDIT_PAGESPEED_BASE_URL"),
            pagespeed_api_key: env_string("SITEAUDIT_PAGESPEED_API_KEY"),
            max_pages: env_parsed("SITEAUDIT_MAX_PAGES")?,
            poll_interval_ms: env_parsed("SITEAUDIT_POLL_INTERVAL_MS")?,
            max_poll_attempts: env_parsed("SITEAUDIT_MAX_POLL_ATTEMPTS")?,
            advanced_max_poll_attempts: env_parsed("SITEAUDIT_ADVANCED_MAX_POLL_ATTEMPTS")?,
            request_timeout_secs: env_parsed("SITEAUDIT_REQUEST_TIMEOUT_SECS")?,
            mode: None,
            output: None,
            save: None,
            verbose: None,
        })
    }

    /// Layer `other` on top of this configuration; values set in `other` win
    pub fn overlay(self, other: Config) -> Config {
        Config {
            api_base_url: other.api_base_url.or(self.api_base_url),
            api_login: other.api_login.or(self.api_login),
            api_password: other.api_password.or(self.api_password),
            pagespeed_base_url: other.pagespeed_base_url.or(self.pagespeed_base_url),
            pagespeed_api_key: other.pagespeed_api_key.or(self.pagespeed_api_key),
            max_pages: other.max_pages.or(self.max_pages),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            max_poll_attempts: other.max_poll_attempts.or(self.max_poll_attempts),
            advanced_max_poll_attempts: other
                .advanced_max_poll_attempts
                .or(self.advanced_max_poll_attempts),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            mode: other.mode.or(self.mode),
            output: other.output.or(self.output),
            save: other.save.or(self.save),
            verbose: other.verbose.or(self.verbose),
        }
    }

    /// Merge this configuration with CLI arguments. A flag given on the
    /// command line wins over the config file, which wins over the built-in
    /// defaults.
    pub fn merge_with_cli(&self, cli: &Cli) -> RunOptions {
        RunOptions {
            url: cli.url.clone(),
            max_pages: cli.max_pages.or(self.max_pages).unwrap_or(DEFAULT_MAX_PAGES),
            mode: cli.mode.or(self.mode).unwrap_or_default(),
            output: cli
                .output
                .clone()
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            save: cli.save.clone().or_else(|| self.save.clone()),
            verbose: cli.verbose || self.verbose.unwrap_or(false),
            no_progress: cli.no_progress,
        }
    }
}

/// Per-run options after CLI flags have been layered over the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub url: String,
    pub max_pages: u64,
    pub mode: AnalysisMode,
    pub output: String,
    pub save: Option<String>,
    pub verbose: bool,
    pub no_progress: bool,
}

/// Fully resolved API and polling settings, built once at startup and
/// passed by reference from there on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub api_login: String,
    pub api_password: String,
    pub pagespeed_base_url: String,
    pub pagespeed_api_key: Option<String>,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u64,
    pub advanced_max_poll_attempts: u64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_login = config.api_login.clone().context(
            "On-page API login is missing (set SITEAUDIT_API_LOGIN or api_login in the config file)",
        )?;
        let api_password = config.api_password.clone().context(
            "On-page API password is missing (set SITEAUDIT_API_PASSWORD or api_password in the config file)",
        )?;

        let max_poll_attempts = config
            .max_poll_attempts
            .unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS);
        let advanced_max_poll_attempts = config
            .advanced_max_poll_attempts
            .unwrap_or(DEFAULT_ADVANCED_MAX_POLL_ATTEMPTS);
        if max_poll_attempts == 0 || advanced_max_poll_attempts == 0 {
            anyhow::bail!("Poll attempt limits must be greater than zero");
        }
        let request_timeout_secs = config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be greater than zero");
        }

        Ok(Self {
            api_base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_login,
            api_password,
            pagespeed_base_url: config
                .pagespeed_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_PAGESPEED_BASE_URL.to_string()),
            pagespeed_api_key: config.pagespeed_api_key.clone(),
            poll_interval_ms: config.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            max_poll_attempts,
            advanced_max_poll_attempts,
            request_timeout_secs,
        })
    }

    pub fn poll_profiles(&self) -> PollProfiles {
        PollProfiles {
            interval: Duration::from_millis(self.poll_interval_ms),
            free_max_attempts: self.max_poll_attempts,
            advanced_max_attempts: self.advanced_max_poll_attempts,
        }
    }
}
