//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Environment variable overriding `target.base_url`
pub const BASE_URL_ENV: &str = "STOREFRONT_E2E_BASE_URL";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Application under test
    #[serde(default)]
    pub target: TargetConfig,

    /// Browser and WebDriver settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Application under test
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Base URL that relative navigation targets are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5173".to_string()
}

/// Browser and WebDriver settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// WebDriver endpoint
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Spawn chromedriver when nothing answers at `webdriver_url`
    #[serde(default = "default_true")]
    pub spawn_driver: bool,

    /// Explicit driver binary; falls back to `chromedriver` on PATH
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Extra browser command line arguments
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            spawn_driver: true,
            driver_path: None,
            headless: true,
            args: default_browser_args(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_true() -> bool {
    true
}

fn default_browser_args() -> Vec<String> {
    [
        "--window-size=1280,720",
        "--disable-dev-shm-usage",
        "--ipc=host",
        "--single-process",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl BrowserConfig {
    /// Port the driver should listen on, taken from `webdriver_url`
    pub fn driver_port(&self) -> Option<u16> {
        reqwest::Url::parse(&self.webdriver_url)
            .ok()
            .and_then(|url| url.port_or_known_default())
    }
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Default budget for interactions and element waits
    #[serde(default = "default_step")]
    pub default_ms: u64,

    /// Budget for page navigation
    #[serde(default = "default_navigation")]
    pub navigation_ms: u64,

    /// Budget for load-state waits
    #[serde(default = "default_load_state")]
    pub load_state_ms: u64,

    /// Delay before re-resolving a locator whose action failed
    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    /// Interval between visibility/actionability checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Advisory wall-clock budget for a whole scenario
    #[serde(default = "default_budget")]
    pub budget_ms: u64,

    /// How long to wait for a spawned driver to answer
    #[serde(default = "default_driver_startup")]
    pub driver_startup_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: default_step(),
            navigation_ms: default_navigation(),
            load_state_ms: default_load_state(),
            settle_ms: default_settle(),
            poll_interval_ms: default_poll_interval(),
            budget_ms: default_budget(),
            driver_startup_secs: default_driver_startup(),
        }
    }
}

fn default_step() -> u64 {
    5000
}
fn default_navigation() -> u64 {
    10_000
}
fn default_load_state() -> u64 {
    3000
}
fn default_settle() -> u64 {
    3000
}
fn default_poll_interval() -> u64 {
    100
}
fn default_budget() -> u64 {
    120_000
}
fn default_driver_startup() -> u64 {
    10
}

impl Timeouts {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn load_state_timeout(&self) -> Duration {
        Duration::from_millis(self.load_state_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn driver_startup(&self) -> Duration {
        Duration::from_secs(self.driver_startup_secs)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. The base URL
    /// environment override is applied either way.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.target.base_url).map_err(|e| {
            super::Error::Config(format!(
                "target.base_url '{}' is not a valid URL: {}",
                self.target.base_url, e
            ))
        })?;
        reqwest::Url::parse(&self.browser.webdriver_url).map_err(|e| {
            super::Error::Config(format!(
                "browser.webdriver_url '{}' is not a valid URL: {}",
                self.browser.webdriver_url, e
            ))
        })?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                tracing::debug!(%base_url, "Base URL overridden from environment");
                self.target.base_url = base_url.trim().to_string();
            }
        }
    }
}
