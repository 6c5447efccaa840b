//! Harness configuration.
//!
//! A single serde-backed JSON file (`gridline.json` by default, overridable
//! via `GRIDLINE_CONFIG`) with camelCase keys. Optional keys carry their
//! defaults in the struct; required keys are validated at the point of use
//! and fail naming the missing key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::caps::BrowserFamily;
use crate::error::{HarnessError, Result};

pub const CONFIG_PATH_VAR: &str = "GRIDLINE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "gridline.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    /// Browser family scenarios run against.
    #[serde(default)]
    pub browser: BrowserFamily,
    /// Request headless rendering even for local runs. Containerized and CI
    /// runs are headless regardless of this flag.
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_implicit_wait_secs")]
    pub implicit_wait_secs: u64,
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
    #[serde(default = "default_window_maximize")]
    pub window_maximize: bool,
    /// Application under test. Required.
    #[serde(default)]
    pub app_url: Option<String>,
    /// Per-family remote execution endpoints, mandatory in containerized/CI
    /// environments.
    #[serde(default)]
    pub remote_endpoints: HashMap<BrowserFamily, String>,
    /// Optional shared grid for local development; unreachable is fine, the
    /// provisioner falls back to a locally launched driver.
    #[serde(default)]
    pub local_endpoint: Option<String>,
    #[serde(default = "default_local_driver_port")]
    pub local_driver_port: u16,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_report_port")]
    pub report_port: u16,
    /// Start a local preview server for the generated report (local runs
    /// only, advisory output).
    #[serde(default)]
    pub report_serve: bool,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_implicit_wait_secs() -> u64 {
    10
}

fn default_page_load_timeout_secs() -> u64 {
    30
}

fn default_window_maximize() -> bool {
    true
}

fn default_local_driver_port() -> u16 {
    9515
}

fn default_report_port() -> u16 {
    8080
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("allure-results")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("allure-report")
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: BrowserFamily::default(),
            headless: false,
            implicit_wait_secs: default_implicit_wait_secs(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            window_maximize: default_window_maximize(),
            app_url: None,
            remote_endpoints: HashMap::new(),
            local_endpoint: None,
            local_driver_port: default_local_driver_port(),
            notifications_enabled: false,
            webhook_url: None,
            report_port: default_report_port(),
            report_serve: false,
            results_dir: default_results_dir(),
            report_dir: default_report_dir(),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            HarnessError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load from `GRIDLINE_CONFIG` if set, `gridline.json` otherwise.
    pub fn from_default_location() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(&path)
    }

    pub fn app_url(&self) -> Result<&str> {
        self.app_url
            .as_deref()
            .ok_or_else(|| HarnessError::MissingConfig("appUrl".to_string()))
    }

    pub fn remote_endpoint(&self, family: BrowserFamily) -> Result<&str> {
        self.remote_endpoints
            .get(&family)
            .map(String::as_str)
            .ok_or_else(|| {
                HarnessError::MissingConfig(format!("remoteEndpoints.{family}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let config = HarnessConfig::default();
        assert_eq!(config.browser, BrowserFamily::Chrome);
        assert!(!config.headless);
        assert_eq!(config.implicit_wait_secs, 10);
        assert_eq!(config.page_load_timeout_secs, 30);
        assert!(config.window_maximize);
        assert_eq!(config.local_driver_port, 9515);
        assert_eq!(config.report_port, 8080);
        assert_eq!(config.results_dir, PathBuf::from("allure-results"));
    }

    #[test]
    fn missing_app_url_names_the_key() {
        let config = HarnessConfig::default();
        let err = config.app_url().unwrap_err();
        assert!(matches!(err, HarnessError::MissingConfig(ref key) if key == "appUrl"));
    }

    #[test]
    fn missing_remote_endpoint_names_the_key() {
        let config = HarnessConfig::default();
        let err = config.remote_endpoint(BrowserFamily::Firefox).unwrap_err();
        assert!(
            matches!(err, HarnessError::MissingConfig(ref key) if key == "remoteEndpoints.firefox")
        );
    }

    #[test]
    fn parses_camel_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridline.json");
        fs::write(
            &path,
            r#"{
                "browser": "firefox",
                "appUrl": "https://app.example.com",
                "remoteEndpoints": { "firefox": "http://grid:4444" },
                "implicitWaitSecs": 5,
                "notificationsEnabled": true,
                "webhookUrl": "https://hooks.example.com/T0/B0"
            }"#,
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.browser, BrowserFamily::Firefox);
        assert_eq!(config.app_url().unwrap(), "https://app.example.com");
        assert_eq!(
            config.remote_endpoint(BrowserFamily::Firefox).unwrap(),
            "http://grid:4444"
        );
        assert_eq!(config.implicit_wait_secs, 5);
        assert!(config.notifications_enabled);
    }

    #[test]
    fn unknown_browser_is_rejected() {
        let result: std::result::Result<HarnessConfig, _> =
            serde_json::from_str(r#"{ "browser": "netscape" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = HarnessConfig::load(Path::new("/nonexistent/gridline.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
