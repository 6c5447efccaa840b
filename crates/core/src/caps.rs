//! Per-family capability construction.
//!
//! Every session gets password-manager, autofill, and notification UI
//! suppression: those surfaces pop non-deterministically and block
//! automation. Containerized and CI sessions additionally render headless
//! with the sandbox disabled, since container images usually lack the
//! privileges sandboxed rendering needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thirtyfour::common::capabilities::firefox::FirefoxPreferences;
use thirtyfour::{Capabilities, ChromiumLikeCapabilities, DesiredCapabilities};

use crate::config::HarnessConfig;
use crate::environ::Environment;
use crate::error::{HarnessError, Result};

/// Supported automation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    #[default]
    Chrome,
    Firefox,
    Edge,
}

impl BrowserFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "chrome",
            BrowserFamily::Firefox => "firefox",
            BrowserFamily::Edge => "edge",
        }
    }

    /// Driver binary launched for local fallback sessions.
    pub fn driver_binary(self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "chromedriver",
            BrowserFamily::Firefox => "geckodriver",
            BrowserFamily::Edge => "msedgedriver",
        }
    }
}

impl fmt::Display for BrowserFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserFamily {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserFamily::Chrome),
            "firefox" => Ok(BrowserFamily::Firefox),
            "edge" => Ok(BrowserFamily::Edge),
            other => Err(HarnessError::UnsupportedTarget(other.to_string())),
        }
    }
}

/// Whether sessions for this environment render headless.
pub fn headless_for(environment: Environment, config: &HarnessConfig) -> bool {
    environment.is_remote_mandatory() || config.headless
}

/// Build a fresh capability set for `family` in `environment`. The returned
/// value is never mutated after construction; callers hand it straight to
/// session creation.
pub fn build(
    family: BrowserFamily,
    environment: Environment,
    config: &HarnessConfig,
) -> Result<Capabilities> {
    let headless = headless_for(environment, config);

    let capabilities = match family {
        BrowserFamily::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            apply_chromium_options(&mut caps, environment, headless)?;
            caps.into()
        }
        BrowserFamily::Edge => {
            let mut caps = DesiredCapabilities::edge();
            apply_chromium_options(&mut caps, environment, headless)?;
            caps.into()
        }
        BrowserFamily::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            let mut prefs = FirefoxPreferences::new();
            prefs.set("signon.rememberSignons", false)?;
            prefs.set("dom.webnotifications.enabled", false)?;
            prefs.set("extensions.formautofill.addresses.enabled", false)?;
            prefs.set("extensions.formautofill.creditCards.enabled", false)?;
            caps.set_preferences(prefs)?;
            if headless {
                caps.add_arg("-headless")?;
            }
            caps.into()
        }
    };

    Ok(capabilities)
}

fn apply_chromium_options(
    caps: &mut impl ChromiumLikeCapabilities,
    environment: Environment,
    headless: bool,
) -> Result<()> {
    caps.add_arg("--disable-notifications")?;
    caps.add_arg("--disable-save-password-bubble")?;
    caps.add_arg("--disable-blink-features=AutomationControlled")?;
    caps.add_experimental_option(
        "prefs",
        json!({
            "credentials_enable_service": false,
            "profile.password_manager_enabled": false,
            "autofill.profile_enabled": false,
            "autofill.credit_card_enabled": false,
            "profile.default_content_setting_values.notifications": 2,
        }),
    )?;
    if headless {
        caps.add_arg("--headless=new")?;
    }
    if environment.is_remote_mandatory() {
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(value: &serde_json::Value, options_key: &str) -> Vec<String> {
        value[options_key]["args"]
            .as_array()
            .map(|args| {
                args.iter()
                    .filter_map(|a| a.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn containerized_chrome_is_headless_and_unsandboxed() {
        let config = HarnessConfig::default();
        let caps = build(BrowserFamily::Chrome, Environment::Containerized, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        let args = args_of(&value, "goog:chromeOptions");
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a == "--disable-dev-shm-usage"));
    }

    #[test]
    fn local_chrome_is_headed_by_default() {
        let config = HarnessConfig::default();
        let caps = build(BrowserFamily::Chrome, Environment::Local, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        let args = args_of(&value, "goog:chromeOptions");
        assert!(!args.iter().any(|a| a == "--headless=new"));
        assert!(!args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn local_headless_override_is_honored() {
        let config = HarnessConfig { headless: true, ..HarnessConfig::default() };
        let caps = build(BrowserFamily::Chrome, Environment::Local, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        assert!(args_of(&value, "goog:chromeOptions").iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn chrome_suppresses_password_manager_and_notifications() {
        let config = HarnessConfig::default();
        let caps = build(BrowserFamily::Chrome, Environment::Local, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        let prefs = &value["goog:chromeOptions"]["prefs"];
        assert_eq!(prefs["credentials_enable_service"], json!(false));
        assert_eq!(prefs["profile.password_manager_enabled"], json!(false));
        assert_eq!(
            prefs["profile.default_content_setting_values.notifications"],
            json!(2)
        );
    }

    #[test]
    fn firefox_headless_only_in_container() {
        let config = HarnessConfig::default();

        let local = build(BrowserFamily::Firefox, Environment::Local, &config).unwrap();
        let local = serde_json::to_value(&local).unwrap();
        assert!(!args_of(&local, "moz:firefoxOptions").iter().any(|a| a == "-headless"));

        let ci = build(BrowserFamily::Firefox, Environment::Ci, &config).unwrap();
        let ci = serde_json::to_value(&ci).unwrap();
        assert!(args_of(&ci, "moz:firefoxOptions").iter().any(|a| a == "-headless"));
    }

    #[test]
    fn firefox_suppresses_password_prompts() {
        let config = HarnessConfig::default();
        let caps = build(BrowserFamily::Firefox, Environment::Local, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        let prefs = &value["moz:firefoxOptions"]["prefs"];
        assert_eq!(prefs["signon.rememberSignons"], json!(false));
        assert_eq!(prefs["dom.webnotifications.enabled"], json!(false));
    }

    #[test]
    fn edge_gets_chromium_treatment() {
        let config = HarnessConfig::default();
        let caps = build(BrowserFamily::Edge, Environment::Ci, &config).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        let args = args_of(&value, "ms:edgeOptions");
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn unknown_family_is_unsupported() {
        let err = "netscape".parse::<BrowserFamily>().unwrap_err();
        assert!(matches!(err, HarnessError::UnsupportedTarget(ref name) if name == "netscape"));
    }

    #[test]
    fn family_round_trips_through_str() {
        for family in [BrowserFamily::Chrome, BrowserFamily::Firefox, BrowserFamily::Edge] {
            assert_eq!(family.as_str().parse::<BrowserFamily>().unwrap(), family);
        }
    }
}
