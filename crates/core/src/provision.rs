//! Session provisioning.
//!
//! Resolves, for the classified environment and configured browser family,
//! how a live WebDriver session is obtained:
//!
//! - Containerized / CI: connect to the family's configured remote endpoint.
//!   Remote execution is mandatory there, so a connection failure is fatal
//!   with no fallback.
//! - Local: try the optional shared grid first, then silently fall back to
//!   spawning the family's driver binary and connecting to it. Local
//!   development must not require a grid to be running.

use std::process::Stdio;
use std::time::Duration;

use thirtyfour::WebDriver;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::caps;
use crate::config::HarnessConfig;
use crate::environ::Environment;
use crate::error::{HarnessError, Result};

/// Bounded readiness wait for a freshly spawned driver process.
const LOCAL_CONNECT_ATTEMPTS: u32 = 20;
const LOCAL_CONNECT_DELAY: Duration = Duration::from_millis(250);

/// A fully initialized session: timeouts applied, window sized, plus the
/// locally spawned driver process when one was needed.
pub struct ProvisionedSession {
    pub driver: WebDriver,
    pub driver_process: Option<Child>,
    pub headless: bool,
}

pub async fn provision(
    config: &HarnessConfig,
    environment: Environment,
) -> Result<ProvisionedSession> {
    let family = config.browser;
    let headless = caps::headless_for(environment, config);

    let (driver, driver_process) = if environment.is_remote_mandatory() {
        let endpoint = config.remote_endpoint(family)?;
        debug!(
            target = "gridline",
            endpoint,
            browser = %family,
            "connecting to remote endpoint"
        );
        let capabilities = caps::build(family, environment, config)?;
        let driver = WebDriver::new(endpoint, capabilities)
            .await
            .map_err(|source| HarnessError::RemoteConnection {
                url: endpoint.to_string(),
                source,
            })?;
        (driver, None)
    } else {
        match local_grid_session(config, environment).await {
            Some(driver) => (driver, None),
            None => local_launch(config, environment).await?,
        }
    };

    driver
        .set_implicit_wait_timeout(Duration::from_secs(config.implicit_wait_secs))
        .await?;
    driver
        .set_page_load_timeout(Duration::from_secs(config.page_load_timeout_secs))
        .await?;
    if config.window_maximize && !headless {
        driver.maximize_window().await?;
    }

    Ok(ProvisionedSession { driver, driver_process, headless })
}

/// Optional shared grid for local development. Any failure here is
/// recoverable; the caller falls back to a local driver launch.
async fn local_grid_session(
    config: &HarnessConfig,
    environment: Environment,
) -> Option<WebDriver> {
    let endpoint = config.local_endpoint.as_deref()?;
    let capabilities = caps::build(config.browser, environment, config).ok()?;
    match WebDriver::new(endpoint, capabilities).await {
        Ok(driver) => {
            info!(target = "gridline", endpoint, "connected to local grid");
            Some(driver)
        }
        Err(error) => {
            warn!(
                target = "gridline",
                endpoint,
                %error,
                "local grid unreachable, falling back to local driver"
            );
            None
        }
    }
}

async fn local_launch(
    config: &HarnessConfig,
    environment: Environment,
) -> Result<(WebDriver, Option<Child>)> {
    let binary = config.browser.driver_binary();
    let port = config.local_driver_port;
    debug!(target = "gridline", binary, port, "launching local driver");

    let child = Command::new(binary)
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| HarnessError::LocalLaunch(format!("failed to spawn {binary}: {e}")))?;

    let endpoint = format!("http://localhost:{port}");
    let driver = connect_with_retry(&endpoint, config, environment).await?;
    Ok((driver, Some(child)))
}

/// The driver process needs a moment to bind its port; retry the session
/// request until it answers or the retries run out.
async fn connect_with_retry(
    endpoint: &str,
    config: &HarnessConfig,
    environment: Environment,
) -> Result<WebDriver> {
    let mut last_error = None;
    for _ in 0..LOCAL_CONNECT_ATTEMPTS {
        let capabilities = caps::build(config.browser, environment, config)?;
        match WebDriver::new(endpoint, capabilities).await {
            Ok(driver) => return Ok(driver),
            Err(error) => {
                last_error = Some(error);
                tokio::time::sleep(LOCAL_CONNECT_DELAY).await;
            }
        }
    }

    Err(HarnessError::LocalLaunch(match last_error {
        Some(error) => format!("driver at {endpoint} never became ready: {error}"),
        None => format!("driver at {endpoint} never became ready"),
    }))
}
