//! Report generation and URL resolution.
//!
//! The static report is produced by invoking the external `allure` tool as
//! a subprocess; the URL under which that report is reachable depends
//! entirely on the classified environment. Everything in this module is
//! best-effort: reporting problems are logged and never escalate to
//! test-run failure.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use gridline_core::{Environment, HarnessConfig};

/// Sentinel returned when CI provides no usable identifiers. Displayable,
/// never an error.
pub const REPORT_URL_NOT_CONFIGURED: &str = "report URL not configured";

/// Grace period after spawning the preview server. Its address is advisory
/// output only, so this is a fixed short wait, not a readiness poll.
const PREVIEW_GRACE: Duration = Duration::from_secs(3);

/// Process-environment signals consumed by URL resolution, separated out so
/// the resolution policy stays testable.
#[derive(Debug, Clone, Default)]
pub struct ReportSignals {
    /// `GITHUB_REPOSITORY_OWNER`
    pub owner: Option<String>,
    /// `GITHUB_REPOSITORY`, in `owner/name` form
    pub repository: Option<String>,
    /// `GITHUB_RUN_ID`
    pub run_id: Option<String>,
    /// `ALLURE_REPORT_URL`, an externally reachable override for
    /// containerized runs
    pub url_override: Option<String>,
}

impl ReportSignals {
    pub fn from_process() -> Self {
        Self {
            owner: env_value("GITHUB_REPOSITORY_OWNER"),
            repository: env_value("GITHUB_REPOSITORY"),
            run_id: env_value("GITHUB_RUN_ID"),
            url_override: env_value("ALLURE_REPORT_URL"),
        }
    }

    pub fn from_parts(
        owner: Option<&str>,
        repository: Option<&str>,
        run_id: Option<&str>,
    ) -> Self {
        Self {
            owner: owner.map(String::from),
            repository: repository.map(String::from),
            run_id: run_id.map(String::from),
            url_override: None,
        }
    }
}

/// Derive the externally reachable report location. Never fails; always
/// returns a displayable string.
pub async fn resolve_report_url(
    environment: Environment,
    config: &HarnessConfig,
    signals: &ReportSignals,
) -> String {
    match environment {
        Environment::Ci => ci_report_url(signals),
        Environment::Containerized => signals
            .url_override
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", config.report_port)),
        Environment::Local => local_report_url(config).await,
    }
}

/// Hosted-pages URL when owner and repository are known, the run console as
/// a fallback, the sentinel when CI tells us nothing.
fn ci_report_url(signals: &ReportSignals) -> String {
    if let (Some(owner), Some(repository)) = (signals.owner.as_deref(), signals.repository.as_deref())
    {
        let repo = short_repo_name(repository);
        return format!("https://{owner}.github.io/{repo}/allure-report");
    }
    if let (Some(repository), Some(run_id)) =
        (signals.repository.as_deref(), signals.run_id.as_deref())
    {
        return format!("https://github.com/{repository}/actions/runs/{run_id}");
    }
    REPORT_URL_NOT_CONFIGURED.to_string()
}

/// `owner/name` → `name`.
fn short_repo_name(repository: &str) -> &str {
    repository.rsplit('/').next().unwrap_or(repository)
}

async fn local_report_url(config: &HarnessConfig) -> String {
    if config.report_serve {
        spawn_preview_server(config);
        tokio::time::sleep(PREVIEW_GRACE).await;
        return format!("http://localhost:{}", config.report_port);
    }

    let index = config.report_dir.join("index.html");
    let absolute = std::path::absolute(&index).unwrap_or(index);
    format!("file://{}", absolute.display())
}

/// Detached `allure open`. Nothing consults the child again; later steps do
/// not depend on the server being up.
fn spawn_preview_server(config: &HarnessConfig) {
    let spawned = Command::new("allure")
        .arg("open")
        .arg(&config.report_dir)
        .arg("--port")
        .arg(config.report_port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_child) => {
            info!(target = "gridline", port = config.report_port, "report preview server starting")
        }
        Err(error) => {
            warn!(target = "gridline", %error, "failed to start report preview server")
        }
    }
}

/// Generate the static report from collected results. A non-zero exit or a
/// missing binary is logged, not fatal.
pub async fn generate_report(config: &HarnessConfig) {
    debug!(
        target = "gridline",
        results = %config.results_dir.display(),
        "generating report"
    );
    let status = Command::new("allure")
        .arg("generate")
        .arg(&config.results_dir)
        .arg("--clean")
        .arg("-o")
        .arg(&config.report_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => {
            info!(target = "gridline", report = %config.report_dir.display(), "report generated");
        }
        Ok(status) => warn!(target = "gridline", ?status, "report generation failed"),
        Err(error) => warn!(target = "gridline", %error, "report generation could not run"),
    }
}

/// Environment block the report surfaces alongside results. Written before
/// generation; failures are logged, never fatal.
pub fn write_environment_info(config: &HarnessConfig, environment: Environment) {
    let path = config.results_dir.join("environment.properties");
    let content = format!(
        "browser={}\nenvironment={}\nos={}\n",
        config.browser,
        environment.as_str(),
        std::env::consts::OS,
    );
    let written = std::fs::create_dir_all(&config.results_dir)
        .and_then(|_| std::fs::write(&path, content));
    if let Err(error) = written {
        warn!(target = "gridline", %error, path = %path.display(), "failed to write environment info");
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ci_url_contains_owner_and_repo() {
        let config = HarnessConfig::default();
        let signals = ReportSignals::from_parts(Some("acme"), Some("acme/site"), None);
        let url = resolve_report_url(Environment::Ci, &config, &signals).await;
        assert!(url.contains("acme"));
        assert!(url.contains("site"));
        assert!(!url.contains("not configured"));
        assert_eq!(url, "https://acme.github.io/site/allure-report");
    }

    #[tokio::test]
    async fn ci_falls_back_to_run_console() {
        let config = HarnessConfig::default();
        let signals = ReportSignals::from_parts(None, Some("acme/site"), Some("12345"));
        let url = resolve_report_url(Environment::Ci, &config, &signals).await;
        assert_eq!(url, "https://github.com/acme/site/actions/runs/12345");
    }

    #[tokio::test]
    async fn ci_without_identifiers_returns_sentinel() {
        let config = HarnessConfig::default();
        let signals = ReportSignals::default();
        let url = resolve_report_url(Environment::Ci, &config, &signals).await;
        assert_eq!(url, REPORT_URL_NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn containerized_honors_override() {
        let config = HarnessConfig::default();
        let signals = ReportSignals {
            url_override: Some("http://reports.internal:9090".to_string()),
            ..ReportSignals::default()
        };
        let url = resolve_report_url(Environment::Containerized, &config, &signals).await;
        assert_eq!(url, "http://reports.internal:9090");
    }

    #[tokio::test]
    async fn containerized_defaults_to_report_port() {
        let config = HarnessConfig::default();
        let url =
            resolve_report_url(Environment::Containerized, &config, &ReportSignals::default())
                .await;
        assert_eq!(url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn local_returns_file_url_to_static_report() {
        let config = HarnessConfig::default();
        let url = resolve_report_url(Environment::Local, &config, &ReportSignals::default()).await;
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("index.html"));
    }

    #[test]
    fn repo_name_is_stripped_of_owner() {
        assert_eq!(short_repo_name("acme/site"), "site");
        assert_eq!(short_repo_name("site"), "site");
    }

    #[test]
    fn environment_info_lands_in_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig {
            results_dir: dir.path().join("allure-results"),
            ..HarnessConfig::default()
        };
        write_environment_info(&config, Environment::Local);

        let content =
            std::fs::read_to_string(config.results_dir.join("environment.properties")).unwrap();
        assert!(content.contains("browser=chrome"));
        assert!(content.contains("environment=local"));
    }
}
