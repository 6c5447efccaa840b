//! gridline: run-level orchestration for end-to-end UI test suites.
//!
//! Layers over [`gridline_core`]: aggregates per-scenario outcomes into a
//! run summary, derives the externally reachable report URL for the
//! classified environment, and publishes the summary to a webhook.
//!
//! The scenario engine owns one `SessionManager` per worker thread and a
//! single shared [`RunContext`] per run:
//!
//! ```ignore
//! use std::sync::Arc;
//! use gridline::{HarnessConfig, RunContext, ScenarioOutcome, SessionManager};
//!
//! let config = Arc::new(HarnessConfig::from_default_location()?);
//! let run = RunContext::new(config.clone());
//! run.on_run_start();
//!
//! // per scenario, on its worker thread
//! let mut session = SessionManager::new(config.clone());
//! session.acquire().await?;
//! session.goto_app().await?;
//! // ... scenario body ...
//! session.terminate().await?;
//! run.on_scenario_outcome(ScenarioOutcome::Passed);
//!
//! // once, after all workers join
//! let summary = run.on_run_finish().await;
//! ```

pub mod hooks;
pub mod logging;
pub mod notify;
pub mod report;
pub mod run;
pub mod testing;

pub use gridline_core::{
    BrowserFamily, Environment, HarnessConfig, HarnessError, Result, SessionManager,
};
pub use hooks::RunContext;
pub use notify::{NotificationTransport, Notifier, WebhookTransport};
pub use report::{REPORT_URL_NOT_CONFIGURED, ReportSignals, resolve_report_url};
pub use run::{RunAggregator, RunCounters, RunSummary, ScenarioOutcome};
