//! Run boundary facade for the scenario engine.
//!
//! One [`RunContext`] per run, shared across scenario worker threads; one
//! `SessionManager` per thread. The engine calls `on_run_start()` once,
//! then per scenario `acquire()`/`goto_app()` before the body and
//! `terminate()` after, records the outcome with `on_scenario_outcome()`
//! exactly once per scenario (after teardown was attempted), and finally
//! calls `on_run_finish()` once after all threads have joined.

use std::sync::Arc;

use tracing::info;

use gridline_core::{Environment, HarnessConfig};

use crate::notify::{NotificationTransport, Notifier};
use crate::report::{self, ReportSignals};
use crate::run::{RunAggregator, RunSummary, ScenarioOutcome};

pub struct RunContext {
    config: Arc<HarnessConfig>,
    environment: Environment,
    aggregator: RunAggregator,
    notifier: Notifier,
}

impl RunContext {
    pub fn new(config: Arc<HarnessConfig>) -> Self {
        let notifier = Notifier::from_config(&config);
        Self::assemble(config, Environment::detect(), notifier)
    }

    /// Injection point for tests: fixed environment, recorded deliveries.
    pub fn with_transport(
        config: Arc<HarnessConfig>,
        environment: Environment,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        let notifier = Notifier::with_transport(&config, transport);
        Self::assemble(config, environment, notifier)
    }

    fn assemble(config: Arc<HarnessConfig>, environment: Environment, notifier: Notifier) -> Self {
        Self {
            config,
            environment,
            aggregator: RunAggregator::new(),
            notifier,
        }
    }

    pub fn config(&self) -> &Arc<HarnessConfig> {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn on_run_start(&self) {
        info!(
            target = "gridline",
            environment = self.environment.as_str(),
            browser = %self.config.browser,
            "run started"
        );
        self.aggregator.on_run_start();
    }

    pub fn on_scenario_outcome(&self, outcome: ScenarioOutcome) {
        self.aggregator.on_scenario_outcome(outcome);
    }

    /// Close out the run: generate the report, resolve its URL, build the
    /// immutable summary, notify, return it. Reporting and notification
    /// problems are logged, never raised; the run's pass/fail outcome is
    /// the counters, nothing else.
    pub async fn on_run_finish(&self) -> RunSummary {
        let (counters, duration) = self.aggregator.finish();

        report::write_environment_info(&self.config, self.environment);
        report::generate_report(&self.config).await;
        let report_url = report::resolve_report_url(
            self.environment,
            &self.config,
            &ReportSignals::from_process(),
        )
        .await;

        let summary = RunSummary { counters, duration, report_url };
        info!(
            target = "gridline",
            total = summary.counters.total,
            passed = summary.counters.passed,
            failed = summary.counters.failed,
            skipped = summary.counters.skipped,
            duration = %summary.format_duration(),
            report = %summary.report_url,
            "run finished"
        );

        self.notifier.send(&summary).await;
        summary
    }
}
