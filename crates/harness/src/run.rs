//! Run-level outcome aggregation.
//!
//! One [`RunAggregator`] exists per run, shared across scenario worker
//! threads via `Arc`. It is an explicit value mutated through its methods
//! and read once at run end, so it stays testable without a live run.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed,
    Skipped,
}

/// Monotonic counters for one run. Invariant after every recorded outcome:
/// `total == passed + failed + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct RunState {
    counters: RunCounters,
    started_at: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct RunAggregator {
    state: Mutex<RunState>,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset counters and record the start instant. Called once per run.
    pub fn on_run_start(&self) {
        let mut state = self.state.lock();
        state.counters = RunCounters::default();
        state.started_at = Some(Instant::now());
    }

    /// Record one scenario outcome. Called exactly once per scenario, after
    /// that scenario's session teardown has been attempted. Increments are
    /// serialized behind the lock; concurrent completions lose no updates.
    pub fn on_scenario_outcome(&self, outcome: ScenarioOutcome) {
        let mut state = self.state.lock();
        state.counters.total += 1;
        match outcome {
            ScenarioOutcome::Passed => state.counters.passed += 1,
            ScenarioOutcome::Failed => state.counters.failed += 1,
            ScenarioOutcome::Skipped => state.counters.skipped += 1,
        }
    }

    pub fn counters(&self) -> RunCounters {
        self.state.lock().counters
    }

    /// Snapshot for summary construction. A run with zero scenarios yields
    /// all-zero counters, and a run that never started has zero elapsed time.
    pub fn finish(&self) -> (RunCounters, Duration) {
        let state = self.state.lock();
        let elapsed = state.started_at.map(|t| t.elapsed()).unwrap_or_default();
        (state.counters, elapsed)
    }
}

/// Immutable snapshot of one finished run, handed to the notifier.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counters: RunCounters,
    pub duration: Duration,
    pub report_url: String,
}

impl RunSummary {
    /// The run's outcome is decided by scenario counters, nothing else.
    pub fn passed(&self) -> bool {
        self.counters.failed == 0
    }

    /// `"2 min, 13 sec"`, the shape the notification message carries.
    pub fn format_duration(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{} min, {} sec", secs / 60, secs % 60)
    }
}
