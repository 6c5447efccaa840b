//! Execution environment classification.
//!
//! Everything downstream (capability construction, connection strategy,
//! report URL derivation) branches on one canonical classification computed
//! here, instead of re-deriving environment state from ad-hoc signal sets.

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

/// Where the test process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Local,
    Containerized,
    Ci,
}

impl Environment {
    /// Classify the current process environment. Computed once and cached;
    /// repeated calls within the same process return the same value.
    pub fn detect() -> Environment {
        static DETECTED: OnceLock<Environment> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let environment = classify(&EnvSignals::from_process());
            debug!(target = "gridline", ?environment, "classified execution environment");
            environment
        })
    }

    /// Containerized and CI runs must use a remote execution endpoint; there
    /// is no local-launch fallback for them.
    pub fn is_remote_mandatory(self) -> bool {
        matches!(self, Environment::Containerized | Environment::Ci)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Containerized => "containerized",
            Environment::Ci => "ci",
        }
    }
}

/// Raw process signals the classifier consumes, separated from the decision
/// so the decision stays a pure function.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSignals {
    /// A CI marker variable (`GITHUB_ACTIONS` or `CI`) is present.
    pub ci_marker: bool,
    /// A container marker is present: `/.dockerenv`, `/run/.containerenv`,
    /// or the `CONTAINER` variable. A configured grid address is NOT a
    /// container signal; it is connection configuration.
    pub container_marker: bool,
}

impl EnvSignals {
    pub fn from_process() -> Self {
        Self {
            ci_marker: env_present("GITHUB_ACTIONS") || env_present("CI"),
            container_marker: Path::new("/.dockerenv").exists()
                || Path::new("/run/.containerenv").exists()
                || env_present("CONTAINER"),
        }
    }
}

/// First match wins. CI outranks Containerized because CI images frequently
/// run inside containers and CI status decides the report URL strategy.
pub fn classify(signals: &EnvSignals) -> Environment {
    if signals.ci_marker {
        Environment::Ci
    } else if signals.container_marker {
        Environment::Containerized
    } else {
        Environment::Local
    }
}

fn env_present(key: &str) -> bool {
    std::env::var_os(key).is_some_and(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ci_marker_wins_over_container_marker() {
        let signals = EnvSignals { ci_marker: true, container_marker: true };
        assert_eq!(classify(&signals), Environment::Ci);
    }

    #[test]
    fn container_marker_without_ci_is_containerized() {
        let signals = EnvSignals { ci_marker: false, container_marker: true };
        assert_eq!(classify(&signals), Environment::Containerized);
    }

    #[test]
    fn no_markers_is_local() {
        assert_eq!(classify(&EnvSignals::default()), Environment::Local);
    }

    #[test]
    fn detect_is_idempotent() {
        assert_eq!(Environment::detect(), Environment::detect());
    }

    #[test]
    fn remote_is_mandatory_outside_local() {
        assert!(!Environment::Local.is_remote_mandatory());
        assert!(Environment::Containerized.is_remote_mandatory());
        assert!(Environment::Ci.is_remote_mandatory());
    }
}
