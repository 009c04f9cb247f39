//! Health-check registry and UI-formatted reporting.
//!
//! Checks are registered by name at startup, one per persistence store
//! plus the data-protection keyring, and aggregated on demand into the
//! JSON document the `/health` endpoint serves.
//!
//! # Report shape
//!
//! ```json
//! {
//!   "status": "Healthy",
//!   "totalDuration": "00:00:00.0001230",
//!   "entries": {
//!     "identity": { "status": "Healthy", "duration": "00:00:00.0000120" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Outcome of a single health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// The dependency is ready.
    Healthy,
    /// The dependency is not ready.
    Unhealthy {
        /// Why the check failed.
        reason: String,
    },
}

impl CheckStatus {
    /// Creates an unhealthy status with a reason.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self::Unhealthy {
            reason: reason.into(),
        }
    }

    /// Whether this status is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Unhealthy { .. } => "Unhealthy",
        }
    }
}

type CheckFn = Arc<dyn Fn() -> CheckStatus + Send + Sync>;

/// A named set of health checks, fixed after startup.
#[derive(Clone, Default)]
pub struct HealthRegistry {
    checks: Vec<(String, CheckFn)>,
}

impl HealthRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Adds a named check.
    #[must_use]
    pub fn add_check(
        mut self,
        name: impl Into<String>,
        check: impl Fn() -> CheckStatus + Send + Sync + 'static,
    ) -> Self {
        self.checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs every check and aggregates the results.
    ///
    /// The overall status is `Healthy` only when every entry is healthy.
    #[must_use]
    pub fn report(&self) -> HealthReport {
        let started = Instant::now();
        let mut entries = BTreeMap::new();
        let mut healthy = true;

        for (name, check) in &self.checks {
            let check_started = Instant::now();
            let status = check();
            if !status.is_healthy() {
                healthy = false;
            }
            entries.insert(
                name.clone(),
                HealthEntry {
                    status: status.label().to_string(),
                    duration: format_duration(check_started.elapsed()),
                    description: match status {
                        CheckStatus::Healthy => None,
                        CheckStatus::Unhealthy { reason } => Some(reason),
                    },
                },
            );
        }

        HealthReport {
            status: if healthy { "Healthy" } else { "Unhealthy" }.to_string(),
            total_duration: format_duration(started.elapsed()),
            entries,
        }
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthRegistry")
            .field("checks", &self.checks.len())
            .finish()
    }
}

/// Aggregated health report in the UI-consumable shape.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status: `Healthy` or `Unhealthy`.
    pub status: String,
    /// Total time spent running the checks, `hh:mm:ss.fffffff`.
    #[serde(rename = "totalDuration")]
    pub total_duration: String,
    /// Per-check entries, keyed by check name.
    pub entries: BTreeMap<String, HealthEntry>,
}

impl HealthReport {
    /// Whether every entry reported healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "Healthy"
    }
}

/// A single entry of the aggregated report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthEntry {
    /// Entry status: `Healthy` or `Unhealthy`.
    pub status: String,
    /// Time spent in this check, `hh:mm:ss.fffffff`.
    pub duration: String,
    /// Failure reason, present only for unhealthy entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Formats a duration as `hh:mm:ss.fffffff`, the shape health-check UIs
/// expect.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let ticks = duration.subsec_nanos() / 100;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_is_healthy() {
        let report = HealthRegistry::new().report();
        assert!(report.is_healthy());
        assert!(report.entries.is_empty());
    }

    #[test]
    fn test_all_healthy() {
        let registry = HealthRegistry::new()
            .add_check("identity", || CheckStatus::Healthy)
            .add_check("grants", || CheckStatus::Healthy);

        let report = registry.report();
        assert!(report.is_healthy());
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries["identity"].status, "Healthy");
    }

    #[test]
    fn test_single_failure_degrades_overall_status() {
        let registry = HealthRegistry::new()
            .add_check("identity", || CheckStatus::Healthy)
            .add_check("grants", || CheckStatus::unhealthy("connection refused"));

        let report = registry.report();
        assert!(!report.is_healthy());
        assert_eq!(report.status, "Unhealthy");
        assert_eq!(
            report.entries["grants"].description.as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn test_report_serializes_ui_shape() {
        let registry = HealthRegistry::new().add_check("identity", || CheckStatus::Healthy);
        let json = serde_json::to_value(registry.report()).unwrap();

        assert_eq!(json["status"], "Healthy");
        assert!(json["totalDuration"].is_string());
        assert_eq!(json["entries"]["identity"]["status"], "Healthy");
        assert!(json["entries"]["identity"].get("description").is_none());
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(
            format_duration(Duration::from_micros(123)),
            "00:00:00.0001230"
        );
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01.0000000");
    }
}
