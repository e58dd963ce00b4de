//! # Reservations Runtime
//!
//! In-process machinery around the reservation contracts in
//! `reservations-core`.
//!
//! ## Core Components
//!
//! - **Resource Locks**: one exclusive lock per resource with a bounded wait
//! - **Locking Service**: `register`/`cancel` over any store and ledger, each
//!   call serialized by the resource's lock
//! - **Retry**: caller-side backoff for `Busy`
//! - **Metrics**: Prometheus counters and histograms for every call
//! - **Health**: component health checks for readiness probes
//!
//! ## Example
//!
//! ```ignore
//! use reservations_runtime::LockingReservationService;
//! use std::time::Duration;
//!
//! let service = LockingReservationService::new(store, ledger, Duration::from_secs(2));
//! let reservation = service.register(resource_id, subject_id, clock.now()).await?;
//! ```

/// Per-resource locks with a bounded wait
pub mod locks;

/// Lock-serialized reservation service
pub mod service;

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

pub use locks::{ResourceGuard, ResourceLocks};
pub use service::{LockingReservationService, log_rejection};

use serde::Serialize;

/// Health check status levels
///
/// Indicates the current health state of a component or system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,

    /// Component is operational but experiencing issues
    Degraded,

    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if status is unhealthy
    #[must_use]
    pub const fn is_unhealthy(self) -> bool {
        matches!(self, Self::Unhealthy)
    }

    /// Get the worst status between two statuses
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Name of the component being checked
    pub component: String,

    /// Current health status
    pub status: HealthStatus,

    /// Optional message providing details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Optional metadata (e.g., latency, pool size)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
            metadata: Vec::new(),
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Create a degraded check result: working, but outside its normal envelope
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Add metadata to the health check
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Aggregated health report
///
/// Combines multiple health checks into an overall system status.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall system status (worst of all checks)
    pub status: HealthStatus,

    /// Individual component checks
    pub checks: Vec<HealthCheck>,

    /// Timestamp when report was generated
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    /// Create a new health report from checks
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self {
            status,
            checks,
            timestamp,
        }
    }

    /// Check if overall system is unhealthy
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        self.status.is_unhealthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_takes_worst_status() {
        let report = HealthReport::new(
            vec![
                HealthCheck::healthy("locks"),
                HealthCheck::unhealthy("database", "connection refused"),
            ],
            chrono::Utc::now(),
        );
        assert!(report.is_unhealthy());
        assert_eq!(report.status.to_string(), "unhealthy");
    }

    #[test]
    fn degraded_check_degrades_the_report() {
        let report = HealthReport::new(
            vec![
                HealthCheck::healthy("locks"),
                HealthCheck::degraded("database", "slow ping").with_metadata("latency_ms", "900"),
            ],
            chrono::Utc::now(),
        );
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.is_unhealthy());

        let json = serde_json::to_value(&report.checks[1]).unwrap_or_default();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["metadata"][0][0], "latency_ms");
        assert_eq!(json["metadata"][0][1], "900");
    }

    #[test]
    fn empty_report_is_healthy() {
        let report = HealthReport::new(Vec::new(), chrono::Utc::now());
        assert!(report.status.is_healthy());
    }

    #[test]
    fn check_serializes_without_empty_fields() {
        let json = serde_json::to_value(HealthCheck::healthy("database")).unwrap_or_default();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("message").is_none());
        assert!(json.get("metadata").is_none());
    }
}
