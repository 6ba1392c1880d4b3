use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Roll up individual service states
    ///
    /// Any degraded service makes the whole report degraded, even when
    /// others are unhealthy; unhealthy only wins when nothing is degraded.
    pub fn aggregate<'a>(statuses: impl IntoIterator<Item = &'a HealthStatus>) -> Self {
        let mut degraded = false;
        let mut unhealthy = false;
        for status in statuses {
            match status {
                Self::Degraded => degraded = true,
                Self::Unhealthy => unhealthy = true,
                Self::Healthy => {}
            }
        }
        match (unhealthy, degraded) {
            (_, true) => Self::Degraded,
            (true, false) => Self::Unhealthy,
            (false, false) => Self::Healthy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub name: String,
    pub status: HealthStatus,
    pub configured: bool,
    pub last_checked: DateTime<Utc>,
    /// Round-trip time of the check, when one was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub services: BTreeMap<String, ServiceHealth>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

impl HealthReport {
    pub fn new(
        services: BTreeMap<String, ServiceHealth>,
        timestamp: DateTime<Utc>,
        version: impl Into<String>,
        uptime_seconds: u64,
    ) -> Self {
        Self {
            status: HealthStatus::aggregate(services.values().map(|s| &s.status)),
            services,
            timestamp,
            version: version.into(),
            uptime_seconds,
        }
    }

    pub fn healthy_count(&self) -> usize {
        self.services
            .values()
            .filter(|s| s.status == HealthStatus::Healthy)
            .count()
    }
}
