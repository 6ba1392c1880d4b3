//! Health report
//!
//! Vendors that are not configured report `unhealthy` with
//! `configured: false`. The database is pinged when configured; a slow
//! round trip is `degraded`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime};

use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use shared::ApiResponse;
use shared::models::{HealthReport, HealthStatus, ServiceHealth};

use crate::state::AppState;

/// Ping slower than this is reported degraded
const DEGRADED_LATENCY: Duration = Duration::from_secs(1);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn router() -> Router<AppState> {
    START_TIME.get_or_init(SystemTime::now);
    Router::new().route("/api/health", get(health))
}

fn service(
    name: &str,
    status: HealthStatus,
    configured: bool,
    now: DateTime<Utc>,
) -> ServiceHealth {
    ServiceHealth {
        name: name.to_string(),
        status,
        configured,
        last_checked: now,
        latency_ms: None,
        error: None,
    }
}

/// Vendor without a live check: healthy exactly when configured
fn vendor(name: &str, configured: bool, now: DateTime<Utc>) -> ServiceHealth {
    let status = if configured {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    let mut health = service(name, status, configured, now);
    if !configured {
        health.error = Some("Not configured".into());
    }
    health
}

async fn check_database(state: &AppState, now: DateTime<Utc>) -> ServiceHealth {
    const NAME: &str = "PostgreSQL Database";
    if !state.database.is_configured() {
        return vendor(NAME, false, now);
    }

    let started = Instant::now();
    let result = tokio::time::timeout(PING_TIMEOUT, state.database.ping()).await;
    let elapsed = started.elapsed();

    let mut health = service(NAME, HealthStatus::Healthy, true, now);
    health.latency_ms = Some(elapsed.as_millis() as u64);
    match result {
        Ok(Ok(())) if elapsed > DEGRADED_LATENCY => health.status = HealthStatus::Degraded,
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database health check failed");
            health.status = HealthStatus::Unhealthy;
            health.error = Some("Database ping failed".into());
        }
        Err(_) => {
            health.status = HealthStatus::Unhealthy;
            health.error = Some("Database ping timed out".into());
        }
    }
    health
}

/// Build the report for the current state
pub async fn build_report(state: &AppState) -> HealthReport {
    let now = Utc::now();
    let mut services = BTreeMap::new();

    services.insert(
        "storage".to_string(),
        vendor("Blob Storage", state.blobs.is_configured(), now),
    );
    services.insert(
        "payments".to_string(),
        vendor("Stripe Payments", state.payments.is_configured(), now),
    );
    services.insert(
        "email".to_string(),
        vendor("SendGrid Email", state.mailer.is_configured(), now),
    );
    services.insert(
        "shipping".to_string(),
        vendor("Shippo Shipping", state.shipping.is_configured(), now),
    );
    services.insert("database".to_string(), check_database(state, now).await);

    for (key, name) in [
        ("api", "Core API"),
        ("files", "File Upload"),
        ("pricing", "Pricing Calculator"),
        ("orders", "Order Management"),
        ("notifications", "Notifications"),
    ] {
        services.insert(
            key.to_string(),
            service(name, HealthStatus::Healthy, true, now),
        );
    }

    HealthReport::new(
        services,
        now,
        env!("CARGO_PKG_VERSION"),
        get_uptime_seconds(),
    )
}

/// GET /api/health
///
/// Always 200; the aggregate lives in the body.
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthReport> {
    let report = build_report(&state).await;
    if report.status != HealthStatus::Healthy {
        tracing::debug!(status = ?report.status, healthy = report.healthy_count(), "Health check");
    }
    ApiResponse::success(report)
}
