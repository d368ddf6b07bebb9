// HTTP request handlers
use axum::{extract::State, http::StatusCode, Json};

use crate::monitoring::{HealthReport, PipelineMonitor, StatsSnapshot};

/// Health endpoint: 200 when healthy, 503 otherwise.
pub async fn health_check(
    State(monitor): State<PipelineMonitor>,
) -> (StatusCode, Json<HealthReport>) {
    let report = monitor.health_check();
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Stats endpoint
pub async fn stats(State(monitor): State<PipelineMonitor>) -> Json<StatsSnapshot> {
    Json(monitor.stats())
}
