use crate::{app::AppState, models::HealthStatus};
use axum::{extract::State, Json};
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let payments_ok = tokio::fs::try_exists(state.config.payments_file())
        .await
        .unwrap_or(false);
    let settings_ok = tokio::fs::try_exists(state.config.settings_file())
        .await
        .unwrap_or(false);

    let status = if payments_ok && settings_ok {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        payments_file: payments_ok,
        settings_file: settings_ok,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
