use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;

pub const LIVENESS_BODY: &str = "OI spike alerter is running";

#[derive(Clone)]
pub struct ApiState {
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub symbol: String,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub symbol: String,
    pub cycles_evaluated: u64,
    pub cycles_skipped: u64,
    pub cycles_failed: u64,
    pub alerts_fired: u64,
    pub deliveries_failed: u64,
    pub last_cycle_at_ns: u64,
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
    pub max_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let h = &state.health;
    Json(HealthResponse {
        status: "ok",
        symbol: state.symbol.clone(),
        cycles_evaluated: h.cycles_evaluated(),
        cycles_skipped: h.cycles_skipped(),
        cycles_failed: h.cycles_failed(),
        alerts_fired: h.alerts_fired(),
        deliveries_failed: h.deliveries_failed(),
        last_cycle_at_ns: h.last_cycle_at_ns(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let p = state.latency.percentiles();
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms: p.map(|p| p.0),
        p95_ms: p.map(|p| p.1),
        p99_ms: p.map(|p| p.2),
        max_ms: p.map(|p| p.3),
    })
}
