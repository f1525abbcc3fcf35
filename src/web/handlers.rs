//! HTTP request handlers.

use super::AppState;
use crate::monitor::{
    normalize_url, AlertState, MetricsSnapshot, Target, TargetAggregator, TraceWindow,
};
use crate::scheduler::build_report;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Text report
// ============================================================================

pub async fn handle_report(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    let window = query.window.unwrap_or(TraceWindow::Short);
    build_report(&state.registry, window)
}

// ============================================================================
// API: Targets
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub url: String,
    pub interval_ms: u64,
    pub alert_state: AlertState,
    pub sample_count: usize,
}

impl TargetInfo {
    fn from_aggregator(aggregator: &TargetAggregator) -> Self {
        let target = aggregator.target();
        Self {
            url: target.url().to_string(),
            interval_ms: u64::try_from(target.interval().as_millis()).unwrap_or(u64::MAX),
            alert_state: aggregator.alert_state(),
            sample_count: aggregator.sample_count(),
        }
    }
}

pub async fn handle_get_targets(State(state): State<AppState>) -> impl IntoResponse {
    let targets: Vec<TargetInfo> = state
        .registry
        .aggregators()
        .iter()
        .map(|a| TargetInfo::from_aggregator(a))
        .collect();

    Json(targets)
}

#[derive(Debug, Deserialize)]
pub struct CreateTargetRequest {
    pub url: String,
    pub interval_ms: u64,
}

pub async fn handle_create_target(
    State(state): State<AppState>,
    Json(req): Json<CreateTargetRequest>,
) -> impl IntoResponse {
    let target = match Target::new(&req.url, Duration::from_millis(req.interval_ms)) {
        Ok(t) => t,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let aggregator = state.scheduler.add_target(target).await;
    (
        StatusCode::CREATED,
        Json(TargetInfo::from_aggregator(&aggregator)),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub target: String,
}

pub async fn handle_delete_target(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
) -> impl IntoResponse {
    let url = match normalize_url(&query.target) {
        Ok(u) => u,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    if state.registry.get(&url).is_none() {
        return (StatusCode::NOT_FOUND, "Target not found").into_response();
    }

    state.scheduler.remove_target(&url).await;
    StatusCode::NO_CONTENT.into_response()
}

// ============================================================================
// API: Snapshots
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub window: Option<TraceWindow>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub target: String,
    #[serde(default)]
    pub window: Option<TraceWindow>,
}

pub async fn handle_get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> impl IntoResponse {
    let url = match normalize_url(&query.target) {
        Ok(u) => u,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let aggregator = match state.registry.get(&url) {
        Some(a) => a,
        None => return (StatusCode::NOT_FOUND, "Target not found").into_response(),
    };

    let window = query.window.unwrap_or(TraceWindow::Short);
    Json(aggregator.snapshot(window)).into_response()
}

pub async fn handle_get_snapshots(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    let window = query.window.unwrap_or(TraceWindow::Short);
    let snapshots: Vec<MetricsSnapshot> = state
        .registry
        .aggregators()
        .iter()
        .map(|a| a.snapshot(window))
        .collect();

    Json(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{AggregatorConfig, Registry, Sample};
    use crate::probe::ProbeConfig;
    use crate::scheduler::Scheduler;
    use chrono::Utc;
    use std::sync::Arc;

    fn state() -> AppState {
        let registry = Arc::new(Registry::new(AggregatorConfig::default()));
        let aggregator =
            registry.register(Target::new("www.google.com", Duration::from_millis(800)).unwrap());
        aggregator
            .ingest(Sample::up(Utc::now(), Duration::from_millis(25), 200))
            .unwrap();
        let scheduler = Arc::new(Scheduler::new(registry.clone(), ProbeConfig::default()).unwrap());
        AppState {
            registry,
            scheduler,
        }
    }

    #[tokio::test]
    async fn test_snapshot_for_known_target() {
        let query = SnapshotQuery {
            target: "www.google.com".to_string(),
            window: Some(TraceWindow::Long),
        };
        let response = handle_get_snapshot(State(state()), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_snapshot_for_unknown_target() {
        let query = SnapshotQuery {
            target: "github.com".to_string(),
            window: None,
        };
        let response = handle_get_snapshot(State(state()), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let query = SnapshotQuery {
            target: String::new(),
            window: None,
        };
        let response = handle_get_snapshot(State(state()), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_targets_and_snapshots_list() {
        let state = state();

        let response = handle_get_targets(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = handle_get_snapshots(State(state), Query(WindowQuery::default()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let state = state();
        let aggregator = state.registry.get("http://www.google.com/").unwrap();
        let json = serde_json::to_value(aggregator.snapshot(TraceWindow::Short)).unwrap();

        assert_eq!(json["target"], "http://www.google.com/");
        assert_eq!(json["window"], "short");
        assert_eq!(json["alert_state"], "healthy");
        assert_eq!(json["availability"], 100.0);
        assert_eq!(json["status_counts"][0]["code"], 200);
        assert_eq!(json["status_counts"][0]["count"], 1);
    }

    #[test]
    fn test_window_query_parses_lowercase() {
        let query: WindowQuery = serde_json::from_str(r#"{"window":"long"}"#).unwrap();
        assert_eq!(query.window, Some(TraceWindow::Long));
        assert!(serde_json::from_str::<WindowQuery>(r#"{"window":"hourly"}"#).is_err());
    }
}
