//! Prometheus scrape endpoint

use axum::{extract::State, http::StatusCode};

use crate::handlers::AppState;

/// `200` with the text exposition format, `500` if encoding fails
pub async fn handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(output) => (StatusCode::OK, output),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics for Prometheus scraping");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::state_with;
    use crate::router::RouteMode;

    #[tokio::test]
    async fn test_metrics_handler_returns_prometheus_format() {
        let state = state_with(&[]).await;
        state
            .metrics()
            .record_route("fast", RouteMode::Auto, None)
            .unwrap();

        let (status, body) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# TYPE devil_router_routes_total counter"));
        assert!(body.contains("devil_router_routes_total{category=\"fast\",mode=\"auto\"} 1"));
    }
}
