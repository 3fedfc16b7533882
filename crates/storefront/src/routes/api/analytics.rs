//! A/B test event endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::analytics::{NewAbTestEvent, TestSummary};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Optional test filter.
#[derive(Debug, Default, Deserialize)]
pub struct TestFilter {
    pub test_id: Option<String>,
}

impl TestFilter {
    fn test_id(&self) -> Option<&str> {
        self.test_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Summary response.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub tests: Vec<TestSummary>,
    pub total_events: usize,
}

/// Per-variant counts, optionally for one test.
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Query(filter): Query<TestFilter>,
) -> Json<SummaryResponse> {
    let store = state.ab_tests();
    Json(SummaryResponse {
        tests: store.summary(filter.test_id()),
        total_events: store.len(),
    })
}

/// Record an impression or conversion.
#[instrument(skip(state))]
pub async fn record(
    State(state): State<AppState>,
    Json(event): Json<NewAbTestEvent>,
) -> Result<impl IntoResponse> {
    let event = event.validate().map_err(AppError::BadRequest)?;
    tracing::debug!(test_id = %event.test_id, variant = %event.variant, "A/B event");
    state.ab_tests().record(event);
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "recorded": true }))))
}

/// Drop events for one test, or all of them.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Query(filter): Query<TestFilter>,
) -> Json<serde_json::Value> {
    let cleared = state.ab_tests().clear(filter.test_id());
    tracing::info!(cleared, test_id = ?filter.test_id(), "A/B events cleared");
    Json(serde_json::json!({ "cleared": cleared }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{body_json, get, json_request, test_app};

    fn event(test_id: &str, variant: &str, kind: &str) -> serde_json::Value {
        json!({ "test_id": test_id, "variant": variant, "event": kind })
    }

    #[tokio::test]
    async fn test_record_summarise_clear() {
        let (app, _) = test_app();
        for body in [
            event("hero", "a", "impression"),
            event("hero", "a", "impression"),
            event("hero", "a", "conversion"),
            event("hero", "b", "impression"),
            event("footer", "x", "impression"),
        ] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/api/analytics/ab-test", &body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get("/api/analytics/ab-test?test_id=hero"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["total_events"], 5);
        assert_eq!(json["tests"].as_array().unwrap().len(), 1);
        assert_eq!(json["tests"][0]["variants"][0]["variant"], "a");
        assert_eq!(json["tests"][0]["variants"][0]["impressions"], 2);
        assert_eq!(json["tests"][0]["variants"][0]["conversions"], 1);

        let response = app
            .clone()
            .oneshot(json_request("DELETE", "/api/analytics/ab-test?test_id=hero", &json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({ "cleared": 4 }));

        let response = app.oneshot(get("/api/analytics/ab-test")).await.unwrap();
        assert_eq!(body_json(response).await["total_events"], 1);
    }

    #[tokio::test]
    async fn test_record_rejects_blank_test_id() {
        let (app, _) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/analytics/ab-test",
                &event("  ", "a", "impression"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
