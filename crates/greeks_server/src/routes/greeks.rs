//! Greeks query endpoint
//!
//! `GET /api/greeks?r=<rate>&time_filter=<HH:MM,...>` returns a JSON array of
//! result rows over every discovered instrument.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;

/// Error body for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
}

/// Build the greeks routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/greeks", get(greeks_handler))
}

/// GET /api/greeks - Greeks for the instrument universe
///
/// Data problems shrink the result, never fail the request. The pipeline
/// runs on the blocking pool; only a panic inside it yields a 500.
async fn greeks_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let pipeline = state.pipeline.clone();
    match tokio::task::spawn_blocking(move || pipeline.handle_query(&query)).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "greeks request aborted");
            let body = ErrorResponse {
                error: "internal_error".to_string(),
                message: "greeks computation failed".to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::routes::test_support::empty_state;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use greeks_core::analytical::BlackScholes;
    use greeks_core::types::{time_to_expiry, OptionType};
    use greeks_pipeline::{
        CsvSource, GreeksCalculator, GreeksPipeline, InstrumentDescriptor, InstrumentEnumerator,
        PipelineConfig,
    };
    use infra_store::MemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = routes()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_data_returns_empty_array() {
        let (status, json) = get_json(empty_state(), "/api/greeks?r=0.06").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_returns_rows_for_priced_option() {
        let dir = tempfile::tempdir().unwrap();
        let spot = dir.path().join("spot.csv");
        let options_dir = dir.path().join("options");
        std::fs::create_dir(&options_dir).unwrap();

        let expiry = NaiveDate::from_ymd_opt(2024, 6, 27).unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 6, 26)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        let price = BlackScholes::new(22000.0, 0.05, 0.2).unwrap().price(
            22000.0,
            time_to_expiry(expiry, ts),
            OptionType::Call,
        );

        std::fs::write(&spot, format!("datetime,close\n{ts},22000\n")).unwrap();
        std::fs::write(
            options_dir.join("NIFTY_2024-06-27_22000_CE.csv"),
            format!("datetime,strike,type,close\n{ts},22000,CE,{price:.8}\n"),
        )
        .unwrap();

        let pipeline = GreeksPipeline::from_paths(&spot, &options_dir, PipelineConfig::default());
        let state = AppState::new(Arc::new(ServerConfig::default()), pipeline);

        let (status, json) = get_json(state, "/api/greeks?r=0.05&time_filter=09:15").await;
        assert_eq!(status, StatusCode::OK);

        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["datetime"], "2024-06-26T09:15:00");
        assert_eq!(row["expiry"], "2024-06-27");
        assert_eq!(row["strike"], 22000.0);
        assert_eq!(row["type"], "call");
        assert!((row["iv"].as_f64().unwrap() - 0.2).abs() < 1e-4);
        for greek in ["price", "delta", "gamma", "vega", "theta", "rho"] {
            assert!(row[greek].is_number(), "{greek}");
        }
    }

    struct PanickingEnumerator;

    impl InstrumentEnumerator for PanickingEnumerator {
        fn list_instruments(&self) -> Vec<InstrumentDescriptor> {
            panic!("enumeration blew up")
        }
    }

    #[tokio::test]
    async fn test_pipeline_panic_returns_500() {
        let pipeline = GreeksPipeline::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CsvSource),
            Arc::new(PanickingEnumerator),
            GreeksCalculator::default(),
            "/nonexistent/spot.csv",
            PipelineConfig::default(),
        );
        let state = AppState::new(Arc::new(ServerConfig::default()), pipeline);

        let (status, json) = get_json(state, "/api/greeks").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = serde_json::from_value(json).unwrap();
        assert_eq!(error.error, "internal_error");
    }

    #[tokio::test]
    async fn test_greeks_route_is_get_only() {
        let response = routes()
            .with_state(empty_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/greeks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
