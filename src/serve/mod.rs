// ============================================================
// Layer 7 — HTTP Prediction API (axum)
// ============================================================
// Routes:
//
//   GET  /         → {"message": "..."}                 liveness banner
//   POST /predict  → PatientData JSON in, Prediction JSON out
//   GET  /health   → {"status": "ok", "model": "<kind>"}
//   GET  /metrics  → Prometheus text format
//
// The server owns one Inferencer, loaded before the socket is
// bound; if either artifact is missing the process exits
// instead of serving. A failed prediction is logged and
// answered with 500 {"detail": "<error>"}.

pub mod metrics;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::domain::patient::{PatientData, Prediction};
use crate::ml::inferencer::Inferencer;
use metrics::ApiMetrics;

pub const HOME_MESSAGE: &str = "Heart Disease Prediction API is running.";

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub inferencer: Arc<Inferencer>,
    pub metrics:    Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(inferencer: Inferencer) -> Result<Self> {
        Ok(Self {
            inferencer: Arc::new(inferencer),
            metrics:    Arc::new(ApiMetrics::new().context("Cannot register API metrics")?),
        })
    }
}

/// Error body returned for failed requests.
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": self.0 }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn run(host: &str, port: u16, inferencer: Inferencer) -> Result<()> {
    let state = AppState::new(inferencer)?;
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Cannot bind {host}:{port}"))?;
    tracing::info!("Serving predictions on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await.context("Server error")?;
    Ok(())
}

// ─── Middleware ───────────────────────────────────────────────────────────────
async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method  = req.method().to_string();
    let handler = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let started  = Instant::now();
    let response = next.run(req).await;
    state.metrics.observe_request(
        &method,
        &handler,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

// ─── Handlers ─────────────────────────────────────────────────────────────────
async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": HOME_MESSAGE }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "model": state.inferencer.model_kind().to_string() }))
}

async fn predict(
    State(state): State<AppState>,
    Json(patient): Json<PatientData>,
) -> Result<Json<Prediction>, ApiError> {
    match state.inferencer.predict(&patient) {
        Ok(prediction) => {
            tracing::info!(
                request = ?patient,
                prediction = prediction.prediction,
                confidence = prediction.confidence,
                "Prediction served"
            );
            state
                .metrics
                .predictions
                .with_label_values(&[prediction.status.as_str()])
                .inc();
            Ok(Json(prediction))
        }
        Err(e) => {
            tracing::error!("Prediction failed: {e}");
            Err(ApiError(e.to_string()))
        }
    }
}

async fn metrics_text(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.render().map_err(|e| ApiError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;
    use crate::domain::patient::COLUMN_NAMES;
    use crate::ml::features::ColumnTransformer;
    use crate::ml::logistic::LogisticRegression;
    use crate::ml::model::TrainedModel;
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    fn state_with(coefficient: f32) -> AppState {
        let raw = [
            [63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0, 1.0],
            [41.0, 0.0, 1.0, 130.0, 204.0, 0.0, 2.0, 172.0, 0.0, 1.4, 2.0, 0.0, 2.0, 0.0],
        ];
        let rows  = raw.iter().map(|r| r.iter().map(|&v| Some(v)).collect()).collect();
        let table = Table::new(COLUMN_NAMES.iter().map(|c| c.to_string()).collect(), rows).unwrap();
        let ct    = ColumnTransformer::fit_default(&table).unwrap();

        let mut coefficients = vec![0.0; ct.output_width()];
        coefficients[0] = coefficient;
        let model = TrainedModel::LogisticRegression(LogisticRegression { coefficients, intercept: 0.0 });
        AppState::new(Inferencer::new(model, ct).unwrap()).unwrap()
    }

    fn patient_json(age: i64) -> String {
        json!({
            "age": age, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
            "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
            "ca": 0, "thal": 1
        })
        .to_string()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_predict(body: String) -> HttpRequest<Body> {
        HttpRequest::post("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_home_message() {
        let resp = router(state_with(3.0))
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], HOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_predict_positive_patient() {
        let resp = router(state_with(3.0)).oneshot(post_predict(patient_json(63))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["prediction"], 1);
        assert_eq!(body["status"], "Positive");
        let confidence = body["confidence"].as_f64().unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0);
    }

    #[tokio::test]
    async fn test_predict_negative_patient() {
        let resp = router(state_with(3.0)).oneshot(post_predict(patient_json(41))).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["prediction"], 0);
        assert_eq!(body["status"], "Negative");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let resp = router(state_with(3.0))
            .oneshot(post_predict(r#"{"age": "old"}"#.to_string()))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_api_error_is_500_with_detail() {
        let resp = ApiError("feature width mismatch: expected 28, got 1".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["detail"], "feature width mismatch: expected 28, got 1");
    }

    #[tokio::test]
    async fn test_health_reports_model_kind() {
        let resp = router(state_with(3.0))
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "Logistic_Regression");
    }

    #[tokio::test]
    async fn test_metrics_count_requests_and_predictions() {
        let app = router(state_with(3.0));
        app.clone().oneshot(post_predict(patient_json(63))).await.unwrap();
        app.clone().oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap()).await.unwrap();

        let resp = app.oneshot(HttpRequest::get("/metrics").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text  = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#"http_requests_total{handler="/predict",method="POST",status="200"} 1"#));
        assert!(text.contains(r#"http_requests_total{handler="/health",method="GET",status="200"} 1"#));
        assert!(text.contains(r#"heart_predictions_total{status="Positive"} 1"#));
    }
}
