use crate::errors::ApiError;
use crate::state::{ServingState, SharedState};
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use credit_score_core::{
    feature_names, FeatureImportanceRecord, FeatureVector, ModelInfo, Prediction, ScoringError,
    ScoringParams, Threshold, ThresholdPrediction, VERSION,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct PredictRequest {
    features: Vec<f64>,
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    features: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct Endpoint {
    path: &'static str,
    method: &'static str,
    description: &'static str,
}

const ENDPOINTS: &[Endpoint] = &[
    Endpoint { path: "/", method: "GET", description: "Service banner" },
    Endpoint { path: "/health", method: "GET", description: "Artifact and service status" },
    Endpoint { path: "/model-info", method: "GET", description: "Loaded model metadata" },
    Endpoint { path: "/feature-importance", method: "GET", description: "Top feature statistics" },
    Endpoint { path: "/metrics", method: "GET", description: "Prometheus metrics" },
    Endpoint { path: "/predict", method: "POST", description: "Single prediction at 0.5" },
    Endpoint {
        path: "/predict_with_threshold",
        method: "POST",
        description: "Credit decision at a chosen threshold",
    },
    Endpoint { path: "/predict_batch", method: "POST", description: "Predictions for many profiles" },
];

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
    endpoints: &'static [Endpoint],
    model_loaded: bool,
    scaler_loaded: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_status: &'static str,
    scaler_status: &'static str,
    scoring_status: &'static str,
    uptime_seconds: u64,
}

#[derive(Serialize)]
struct ModelInfoResponse {
    #[serde(flatten)]
    info: ModelInfo,
    feature_names: Vec<String>,
    classes: [u8; 2],
    class_names: [&'static str; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    roc_auc_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p_max: Option<f64>,
}

#[derive(Serialize)]
struct FeatureImportanceResponse {
    features: Vec<FeatureImportanceRecord>,
    total: usize,
}

#[derive(Serialize)]
struct PredictResponse {
    #[serde(flatten)]
    prediction: Prediction,
    message: &'static str,
}

#[derive(Serialize)]
struct ThresholdResponse {
    #[serde(flatten)]
    result: ThresholdPrediction,
    probability_percent: String,
    message: String,
}

#[derive(Serialize)]
struct BatchItem {
    index: usize,
    #[serde(flatten)]
    prediction: Prediction,
}

#[derive(Serialize)]
struct BatchResponse {
    predictions: Vec<BatchItem>,
    total: usize,
}

pub async fn start_server(state: ServingState, addr: &str, body_limit: usize) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared, body_limit);
    let listener = bind_listener(addr).await?;
    info!("Scoring API listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("scoring server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}

pub fn build_router(state: SharedState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/model-info", get(handle_model_info))
        .route("/feature-importance", get(handle_feature_importance))
        .route("/metrics", get(handle_metrics))
        .route("/predict", post(handle_predict))
        .route("/predict_with_threshold", post(handle_predict_with_threshold))
        .route("/predict_batch", post(handle_predict_batch))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_label(loaded: bool) -> &'static str {
    if loaded {
        "loaded"
    } else {
        "not_loaded"
    }
}

/// Unwrap the body only after the service is known to be able to predict.
/// Oversized or unreadable bodies keep their own status; anything else is a 400.
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| match rejection {
        JsonRejection::BytesRejection(_) => ApiError::new(rejection.status(), rejection.body_text()),
        _ => ApiError::bad_request(format!("invalid request body: {}", rejection.body_text())),
    })
}

fn record_outcome<T>(state: &ServingState, result: Result<T, ScoringError>) -> Result<T, ApiError> {
    result.map_err(|err| {
        if !err.is_client_error() {
            state.record_failure();
        }
        ApiError::from(err)
    })
}

async fn handle_home(State(state): State<SharedState>) -> Json<HomeResponse> {
    state.record_request();
    Json(HomeResponse {
        message: "Credit scoring prediction API",
        status: "active",
        version: VERSION,
        endpoints: ENDPOINTS,
        model_loaded: state.model_loaded(),
        scaler_loaded: state.scaler_loaded(),
    })
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    state.record_request();
    let status = if state.is_ready() { "healthy" } else { "degraded" };
    let scoring_status = if state.metadata().is_some() {
        "calibrated"
    } else {
        "default"
    };
    Json(HealthResponse {
        status,
        model_status: status_label(state.model_loaded()),
        scaler_status: status_label(state.scaler_loaded()),
        scoring_status,
        uptime_seconds: state.uptime_seconds(),
    })
}

async fn handle_model_info(
    State(state): State<SharedState>,
) -> Result<Json<ModelInfoResponse>, ApiError> {
    state.record_request();
    let model = state
        .model()
        .ok_or_else(|| ApiError::service_unavailable("model not loaded"))?;
    let metadata = state.metadata();
    let scoring: Option<ScoringParams> = metadata.map(|m| m.scoring_params());
    Ok(Json(ModelInfoResponse {
        info: model.info(),
        feature_names: feature_names(),
        classes: [0, 1],
        class_names: ["no_transaction", "transaction"],
        roc_auc_score: metadata.and_then(|m| m.roc_auc_score),
        p_min: scoring.map(|s| s.p_min()),
        p_max: scoring.map(|s| s.p_max()),
    }))
}

async fn handle_feature_importance(
    State(state): State<SharedState>,
) -> Json<FeatureImportanceResponse> {
    state.record_request();
    let features = state.feature_mapping().to_vec();
    Json(FeatureImportanceResponse {
        total: features.len(),
        features,
    })
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let req_total = state.record_request();
    let uptime = state.uptime_seconds();

    let mut metrics =
        "# HELP credit_score_http_requests_total Total number of HTTP requests handled\n".to_string();
    metrics.push_str("# TYPE credit_score_http_requests_total counter\n");
    metrics.push_str(&format!("credit_score_http_requests_total {req_total}\n"));
    metrics.push_str("# HELP credit_score_predictions_total Profiles scored successfully\n");
    metrics.push_str("# TYPE credit_score_predictions_total counter\n");
    metrics.push_str(&format!(
        "credit_score_predictions_total {}\n",
        state.prediction_total()
    ));
    metrics.push_str("# HELP credit_score_failed_predictions_total Predictions that failed inside the model\n");
    metrics.push_str("# TYPE credit_score_failed_predictions_total counter\n");
    metrics.push_str(&format!(
        "credit_score_failed_predictions_total {}\n",
        state.failure_total()
    ));
    metrics.push_str("# HELP credit_score_model_ready Whether model and scaler are loaded\n");
    metrics.push_str("# TYPE credit_score_model_ready gauge\n");
    metrics.push_str(&format!(
        "credit_score_model_ready {}\n",
        u8::from(state.is_ready())
    ));
    metrics.push_str("# HELP credit_score_uptime_seconds Uptime of the service in seconds\n");
    metrics.push_str("# TYPE credit_score_uptime_seconds gauge\n");
    metrics.push_str(&format!("credit_score_uptime_seconds {uptime}\n"));

    let mut response = Response::new(Body::from(metrics));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}

async fn handle_predict(
    State(state): State<SharedState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    state.record_request();
    let predictor = state.predictor()?;
    let request = parse_body(body)?;
    let features = FeatureVector::new(request.features)?;

    let prediction = record_outcome(&state, predictor.predict(&features))?;
    state.record_predictions(1);
    let message = if prediction.prediction == 1 {
        "Transaction predicted"
    } else {
        "No transaction predicted"
    };
    Ok(Json(PredictResponse {
        prediction,
        message,
    }))
}

async fn handle_predict_with_threshold(
    State(state): State<SharedState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ThresholdResponse>, ApiError> {
    state.record_request();
    let predictor = state.predictor()?;
    let request = parse_body(body)?;
    let threshold = match request.threshold {
        Some(value) => Threshold::new(value)?,
        None => Threshold::default(),
    };
    let features = FeatureVector::new(request.features)?;

    let result = record_outcome(&state, predictor.predict_with_threshold(&features, threshold))?;
    state.record_predictions(1);
    let transaction = result.probability.transaction;
    Ok(Json(ThresholdResponse {
        probability_percent: format!("{:.2}%", transaction * 100.0),
        message: format!(
            "Transaction probability: {:.1}% (threshold: {:.0}%)",
            transaction * 100.0,
            threshold.value() * 100.0
        ),
        result,
    }))
}

async fn handle_predict_batch(
    State(state): State<SharedState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    state.record_request();
    let predictor = state.predictor()?;
    let request = parse_body(body)?;
    if request.features.is_empty() {
        return Err(ApiError::bad_request("batch must contain at least one profile"));
    }
    let batch = request
        .features
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            FeatureVector::new(row)
                .map_err(|err| ApiError::bad_request(format!("profile {index}: {err}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let predictions = record_outcome(&state, predictor.predict_batch(&batch))?;
    state.record_predictions(predictions.len() as u64);
    let predictions: Vec<BatchItem> = predictions
        .into_iter()
        .enumerate()
        .map(|(index, prediction)| BatchItem { index, prediction })
        .collect();
    Ok(Json(BatchResponse {
        total: predictions.len(),
        predictions,
    }))
}
