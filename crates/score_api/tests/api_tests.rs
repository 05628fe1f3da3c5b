use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use credit_score_api::{build_router, LoadedArtifacts, ServingState};
use credit_score_core::{
    ClassifierModel, Direction, FeatureImportanceRecord, ScoringMetadata, ScoringParams,
    StandardScaler, FEATURE_COUNT,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

fn model() -> ClassifierModel {
    let mut coefficients = vec![0.0; FEATURE_COUNT];
    coefficients[0] = 1.5;
    coefficients[1] = -0.5;
    ClassifierModel::Logistic {
        coefficients,
        intercept: -1.0,
    }
}

fn record() -> FeatureImportanceRecord {
    FeatureImportanceRecord {
        feature: "var_0".to_string(),
        var_index: 0,
        importance: 1.5,
        impact_points: 42.0,
        direction: Direction::Higher,
        min: -3.0,
        max: 3.0,
        p10: -1.2,
        p25: -0.6,
        p50: 0.0,
        p75: 0.6,
        p90: 1.2,
        mean_accepted: 0.4,
        mean_rejected: -0.1,
        score_at_p10: 10.0,
        score_at_p90: 52.0,
        optimal_value: 0.4,
    }
}

fn ready_router() -> Router {
    let artifacts = LoadedArtifacts {
        model: Some(Arc::new(model())),
        scaler: Some(StandardScaler::identity(FEATURE_COUNT)),
        metadata: Some(ScoringMetadata::new(
            "LogisticRegression",
            ScoringParams::default(),
        )),
        feature_mapping: vec![record()],
    };
    build_router(Arc::new(ServingState::new(artifacts)), BODY_LIMIT)
}

fn empty_router() -> Router {
    build_router(
        Arc::new(ServingState::new(LoadedArtifacts::default())),
        BODY_LIMIT,
    )
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_raw(router: Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, body.to_string()).await
}

fn zeros(len: usize) -> Vec<f64> {
    vec![0.0; len]
}

#[tokio::test]
async fn home_reports_loaded_artifacts() {
    let (status, body) = get_json(ready_router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["scaler_loaded"], true);
    assert!(body["endpoints"].as_array().unwrap().len() >= 8);
}

#[tokio::test]
async fn health_degrades_without_artifacts() {
    let (status, body) = get_json(empty_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_status"], "not_loaded");
    assert_eq!(body["scaler_status"], "not_loaded");

    let (_, body) = get_json(ready_router(), "/health").await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["scoring_status"], "calibrated");
}

#[tokio::test]
async fn threshold_prediction_on_zero_profile() {
    let (status, body) = post_json(
        ready_router(),
        "/predict_with_threshold",
        json!({ "features": zeros(FEATURE_COUNT), "threshold": 0.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prediction = body["prediction"].as_u64().unwrap();
    assert!(prediction <= 1);
    let level = body["confidence_level"].as_str().unwrap();
    assert!(["HIGH", "MEDIUM", "LOW"].contains(&level));

    let p0 = body["probability"]["no_transaction"].as_f64().unwrap();
    let p1 = body["probability"]["transaction"].as_f64().unwrap();
    assert!((p0 + p1 - 1.0).abs() < 1e-9);

    // sigmoid(-1) sits below 0.5
    assert_eq!(prediction, 0);
    assert_eq!(body["decision"], "CREDIT_REJECTED");
    assert_eq!(body["threshold_used"], 0.5);
    let risk = body["risk_score"].as_f64().unwrap();
    assert!((risk - p1).abs() < 1e-12);

    let score = body["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(body["score_band"].is_string());
    assert!(body["probability_percent"].as_str().unwrap().ends_with('%'));
    assert!(body["message"].as_str().unwrap().contains("threshold: 50%"));
}

#[tokio::test]
async fn threshold_defaults_to_one_half() {
    let (status, body) = post_json(
        ready_router(),
        "/predict_with_threshold",
        json!({ "features": zeros(FEATURE_COUNT) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threshold_used"], 0.5);
}

#[tokio::test]
async fn wrong_feature_count_is_bad_request() {
    let (status, body) = post_json(
        ready_router(),
        "/predict_with_threshold",
        json!({ "features": zeros(199), "threshold": 0.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("199"));
}

#[tokio::test]
async fn out_of_range_threshold_is_bad_request() {
    let (status, body) = post_json(
        ready_router(),
        "/predict_with_threshold",
        json!({ "features": zeros(FEATURE_COUNT), "threshold": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (status, body) = post_raw(ready_router(), "/predict", "{\"features\": [1, 2".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post_json(ready_router(), "/predict", json!({ "values": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let values = vec!["0"; BODY_LIMIT / 2 + 1].join(",");
    let body = format!("{{\"features\": [{values}]}}");
    assert!(body.len() > BODY_LIMIT);
    let (status, body) = post_raw(ready_router(), "/predict", body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_width_scaler_is_unavailable() {
    let artifacts = LoadedArtifacts {
        model: Some(Arc::new(model())),
        scaler: Some(StandardScaler::identity(10)),
        ..LoadedArtifacts::default()
    };
    let router = build_router(Arc::new(ServingState::new(artifacts)), BODY_LIMIT);
    let (status, body) =
        post_json(router.clone(), "/predict", json!({ "features": zeros(FEATURE_COUNT) })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("scaler not loaded"));

    let (_, body) = get_json(router, "/health").await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["scaler_status"], "not_loaded");
}

#[tokio::test]
async fn missing_model_is_unavailable_before_validation() {
    for uri in ["/predict", "/predict_with_threshold"] {
        let (status, body) = post_json(empty_router(), uri, json!({ "features": zeros(3) })).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert!(body["error"].as_str().unwrap().contains("not loaded"));
    }
    let (status, _) = get_json(empty_router(), "/model-info").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn plain_prediction_uses_half_cut() {
    let mut features = zeros(FEATURE_COUNT);
    features[0] = 3.0;
    let (status, body) = post_json(ready_router(), "/predict", json!({ "features": features })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1);
    assert_eq!(body["message"], "Transaction predicted");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 50.0 && confidence <= 100.0);
}

#[tokio::test]
async fn batch_returns_indexed_predictions() {
    let mut strong = zeros(FEATURE_COUNT);
    strong[0] = 4.0;
    let (status, body) = post_json(
        ready_router(),
        "/predict_batch",
        json!({ "features": [zeros(FEATURE_COUNT), strong] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["index"], 0);
    assert_eq!(predictions[0]["prediction"], 0);
    assert_eq!(predictions[1]["index"], 1);
    assert_eq!(predictions[1]["prediction"], 1);
}

#[tokio::test]
async fn batch_with_one_bad_row_fails_whole() {
    let (status, body) = post_json(
        ready_router(),
        "/predict_batch",
        json!({ "features": [zeros(FEATURE_COUNT), zeros(10)] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("predictions").is_none());
    assert!(body["error"].as_str().unwrap().contains("profile 1"));

    let (status, _) = post_json(ready_router(), "/predict_batch", json!({ "features": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn model_info_lists_features() {
    let (status, body) = get_json(ready_router(), "/model-info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "LogisticRegression");
    assert_eq!(body["n_features"], FEATURE_COUNT);
    assert_eq!(body["feature_names"].as_array().unwrap().len(), FEATURE_COUNT);
    assert_eq!(body["feature_names"][199], "var_199");
    assert_eq!(body["class_names"][1], "transaction");
}

#[tokio::test]
async fn feature_importance_serves_records() {
    let (status, body) = get_json(ready_router(), "/feature-importance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["features"][0]["feature"], "var_0");
    assert_eq!(body["features"][0]["direction"], "higher");

    let (_, body) = get_json(empty_router(), "/feature-importance").await;
    assert_eq!(body["total"], 0);
    assert!(body["features"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn metrics_are_prometheus_text() {
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = send(ready_router(), request).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("# TYPE credit_score_http_requests_total counter"));
    assert!(text.contains("credit_score_model_ready 1"));
    assert!(text.contains("credit_score_failed_predictions_total 0"));
}

#[tokio::test]
async fn counters_track_predictions() {
    let state = Arc::new(ServingState::new(LoadedArtifacts {
        model: Some(Arc::new(model())),
        scaler: Some(StandardScaler::identity(FEATURE_COUNT)),
        metadata: None,
        feature_mapping: Vec::new(),
    }));
    let router = build_router(state.clone(), BODY_LIMIT);
    let (status, _) = post_json(
        router.clone(),
        "/predict_batch",
        json!({ "features": [zeros(FEATURE_COUNT), zeros(FEATURE_COUNT), zeros(FEATURE_COUNT)] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(router, "/predict", json!({ "features": zeros(5) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(state.prediction_total(), 3);
    assert_eq!(state.request_total(), 2);
    assert_eq!(state.failure_total(), 0);
}
