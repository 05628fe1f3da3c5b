//! Process-wide serving state
//!
//! Built once at start-up and shared behind an `Arc`. Nothing in here is
//! mutated by a request except the counters.

use crate::config::ArtifactPaths;
use credit_score_core::{
    load_feature_mapping, Classifier, ClassifierModel, FeatureImportanceRecord, Predictor,
    ScoringError, ScoringMetadata, StandardScaler, FEATURE_COUNT,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Artifacts as loaded from disk; any of them may be missing.
#[derive(Default)]
pub struct LoadedArtifacts {
    pub model: Option<Arc<dyn Classifier>>,
    pub scaler: Option<StandardScaler>,
    pub metadata: Option<ScoringMetadata>,
    pub feature_mapping: Vec<FeatureImportanceRecord>,
}

impl LoadedArtifacts {
    /// Load every artifact, logging and skipping the ones that fail.
    pub fn load(paths: &ArtifactPaths) -> Self {
        let model = load_optional("model", &paths.model_path, |p| ClassifierModel::load_json(p))
            .map(|model| Arc::new(model) as Arc<dyn Classifier>);
        let scaler = load_optional("scaler", &paths.scaler_path, |p| {
            let scaler = StandardScaler::load_json(p)?;
            scaler.validate_for(FEATURE_COUNT)?;
            Ok(scaler)
        });
        let metadata = load_optional("scoring metadata", &paths.metadata_path, |p| {
            ScoringMetadata::load_json(p)
        });
        let feature_mapping = load_optional("feature mapping", &paths.feature_mapping_path, |p| {
            load_feature_mapping(p)
        })
        .unwrap_or_default();

        Self {
            model,
            scaler,
            metadata,
            feature_mapping,
        }
    }
}

fn load_optional<T, F>(what: &str, path: &Path, loader: F) -> Option<T>
where
    F: FnOnce(&Path) -> Result<T, ScoringError>,
{
    if !path.exists() {
        warn!(path = %path.display(), "{what} not found");
        return None;
    }
    match loader(path) {
        Ok(value) => {
            info!(path = %path.display(), "{what} loaded");
            Some(value)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load {what}");
            None
        }
    }
}

pub struct ServingState {
    artifacts: LoadedArtifacts,
    predictor: Option<Predictor>,
    start_time: Instant,
    req_count: AtomicU64,
    predictions: AtomicU64,
    failed_predictions: AtomicU64,
}

pub type SharedState = Arc<ServingState>;

impl ServingState {
    pub fn new(mut artifacts: LoadedArtifacts) -> Self {
        if let Some(Err(err)) = artifacts
            .scaler
            .as_ref()
            .map(|scaler| scaler.validate_for(FEATURE_COUNT))
        {
            warn!(error = %err, "discarding scaler");
            artifacts.scaler = None;
        }

        let predictor = match (&artifacts.model, &artifacts.scaler) {
            (Some(model), Some(scaler)) => {
                let mut predictor = Predictor::new(scaler.clone(), Arc::clone(model));
                if let Some(metadata) = &artifacts.metadata {
                    predictor = predictor
                        .with_scoring(metadata.scoring_params())
                        .with_thresholds(metadata.recommended_thresholds);
                }
                Some(predictor)
            }
            _ => None,
        };

        Self {
            artifacts,
            predictor,
            start_time: Instant::now(),
            req_count: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            failed_predictions: AtomicU64::new(0),
        }
    }

    pub fn load(paths: &ArtifactPaths) -> Self {
        Self::new(LoadedArtifacts::load(paths))
    }

    /// The composed predictor, or the reason the service cannot predict.
    pub fn predictor(&self) -> Result<&Predictor, ScoringError> {
        if let Some(predictor) = &self.predictor {
            return Ok(predictor);
        }
        let missing = match (self.model_loaded(), self.scaler_loaded()) {
            (false, false) => "model and scaler not loaded",
            (false, true) => "model not loaded",
            _ => "scaler not loaded",
        };
        Err(ScoringError::unavailable(missing))
    }

    pub fn model(&self) -> Option<&dyn Classifier> {
        self.artifacts.model.as_deref()
    }

    pub fn model_loaded(&self) -> bool {
        self.artifacts.model.is_some()
    }

    pub fn scaler_loaded(&self) -> bool {
        self.artifacts.scaler.is_some()
    }

    pub fn metadata(&self) -> Option<&ScoringMetadata> {
        self.artifacts.metadata.as_ref()
    }

    pub fn feature_mapping(&self) -> &[FeatureImportanceRecord] {
        &self.artifacts.feature_mapping
    }

    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_predictions(&self, count: u64) {
        self.predictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_predictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_total(&self) -> u64 {
        self.req_count.load(Ordering::Relaxed)
    }

    pub fn prediction_total(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    pub fn failure_total(&self) -> u64 {
        self.failed_predictions.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
