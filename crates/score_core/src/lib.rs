//! Credit Scoring Core
//!
//! Pure library behind the scoring service and the offline analyzer:
//! feature validation, standardization, classifier inference, the
//! probability→score transform and the decision policy.
//!
//! Modules:
//! - `features`: 200-value feature vector validation and naming
//! - `scaler`: fitted per-feature standardization
//! - `gbdt`: boosted tree ensemble inference
//! - `model`: classifier contract and the tagged model families
//! - `transform`: clipped linear probability→score rescaling
//! - `policy`: thresholds, confidence bands, risk score, score bands
//! - `artifacts`: persisted scoring metadata and feature mapping
//! - `predictor`: the composed inference path
//! - `stats`: descriptive statistics shared with the analyzer

pub mod artifacts;
pub mod errors;
pub mod features;
pub mod gbdt;
pub mod model;
pub mod policy;
pub mod predictor;
pub mod scaler;
pub mod stats;
pub mod transform;

pub use artifacts::{
    load_feature_mapping, save_feature_mapping, Direction, FeatureImportanceRecord,
    ScoreDistribution, ScoringMetadata, ScoringTransform,
};
pub use errors::{Result, ScoringError};
pub use features::{feature_name, feature_names, FeatureVector, FEATURE_COUNT};
pub use gbdt::GbdtModel;
pub use model::{Classifier, ClassifierModel, FeatureWeights, ModelInfo};
pub use policy::{
    decide, risk_score, ConfidenceLevel, Decision, DecisionOutcome, ScoreBand, ScoreThresholds,
    Threshold,
};
pub use predictor::{ClassProbabilities, Prediction, Predictor, ScoredProfile, ThresholdPrediction};
pub use scaler::StandardScaler;
pub use transform::{probability_to_score, ScoringParams};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
