//! Credit Scoring Analyzer - offline calibration and questionnaire tooling
//!
//! Runs a trained model over a labelled reference dataset to fit the
//! probability→score bounds, measure per-feature score impact, and emit
//! the defaults consumed by the front-end.

pub mod calibrate;
pub mod dataset;
pub mod defaults;
pub mod emit;
pub mod errors;
pub mod impact;
pub mod questionnaire;

use credit_score_core::{ClassifierModel, Predictor, StandardScaler};
use std::path::Path;
use std::sync::Arc;

pub use calibrate::{calibrate, roc_auc, Calibration};
pub use dataset::{Dataset, Subset};
pub use defaults::{optimize_defaults, sensitivity, DefaultProfile, SensitivityReport};
pub use emit::FrontendBundle;
pub use errors::AnalyzerError;
pub use impact::{analyze_features, DEFAULT_TOP_FEATURES};
pub use questionnaire::{build_questions, LabelSet, Question, QuestionKind, Questionnaire};

/// Load a model and its scaler into a ready predictor.
pub fn load_predictor(model_path: &Path, scaler_path: &Path) -> Result<Predictor, AnalyzerError> {
    let model = ClassifierModel::load_json(model_path)?;
    let scaler = StandardScaler::load_json(scaler_path)?;
    Ok(Predictor::new(scaler, Arc::new(model)))
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
