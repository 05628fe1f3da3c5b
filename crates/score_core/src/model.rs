//! Classifier contract and the supported model families
//!
//! The serving layer only ever sees [`Classifier::predict_proba`]. Which
//! family produced the probability is decided once, when the model file is
//! parsed, through the `kind` tag of [`ClassifierModel`].

use crate::errors::{Result, ScoringError};
use crate::features::FEATURE_COUNT;
use crate::gbdt::GbdtModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Binary classifier over a standardized feature slice.
pub trait Classifier: Send + Sync {
    /// `[p(no transaction), p(transaction)]`, summing to 1.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;

    /// Hard label at the conventional 0.5 cut.
    fn predict(&self, features: &[f64]) -> Result<u8> {
        let [_, positive] = self.predict_proba(features)?;
        Ok(u8::from(positive >= 0.5))
    }

    fn feature_weights(&self) -> FeatureWeights;

    fn info(&self) -> ModelInfo;
}

/// Per-feature weights, tagged by where they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "values", rename_all = "snake_case")]
pub enum FeatureWeights {
    /// Signed coefficients of a linear model
    LinearCoefficients(Vec<f64>),
    /// Non-negative importances of a tree ensemble
    TreeImportances(Vec<f64>),
}

impl FeatureWeights {
    /// Non-negative magnitude per feature, suitable for ranking
    pub fn importance(&self) -> Vec<f64> {
        match self {
            Self::LinearCoefficients(weights) => weights.iter().map(|w| w.abs()).collect(),
            Self::TreeImportances(scores) => scores.clone(),
        }
    }

    /// Raw value per feature (signed for linear models)
    pub fn raw(&self) -> &[f64] {
        match self {
            Self::LinearCoefficients(values) | Self::TreeImportances(values) => values,
        }
    }

    /// Feature indices ordered by decreasing importance; ties keep index order.
    pub fn ranked(&self) -> Vec<usize> {
        let importance = self.importance();
        let mut order: Vec<usize> = (0..importance.len()).collect();
        order.sort_by(|a, b| importance[*b].total_cmp(&importance[*a]));
        order
    }
}

/// Descriptive metadata returned by `/model-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub n_features: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_coefficients: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercept: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// Logistic function; saturates cleanly for large magnitudes.
pub fn sigmoid(margin: f64) -> f64 {
    if margin >= 0.0 {
        1.0 / (1.0 + (-margin).exp())
    } else {
        let e = margin.exp();
        e / (1.0 + e)
    }
}

/// Supported classifier families, selected once at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble(GbdtModel),
}

impl ClassifierModel {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Logistic {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(ScoringError::unavailable(format!(
                        "logistic model has {} coefficients, expected {FEATURE_COUNT}",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ScoringError::unavailable(
                        "logistic model contains non-finite parameters",
                    ));
                }
                Ok(())
            }
            Self::TreeEnsemble(model) => model
                .validate(FEATURE_COUNT)
                .map_err(ScoringError::unavailable),
        }
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let model: ClassifierModel = serde_json::from_str(&json)?;
        model.validate()?;
        debug!(path = %path.display(), model_type = model.type_name(), "classifier parsed");
        Ok(model)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Logistic { .. } => "LogisticRegression",
            Self::TreeEnsemble(_) => "GradientBoostedTrees",
        }
    }

    fn margin(&self, features: &[f64]) -> f64 {
        match self {
            Self::Logistic {
                coefficients,
                intercept,
            } => coefficients
                .iter()
                .zip(features)
                .fold(*intercept, |acc, (w, x)| acc + w * x),
            Self::TreeEnsemble(model) => model.margin(features),
        }
    }
}

impl Classifier for ClassifierModel {
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != FEATURE_COUNT {
            return Err(ScoringError::inference(format!(
                "classifier expects {FEATURE_COUNT} features, received {}",
                features.len()
            )));
        }
        let positive = sigmoid(self.margin(features));
        if !positive.is_finite() {
            return Err(ScoringError::inference("classifier produced a non-finite probability"));
        }
        Ok([1.0 - positive, positive])
    }

    fn feature_weights(&self) -> FeatureWeights {
        match self {
            Self::Logistic { coefficients, .. } => {
                FeatureWeights::LinearCoefficients(coefficients.clone())
            }
            Self::TreeEnsemble(model) => {
                FeatureWeights::TreeImportances(model.feature_importances(FEATURE_COUNT))
            }
        }
    }

    fn info(&self) -> ModelInfo {
        let mut info = ModelInfo {
            model_type: self.type_name().to_string(),
            n_features: FEATURE_COUNT,
            n_coefficients: None,
            intercept: None,
            n_estimators: None,
            max_depth: None,
        };
        match self {
            Self::Logistic {
                coefficients,
                intercept,
            } => {
                info.n_coefficients = Some(coefficients.len());
                info.intercept = Some(*intercept);
            }
            Self::TreeEnsemble(model) => {
                info.n_estimators = Some(model.num_trees());
                info.max_depth = Some(model.max_depth());
            }
        }
        info
    }
}
