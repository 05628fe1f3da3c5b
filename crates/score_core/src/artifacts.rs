//! Persisted scoring configuration
//!
//! Two JSON files are produced offline and loaded read-only at start-up:
//! the scoring metadata (transform bounds, score distribution, recommended
//! cut-points) and the feature mapping (one importance record per top
//! feature).

use crate::errors::Result;
use crate::features::FEATURE_COUNT;
use crate::policy::ScoreThresholds;
use crate::transform::{ScoringParams, SCORE_FORMULA};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bounds of the probability→score transform as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTransform {
    #[serde(flatten)]
    pub params: ScoringParams,
    #[serde(default = "default_formula")]
    pub formula: String,
}

fn default_formula() -> String {
    SCORE_FORMULA.to_string()
}

impl From<ScoringParams> for ScoringTransform {
    fn from(params: ScoringParams) -> Self {
        Self {
            params,
            formula: default_formula(),
        }
    }
}

/// Score quantiles over the reference dataset, split by outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub accepted_median: f64,
    pub rejected_median: f64,
    pub accepted_p25: f64,
    pub accepted_p75: f64,
}

/// Contents of the scoring metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringMetadata {
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_auc_score: Option<f64>,
    #[serde(default = "default_n_features")]
    pub n_features: usize,
    pub scoring_transform: ScoringTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_distribution: Option<ScoreDistribution>,
    #[serde(default)]
    pub recommended_thresholds: ScoreThresholds,
}

fn default_n_features() -> usize {
    FEATURE_COUNT
}

impl ScoringMetadata {
    pub fn new(model_type: impl Into<String>, params: ScoringParams) -> Self {
        Self {
            model_type: model_type.into(),
            roc_auc_score: None,
            n_features: FEATURE_COUNT,
            scoring_transform: params.into(),
            score_distribution: None,
            recommended_thresholds: ScoreThresholds::default(),
        }
    }

    pub fn scoring_params(&self) -> ScoringParams {
        self.scoring_transform.params
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let metadata: ScoringMetadata = serde_json::from_str(&json)?;
        metadata.recommended_thresholds.validate()?;
        Ok(metadata)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Preferred direction of a feature: moving it this way raises the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Higher,
    Lower,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Higher => "higher",
            Self::Lower => "lower",
        }
    }
}

/// Importance, direction and distribution of one influential feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceRecord {
    pub feature: String,
    pub var_index: usize,
    pub importance: f64,
    pub impact_points: f64,
    pub direction: Direction,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub mean_accepted: f64,
    pub mean_rejected: f64,
    pub score_at_p10: f64,
    pub score_at_p90: f64,
    pub optimal_value: f64,
}

impl FeatureImportanceRecord {
    /// Value that moves the score up: P90 for `higher`, P10 for `lower`.
    pub fn favorable_value(&self) -> f64 {
        match self.direction {
            Direction::Higher => self.p90,
            Direction::Lower => self.p10,
        }
    }

    pub fn unfavorable_value(&self) -> f64 {
        match self.direction {
            Direction::Higher => self.p10,
            Direction::Lower => self.p90,
        }
    }
}

pub fn load_feature_mapping<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureImportanceRecord>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn save_feature_mapping<P: AsRef<Path>>(
    path: P,
    records: &[FeatureImportanceRecord],
) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}
