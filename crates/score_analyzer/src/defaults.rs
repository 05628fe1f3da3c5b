//! Starting profile offered by the front-end questionnaire
//!
//! The profile begins at the accepted-class means and nudges each analysed
//! feature toward its favourable side, so a fresh form lands on a middling
//! score instead of a refusal.

use crate::dataset::Dataset;
use crate::errors::{AnalyzerError, Result};
use credit_score_core::{
    stats, Direction, FeatureImportanceRecord, FeatureVector, Predictor, ScoreThresholds,
    ScoringParams,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Accepted-class quantile used for features where higher is better
pub const FAVORABLE_HIGH_QUANTILE: f64 = 0.65;
/// Accepted-class quantile used for features where lower is better
pub const FAVORABLE_LOW_QUANTILE: f64 = 0.35;
/// Weight of the optimised profile when it has to be toned down
pub const BLEND_WEIGHT: f64 = 0.5;
/// Number of leading features moved by the sensitivity check
pub const SENSITIVITY_FEATURES: usize = 5;

/// Probability and score of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileScore {
    pub probability: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultProfile {
    pub features: Vec<f64>,
    pub base: ProfileScore,
    pub optimized: ProfileScore,
    pub result: ProfileScore,
    /// True when the optimised profile scored too high and was blended back.
    pub blended: bool,
}

/// Score swing of the default profile when its leading features are moved
/// to their unfavourable and favourable ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub default_score: f64,
    pub degraded_score: f64,
    pub improved_score: f64,
}

impl SensitivityReport {
    pub fn swing(&self) -> f64 {
        (self.improved_score - self.degraded_score).abs()
    }
}

fn score_profile(
    predictor: &Predictor,
    scoring: ScoringParams,
    values: &[f64],
) -> Result<ProfileScore> {
    let features = FeatureVector::new(values.to_vec())?;
    let [_, probability] = predictor.probabilities(&features)?;
    Ok(ProfileScore {
        probability,
        score: scoring.probability_to_score(probability),
    })
}

/// Build the default profile from the accepted class and the analysed features.
pub fn optimize_defaults(
    predictor: &Predictor,
    dataset: &Dataset,
    records: &[FeatureImportanceRecord],
    scoring: ScoringParams,
    thresholds: ScoreThresholds,
) -> Result<DefaultProfile> {
    let accepted = dataset.accepted();
    let base = accepted
        .column_means()
        .ok_or_else(|| AnalyzerError::analysis("dataset has no accepted rows"))?;
    let base_score = score_profile(predictor, scoring, &base)?;
    info!(
        "Base score (accepted means): {:.1}/100 (prob {:.2}%)",
        base_score.score,
        base_score.probability * 100.0
    );

    let mut optimized = base.clone();
    for record in records {
        let level = match record.direction {
            Direction::Higher => FAVORABLE_HIGH_QUANTILE,
            Direction::Lower => FAVORABLE_LOW_QUANTILE,
        };
        let column = accepted.column(record.var_index);
        let value = stats::quantile(&column, level)
            .ok_or_else(|| AnalyzerError::analysis("empty accepted column"))?;
        debug!("{} -> {:.4}", record.feature, value);
        optimized[record.var_index] = value;
    }
    let optimized_score = score_profile(predictor, scoring, &optimized)?;
    info!("Optimised score: {:.1}/100", optimized_score.score);

    let blended = optimized_score.score > thresholds.very_strict;
    let (features, result) = if blended {
        let mixed: Vec<f64> = optimized
            .iter()
            .zip(&base)
            .map(|(o, b)| BLEND_WEIGHT * o + (1.0 - BLEND_WEIGHT) * b)
            .collect();
        let mixed_score = score_profile(predictor, scoring, &mixed)?;
        info!("Blended score (50/50): {:.1}/100", mixed_score.score);
        (mixed, mixed_score)
    } else {
        (optimized, optimized_score)
    };

    Ok(DefaultProfile {
        features,
        base: base_score,
        optimized: optimized_score,
        result,
        blended,
    })
}

/// Move the first `SENSITIVITY_FEATURES` records to their unfavourable and
/// favourable ends and report the resulting scores.
pub fn sensitivity(
    predictor: &Predictor,
    scoring: ScoringParams,
    profile: &[f64],
    records: &[FeatureImportanceRecord],
) -> Result<SensitivityReport> {
    let leading = &records[..records.len().min(SENSITIVITY_FEATURES)];
    let mut degraded = profile.to_vec();
    let mut improved = profile.to_vec();
    for record in leading {
        let slot = record.var_index;
        if slot >= profile.len() {
            return Err(AnalyzerError::analysis(format!(
                "feature index {slot} out of range"
            )));
        }
        degraded[slot] = record.unfavorable_value();
        improved[slot] = record.favorable_value();
    }

    Ok(SensitivityReport {
        default_score: score_profile(predictor, scoring, profile)?.score,
        degraded_score: score_profile(predictor, scoring, &degraded)?.score,
        improved_score: score_profile(predictor, scoring, &improved)?.score,
    })
}
