//! Per-feature score impact on the average profile
//!
//! Each influential feature is swept from its P10 to its P90 while every
//! other feature stays at the dataset mean; the score difference between
//! the two ends is the feature's impact in points.

use crate::dataset::Dataset;
use crate::errors::{AnalyzerError, Result};
use credit_score_core::{
    feature_name, stats, Direction, FeatureImportanceRecord, FeatureVector, Predictor,
    ScoringParams,
};
use tracing::debug;

/// Number of features kept when the caller does not choose
pub const DEFAULT_TOP_FEATURES: usize = 20;

/// Rank features by model weight and measure the score impact of the
/// `top_n` strongest ones, most impactful first.
pub fn analyze_features(
    predictor: &Predictor,
    dataset: &Dataset,
    scoring: ScoringParams,
    top_n: usize,
) -> Result<Vec<FeatureImportanceRecord>> {
    let weights = predictor.model().feature_weights();
    let importance = weights.importance();
    let base = FeatureVector::new(dataset.column_means())?;
    let accepted = dataset.accepted();
    let rejected = dataset.rejected();

    let mut records = weights
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|index| -> Result<FeatureImportanceRecord> {
            let mut column = dataset.column(index);
            column.sort_by(f64::total_cmp);
            let q = |level: f64| {
                stats::quantile_sorted(&column, level)
                    .ok_or_else(|| AnalyzerError::analysis("empty feature column"))
            };
            let (p10, p25, p50, p75, p90) = (q(0.10)?, q(0.25)?, q(0.50)?, q(0.75)?, q(0.90)?);

            let prob_low = positive_probability(predictor, &base.with_value(index, p10)?)?;
            let prob_high = positive_probability(predictor, &base.with_value(index, p90)?)?;
            let score_low = scoring.probability_to_score(prob_low);
            let score_high = scoring.probability_to_score(prob_high);
            let direction = if prob_high > prob_low {
                Direction::Higher
            } else {
                Direction::Lower
            };
            // score_at_p10/p90 hold the unfavourable and favourable ends
            let (score_at_p10, score_at_p90) = match direction {
                Direction::Higher => (score_low, score_high),
                Direction::Lower => (score_high, score_low),
            };

            let mean_accepted = stats::mean(&accepted.column(index)).unwrap_or(p50);
            let mean_rejected = stats::mean(&rejected.column(index)).unwrap_or(p50);

            debug!(
                "{}: impact {:.1} pts, direction {}",
                feature_name(index),
                (score_high - score_low).abs(),
                direction.as_str()
            );

            Ok(FeatureImportanceRecord {
                feature: feature_name(index),
                var_index: index,
                importance: importance.get(index).copied().unwrap_or(0.0),
                impact_points: (score_high - score_low).abs(),
                direction,
                min: column.first().copied().unwrap_or(p10),
                max: column.last().copied().unwrap_or(p90),
                p10,
                p25,
                p50,
                p75,
                p90,
                mean_accepted,
                mean_rejected,
                score_at_p10,
                score_at_p90,
                optimal_value: mean_accepted,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    records.sort_by(|a, b| b.impact_points.total_cmp(&a.impact_points));
    Ok(records)
}

fn positive_probability(predictor: &Predictor, features: &FeatureVector) -> Result<f64> {
    let [_, p1] = predictor.probabilities(features)?;
    Ok(p1)
}
