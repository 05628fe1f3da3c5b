//! Probability→score calibration over a labelled reference dataset

use crate::dataset::Dataset;
use crate::errors::Result;
use credit_score_core::{stats, Predictor, ScoreDistribution, ScoringMetadata, ScoringParams};
use tracing::{debug, info};

/// Everything learned from one pass of the model over the dataset.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub metadata: ScoringMetadata,
    pub probabilities: Vec<f64>,
}

/// Positive-class probability of every row, in dataset order.
pub fn positive_probabilities(predictor: &Predictor, dataset: &Dataset) -> Result<Vec<f64>> {
    (0..dataset.len())
        .map(|index| -> Result<f64> {
            let features = dataset.vector(index)?;
            let [_, p1] = predictor.probabilities(&features)?;
            Ok(p1)
        })
        .collect()
}

/// Area under the ROC curve from the rank statistic; ties share their
/// average rank. `None` when one of the classes is absent.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    if scores.len() != labels.len() {
        return None;
    }
    let positives = labels.iter().filter(|l| **l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1..=end share their mean
        let shared = (start + 1 + end) as f64 / 2.0;
        for position in &order[start..end] {
            ranks[*position] = shared;
        }
        start = end;
    }

    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(labels)
        .filter(|(_, label)| **label == 1)
        .map(|(rank, _)| rank)
        .sum();
    let positives = positives as f64;
    let u = positive_rank_sum - positives * (positives + 1.0) / 2.0;
    Some(u / (positives * negatives as f64))
}

/// Score distribution of each class under `params`.
pub fn score_distribution(
    probabilities: &[f64],
    labels: &[u8],
    params: ScoringParams,
) -> Option<ScoreDistribution> {
    let split = |target: u8| -> Vec<f64> {
        probabilities
            .iter()
            .zip(labels)
            .filter(|(_, label)| **label == target)
            .map(|(p, _)| *p)
            .collect()
    };
    let accepted = split(1);
    let rejected = split(0);
    let accepted_scores: Vec<f64> = accepted
        .iter()
        .map(|p| params.probability_to_score(*p))
        .collect();

    Some(ScoreDistribution {
        accepted_median: params.probability_to_score(stats::median(&accepted)?),
        rejected_median: params.probability_to_score(stats::median(&rejected)?),
        accepted_p25: stats::percentile(&accepted_scores, 25.0)?,
        accepted_p75: stats::percentile(&accepted_scores, 75.0)?,
    })
}

/// Fit the score bounds on P1/P99 of the model's probabilities and
/// summarise how both classes land on the resulting scale.
pub fn calibrate(predictor: &Predictor, dataset: &Dataset) -> Result<Calibration> {
    let probabilities = positive_probabilities(predictor, dataset)?;
    let params = ScoringParams::from_probabilities(&probabilities)?;
    info!(
        "Score range fitted: p_min={:.4}, p_max={:.4}",
        params.p_min(),
        params.p_max()
    );

    let mut metadata = ScoringMetadata::new(predictor.model_info().model_type, params);
    metadata.roc_auc_score = roc_auc(&probabilities, &dataset.targets);
    metadata.score_distribution = score_distribution(&probabilities, &dataset.targets, params);

    if let Some(auc) = metadata.roc_auc_score {
        info!("ROC-AUC on reference data: {auc:.4}");
    }
    if let Some(distribution) = &metadata.score_distribution {
        debug!(
            "Median scores: accepted={:.1}, rejected={:.1}",
            distribution.accepted_median, distribution.rejected_median
        );
    }

    Ok(Calibration {
        metadata,
        probabilities,
    })
}
