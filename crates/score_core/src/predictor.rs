//! End-to-end scoring: standardize, classify, transform, decide
//!
//! A [`Predictor`] is built once from the loaded artifacts and shared
//! read-only by every request.

use crate::errors::Result;
use crate::features::FeatureVector;
use crate::model::{Classifier, ModelInfo};
use crate::policy::{self, DecisionOutcome, ScoreBand, ScoreThresholds, Threshold};
use crate::scaler::StandardScaler;
use crate::transform::ScoringParams;
use serde::Serialize;
use std::sync::Arc;

/// Class probabilities in the shape the API returns them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub no_transaction: f64,
    pub transaction: f64,
}

impl From<[f64; 2]> for ClassProbabilities {
    fn from([no_transaction, transaction]: [f64; 2]) -> Self {
        Self {
            no_transaction,
            transaction,
        }
    }
}

/// Result of a plain prediction at the 0.5 cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: u8,
    pub probability: ClassProbabilities,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Result of a prediction against a caller-chosen threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdPrediction {
    pub probability: ClassProbabilities,
    pub threshold_used: f64,
    #[serde(flatten)]
    pub outcome: DecisionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_band: Option<ScoreBand>,
}

/// Probability and score of one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredProfile {
    pub probability: f64,
    pub score: f64,
}

pub struct Predictor {
    scaler: StandardScaler,
    model: Arc<dyn Classifier>,
    scoring: Option<ScoringParams>,
    thresholds: ScoreThresholds,
}

impl Predictor {
    pub fn new(scaler: StandardScaler, model: Arc<dyn Classifier>) -> Self {
        Self {
            scaler,
            model,
            scoring: None,
            thresholds: ScoreThresholds::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringParams) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn with_thresholds(mut self, thresholds: ScoreThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn scoring(&self) -> Option<ScoringParams> {
        self.scoring
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn model_info(&self) -> ModelInfo {
        self.model.info()
    }

    /// Raw `[p0, p1]` for a validated vector.
    pub fn probabilities(&self, features: &FeatureVector) -> Result<[f64; 2]> {
        let scaled = self.scaler.transform(features)?;
        self.model.predict_proba(&scaled)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let probabilities = self.probabilities(features)?;
        let prediction = u8::from(probabilities[1] >= policy::DEFAULT_THRESHOLD);
        Ok(Prediction {
            prediction,
            probability: probabilities.into(),
            confidence: policy::confidence_percent(probabilities),
            score: self.scoring.map(|s| s.probability_to_score(probabilities[1])),
        })
    }

    pub fn predict_with_threshold(
        &self,
        features: &FeatureVector,
        threshold: Threshold,
    ) -> Result<ThresholdPrediction> {
        let probabilities = self.probabilities(features)?;
        let outcome = policy::decide(probabilities[1], threshold)?;
        let score = self.scoring.map(|s| s.probability_to_score(probabilities[1]));
        let score_band = score.map(|s| self.thresholds.band(s)).transpose()?;
        Ok(ThresholdPrediction {
            probability: probabilities.into(),
            threshold_used: threshold.value(),
            outcome,
            score,
            score_band,
        })
    }

    /// All-or-nothing: the first failing row fails the batch.
    pub fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<Prediction>> {
        batch.iter().map(|features| self.predict(features)).collect()
    }

    /// Positive-class probability and its score; scoring bounds fall back to
    /// the reference defaults when none were loaded.
    pub fn score(&self, features: &FeatureVector) -> Result<ScoredProfile> {
        let [_, probability] = self.probabilities(features)?;
        let scoring = self.scoring.unwrap_or_default();
        Ok(ScoredProfile {
            probability,
            score: scoring.probability_to_score(probability),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScoringError;
    use crate::features::FEATURE_COUNT;
    use crate::model::{ClassifierModel, FeatureWeights};

    fn logistic_predictor() -> Predictor {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = 1.0;
        let model = ClassifierModel::Logistic {
            coefficients,
            intercept: 0.0,
        };
        Predictor::new(StandardScaler::identity(FEATURE_COUNT), Arc::new(model))
    }

    fn profile(first: f64) -> FeatureVector {
        FeatureVector::zeros().with_value(0, first).unwrap()
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2]> {
            Err(ScoringError::inference("boom"))
        }

        fn feature_weights(&self) -> FeatureWeights {
            FeatureWeights::TreeImportances(vec![0.0; FEATURE_COUNT])
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                model_type: "Failing".to_string(),
                n_features: FEATURE_COUNT,
                n_coefficients: None,
                intercept: None,
                n_estimators: None,
                max_depth: None,
            }
        }
    }

    #[test]
    fn zero_profile_is_a_coin_flip() {
        let prediction = logistic_predictor().predict(&FeatureVector::zeros()).unwrap();
        assert_eq!(prediction.prediction, 1);
        assert_eq!(prediction.probability.transaction, 0.5);
        assert_eq!(prediction.confidence, 50.0);
        assert!(prediction.score.is_none());
    }

    #[test]
    fn threshold_prediction_carries_score_and_band() {
        let predictor = logistic_predictor().with_scoring(ScoringParams::new(0.1, 0.9).unwrap());
        let result = predictor
            .predict_with_threshold(&profile(3.0), Threshold::new(0.6).unwrap())
            .unwrap();
        assert_eq!(result.outcome.prediction, 1);
        assert_eq!(result.threshold_used, 0.6);
        assert_eq!(result.score, Some(100.0));
        assert_eq!(result.score_band, Some(ScoreBand::Excellent));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["decision"], "CREDIT_ACCEPTED");
        assert_eq!(json["confidence_level"], "HIGH");
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let predictor = logistic_predictor();
        let batch = vec![profile(-1.0), profile(1.0)];
        let results = predictor.predict_batch(&batch).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].prediction, 0);
        assert_eq!(results[1].prediction, 1);

        let failing = Predictor::new(
            StandardScaler::identity(FEATURE_COUNT),
            Arc::new(FailingClassifier),
        );
        assert!(matches!(
            failing.predict_batch(&batch),
            Err(ScoringError::InferenceFailure(_))
        ));
    }

    #[test]
    fn scaler_is_applied_before_inference() {
        let mut scaler = StandardScaler::identity(FEATURE_COUNT);
        scaler.mean[0] = 2.0;
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = 1.0;
        let model = ClassifierModel::Logistic {
            coefficients,
            intercept: 0.0,
        };
        let predictor = Predictor::new(scaler, Arc::new(model));
        let [_, p] = predictor.probabilities(&profile(2.0)).unwrap();
        assert_eq!(p, 0.5);
    }

    #[test]
    fn score_falls_back_to_reference_bounds() {
        let scored = logistic_predictor().score(&profile(-10.0)).unwrap();
        assert!(scored.probability < 0.001);
        assert_eq!(scored.score, 0.0);
    }
}
