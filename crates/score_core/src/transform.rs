//! Probability to 0–100 score transform
//!
//! The classifier's positive-class probability sits in a narrow band for
//! almost every customer. The transform clips it to `[p_min, p_max]`
//! (reference percentiles of that distribution) and stretches the band
//! linearly onto `[0, 100]`:
//!
//! ```text
//! score = (clip(p, p_min, p_max) - p_min) / (p_max - p_min) * 100
//! ```
//!
//! Callers must pass a valid probability; the result for `NaN` is not
//! meaningful.

use crate::errors::{Result, ScoringError};
use crate::stats;
use serde::{Deserialize, Serialize};

/// Lower bound of the reference probability band
pub const DEFAULT_P_MIN: f64 = 0.006125;
/// Upper bound of the reference probability band
pub const DEFAULT_P_MAX: f64 = 0.723838;

/// Percentiles of the reference distribution used as bounds
pub const LOWER_PERCENTILE: f64 = 1.0;
pub const UPPER_PERCENTILE: f64 = 99.0;

/// Human-readable form persisted next to the bounds
pub const SCORE_FORMULA: &str = "score = ((prob - p_min) / (p_max - p_min)) * 100";

/// Clip `probability` into `[p_min, p_max]` and rescale it to `[0, 100]`.
///
/// Requires `p_min < p_max`; [`ScoringParams`] guarantees it.
pub fn probability_to_score(probability: f64, p_min: f64, p_max: f64) -> f64 {
    let clipped = probability.max(p_min).min(p_max);
    (clipped - p_min) / (p_max - p_min) * 100.0
}

/// Fitted bounds of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringParams {
    p_min: f64,
    p_max: f64,
}

impl ScoringParams {
    /// Enforces `0 <= p_min < p_max <= 1`.
    pub fn new(p_min: f64, p_max: f64) -> Result<Self> {
        if !p_min.is_finite() || !p_max.is_finite() {
            return Err(ScoringError::invalid_input("scoring bounds must be finite"));
        }
        if !(0.0 <= p_min && p_min < p_max && p_max <= 1.0) {
            return Err(ScoringError::invalid_input(format!(
                "scoring bounds must satisfy 0 <= p_min < p_max <= 1, got [{p_min}, {p_max}]"
            )));
        }
        Ok(Self { p_min, p_max })
    }

    /// Bounds from the P1/P99 of a reference probability sample.
    pub fn from_probabilities(probabilities: &[f64]) -> Result<Self> {
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ScoringError::invalid_input(
                "reference probabilities contain non-finite values",
            ));
        }
        let p_min = stats::percentile(probabilities, LOWER_PERCENTILE)
            .ok_or_else(|| ScoringError::invalid_input("no reference probabilities"))?;
        let p_max = stats::percentile(probabilities, UPPER_PERCENTILE)
            .ok_or_else(|| ScoringError::invalid_input("no reference probabilities"))?;
        Self::new(p_min, p_max)
    }

    pub fn p_min(&self) -> f64 {
        self.p_min
    }

    pub fn p_max(&self) -> f64 {
        self.p_max
    }

    pub fn probability_to_score(&self, probability: f64) -> f64 {
        probability_to_score(probability, self.p_min, self.p_max)
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            p_min: DEFAULT_P_MIN,
            p_max: DEFAULT_P_MAX,
        }
    }
}

impl<'de> Deserialize<'de> for ScoringParams {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            p_min: f64,
            p_max: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        ScoringParams::new(raw.p_min, raw.p_max).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_bounds_map_to_extremes() {
        let params = ScoringParams::default();
        assert_eq!(params.probability_to_score(DEFAULT_P_MIN), 0.0);
        assert_eq!(params.probability_to_score(DEFAULT_P_MAX), 100.0);
    }

    #[test]
    fn midpoint_probability() {
        let score = ScoringParams::default().probability_to_score(0.365);
        assert!((score - 50.04).abs() < 0.05, "score was {score}");
    }

    #[test]
    fn clips_outside_band() {
        let params = ScoringParams::default();
        assert_eq!(params.probability_to_score(0.0), 0.0);
        assert_eq!(params.probability_to_score(-3.0), 0.0);
        assert_eq!(params.probability_to_score(0.9), 100.0);
        assert_eq!(params.probability_to_score(42.0), 100.0);
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert!(ScoringParams::new(0.5, 0.5).is_err());
        assert!(ScoringParams::new(0.6, 0.5).is_err());
        assert!(ScoringParams::new(-0.1, 0.5).is_err());
        assert!(ScoringParams::new(0.1, 1.1).is_err());
        assert!(ScoringParams::new(f64::NAN, 0.5).is_err());
        assert!(ScoringParams::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn bounds_from_reference_distribution() {
        let probabilities: Vec<f64> = (0..=100).map(|i| f64::from(i) / 100.0).collect();
        let params = ScoringParams::from_probabilities(&probabilities).unwrap();
        assert!((params.p_min() - 0.01).abs() < 1e-12);
        assert!((params.p_max() - 0.99).abs() < 1e-12);

        assert!(ScoringParams::from_probabilities(&[]).is_err());
        // a degenerate sample cannot yield p_min < p_max
        assert!(ScoringParams::from_probabilities(&[0.2, 0.2, 0.2]).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: ScoringParams = serde_json::from_str(r#"{"p_min":0.1,"p_max":0.2}"#).unwrap();
        assert_eq!(ok.p_max(), 0.2);
        let bad = serde_json::from_str::<ScoringParams>(r#"{"p_min":0.3,"p_max":0.2}"#);
        assert!(bad.is_err());
    }
}
