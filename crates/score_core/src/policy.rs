//! Decision threshold, confidence band and risk policy
//!
//! Decisions are always taken in probability space: the raw positive-class
//! probability is compared against a threshold in `[0, 1]`. Score-space
//! cut-points ([`ScoreThresholds`]) only label a 0–100 score for display and
//! never change a decision.

use crate::errors::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold used when a request does not supply one
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Distance from the threshold above which confidence is HIGH
pub const HIGH_CONFIDENCE_DISTANCE: f64 = 0.3;
/// Distance from the threshold above which confidence is MEDIUM
pub const MEDIUM_CONFIDENCE_DISTANCE: f64 = 0.1;

/// Validated probability-space cut-point in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoringError::invalid_input(format!(
                "threshold must be between 0 and 1, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    CreditAccepted,
    CreditRejected,
}

impl Decision {
    pub fn from_prediction(prediction: u8) -> Self {
        if prediction == 1 {
            Self::CreditAccepted
        } else {
            Self::CreditRejected
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditAccepted => "CREDIT_ACCEPTED",
            Self::CreditRejected => "CREDIT_REJECTED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative band from the distance between probability and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_distance(distance: f64) -> Self {
        if distance > HIGH_CONFIDENCE_DISTANCE {
            Self::High
        } else if distance > MEDIUM_CONFIDENCE_DISTANCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived from one probability/threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub prediction: u8,
    pub decision: Decision,
    pub confidence_level: ConfidenceLevel,
    pub risk_score: f64,
}

fn check_probability(probability: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(ScoringError::invalid_input(format!(
            "probability must be between 0 and 1, got {probability}"
        )));
    }
    Ok(())
}

/// Accept when `probability >= threshold`.
pub fn decide(probability: f64, threshold: Threshold) -> Result<DecisionOutcome> {
    check_probability(probability)?;
    let prediction = u8::from(probability >= threshold.value());
    let distance = (probability - threshold.value()).abs();
    Ok(DecisionOutcome {
        prediction,
        decision: Decision::from_prediction(prediction),
        confidence_level: ConfidenceLevel::from_distance(distance),
        risk_score: risk_score(probability, prediction),
    })
}

/// Probability that `prediction` is wrong.
pub fn risk_score(probability_positive: f64, prediction: u8) -> f64 {
    if prediction == 1 {
        1.0 - probability_positive
    } else {
        probability_positive
    }
}

/// Confidence of a plain prediction: the larger class probability, in percent.
pub fn confidence_percent(probabilities: [f64; 2]) -> f64 {
    probabilities[0].max(probabilities[1]) * 100.0
}

/// Label attached to a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Average,
    AtRisk,
    Unfavorable,
}

impl ScoreBand {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "very good profile, credit granted immediately",
            Self::Good => "good profile, credit likely",
            Self::Average => "average profile, needs review",
            Self::AtRisk => "risky profile, special conditions",
            Self::Unfavorable => "unfavorable profile, refusal likely",
        }
    }
}

/// Recommended score cut-points, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub very_strict: f64,
    pub strict: f64,
    pub normal: f64,
    pub lenient: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            very_strict: 70.0,
            strict: 60.0,
            normal: 50.0,
            lenient: 40.0,
        }
    }
}

impl ScoreThresholds {
    pub fn validate(&self) -> Result<()> {
        let ordered = [self.very_strict, self.strict, self.normal, self.lenient];
        if ordered.iter().any(|t| !(0.0..=100.0).contains(t)) {
            return Err(ScoringError::invalid_input(
                "score thresholds must lie within [0, 100]",
            ));
        }
        if ordered.windows(2).any(|pair| pair[0] < pair[1]) {
            return Err(ScoringError::invalid_input(
                "score thresholds must be ordered very_strict >= strict >= normal >= lenient",
            ));
        }
        Ok(())
    }

    pub fn band(&self, score: f64) -> Result<ScoreBand> {
        if !(0.0..=100.0).contains(&score) {
            return Err(ScoringError::invalid_input(format!(
                "score must be between 0 and 100, got {score}"
            )));
        }
        Ok(if score >= self.very_strict {
            ScoreBand::Excellent
        } else if score >= self.strict {
            ScoreBand::Good
        } else if score >= self.normal {
            ScoreBand::Average
        } else if score >= self.lenient {
            ScoreBand::AtRisk
        } else {
            ScoreBand::Unfavorable
        })
    }
}
