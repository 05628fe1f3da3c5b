//! Feature vector validation
//!
//! The classifier was trained on exactly [`FEATURE_COUNT`] anonymized
//! variables named `var_0..var_199`. Position matters; names carry no
//! semantics beyond the index.

use crate::errors::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Number of input variables expected by the classifier
pub const FEATURE_COUNT: usize = 200;

/// Column name of the feature at `index`
pub fn feature_name(index: usize) -> String {
    format!("var_{index}")
}

/// All feature names in training order
pub fn feature_names() -> Vec<String> {
    (0..FEATURE_COUNT).map(feature_name).collect()
}

/// Parse a `var_N` column name back into its index
pub fn parse_feature_name(name: &str) -> Option<usize> {
    let index = name.strip_prefix("var_")?.parse::<usize>().ok()?;
    (index < FEATURE_COUNT).then_some(index)
}

/// Validated, ordered input to the classifier.
///
/// Construction is the only place where length and finiteness are checked;
/// every holder of a `FeatureVector` can rely on both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(ScoringError::invalid_input(format!(
                "invalid feature count: expected {FEATURE_COUNT}, received {}",
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScoringError::invalid_input(format!(
                "feature {} is not a finite number",
                feature_name(index)
            )));
        }
        Ok(Self(values))
    }

    /// All-zero profile, mostly useful for smoke checks.
    pub fn zeros() -> Self {
        Self(vec![0.0; FEATURE_COUNT])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Copy of this vector with one position replaced.
    pub fn with_value(&self, index: usize, value: f64) -> Result<Self> {
        if index >= FEATURE_COUNT {
            return Err(ScoringError::invalid_input(format!(
                "feature index {index} out of range"
            )));
        }
        if !value.is_finite() {
            return Err(ScoringError::invalid_input(format!(
                "feature {} is not a finite number",
                feature_name(index)
            )));
        }
        let mut values = self.0.clone();
        values[index] = value;
        Ok(Self(values))
    }
}

impl<'de> Deserialize<'de> for FeatureVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        FeatureVector::new(values).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = ScoringError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}
