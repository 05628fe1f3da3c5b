//! Per-feature standardization applied before inference

use crate::errors::{Result, ScoringError};
use crate::features::FeatureVector;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fitted standardizer: `(x - mean) / scale` per column.
///
/// Immutable after fit and shared read-only by every inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major samples. Columns with zero spread get a unit scale.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| ScoringError::invalid_input("cannot fit scaler on an empty sample"))?;
        if rows.iter().any(|row| row.len() != width) {
            return Err(ScoringError::invalid_input(
                "cannot fit scaler on rows of differing width",
            ));
        }

        let mut mean = Vec::with_capacity(width);
        let mut scale = Vec::with_capacity(width);
        let mut column = Vec::with_capacity(rows.len());
        for j in 0..width {
            column.clear();
            column.extend(rows.iter().map(|row| row[j]));
            let m = stats::mean(&column).unwrap_or(0.0);
            let s = stats::population_std(&column).unwrap_or(0.0);
            mean.push(m);
            scale.push(if s > 0.0 { s } else { 1.0 });
        }

        Ok(Self { mean, scale })
    }

    /// Identity transform of the given width.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(ScoringError::unavailable(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ScoringError::unavailable("scaler mean contains non-finite values"));
        }
        if let Some(index) = self.scale.iter().position(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ScoringError::unavailable(format!(
                "scaler scale at index {index} must be a positive finite number"
            )));
        }
        Ok(())
    }

    /// Structural checks plus the width the classifier expects.
    pub fn validate_for(&self, n_features: usize) -> Result<()> {
        self.validate()?;
        if self.n_features() != n_features {
            return Err(ScoringError::unavailable(format!(
                "scaler was fitted on {} features, expected {n_features}",
                self.n_features()
            )));
        }
        Ok(())
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        self.transform_slice(features.as_slice())
    }

    pub fn transform_slice(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.n_features() {
            return Err(ScoringError::invalid_input(format!(
                "scaler expects {} features, received {}",
                self.n_features(),
                values.len()
            )));
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let scaler: StandardScaler = serde_json::from_str(&json)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use tempfile::tempdir;

    #[test]
    fn fit_centres_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.mean, vec![2.0, 10.0]);
        assert_eq!(scaler.scale, vec![1.0, 1.0]);

        let out = scaler.transform_slice(&[3.0, 12.0]).unwrap();
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn fit_rejects_empty_and_ragged() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn transform_checks_width() {
        let scaler = StandardScaler::identity(3);
        assert!(scaler.transform_slice(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn validate_rejects_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 0.0],
        };
        assert!(matches!(scaler.validate(), Err(ScoringError::ModelUnavailable(_))));
    }

    #[test]
    fn validate_for_rejects_wrong_width() {
        let err = StandardScaler::identity(10)
            .validate_for(FEATURE_COUNT)
            .unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable(_)));
        assert!(err.to_string().contains("fitted on 10 features"));
        assert!(StandardScaler::identity(FEATURE_COUNT)
            .validate_for(FEATURE_COUNT)
            .is_ok());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        let scaler = StandardScaler {
            mean: vec![0.5; FEATURE_COUNT],
            scale: vec![2.0; FEATURE_COUNT],
        };
        scaler.save_json(&path).unwrap();
        let loaded = StandardScaler::load_json(&path).unwrap();
        assert_eq!(loaded, scaler);

        let transformed = loaded.transform(&FeatureVector::zeros()).unwrap();
        assert!(transformed.iter().all(|v| (*v + 0.25).abs() < 1e-12));
    }
}
