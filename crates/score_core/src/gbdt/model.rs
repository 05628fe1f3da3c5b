//! Boosted tree ensemble for binary classification

use super::tree::Tree;
use serde::{Deserialize, Serialize};

/// Current model format version
pub const FORMAT_VERSION: i32 = 1;

/// Gradient boosted ensemble producing a log-odds margin.
///
/// `margin = init_score + Σ tree.weight · leaf(tree)`; the positive class
/// probability is `sigmoid(margin)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    /// Model format version (always 1 for now)
    #[serde(default = "default_version")]
    pub version: i32,

    /// Starting margin before any tree contributes
    #[serde(default)]
    pub init_score: f64,

    pub trees: Vec<Tree>,

    /// Importances exported with the model; split counts are used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importances: Option<Vec<f64>>,
}

fn default_version() -> i32 {
    FORMAT_VERSION
}

impl GbdtModel {
    pub fn new(trees: Vec<Tree>, init_score: f64) -> Self {
        Self {
            version: FORMAT_VERSION,
            init_score,
            trees,
            importances: None,
        }
    }

    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.version != FORMAT_VERSION {
            return Err(format!("unsupported model version: {}", self.version));
        }
        if !self.init_score.is_finite() {
            return Err("init_score is not finite".to_string());
        }
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("tree {i} validation failed: {e}"))?;
        }
        if let Some(importances) = &self.importances {
            if importances.len() != n_features {
                return Err(format!(
                    "expected {n_features} importances, found {}",
                    importances.len()
                ));
            }
        }
        Ok(())
    }

    /// Raw log-odds margin
    pub fn margin(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.init_score, |acc, tree| acc + tree.contribution(features))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(Tree::depth).max().unwrap_or(0)
    }

    /// Per-feature importance: exported values if present, else split counts.
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        if let Some(importances) = &self.importances {
            return importances.clone();
        }
        let mut counts = vec![0.0; n_features];
        for tree in &self.trees {
            tree.accumulate_split_counts(&mut counts);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> GbdtModel {
        let tree1 = Tree::new(
            vec![Node::internal(0, 0.0, 1, 2), Node::leaf(-1.0), Node::leaf(1.0)],
            0.1,
        );
        let tree2 = Tree::new(
            vec![Node::internal(1, 0.0, 1, 2), Node::leaf(-0.5), Node::leaf(0.5)],
            0.1,
        );
        GbdtModel::new(vec![tree1, tree2], -2.0)
    }

    #[test]
    fn margin_accumulates_weighted_leaves() {
        let model = create_test_model();
        assert!(model.validate(2).is_ok());
        let margin = model.margin(&[1.0, -1.0]);
        assert!((margin - (-2.0 + 0.1 - 0.05)).abs() < 1e-12);
    }

    #[test]
    fn inference_is_repeatable() {
        let model = create_test_model();
        let features = [0.3, 0.7];
        assert_eq!(model.margin(&features), model.margin(&features));
    }

    #[test]
    fn importances_default_to_split_counts() {
        let mut model = create_test_model();
        assert_eq!(model.feature_importances(3), vec![1.0, 1.0, 0.0]);

        model.importances = Some(vec![5.0, 2.0]);
        assert_eq!(model.feature_importances(2), vec![5.0, 2.0]);
        assert!(model.validate(3).is_err());
    }

    #[test]
    fn validation_rejects_empty_and_wrong_version() {
        assert!(GbdtModel::new(vec![], 0.0).validate(2).is_err());
        let mut model = create_test_model();
        model.version = 7;
        assert!(model.validate(2).is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{"trees":[{"nodes":[{"left":-1,"right":-1,"feature":-1,"leaf":0.25}]}]}"#;
        let model: GbdtModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.version, FORMAT_VERSION);
        assert_eq!(model.trees[0].weight, 1.0);
        assert_eq!(model.margin(&[]), 0.25);
        assert_eq!(model.max_depth(), 0);
    }
}
