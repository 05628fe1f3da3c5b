//! Decision tree structures for boosted ensemble inference
//!
//! Trees are flat node arrays with node 0 as the root. Structure is checked
//! once by [`Tree::validate`] when a model is loaded, so traversal never has
//! to guard against dangling child indices.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the (scaled) feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the raw margin contribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split threshold; values `<=` threshold go left
    #[serde(default)]
    pub threshold: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    #[serde(default)]
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree of the ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Multiplier applied to the leaf value (shrinkage)
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw (unweighted) leaf value reached by `features`.
    ///
    /// Callers must have validated the tree against the feature width.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if let Some(value) = node.leaf {
                return value;
            }
            let feature_value = features[node.feature_idx as usize];
            idx = if feature_value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Weighted contribution of this tree to the ensemble margin
    pub fn contribution(&self, features: &[f64]) -> f64 {
        self.evaluate(features) * self.weight
    }

    /// Longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize, remaining: usize) -> usize {
            let node = &nodes[idx];
            if node.is_leaf() || remaining == 0 {
                return 0;
            }
            1 + walk(nodes, node.left as usize, remaining - 1)
                .max(walk(nodes, node.right as usize, remaining - 1))
        }
        if self.nodes.is_empty() {
            return 0;
        }
        walk(&self.nodes, 0, self.nodes.len())
    }

    /// Add one to `counts[feature]` for every split on that feature.
    pub fn accumulate_split_counts(&self, counts: &mut [f64]) {
        for node in self.nodes.iter().filter(|n| !n.is_leaf()) {
            if let Some(slot) = counts.get_mut(node.feature_idx as usize) {
                *slot += 1.0;
            }
        }
    }

    /// Validate structure against a feature width.
    ///
    /// Rejects dangling children, out-of-range features and non-finite values.
    /// A child index must be greater than its parent's and every node has at
    /// most one parent, so the nodes form a proper tree.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err("tree weight is not finite".to_string());
        }

        let len = self.nodes.len();
        let mut referenced = vec![false; len];
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(_) => return Err(format!("leaf node {i} has a non-finite value")),
                    None => return Err(format!("leaf node {i} has no leaf value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child < 0 || child as usize >= len {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
                if child as usize <= i {
                    return Err(format!("node {i} points back to node {child}"));
                }
                if std::mem::replace(&mut referenced[child as usize], true) {
                    return Err(format!("node {child} has more than one parent"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= n_features {
                return Err(format!(
                    "node {i} splits on feature {} outside 0..{n_features}",
                    node.feature_idx
                ));
            }
            if !node.threshold.is_finite() {
                return Err(format!("node {i} has a non-finite threshold"));
            }
        }

        Ok(())
    }
}
