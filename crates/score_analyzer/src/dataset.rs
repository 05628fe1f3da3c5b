//! Labelled reference dataset loading
//!
//! Reads the `ID_code,target,var_0..var_199` CSV layout. Columns are
//! resolved by header name, so their order in the file does not matter;
//! the id column is optional.

use crate::errors::{AnalyzerError, Result};
use credit_score_core::features::parse_feature_name;
use credit_score_core::stats::{self, Summary};
use credit_score_core::{FeatureVector, FEATURE_COUNT};
use std::path::Path;

const ID_COLUMN: &str = "ID_code";
const TARGET_COLUMN: &str = "target";

/// Labelled profiles, one row of `FEATURE_COUNT` raw values per customer
#[derive(Clone, Debug)]
pub struct Dataset {
    pub ids: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<u8>,
}

/// Borrowed selection of rows from a [`Dataset`]
#[derive(Clone, Debug)]
pub struct Subset<'a> {
    rows: Vec<&'a [f64]>,
}

impl<'a> Subset<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[&'a [f64]] {
        &self.rows
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Per-feature mean; `None` for an empty selection.
    pub fn column_means(&self) -> Option<Vec<f64>> {
        (0..FEATURE_COUNT)
            .map(|index| stats::mean(&self.column(index)))
            .collect()
    }
}

struct Layout {
    id: Option<usize>,
    target: usize,
    features: Vec<usize>,
    width: usize,
}

impl Layout {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<&str> = header.split(',').map(|s| s.trim()).collect();
        let mut id = None;
        let mut target = None;
        let mut features = vec![None; FEATURE_COUNT];

        for (position, name) in names.iter().enumerate() {
            if *name == ID_COLUMN {
                id = Some(position);
            } else if *name == TARGET_COLUMN {
                target = Some(position);
            } else if let Some(index) = parse_feature_name(name) {
                features[index] = Some(position);
            }
        }

        let target =
            target.ok_or_else(|| AnalyzerError::dataset("missing `target` column in header"))?;
        let features = features
            .into_iter()
            .enumerate()
            .map(|(index, position)| {
                position
                    .ok_or_else(|| AnalyzerError::dataset(format!("missing column var_{index}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            target,
            features,
            width: names.len(),
        })
    }
}

impl Dataset {
    /// Build from in-memory rows; every row must hold `FEATURE_COUNT` finite values.
    pub fn new(ids: Vec<String>, features: Vec<Vec<f64>>, targets: Vec<u8>) -> Result<Self> {
        if features.is_empty() {
            return Err(AnalyzerError::dataset("dataset is empty"));
        }
        if features.len() != targets.len() || ids.len() != features.len() {
            return Err(AnalyzerError::dataset(format!(
                "row count mismatch: {} feature rows, {} targets, {} ids",
                features.len(),
                targets.len(),
                ids.len()
            )));
        }
        for (row_idx, row) in features.iter().enumerate() {
            if row.len() != FEATURE_COUNT {
                return Err(AnalyzerError::dataset(format!(
                    "row {row_idx}: expected {FEATURE_COUNT} features, got {}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(AnalyzerError::dataset(format!(
                    "row {row_idx}: non-finite feature value"
                )));
            }
        }
        if let Some(target) = targets.iter().find(|t| **t > 1) {
            return Err(AnalyzerError::dataset(format!(
                "target must be 0 or 1, got {target}"
            )));
        }
        Ok(Self {
            ids,
            features,
            targets,
        })
    }

    /// Load dataset from CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse_csv(&content)
    }

    pub fn parse_csv(content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let (_, header) = lines
            .next()
            .ok_or_else(|| AnalyzerError::dataset("dataset is empty"))?;
        let layout = Layout::from_header(header)?;

        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (line_idx, line) in lines {
            let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if parts.len() != layout.width {
                return Err(AnalyzerError::dataset(format!(
                    "line {}: expected {} columns, got {}",
                    line_idx + 1,
                    layout.width,
                    parts.len()
                )));
            }

            let id = match layout.id {
                Some(position) => parts[position].to_string(),
                None => format!("row_{}", features.len()),
            };

            let target = match parts[layout.target] {
                "0" => 0,
                "1" => 1,
                other => {
                    return Err(AnalyzerError::dataset(format!(
                        "line {}: invalid target `{other}`",
                        line_idx + 1
                    )))
                }
            };

            let row = layout
                .features
                .iter()
                .enumerate()
                .map(|(index, position)| {
                    parts[*position].parse::<f64>().map_err(|_| {
                        AnalyzerError::dataset(format!(
                            "line {}, var_{index}: invalid number `{}`",
                            line_idx + 1,
                            parts[*position]
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            ids.push(id);
            features.push(row);
            targets.push(target);
        }

        Self::new(ids, features, targets)
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn all(&self) -> Subset<'_> {
        Subset {
            rows: self.features.iter().map(Vec::as_slice).collect(),
        }
    }

    fn with_target(&self, target: u8) -> Subset<'_> {
        Subset {
            rows: self
                .features
                .iter()
                .zip(&self.targets)
                .filter(|(_, t)| **t == target)
                .map(|(row, _)| row.as_slice())
                .collect(),
        }
    }

    /// Rows labelled 1 (transaction, credit-worthy)
    pub fn accepted(&self) -> Subset<'_> {
        self.with_target(1)
    }

    /// Rows labelled 0
    pub fn rejected(&self) -> Subset<'_> {
        self.with_target(0)
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.features.iter().map(|row| row[index]).collect()
    }

    pub fn column_means(&self) -> Vec<f64> {
        // rows are non-empty by construction
        self.all().column_means().unwrap_or_else(|| vec![0.0; FEATURE_COUNT])
    }

    /// Distribution summary of feature `index` over every row.
    pub fn describe(&self, index: usize) -> Option<Summary> {
        if index >= FEATURE_COUNT {
            return None;
        }
        Summary::describe(&self.column(index))
    }

    /// Validated vector for row `index`.
    pub fn vector(&self, index: usize) -> Result<FeatureVector> {
        let row = self
            .features
            .get(index)
            .ok_or_else(|| AnalyzerError::dataset(format!("row {index} out of range")))?;
        Ok(FeatureVector::new(row.clone())?)
    }
}
