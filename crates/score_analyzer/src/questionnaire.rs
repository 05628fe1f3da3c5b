//! Questions derived from the most influential features
//!
//! Features are anonymised, so any business wording comes from an optional
//! labels file and is cosmetic only.

use crate::errors::Result;
use credit_score_core::{stats, Direction, FeatureImportanceRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Below this P10–P90 spread a feature is asked as a five-way choice.
pub const SELECT_RANGE_LIMIT: f64 = 3.0;

/// Number of slider steps between P10 and P90
pub const RANGE_STEPS: f64 = 20.0;

const OPTION_LEVELS: [(f64, &str); 5] = [
    (10.0, "Very low"),
    (30.0, "Low"),
    (50.0, "Average"),
    (70.0, "Good"),
    (90.0, "Excellent"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Select,
    Range,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Range => "range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub value: f64,
}

/// Display wording for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionLabel {
    pub question: String,
    pub category: String,
    #[serde(default)]
    pub unit: String,
}

impl QuestionLabel {
    pub fn fallback(feature: &str) -> Self {
        Self {
            question: format!("Variable {feature}"),
            category: "Other".to_string(),
            unit: String::new(),
        }
    }
}

/// Labels keyed by feature name (`var_N`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(HashMap<String, QuestionLabel>);

impl LabelSet {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn label_for(&self, feature: &str) -> QuestionLabel {
        self.0
            .get(feature)
            .cloned()
            .unwrap_or_else(|| QuestionLabel::fallback(feature))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub var_index: usize,
    pub category: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    pub help_text: String,
    pub impact_points: f64,
    pub direction: Direction,
    pub optimal_value: f64,
}

impl Question {
    pub fn from_record(record: &FeatureImportanceRecord, labels: &LabelSet) -> Self {
        let label = labels.label_for(&record.feature);
        let spread = record.p90 - record.p10;
        let kind = if spread < SELECT_RANGE_LIMIT {
            QuestionKind::Select
        } else {
            QuestionKind::Range
        };
        let options = (kind == QuestionKind::Select).then(|| {
            let bounds = [record.p10, record.p90];
            OPTION_LEVELS
                .iter()
                .map(|(level, name)| QuestionOption {
                    label: name.to_string(),
                    value: stats::percentile(&bounds, *level).unwrap_or(record.p50),
                })
                .collect()
        });

        Self {
            id: record.feature.clone(),
            var_index: record.var_index,
            category: label.category,
            question: label.question,
            kind,
            min: record.p10,
            max: record.p90,
            step: spread / RANGE_STEPS,
            unit: label.unit,
            options,
            help_text: format!(
                "Impact: {:.1} points. Optimal value: {:.1}",
                record.impact_points, record.optimal_value
            ),
            impact_points: record.impact_points,
            direction: record.direction,
            optimal_value: record.optimal_value,
        }
    }
}

/// One question per record, in record order.
pub fn build_questions(records: &[FeatureImportanceRecord], labels: &LabelSet) -> Vec<Question> {
    records
        .iter()
        .map(|record| Question::from_record(record, labels))
        .collect()
}

/// Coarse grouping by how spread out a feature is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionGroup {
    Demographic,
    History,
    Financial,
}

impl QuestionGroup {
    pub fn from_std(std: f64) -> Self {
        if std < 2.0 {
            Self::Demographic
        } else if std < 5.0 {
            Self::History
        } else {
            Self::Financial
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub demographic: Vec<Question>,
    pub financial: Vec<Question>,
    pub history: Vec<Question>,
}

impl Questionnaire {
    /// Group questions using the standard deviation of each feature column.
    pub fn group<F>(questions: Vec<Question>, column_std: F) -> Self
    where
        F: Fn(usize) -> f64,
    {
        let mut questionnaire = Self::default();
        for question in questions {
            match QuestionGroup::from_std(column_std(question.var_index)) {
                QuestionGroup::Demographic => questionnaire.demographic.push(question),
                QuestionGroup::History => questionnaire.history.push(question),
                QuestionGroup::Financial => questionnaire.financial.push(question),
            }
        }
        questionnaire
    }

    pub fn len(&self) -> usize {
        self.demographic.len() + self.financial.len() + self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
