//! Front-end defaults module, as TypeScript or JSON

use crate::errors::Result;
use crate::questionnaire::Question;
use credit_score_core::{ScoreThresholds, ScoringParams};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::Path;

/// Values per line in the emitted `DEFAULT_FEATURES` array
const VALUES_PER_LINE: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringParamsView {
    pub p_min: f64,
    pub p_max: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsView {
    pub very_strict: f64,
    pub strict: f64,
    pub normal: f64,
    pub lenient: f64,
}

/// Everything the front-end needs to score a profile offline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendBundle {
    pub generated_at: String,
    pub expected_score: f64,
    pub scoring_params: ScoringParamsView,
    pub score_thresholds: ThresholdsView,
    pub default_features: Vec<f64>,
    pub bank_questions: Vec<Question>,
}

impl FrontendBundle {
    pub fn new(
        scoring: ScoringParams,
        thresholds: ScoreThresholds,
        default_features: Vec<f64>,
        expected_score: f64,
        bank_questions: Vec<Question>,
    ) -> Self {
        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            expected_score,
            scoring_params: ScoringParamsView {
                p_min: scoring.p_min(),
                p_max: scoring.p_max(),
            },
            score_thresholds: ThresholdsView {
                very_strict: thresholds.very_strict,
                strict: thresholds.strict,
                normal: thresholds.normal,
                lenient: thresholds.lenient,
            },
            default_features,
            bank_questions,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_typescript(&self) -> Result<String> {
        let mut ts = String::new();
        self.render_typescript(&mut ts)?;
        Ok(ts)
    }

    fn render_typescript(&self, ts: &mut String) -> fmt::Result {
        let rule = "// ===========================================================";
        writeln!(ts, "{rule}")?;
        writeln!(ts, "// GENERATED FILE, DO NOT EDIT ({})", self.generated_at)?;
        writeln!(
            ts,
            "// DEFAULT VALUES TUNED FOR A STARTING SCORE OF ~{:.0}/100",
            self.expected_score
        )?;
        writeln!(ts, "{rule}")?;
        ts.push('\n');

        writeln!(ts, "/**\n * Probability to score (0-100) transform parameters\n */")?;
        writeln!(ts, "export const SCORING_PARAMS = {{")?;
        writeln!(ts, "  pMin: {:.6},", self.scoring_params.p_min)?;
        writeln!(ts, "  pMax: {:.6}", self.scoring_params.p_max)?;
        writeln!(ts, "}};\n")?;

        ts.push_str(
            "/**\n * Maps a raw probability onto the 0-100 credit score\n */\n\
             export function probabilityToScore(probability: number): number {\n  \
             const clipped = Math.min(Math.max(probability, SCORING_PARAMS.pMin), SCORING_PARAMS.pMax);\n  \
             return ((clipped - SCORING_PARAMS.pMin) / (SCORING_PARAMS.pMax - SCORING_PARAMS.pMin)) * 100;\n\
             }\n\n",
        );

        let thresholds = &self.score_thresholds;
        writeln!(ts, "/**\n * Recommended decision thresholds (points out of 100)\n */")?;
        writeln!(ts, "export const SCORE_THRESHOLDS = {{")?;
        writeln!(ts, "  veryStrict: {},", thresholds.very_strict)?;
        writeln!(ts, "  strict: {},", thresholds.strict)?;
        writeln!(ts, "  normal: {},", thresholds.normal)?;
        writeln!(ts, "  lenient: {}", thresholds.lenient)?;
        writeln!(ts, "}};\n")?;

        writeln!(
            ts,
            "/**\n * Default values for all {} features\n */",
            self.default_features.len()
        )?;
        writeln!(ts, "export const DEFAULT_FEATURES: number[] = [")?;
        let lines: Vec<String> = self
            .default_features
            .chunks(VALUES_PER_LINE)
            .map(|chunk| {
                let values: Vec<String> = chunk.iter().map(|v| format!("{v:.2}")).collect();
                format!("  {}", values.join(", "))
            })
            .collect();
        writeln!(ts, "{}", lines.join(",\n"))?;
        writeln!(ts, "];\n")?;

        ts.push_str(BANK_QUESTION_INTERFACE);
        writeln!(
            ts,
            "/**\n * Questions for the most influential features, by impact\n */"
        )?;
        writeln!(ts, "export const BANK_QUESTIONS: BankQuestion[] = [")?;
        for question in &self.bank_questions {
            write_question(ts, question)?;
        }
        writeln!(ts, "];")
    }

    pub fn write_typescript<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_typescript()?)?;
        Ok(())
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

const BANK_QUESTION_INTERFACE: &str = "/**
 * Questionnaire entry bound to one model feature
 */
export interface BankQuestion {
  id: string;
  varIndex: number;
  category: string;
  question: string;
  type: 'number' | 'select' | 'range';
  min: number;
  max: number;
  step?: number;
  unit?: string;
  options?: {label: string, value: number}[];
  helpText?: string;
  impactPoints: number;
  direction: 'higher' | 'lower';
  optimalValue: number;
}

";

/// Single-quoted TypeScript string literal
fn ts_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{escaped}'")
}

fn write_question(ts: &mut String, question: &Question) -> fmt::Result {
    writeln!(ts, "  {{")?;
    writeln!(ts, "    id: {},", ts_string(&question.id))?;
    writeln!(ts, "    varIndex: {},", question.var_index)?;
    writeln!(ts, "    category: {},", ts_string(&question.category))?;
    writeln!(ts, "    question: {},", ts_string(&question.question))?;
    writeln!(ts, "    type: '{}',", question.kind.as_str())?;
    writeln!(ts, "    min: {:.2},", question.min)?;
    writeln!(ts, "    max: {:.2},", question.max)?;
    writeln!(ts, "    step: {:.2},", question.step)?;
    writeln!(ts, "    unit: {},", ts_string(&question.unit))?;
    if let Some(options) = &question.options {
        let rendered: Vec<String> = options
            .iter()
            .map(|o| format!("{{label: {}, value: {:.2}}}", ts_string(&o.label), o.value))
            .collect();
        writeln!(ts, "    options: [{}],", rendered.join(", "))?;
    }
    writeln!(ts, "    helpText: {},", ts_string(&question.help_text))?;
    writeln!(ts, "    impactPoints: {:.1},", question.impact_points)?;
    writeln!(ts, "    direction: '{}',", question.direction.as_str())?;
    writeln!(ts, "    optimalValue: {:.2}", question.optimal_value)?;
    writeln!(ts, "  }},")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::tests::record;
    use crate::questionnaire::{build_questions, LabelSet};
    use credit_score_core::FEATURE_COUNT;

    fn bundle() -> FrontendBundle {
        let questions = build_questions(
            &[record(6, 1.0, 2.0, 12.5), record(174, 0.0, 20.0, 30.0)],
            &LabelSet::default(),
        );
        let features: Vec<f64> = (0..FEATURE_COUNT).map(|i| i as f64 / 3.0).collect();
        FrontendBundle::new(
            ScoringParams::default(),
            ScoreThresholds::default(),
            features,
            55.4,
            questions,
        )
    }

    #[test]
    fn typescript_carries_params_and_defaults() {
        let ts = bundle().to_typescript().unwrap();
        assert!(ts.contains("pMin: 0.006125,"));
        assert!(ts.contains("pMax: 0.723838"));
        assert!(ts.contains("export function probabilityToScore(probability: number): number {"));
        assert!(ts.contains("veryStrict: 70,"));
        assert!(ts.contains("~55/100"));
        assert!(ts.contains("  0.00, 0.33, 0.67, 1.00, 1.33, 1.67, 2.00, 2.33, 2.67, 3.00,\n"));

        let array_start = ts.find("DEFAULT_FEATURES: number[] = [").unwrap();
        let array_end = array_start + ts[array_start..].find("];").unwrap();
        let body = &ts[array_start..array_end];
        assert_eq!(body.lines().count() - 1, FEATURE_COUNT / VALUES_PER_LINE);
    }

    #[test]
    fn typescript_lists_questions() {
        let ts = bundle().to_typescript().unwrap();
        assert!(ts.contains("export interface BankQuestion {"));
        assert!(ts.contains("    id: 'var_6',"));
        assert!(ts.contains("    type: 'select',"));
        assert!(ts.contains("options: [{label: 'Very low', value: 1.10}"));
        assert!(ts.contains("    id: 'var_174',"));
        assert!(ts.contains("    type: 'range',"));
        assert!(ts.contains("    step: 1.00,"));
        assert!(ts.contains("    impactPoints: 30.0,"));
        assert_eq!(ts.matches("options: [").count(), 1);
        assert!(ts.trim_end().ends_with("];"));
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(ts_string("it's"), "'it\\'s'");
        assert_eq!(ts_string("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn json_mirrors_typescript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");
        bundle().write_json(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["scoringParams"]["pMin"], 0.006125);
        assert_eq!(json["scoreThresholds"]["veryStrict"], 70.0);
        assert_eq!(json["defaultFeatures"].as_array().unwrap().len(), FEATURE_COUNT);
        assert_eq!(json["bankQuestions"][1]["type"], "range");
    }
}
