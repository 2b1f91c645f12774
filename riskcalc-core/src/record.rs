//! Shapes an [`Assessment`] for the result panel and for storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Assessment, CalcError, CalculationInput, ScoreResult, SkippedScore};

const ENTRY_SEPARATOR: &str = "; ";
const NAME_SEPARATOR: &str = ": ";

/// What the result panel renders for one calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayRecord {
    pub calculator_id: String,
    pub calculator_name: String,
    /// Primary score value.
    pub value: Option<f64>,
    pub display_value: String,
    pub interpretation: String,
    pub status: String,
    pub recommendations: Vec<String>,
    pub scores: Vec<ScoreResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedScore>,
    pub urgent: bool,
}

impl From<&Assessment> for DisplayRecord {
    fn from(assessment: &Assessment) -> Self {
        let primary = assessment.primary();
        let interpretation = primary.map(|score| score.label.clone());
        Self {
            calculator_id: assessment.calculator_id.clone(),
            calculator_name: assessment.calculator_name.clone(),
            value: primary.map(|score| score.value),
            display_value: primary
                .map(|score| score.display_value.clone())
                .unwrap_or_default(),
            interpretation: interpretation.unwrap_or_default(),
            status: primary
                .map(|score| score.grade.as_str().to_string())
                .unwrap_or_default(),
            recommendations: assessment.recommendations.clone(),
            scores: assessment.scores.clone(),
            skipped: assessment.skipped.clone(),
            urgent: assessment.urgent,
        }
    }
}

/// Row accepted by the external results store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceRecord {
    pub patient_id: String,
    pub calculator_type: String,
    pub calculator_name: String,
    pub input_parameters: Value,
    pub result_text: String,
    pub interpretation: String,
    pub reference_range: String,
    pub is_critical: bool,
    pub notes: String,
}

impl PersistenceRecord {
    pub fn from_assessment(
        patient_id: impl Into<String>,
        assessment: &Assessment,
        input: &CalculationInput,
        notes: impl Into<String>,
    ) -> Self {
        let mut notes: String = notes.into();
        if !assessment.skipped.is_empty() {
            let skipped = assessment
                .skipped
                .iter()
                .map(|skip| format!("{} (missing {})", skip.name, skip.missing_field))
                .collect::<Vec<_>>()
                .join(", ");
            if !notes.is_empty() {
                notes.push('\n');
            }
            notes.push_str(&format!("Not computed: {skipped}"));
        }

        Self {
            patient_id: patient_id.into(),
            calculator_type: assessment.calculator_type.clone(),
            calculator_name: assessment.calculator_name.clone(),
            input_parameters: input.to_json(),
            result_text: join_entries(&assessment.scores, |score| score.value.to_string()),
            interpretation: join_entries(&assessment.scores, |score| score.label.clone()),
            reference_range: join_entries(&assessment.scores, |score| {
                score.reference_range.clone()
            }),
            is_critical: assessment.is_critical(),
            notes,
        }
    }

    /// Recover the scores written by [`PersistenceRecord::from_assessment`].
    pub fn parse_result(&self) -> Result<ParsedResult, CalcError> {
        let values = split_entries(&self.result_text)?
            .into_iter()
            .map(|(name, text)| {
                text.parse::<f64>()
                    .map(|value| (name, value))
                    .map_err(|_| CalcError::Parse(format!("`{text}` is not a stored value")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let interpretations = split_entries(&self.interpretation)?;

        Ok(ParsedResult {
            values,
            interpretations,
            is_critical: self.is_critical,
        })
    }
}

/// Scores read back from a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResult {
    pub values: Vec<(String, f64)>,
    pub interpretations: Vec<(String, String)>,
    pub is_critical: bool,
}

impl ParsedResult {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| *value)
    }
}

fn join_entries(scores: &[ScoreResult], field: impl Fn(&ScoreResult) -> String) -> String {
    scores
        .iter()
        .map(|score| format!("{}{NAME_SEPARATOR}{}", score.name, field(score)))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn split_entries(text: &str) -> Result<Vec<(String, String)>, CalcError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(ENTRY_SEPARATOR)
        .map(|entry| {
            entry
                .split_once(NAME_SEPARATOR)
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .ok_or_else(|| CalcError::Parse(format!("malformed entry `{entry}`")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldValue, Grade, RiskLevel, Status};
    use pretty_assertions::assert_eq;

    fn score(name: &str, value: f64, label: &str, grade: Grade) -> ScoreResult {
        ScoreResult {
            name: name.to_string(),
            value,
            display_value: format!("{value:.2}"),
            unit: None,
            label: label.to_string(),
            reference_range: "< 2.7".to_string(),
            grade,
        }
    }

    fn assessment() -> Assessment {
        Assessment {
            calculator_id: "insulin_resistance".to_string(),
            calculator_name: "Insulin Resistance Panel".to_string(),
            calculator_type: "cardiometabolic".to_string(),
            scores: vec![
                score(
                    "HOMA-IR",
                    5.5 * 10.0 / 22.5,
                    "Normal insulin sensitivity",
                    Status::Normal.into(),
                ),
                score("QUICKI", 0.3419125631, "Normal", Status::Normal.into()),
            ],
            skipped: vec![SkippedScore {
                name: "McAuley index".to_string(),
                missing_field: "triglycerides".to_string(),
            }],
            recommendations: vec!["Keep it up".to_string()],
            urgent: false,
        }
    }

    #[test]
    fn display_record_uses_primary_score() {
        let record = DisplayRecord::from(&assessment());
        assert_eq!(record.value, Some(5.5 * 10.0 / 22.5));
        assert_eq!(record.interpretation, "Normal insulin sensitivity");
        assert_eq!(record.status, "normal");
        assert_eq!(record.recommendations, vec!["Keep it up".to_string()]);
    }

    #[test]
    fn persistence_record_round_trips_values_exactly() {
        let input = CalculationInput::new()
            .with("glucose", FieldValue::Number(5.5))
            .with("insulin", FieldValue::Number(10.0));
        let record = PersistenceRecord::from_assessment("patient-1", &assessment(), &input, "");

        assert_eq!(
            record.result_text,
            "HOMA-IR: 2.4444444444444446; QUICKI: 0.3419125631"
        );
        assert_eq!(record.calculator_type, "cardiometabolic");
        assert_eq!(
            record.notes,
            "Not computed: McAuley index (missing triglycerides)"
        );
        assert_eq!(
            record.input_parameters,
            serde_json::json!({"glucose": 5.5, "insulin": 10.0})
        );

        let parsed = record.parse_result().unwrap();
        assert_eq!(parsed.value("HOMA-IR"), Some(5.5 * 10.0 / 22.5));
        assert_eq!(parsed.value("QUICKI"), Some(0.3419125631));
        assert_eq!(
            parsed.interpretations[0],
            ("HOMA-IR".to_string(), "Normal insulin sensitivity".to_string())
        );
        assert!(!parsed.is_critical);
    }

    #[test]
    fn critical_flag_survives_storage() {
        let mut high = assessment();
        high.scores[0] = score(
            "Cardiovascular points",
            22.0,
            "Very high risk",
            RiskLevel::VeryHigh.into(),
        );
        let record =
            PersistenceRecord::from_assessment("p", &high, &CalculationInput::new(), "seen by GP");
        assert!(record.is_critical);
        assert!(record.notes.starts_with("seen by GP\n"));

        let json = serde_json::to_string(&record).unwrap();
        let restored: PersistenceRecord = serde_json::from_str(&json).unwrap();
        let parsed = restored.parse_result().unwrap();
        assert!(parsed.is_critical);
        assert_eq!(parsed.value("Cardiovascular points"), Some(22.0));
    }

    #[test]
    fn malformed_result_text_is_reported() {
        let mut record =
            PersistenceRecord::from_assessment("p", &assessment(), &CalculationInput::new(), "");
        record.result_text = "HOMA-IR 2.4".to_string();
        assert!(matches!(record.parse_result(), Err(CalcError::Parse(_))));
    }
}
