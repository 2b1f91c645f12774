//! Core value types for the health risk calculators: scores, grades,
//! threshold tables, validated inputs and the records handed to the UI and
//! to the persistence collaborator.

use serde::{Deserialize, Serialize};

pub mod input;
pub mod persist;
pub mod recommend;
pub mod record;
pub mod threshold;

pub use input::{CalculationInput, FieldError, FieldKind, FieldProblem, FieldSpec, FieldValue};
pub use persist::{save_assessment, PersistenceError, RecordSink, SaveNotice};
pub use recommend::RecommendationBuilder;
pub use record::{DisplayRecord, ParsedResult, PersistenceRecord};
pub use threshold::{Band, Breakpoint, Edge, Interval, ThresholdTable};

/// Model constants that are not patient data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Days from ovulation to the next period.
    pub luteal_phase_days: u32,
    /// Days before ovulation counted as fertile.
    pub fertile_window_days: u32,
    /// Upper bound of the composite cardiovascular point score.
    pub cardiovascular_point_cap: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            luteal_phase_days: 14,
            fertile_window_days: 5,
            cardiovascular_point_cap: 30,
        }
    }
}

/// Ordering used when findings are listed: most severe first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Borderline,
    Abnormal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

/// Symptom burden reported by a questionnaire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymptomLevel {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

/// Categorical interpretation attached to a score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "level", rename_all = "snake_case")]
pub enum Grade {
    Status(Status),
    Risk(RiskLevel),
    Symptom(SymptomLevel),
    /// Reference value without a normal range (energy needs, cycle day).
    Informational,
}

impl Grade {
    pub fn severity(self) -> Severity {
        match self {
            Grade::Status(Status::Normal) => Severity::Low,
            Grade::Status(Status::Borderline) => Severity::Moderate,
            Grade::Status(Status::Abnormal) => Severity::High,
            Grade::Risk(RiskLevel::Low) => Severity::Low,
            Grade::Risk(RiskLevel::Moderate) => Severity::Moderate,
            Grade::Risk(RiskLevel::High) => Severity::High,
            Grade::Risk(RiskLevel::VeryHigh) => Severity::Critical,
            Grade::Symptom(SymptomLevel::Minimal) => Severity::Info,
            Grade::Symptom(SymptomLevel::Mild) => Severity::Low,
            Grade::Symptom(SymptomLevel::Moderate) => Severity::Moderate,
            Grade::Symptom(SymptomLevel::Severe) => Severity::High,
            Grade::Informational => Severity::Info,
        }
    }

    /// Short machine label used as the display `status` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Status(Status::Normal) => "normal",
            Grade::Status(Status::Borderline) => "borderline",
            Grade::Status(Status::Abnormal) => "abnormal",
            Grade::Risk(RiskLevel::Low) => "low",
            Grade::Risk(RiskLevel::Moderate) => "moderate",
            Grade::Risk(RiskLevel::High) => "high",
            Grade::Risk(RiskLevel::VeryHigh) => "very_high",
            Grade::Symptom(SymptomLevel::Minimal) => "minimal",
            Grade::Symptom(SymptomLevel::Mild) => "mild",
            Grade::Symptom(SymptomLevel::Moderate) => "moderate",
            Grade::Symptom(SymptomLevel::Severe) => "severe",
            Grade::Informational => "informational",
        }
    }
}

impl From<Status> for Grade {
    fn from(status: Status) -> Self {
        Grade::Status(status)
    }
}

impl From<RiskLevel> for Grade {
    fn from(level: RiskLevel) -> Self {
        Grade::Risk(level)
    }
}

impl From<SymptomLevel> for Grade {
    fn from(level: SymptomLevel) -> Self {
        Grade::Symptom(level)
    }
}

/// One computed index with its interpretation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub name: String,
    pub value: f64,
    /// `value` rounded for display; `value` itself is never rounded.
    pub display_value: String,
    pub unit: Option<String>,
    pub label: String,
    pub reference_range: String,
    pub grade: Grade,
}

impl ScoreResult {
    pub fn is_critical(&self) -> bool {
        self.grade.severity() <= Severity::High
    }
}

/// A sub-score that could not be computed for lack of input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedScore {
    pub name: String,
    pub missing_field: String,
}

/// Everything one "Calculate" action produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub calculator_id: String,
    pub calculator_name: String,
    pub calculator_type: String,
    pub scores: Vec<ScoreResult>,
    #[serde(default)]
    pub skipped: Vec<SkippedScore>,
    pub recommendations: Vec<String>,
    /// Whether an urgent override line was prepended.
    pub urgent: bool,
}

impl Assessment {
    pub fn primary(&self) -> Option<&ScoreResult> {
        self.scores.first()
    }

    pub fn score(&self, name: &str) -> Option<&ScoreResult> {
        self.scores.iter().find(|score| score.name == name)
    }

    pub fn is_critical(&self) -> bool {
        self.urgent || self.scores.iter().any(ScoreResult::is_critical)
    }
}

/// Errors raised before or during a calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("invalid input: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),
    #[error("cannot compute {score}: `{field}` is missing")]
    InsufficientData { score: String, field: String },
    #[error("unknown calculator `{0}`")]
    UnknownCalculator(String),
    #[error("could not read input: {0}")]
    Parse(String),
}

impl CalcError {
    pub fn insufficient(score: impl Into<String>, field: impl Into<String>) -> Self {
        CalcError::InsufficientData {
            score: score.into(),
            field: field.into(),
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Format a value with a fixed number of decimals, dropping a trailing
/// fractional part when it is all zeros.
pub fn format_numeric(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(grade: Grade) -> ScoreResult {
        ScoreResult {
            name: "Index".to_string(),
            value: 1.0,
            display_value: "1".to_string(),
            unit: None,
            label: "Label".to_string(),
            reference_range: "n/a".to_string(),
            grade,
        }
    }

    #[test]
    fn severity_orders_most_severe_first() {
        let mut severities = vec![Severity::Info, Severity::Critical, Severity::Moderate];
        severities.sort();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Moderate, Severity::Info]
        );
    }

    #[test]
    fn abnormal_and_high_risk_are_critical() {
        assert!(score(Status::Abnormal.into()).is_critical());
        assert!(score(RiskLevel::VeryHigh.into()).is_critical());
        assert!(score(SymptomLevel::Severe.into()).is_critical());
        assert!(!score(Status::Borderline.into()).is_critical());
        assert!(!score(Grade::Informational).is_critical());
    }

    #[test]
    fn grade_serializes_with_kind_tag() {
        let json = serde_json::to_value(Grade::Risk(RiskLevel::VeryHigh)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "risk", "level": "very_high"})
        );
        let info = serde_json::to_value(Grade::Informational).unwrap();
        assert_eq!(info, serde_json::json!({"kind": "informational"}));
    }

    #[test]
    fn format_numeric_trims_zeros() {
        assert_eq!(format_numeric(2.0, 2), "2");
        assert_eq!(format_numeric(2.444444, 2), "2.44");
        assert_eq!(format_numeric(1584.3, 0), "1584");
        assert_eq!(format_numeric(0.1, 1), "0.1");
        assert_eq!(format_numeric(-0.001, 2), "0");
    }

    #[test]
    fn default_config_uses_textbook_constants() {
        let config = ScoringConfig::default();
        assert_eq!(config.luteal_phase_days, 14);
        assert_eq!(config.fertile_window_days, 5);
        assert_eq!(config.cardiovascular_point_cap, 30);
    }
}
