//! Health risk calculators: form validation, per-domain scoring and the
//! registry the UI and CLI dispatch through.

use std::fmt;
use std::str::FromStr;

use riskcalc_core::{Assessment, CalcError, CalculationInput, FieldSpec, ScoringConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod cardiometabolic;
pub mod cycle;
pub mod endocrine;
pub mod gynecological;
pub mod psychological;
pub mod scoring;

/// Medical domain a calculator belongs to; stored as `calculator_type`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Cardiometabolic,
    Endocrine,
    Gynecological,
    Psychological,
    Cycle,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Cardiometabolic => "cardiometabolic",
            Domain::Endocrine => "endocrine",
            Domain::Gynecological => "gynecological",
            Domain::Psychological => "psychological",
            Domain::Cycle => "cycle",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    InsulinResistance,
    BodyComposition,
    KidneyFunction,
    CardiovascularRisk,
    Thyroid,
    PcosScreen,
    Phq9,
    Gad7,
    Pss10,
    PsychScreening,
    CyclePhase,
}

impl CalculatorKind {
    pub const ALL: [CalculatorKind; 11] = [
        CalculatorKind::InsulinResistance,
        CalculatorKind::BodyComposition,
        CalculatorKind::KidneyFunction,
        CalculatorKind::CardiovascularRisk,
        CalculatorKind::Thyroid,
        CalculatorKind::PcosScreen,
        CalculatorKind::Phq9,
        CalculatorKind::Gad7,
        CalculatorKind::Pss10,
        CalculatorKind::PsychScreening,
        CalculatorKind::CyclePhase,
    ];

    pub fn id(self) -> &'static str {
        match self {
            CalculatorKind::InsulinResistance => "insulin_resistance",
            CalculatorKind::BodyComposition => "body_composition",
            CalculatorKind::KidneyFunction => "kidney_function",
            CalculatorKind::CardiovascularRisk => "cardiovascular_risk",
            CalculatorKind::Thyroid => "thyroid",
            CalculatorKind::PcosScreen => "pcos_screen",
            CalculatorKind::Phq9 => "phq9",
            CalculatorKind::Gad7 => "gad7",
            CalculatorKind::Pss10 => "pss10",
            CalculatorKind::PsychScreening => "psych_screening",
            CalculatorKind::CyclePhase => "cycle_phase",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CalculatorKind::InsulinResistance => "Insulin Resistance Panel",
            CalculatorKind::BodyComposition => "BMI & Energy Needs",
            CalculatorKind::KidneyFunction => "Kidney Function (eGFR)",
            CalculatorKind::CardiovascularRisk => "Cardiovascular Risk",
            CalculatorKind::Thyroid => "Thyroid Function",
            CalculatorKind::PcosScreen => "PCOS Hormone Screen",
            CalculatorKind::Phq9 => "PHQ-9 Depression Screen",
            CalculatorKind::Gad7 => "GAD-7 Anxiety Screen",
            CalculatorKind::Pss10 => "PSS-10 Perceived Stress",
            CalculatorKind::PsychScreening => "Psychological Wellbeing Screen",
            CalculatorKind::CyclePhase => "Cycle Phase",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            CalculatorKind::InsulinResistance
            | CalculatorKind::BodyComposition
            | CalculatorKind::KidneyFunction
            | CalculatorKind::CardiovascularRisk => Domain::Cardiometabolic,
            CalculatorKind::Thyroid => Domain::Endocrine,
            CalculatorKind::PcosScreen => Domain::Gynecological,
            CalculatorKind::Phq9
            | CalculatorKind::Gad7
            | CalculatorKind::Pss10
            | CalculatorKind::PsychScreening => Domain::Psychological,
            CalculatorKind::CyclePhase => Domain::Cycle,
        }
    }

    /// Form fields accepted by this calculator.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            CalculatorKind::InsulinResistance => cardiometabolic::INSULIN_FIELDS,
            CalculatorKind::BodyComposition => cardiometabolic::BODY_FIELDS,
            CalculatorKind::KidneyFunction => cardiometabolic::KIDNEY_FIELDS,
            CalculatorKind::CardiovascularRisk => cardiometabolic::CARDIOVASCULAR_FIELDS,
            CalculatorKind::Thyroid => endocrine::THYROID_FIELDS,
            CalculatorKind::PcosScreen => gynecological::PCOS_FIELDS,
            CalculatorKind::Phq9 => psychological::PHQ9_FIELDS,
            CalculatorKind::Gad7 => psychological::GAD7_FIELDS,
            CalculatorKind::Pss10 => psychological::PSS10_FIELDS,
            CalculatorKind::PsychScreening => psychological::SCREENING_FIELDS,
            CalculatorKind::CyclePhase => cycle::CYCLE_FIELDS,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn info(self) -> CalculatorInfo {
        CalculatorInfo {
            id: self.id(),
            name: self.name(),
            domain: self.domain(),
            fields: self.fields(),
        }
    }
}

impl FromStr for CalculatorKind {
    type Err = CalcError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        Self::from_id(id.trim())
            .ok_or_else(|| CalcError::UnknownCalculator(id.to_string()))
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Calculator description handed to form builders.
#[derive(Debug, Clone, Serialize)]
pub struct CalculatorInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub domain: Domain,
    pub fields: &'static [FieldSpec],
}

/// Biological sex as used by the sex-specific formulas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const OPTIONS: &'static [&'static str] = &["female", "male"];

    pub(crate) fn from_input(
        input: &CalculationInput,
        score: &str,
        field: &str,
    ) -> Result<Self, CalcError> {
        match input.require_choice(score, field)? {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            _ => Err(CalcError::insufficient(score, field)),
        }
    }
}

/// Run one calculator over already validated input.
pub fn calculate(
    kind: CalculatorKind,
    input: &CalculationInput,
    config: &ScoringConfig,
) -> Result<Assessment, CalcError> {
    tracing::debug!(calculator = kind.id(), "calculating");
    match kind {
        CalculatorKind::InsulinResistance => cardiometabolic::assess_insulin_resistance(input),
        CalculatorKind::BodyComposition => cardiometabolic::assess_body_composition(input),
        CalculatorKind::KidneyFunction => cardiometabolic::assess_kidney_function(input),
        CalculatorKind::CardiovascularRisk => {
            cardiometabolic::assess_cardiovascular_risk(input, config)
        }
        CalculatorKind::Thyroid => endocrine::assess_thyroid(input),
        CalculatorKind::PcosScreen => gynecological::assess_pcos_screen(input),
        CalculatorKind::Phq9 => psychological::assess_phq9(input),
        CalculatorKind::Gad7 => psychological::assess_gad7(input),
        CalculatorKind::Pss10 => psychological::assess_pss10(input),
        CalculatorKind::PsychScreening => psychological::assess_screening(input),
        CalculatorKind::CyclePhase => cycle::assess_cycle_phase(input, config),
    }
}

/// Validate raw form fields and run the calculator, returning the validated
/// input alongside the assessment so it can be stored.
pub fn evaluate_form(
    calculator: &str,
    fields: &Value,
    config: &ScoringConfig,
) -> Result<(CalculationInput, Assessment), CalcError> {
    let kind: CalculatorKind = calculator.parse()?;
    let input = CalculationInput::validate(kind.fields(), fields)?;
    let assessment = calculate(kind, &input, config)?;
    Ok((input, assessment))
}

/// Calculate from a `serde_json::Value` holding the form fields.
pub fn calculate_form_value(
    calculator: &str,
    fields: &Value,
    config: &ScoringConfig,
) -> Result<Assessment, CalcError> {
    evaluate_form(calculator, fields, config)
        .map(|(_, assessment)| assessment)
}

/// Calculate from a JSON string holding the form fields.
pub fn calculate_form_str(
    calculator: &str,
    fields_json: &str,
    config: &ScoringConfig,
) -> Result<Assessment, CalcError> {
    let value: Value = serde_json::from_str(fields_json)
        .map_err(|err| CalcError::Parse(err.to_string()))?;
    calculate_form_value(calculator, &value, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_round_trip_through_from_str() {
        for kind in CalculatorKind::ALL {
            assert_eq!(kind.id().parse::<CalculatorKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                Value::String(kind.id().to_string())
            );
        }
    }

    #[test]
    fn unknown_calculator_is_reported() {
        let err = calculate_form_value("qrisk9", &json!({}), &ScoringConfig::default())
            .unwrap_err();
        assert_eq!(err, CalcError::UnknownCalculator("qrisk9".to_string()));
    }

    #[test]
    fn every_calculator_declares_unique_fields() {
        for kind in CalculatorKind::ALL {
            let fields = kind.fields();
            assert!(!fields.is_empty(), "{kind} has no fields");
            for (i, field) in fields.iter().enumerate() {
                assert!(
                    fields[i + 1..].iter().all(|other| other.name != field.name),
                    "{kind} declares {} twice",
                    field.name
                );
            }
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = calculate_form_str("phq9", "{not json", &ScoringConfig::default());
        assert!(matches!(result, Err(CalcError::Parse(_))));
    }
}
