//! Field declarations and the validator that turns raw form values into a
//! [`CalculationInput`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::CalcError;

/// Shape and physiological range of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Number { min: f64, max: f64 },
    Flag,
    Choice { options: &'static [&'static str] },
    Answers { count: usize, min: u8, max: u8 },
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            unit: None,
            kind,
            required: false,
        }
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Choice(String),
    Answers(Vec<u8>),
    Date(NaiveDate),
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    NotANumber { raw: String },
    OutOfRange { value: f64, min: f64, max: f64 },
    NotAnOption { raw: String, options: Vec<String> },
    WrongLength { expected: usize, actual: usize },
    InvalidAnswer { index: usize, raw: String },
    AnswerOutOfRange {
        index: usize,
        value: i64,
        min: u8,
        max: u8,
    },
    InvalidDate { raw: String },
    Precedes { other: String },
    WrongType { expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {problem}")]
pub struct FieldError {
    pub field: String,
    #[serde(flatten)]
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn new(field: &str, problem: FieldProblem) -> Self {
        Self {
            field: field.to_string(),
            problem,
        }
    }
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => write!(f, "required"),
            FieldProblem::NotANumber { raw } => write!(f, "`{raw}` is not a number"),
            FieldProblem::OutOfRange { value, min, max } => {
                write!(f, "{value} is outside {min}..={max}")
            }
            FieldProblem::NotAnOption { raw, options } => {
                write!(f, "`{raw}` is not one of {}", options.join(", "))
            }
            FieldProblem::WrongLength { expected, actual } => {
                write!(f, "expected {expected} answers, got {actual}")
            }
            FieldProblem::InvalidAnswer { index, raw } => {
                write!(f, "answer {} (`{raw}`) is not a whole number", index + 1)
            }
            FieldProblem::AnswerOutOfRange {
                index,
                value,
                min,
                max,
            } => write!(f, "answer {} is {value}, outside {min}..={max}", index + 1),
            FieldProblem::InvalidDate { raw } => write!(f, "`{raw}` is not a YYYY-MM-DD date"),
            FieldProblem::Precedes { other } => write!(f, "must not be before {other}"),
            FieldProblem::WrongType { expected } => write!(f, "expected {expected}"),
        }
    }
}

/// Named bag of validated values for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CalculationInput {
    values: BTreeMap<String, FieldValue>,
}

impl CalculationInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `raw` (a JSON object of form fields) against `specs`.
    ///
    /// Every failing field is reported; nothing is clamped or defaulted.
    /// Empty strings and `null` count as absent, unchecked flags as `false`,
    /// and undeclared fields are ignored.
    pub fn validate(specs: &[FieldSpec], raw: &Value) -> Result<Self, CalcError> {
        let object = raw
            .as_object()
            .ok_or_else(|| CalcError::Parse("form fields must be a JSON object".to_string()))?;

        let mut input = Self::new();
        let mut errors = Vec::new();

        for spec in specs {
            match parse_field(spec, object) {
                Ok(Some(value)) => {
                    input.values.insert(spec.name.to_string(), value);
                }
                Ok(None) if spec.required && spec.kind != FieldKind::Flag => {
                    errors.push(FieldError::new(spec.name, FieldProblem::Missing));
                }
                Ok(None) => {}
                Err(problem) => errors.push(FieldError::new(spec.name, problem)),
            }
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            tracing::warn!(count = errors.len(), "form validation failed");
            Err(CalcError::Validation(errors))
        }
    }

    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    /// Number needed by `score`; absence is an [`CalcError::InsufficientData`].
    pub fn require_number(&self, score: &str, name: &str) -> Result<f64, CalcError> {
        self.number(name)
            .ok_or_else(|| CalcError::insufficient(score, name))
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Flag(true)))
    }

    pub fn choice(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Choice(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn require_choice(&self, score: &str, name: &str) -> Result<&str, CalcError> {
        self.choice(name)
            .ok_or_else(|| CalcError::insufficient(score, name))
    }

    pub fn answers(&self, name: &str) -> Option<&[u8]> {
        match self.values.get(name) {
            Some(FieldValue::Answers(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn require_answers(&self, score: &str, name: &str) -> Result<&[u8], CalcError> {
        self.answers(name)
            .ok_or_else(|| CalcError::insufficient(score, name))
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.values.get(name) {
            Some(FieldValue::Date(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn require_date(&self, score: &str, name: &str) -> Result<NaiveDate, CalcError> {
        self.date(name)
            .ok_or_else(|| CalcError::insufficient(score, name))
    }

    /// Values as a JSON object, keys sorted, for `input_parameters`.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self)
            .unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

fn parse_field(
    spec: &FieldSpec,
    object: &Map<String, Value>,
) -> Result<Option<FieldValue>, FieldProblem> {
    let raw = match object.get(spec.name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(value) => value,
    };

    match spec.kind {
        FieldKind::Number { min, max } => {
            let value = parse_number(raw)?;
            if value < min || value > max {
                return Err(FieldProblem::OutOfRange { value, min, max });
            }
            Ok(Some(FieldValue::Number(value)))
        }
        FieldKind::Flag => parse_flag(raw).map(|flag| Some(FieldValue::Flag(flag))),
        FieldKind::Choice { options } => {
            let text = raw
                .as_str()
                .ok_or(FieldProblem::WrongType { expected: "text" })?;
            let normalized = text.trim().to_lowercase();
            if options.iter().any(|option| *option == normalized) {
                Ok(Some(FieldValue::Choice(normalized)))
            } else {
                Err(FieldProblem::NotAnOption {
                    raw: text.to_string(),
                    options: options.iter().map(|option| option.to_string()).collect(),
                })
            }
        }
        FieldKind::Answers { count, min, max } => parse_answers(raw, count, min, max),
        FieldKind::Date => {
            let text = raw
                .as_str()
                .ok_or(FieldProblem::WrongType { expected: "date" })?;
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(|date| Some(FieldValue::Date(date)))
                .map_err(|_| FieldProblem::InvalidDate {
                    raw: text.to_string(),
                })
        }
    }
}

fn parse_number(raw: &Value) -> Result<f64, FieldProblem> {
    let value = match raw {
        Value::Number(number) => number
            .as_f64()
            .ok_or(FieldProblem::WrongType { expected: "number" })?,
        Value::String(text) => parse_decimal(text)
            .ok_or_else(|| FieldProblem::NotANumber { raw: text.clone() })?,
        _ => return Err(FieldProblem::WrongType { expected: "number" }),
    };
    Ok(value)
}

/// Accepts `5.4` and `5,4`; rejects `NaN`, `inf` and trailing junk.
fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replacen(',', ".", 1)
    };
    let looks_numeric = normalized
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric {
        return None;
    }
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_flag(raw: &Value) -> Result<bool, FieldProblem> {
    match raw {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(FieldProblem::WrongType { expected: "yes/no" }),
        },
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(FieldProblem::WrongType { expected: "yes/no" }),
        },
        _ => Err(FieldProblem::WrongType { expected: "yes/no" }),
    }
}

fn parse_answers(
    raw: &Value,
    count: usize,
    min: u8,
    max: u8,
) -> Result<Option<FieldValue>, FieldProblem> {
    let items = raw.as_array().ok_or(FieldProblem::WrongType {
        expected: "list of answers",
    })?;
    if items.is_empty() {
        return Ok(None);
    }
    if items.len() != count {
        return Err(FieldProblem::WrongLength {
            expected: count,
            actual: items.len(),
        });
    }

    let mut answers = Vec::with_capacity(count);
    for (index, item) in items.iter().enumerate() {
        let value = match item {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| FieldProblem::InvalidAnswer {
            index,
            raw: item.to_string(),
        })?;

        if value < i64::from(min) || value > i64::from(max) {
            return Err(FieldProblem::AnswerOutOfRange {
                index,
                value,
                min,
                max,
            });
        }
        answers.push(value as u8);
    }
    Ok(Some(FieldValue::Answers(answers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SPECS: &[FieldSpec] = &[
        FieldSpec::required(
            "glucose",
            "Fasting glucose",
            FieldKind::Number {
                min: 1.0,
                max: 40.0,
            },
        )
        .unit("mmol/L"),
        FieldSpec::optional(
            "triglycerides",
            "Triglycerides",
            FieldKind::Number {
                min: 0.1,
                max: 30.0,
            },
        ),
        FieldSpec::optional("smoker", "Current smoker", FieldKind::Flag),
        FieldSpec::required(
            "sex",
            "Sex",
            FieldKind::Choice {
                options: &["female", "male"],
            },
        ),
        FieldSpec::optional(
            "answers",
            "Answers",
            FieldKind::Answers {
                count: 3,
                min: 0,
                max: 3,
            },
        ),
        FieldSpec::optional("since", "Since", FieldKind::Date),
    ];

    fn problems(result: Result<CalculationInput, CalcError>) -> Vec<(String, FieldProblem)> {
        match result {
            Err(CalcError::Validation(errors)) => errors
                .into_iter()
                .map(|error| (error.field, error.problem))
                .collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_typed_form_strings() {
        let input = CalculationInput::validate(
            SPECS,
            &json!({
                "glucose": " 5,4 ",
                "smoker": "yes",
                "sex": "Female",
                "answers": [0, "2", 3],
                "since": "2024-03-01",
                "unrelated": "ignored"
            }),
        )
        .unwrap();

        assert_eq!(input.number("glucose"), Some(5.4));
        assert!(input.flag("smoker"));
        assert_eq!(input.choice("sex"), Some("female"));
        assert_eq!(input.answers("answers"), Some(&[0u8, 2, 3][..]));
        assert_eq!(input.date("since"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(input.number("triglycerides"), None);
        assert!(input.get("unrelated").is_none());
    }

    #[test]
    fn reports_every_failure_without_clamping() {
        let found = problems(CalculationInput::validate(
            SPECS,
            &json!({
                "glucose": "45",
                "triglycerides": "abc",
                "sex": "other",
                "answers": [0, 4, 1],
            }),
        ));

        assert_eq!(
            found,
            vec![
                (
                    "glucose".to_string(),
                    FieldProblem::OutOfRange {
                        value: 45.0,
                        min: 1.0,
                        max: 40.0
                    }
                ),
                (
                    "triglycerides".to_string(),
                    FieldProblem::NotANumber {
                        raw: "abc".to_string()
                    }
                ),
                (
                    "sex".to_string(),
                    FieldProblem::NotAnOption {
                        raw: "other".to_string(),
                        options: vec!["female".to_string(), "male".to_string()]
                    }
                ),
                (
                    "answers".to_string(),
                    FieldProblem::AnswerOutOfRange {
                        index: 1,
                        value: 4,
                        min: 0,
                        max: 3
                    }
                ),
            ]
        );
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let found = problems(CalculationInput::validate(
            SPECS,
            &json!({"glucose": "", "sex": null}),
        ));
        assert_eq!(
            found,
            vec![
                ("glucose".to_string(), FieldProblem::Missing),
                ("sex".to_string(), FieldProblem::Missing),
            ]
        );
    }

    #[test]
    fn rejects_special_float_spellings() {
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("12kg"), None);
        assert_eq!(parse_decimal("1e2"), Some(100.0));
    }

    #[test]
    fn answer_list_length_is_checked() {
        let found = problems(CalculationInput::validate(
            SPECS,
            &json!({"glucose": 5, "sex": "male", "answers": [1, 1]}),
        ));
        assert_eq!(
            found,
            vec![(
                "answers".to_string(),
                FieldProblem::WrongLength {
                    expected: 3,
                    actual: 2
                }
            )]
        );
    }

    #[test]
    fn non_object_form_is_a_parse_error() {
        let result = CalculationInput::validate(SPECS, &json!([1, 2]));
        assert!(matches!(result, Err(CalcError::Parse(_))));
    }

    #[test]
    fn require_number_names_the_missing_field() {
        let input = CalculationInput::new()
            .with("glucose", FieldValue::Number(5.0));
        let err = input
            .require_number("McAuley index", "triglycerides")
            .unwrap_err();
        assert_eq!(
            err,
            CalcError::insufficient("McAuley index", "triglycerides")
        );
        assert_eq!(
            err.to_string(),
            "cannot compute McAuley index: `triglycerides` is missing"
        );
    }

    #[test]
    fn input_parameters_are_sorted_json() {
        let input = CalculationInput::new()
            .with("sex", FieldValue::Choice("female".to_string()))
            .with("age", FieldValue::Number(30.0))
            .with(
                "on_date",
                FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            );
        assert_eq!(
            serde_json::to_string(&input.to_json()).unwrap(),
            r#"{"age":30.0,"on_date":"2024-01-05","sex":"female"}"#
        );
    }
}
