use std::fs;

use pretty_assertions::assert_eq;
use riskcalc_core::{CalcError, DisplayRecord, FieldProblem, PersistenceRecord, ScoringConfig};
use riskcalc_engine::{calculate_form_str, evaluate_form};
use serde_json::{json, Value};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("cannot read fixture")
}

fn assert_matches_golden(calculator: &str) {
    let form = read_fixture(&format!("{calculator}_form.json"));
    let assessment = calculate_form_str(calculator, &form, &ScoringConfig::default())
        .expect("calculation failed");
    let actual = DisplayRecord::from(&assessment);

    let golden = read_fixture(&format!("{calculator}_display.json"));
    let expected: DisplayRecord = serde_json::from_str(&golden)
        .expect("golden is not a display record");

    assert_eq!(actual, expected);
}

#[test]
fn body_composition_matches_golden() {
    assert_matches_golden("body_composition");
}

#[test]
fn psych_screening_matches_golden() {
    assert_matches_golden("psych_screening");
}

#[test]
fn persistence_record_reads_back() {
    let raw = read_fixture("psych_screening_form.json");
    let form: Value = serde_json::from_str(&raw).unwrap();
    let config = ScoringConfig::default();
    let (input, assessment) = evaluate_form("psych_screening", &form, &config).unwrap();
    let record = PersistenceRecord::from_assessment("patient-7", &assessment, &input, "");

    assert_eq!(record.calculator_type, "psychological");
    assert_eq!(record.result_text, "PHQ-9: 8; GAD-7: 10; PSS-10: 26");
    assert_eq!(record.input_parameters, form);
    assert!(!record.is_critical);

    let parsed = record.parse_result().unwrap();
    assert_eq!(parsed.value("PSS-10"), Some(26.0));
}

#[test]
fn every_invalid_field_is_reported() {
    let form = json!({
        "last_period_start": "2026-13-01",
        "cycle_length": 60,
        "on_date": "2026-02-01",
    });
    let config = ScoringConfig::default();
    let err = evaluate_form("cycle_phase", &form, &config).unwrap_err();
    let errors = match err {
        CalcError::Validation(errors) => errors,
        other => panic!("expected a validation error, got {other:?}"),
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(
        fields,
        vec!["last_period_start", "cycle_length", "period_length"]
    );
    assert_eq!(errors[2].problem, FieldProblem::Missing);
}

#[test]
fn cycle_date_before_period_start_is_rejected() {
    let form = json!({
        "last_period_start": "2026-02-01",
        "cycle_length": 28,
        "period_length": 5,
        "on_date": "2026-01-20",
    });
    let config = ScoringConfig::default();
    let err = evaluate_form("cycle_phase", &form, &config).unwrap_err();
    match err {
        CalcError::Validation(errors) => assert_eq!(errors[0].field, "on_date"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}
