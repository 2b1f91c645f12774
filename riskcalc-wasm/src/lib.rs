//! Framework-neutral WASM <-> JavaScript bridge for the calculators.

use riskcalc_core::{
    Assessment, CalcError, CalculationInput, DisplayRecord, PersistenceRecord, ScoringConfig,
};
use riskcalc_engine::{evaluate_form, CalculatorKind};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsScoringConfig {
    #[serde(default)]
    luteal_phase_days: Option<u32>,
    #[serde(default)]
    fertile_window_days: Option<u32>,
    #[serde(default)]
    cardiovascular_point_cap: Option<u32>,
}

impl From<JsScoringConfig> for ScoringConfig {
    fn from(cfg: JsScoringConfig) -> Self {
        let mut base = ScoringConfig::default();
        if let Some(days) = cfg.luteal_phase_days {
            base.luteal_phase_days = days;
        }
        if let Some(days) = cfg.fertile_window_days {
            base.fertile_window_days = days;
        }
        if let Some(cap) = cfg.cardiovascular_point_cap {
            base.cardiovascular_point_cap = cap;
        }
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<ScoringConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsScoringConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(ScoringConfig::from(cfg))
        }
        _ => Ok(ScoringConfig::default()),
    }
}

fn run(
    calculator: &str,
    fields: JsValue,
    config: Option<JsValue>,
) -> Result<(CalculationInput, Assessment), JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let fields = from_value::<serde_json::Value>(fields)
        .map_err(|err| JsValue::from_str(&format!("Could not read form fields: {err}")))?;
    let cfg = read_config(config)?;
    evaluate_form(calculator, &fields, &cfg).map_err(calc_error_to_js)
}

/// Validate form fields and return the display record for the result panel.
///
/// Validation failures reject with an array of `{ field, problem, .. }`
/// objects so the form can mark each field; other failures reject with a
/// message string.
#[wasm_bindgen]
pub fn calculate(
    calculator: &str,
    fields: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let (_, assessment) = run(calculator, fields, config)?;
    to_value(&DisplayRecord::from(&assessment))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize result: {err}")))
}

/// Build the row the results store expects for this calculation.
#[wasm_bindgen]
pub fn persistence_record(
    calculator: &str,
    fields: JsValue,
    patient_id: &str,
    notes: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let (input, assessment) = run(calculator, fields, config)?;
    let record = PersistenceRecord::from_assessment(
        patient_id,
        &assessment,
        &input,
        notes.unwrap_or_default(),
    );
    to_value(&record)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize record: {err}")))
}

/// Calculator ids, names, domains and form fields.
#[wasm_bindgen]
pub fn list_calculators() -> Result<JsValue, JsValue> {
    let infos: Vec<_> = CalculatorKind::ALL
        .into_iter()
        .map(CalculatorKind::info)
        .collect();
    to_value(&infos)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize list: {err}")))
}

fn calc_error_to_js(err: CalcError) -> JsValue {
    match &err {
        CalcError::Validation(errors) => {
            to_value(errors)
                .unwrap_or_else(|_| JsValue::from_str(&format_calc_error(&err)))
        }
        _ => JsValue::from_str(&format_calc_error(&err)),
    }
}

fn format_calc_error(err: &CalcError) -> String {
    format!("Calculation error: {err}")
}
