//! Menstrual cycle phase prediction from the last period start.

use chrono::{Days, NaiveDate};
use riskcalc_core::{
    Assessment, CalcError, CalculationInput, FieldError, FieldKind, FieldProblem, FieldSpec,
    ScoringConfig, Severity,
};
use serde::{Deserialize, Serialize};

use crate::scoring::{informational, Sheet};
use crate::CalculatorKind;

const CYCLE_DAY: &str = "Cycle day";
const DAYS_UNTIL_PERIOD: &str = "Days until next period";

pub const CYCLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "last_period_start",
        "First day of last period",
        FieldKind::Date,
    ),
    FieldSpec::required(
        "cycle_length",
        "Average cycle length",
        FieldKind::Number {
            min: 21.0,
            max: 45.0,
        },
    )
    .unit("days"),
    FieldSpec::required(
        "period_length",
        "Period length",
        FieldKind::Number {
            min: 1.0,
            max: 10.0,
        },
    )
    .unit("days"),
    FieldSpec::required("on_date", "Date", FieldKind::Date),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Fertile,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    pub fn label(self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "Menstrual phase",
            CyclePhase::Follicular => "Follicular phase",
            CyclePhase::Fertile => "Fertile window",
            CyclePhase::Ovulation => "Expected ovulation",
            CyclePhase::Luteal => "Luteal phase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CyclePrediction {
    /// 1-based day within the current cycle.
    pub cycle_day: u32,
    pub phase: CyclePhase,
    pub next_period: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub days_until_next_period: u32,
}

fn shift(date: NaiveDate, days: u64) -> Result<NaiveDate, CalcError> {
    date.checked_add_days(Days::new(days)).ok_or_else(|| {
        CalcError::Validation(vec![FieldError::new(
            "last_period_start",
            FieldProblem::InvalidDate {
                raw: date.to_string(),
            },
        )])
    })
}

/// Predict where `on_date` falls in a regular cycle starting at
/// `last_period_start`. Dates past the first cycle roll over into later
/// cycles of the same length.
pub fn predict_cycle(
    last_period_start: NaiveDate,
    cycle_length: u32,
    period_length: u32,
    on_date: NaiveDate,
    config: &ScoringConfig,
) -> Result<CyclePrediction, CalcError> {
    if on_date < last_period_start {
        return Err(CalcError::Validation(vec![FieldError::new(
            "on_date",
            FieldProblem::Precedes {
                other: "last_period_start".to_string(),
            },
        )]));
    }
    let cycle_length = cycle_length.max(1);

    let elapsed = (on_date - last_period_start).num_days().unsigned_abs();
    let length = u64::from(cycle_length);
    let cycle_start = shift(last_period_start, elapsed / length * length)?;
    let cycle_day = (elapsed % length) as u32 + 1;

    let ovulation_day = cycle_length.saturating_sub(config.luteal_phase_days).max(1);
    let fertile_start_day = ovulation_day
        .saturating_sub(config.fertile_window_days)
        .max(1);

    let phase = if cycle_day <= period_length {
        CyclePhase::Menstrual
    } else if cycle_day == ovulation_day {
        CyclePhase::Ovulation
    } else if (fertile_start_day..ovulation_day).contains(&cycle_day) {
        CyclePhase::Fertile
    } else if cycle_day < fertile_start_day {
        CyclePhase::Follicular
    } else {
        CyclePhase::Luteal
    };

    let ovulation_date = shift(cycle_start, u64::from(ovulation_day - 1))?;
    Ok(CyclePrediction {
        cycle_day,
        phase,
        next_period: shift(cycle_start, length)?,
        ovulation_date,
        fertile_start: shift(cycle_start, u64::from(fertile_start_day - 1))?,
        fertile_end: ovulation_date,
        days_until_next_period: cycle_length - cycle_day + 1,
    })
}

pub fn assess_cycle_phase(
    input: &CalculationInput,
    config: &ScoringConfig,
) -> Result<Assessment, CalcError> {
    let last_period_start = input.require_date(CYCLE_DAY, "last_period_start")?;
    let cycle_length = input.require_number(CYCLE_DAY, "cycle_length")?.round() as u32;
    let period_length = input.require_number(CYCLE_DAY, "period_length")?.round() as u32;
    let on_date = input.require_date(CYCLE_DAY, "on_date")?;

    let prediction = predict_cycle(
        last_period_start,
        cycle_length,
        period_length,
        on_date,
        config,
    )?;

    let mut sheet = Sheet::new(CalculatorKind::CyclePhase);
    sheet.push(informational(
        CYCLE_DAY,
        f64::from(prediction.cycle_day),
        0,
        None,
        prediction.phase.label(),
        format!("1-{cycle_length}"),
    ));
    sheet.push(informational(
        DAYS_UNTIL_PERIOD,
        f64::from(prediction.days_until_next_period),
        0,
        Some("days"),
        format!("Next period around {}", prediction.next_period),
        format!("0-{cycle_length}"),
    ));

    sheet.advise(
        Severity::Info,
        format!("Next period expected around {}.", prediction.next_period),
    );
    sheet.advise(
        Severity::Info,
        format!(
            "Fertile window: {} to {}, with ovulation expected on {}.",
            prediction.fertile_start, prediction.fertile_end, prediction.ovulation_date
        ),
    );
    if !(24..=38).contains(&cycle_length) {
        sheet.advise(
            Severity::Moderate,
            "Cycles shorter than 24 or longer than 38 days are outside the usual range; mention this to your gynecologist.",
        );
    }

    sheet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use riskcalc_core::{FieldValue, Grade};

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn predict(on: &str) -> CyclePrediction {
        predict_cycle(
            date("2026-01-01"),
            28,
            5,
            date(on),
            &ScoringConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn phases_of_a_regular_cycle() {
        let phase = |on: &str| predict(on).phase;
        assert_eq!(phase("2026-01-01"), CyclePhase::Menstrual);
        assert_eq!(phase("2026-01-05"), CyclePhase::Menstrual);
        assert_eq!(phase("2026-01-06"), CyclePhase::Follicular);
        assert_eq!(phase("2026-01-09"), CyclePhase::Fertile);
        assert_eq!(phase("2026-01-14"), CyclePhase::Ovulation);
        assert_eq!(phase("2026-01-15"), CyclePhase::Luteal);
        assert_eq!(phase("2026-01-28"), CyclePhase::Luteal);
    }

    #[test]
    fn dates_of_the_current_cycle() {
        let prediction = predict("2026-01-10");
        assert_eq!(
            prediction,
            CyclePrediction {
                cycle_day: 10,
                phase: CyclePhase::Fertile,
                next_period: date("2026-01-29"),
                ovulation_date: date("2026-01-14"),
                fertile_start: date("2026-01-09"),
                fertile_end: date("2026-01-14"),
                days_until_next_period: 19,
            }
        );
    }

    #[test]
    fn later_dates_roll_into_the_next_cycle() {
        let prediction = predict("2026-02-05");
        assert_eq!(prediction.cycle_day, 8);
        assert_eq!(prediction.phase, CyclePhase::Follicular);
        assert_eq!(prediction.next_period, date("2026-02-26"));
        assert_eq!(prediction.ovulation_date, date("2026-02-11"));
        assert_eq!(prediction.days_until_next_period, 21);

        assert_eq!(predict("2026-01-29").cycle_day, 1);
    }

    #[test]
    fn menstruation_wins_over_an_early_fertile_window() {
        let config = ScoringConfig::default();
        let on = |day: u64| {
            let start = date("2026-03-01");
            predict_cycle(start, 21, 5, shift(start, day - 1).unwrap(), &config)
                .unwrap()
                .phase
        };
        assert_eq!(on(2), CyclePhase::Menstrual);
        assert_eq!(on(6), CyclePhase::Fertile);
        assert_eq!(on(7), CyclePhase::Ovulation);
        assert_eq!(on(8), CyclePhase::Luteal);
    }

    #[test]
    fn date_before_period_start_is_rejected() {
        let err = predict_cycle(
            date("2026-01-10"),
            28,
            5,
            date("2026-01-09"),
            &ScoringConfig::default(),
        )
        .unwrap_err();
        match err {
            CalcError::Validation(errors) => {
                assert_eq!(errors[0].field, "on_date");
                assert_eq!(
                    errors[0].problem,
                    FieldProblem::Precedes {
                        other: "last_period_start".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn assessment_reports_day_and_dates() {
        let input = CalculationInput::new()
            .with("last_period_start", FieldValue::Date(date("2026-01-01")))
            .with("cycle_length", FieldValue::Number(40.0))
            .with("period_length", FieldValue::Number(5.0))
            .with("on_date", FieldValue::Date(date("2026-01-10")));
        let assessment = assess_cycle_phase(&input, &ScoringConfig::default()).unwrap();

        let day = assessment.score(CYCLE_DAY).unwrap();
        assert_eq!(day.value, 10.0);
        assert_eq!(day.label, "Follicular phase");
        assert_eq!(day.grade, Grade::Informational);
        assert_eq!(assessment.score(DAYS_UNTIL_PERIOD).unwrap().value, 31.0);
        assert_eq!(
            assessment.recommendations,
            vec![
                "Cycles shorter than 24 or longer than 38 days are outside the usual range; mention this to your gynecologist.",
                "Next period expected around 2026-02-10.",
                "Fertile window: 2026-01-21 to 2026-01-26, with ovulation expected on 2026-01-26.",
            ]
        );
        assert!(!assessment.urgent);
    }
}
