//! Shared plumbing: named indices backed by threshold tables, and the sheet
//! that collects scores, skipped sub-scores and advice into an assessment.

use riskcalc_core::{
    format_numeric, Assessment, CalcError, Grade, RecommendationBuilder, ScoreResult, Severity,
    SkippedScore, ThresholdTable,
};

use crate::CalculatorKind;

/// A clinical index: display metadata plus its interpretation table.
#[derive(Debug, Clone, Copy)]
pub struct Index<C: 'static> {
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub decimals: usize,
    pub reference_range: &'static str,
    pub table: ThresholdTable<C>,
}

/// A graded score with the advice of the band it landed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub result: ScoreResult,
    pub advice: &'static [&'static str],
}

impl<C> Index<C>
where
    C: Copy + Into<Grade> + 'static,
{
    pub fn score(&self, value: f64) -> Scored {
        let band = self.table.lookup(value);
        Scored {
            result: ScoreResult {
                name: self.name.to_string(),
                value,
                display_value: format_numeric(value, self.decimals),
                unit: self.unit.map(str::to_string),
                label: band.label.to_string(),
                reference_range: self.reference_range.to_string(),
                grade: band.category.into(),
            },
            advice: band.advice,
        }
    }
}

/// A score without a threshold table.
pub fn informational(
    name: &str,
    value: f64,
    decimals: usize,
    unit: Option<&str>,
    label: impl Into<String>,
    reference_range: impl Into<String>,
) -> Scored {
    Scored {
        result: ScoreResult {
            name: name.to_string(),
            value,
            display_value: format_numeric(value, decimals),
            unit: unit.map(str::to_string),
            label: label.into(),
            reference_range: reference_range.into(),
            grade: Grade::Informational,
        },
        advice: &[],
    }
}

pub(crate) struct Sheet {
    kind: CalculatorKind,
    scores: Vec<ScoreResult>,
    skipped: Vec<SkippedScore>,
    advice: RecommendationBuilder,
}

impl Sheet {
    pub(crate) fn new(kind: CalculatorKind) -> Self {
        Self {
            kind,
            scores: Vec::new(),
            skipped: Vec::new(),
            advice: RecommendationBuilder::new(),
        }
    }

    pub(crate) fn push(&mut self, scored: Scored) -> Grade {
        let grade = scored.result.grade;
        let advice = scored.advice.iter().copied();
        self.advice.extend(grade.severity(), advice);
        self.scores.push(scored.result);
        grade
    }

    /// Keep a computed sub-score, or note it as skipped when input is missing.
    pub(crate) fn record(
        &mut self,
        outcome: Result<Scored, CalcError>,
    ) -> Result<Option<Grade>, CalcError> {
        match outcome {
            Ok(scored) => Ok(Some(self.push(scored))),
            Err(CalcError::InsufficientData { score, field }) => {
                tracing::debug!(%score, %field, "sub-score skipped");
                self.skipped.push(SkippedScore {
                    name: score,
                    missing_field: field,
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn advise(&mut self, severity: Severity, text: impl Into<String>) {
        self.advice.add(severity, text);
    }

    pub(crate) fn urgent(&mut self, severity: Severity, text: impl Into<String>) {
        self.advice.urgent(severity, text);
    }

    pub(crate) fn finish(self) -> Result<Assessment, CalcError> {
        if self.scores.is_empty() {
            let err = match self.skipped.into_iter().next() {
                Some(skip) => CalcError::insufficient(skip.name, skip.missing_field),
                None => CalcError::insufficient(self.kind.name(), "input"),
            };
            return Err(err);
        }

        let (recommendations, urgent) = self.advice.finish();
        tracing::debug!(
            calculator = self.kind.id(),
            scores = self.scores.len(),
            skipped = self.skipped.len(),
            urgent,
            "assessment complete"
        );

        Ok(Assessment {
            calculator_id: self.kind.id().to_string(),
            calculator_name: self.kind.name().to_string(),
            calculator_type: self.kind.domain().as_str().to_string(),
            scores: self.scores,
            skipped: self.skipped,
            recommendations,
            urgent,
        })
    }
}

/// Sample each boundary of `index` at `at - eps`, `at` and `at + eps` and
/// check the intervals agree with the lookup.
#[cfg(test)]
pub(crate) fn assert_table_total<C>(index: &Index<C>)
where
    C: Copy + PartialEq + std::fmt::Debug + 'static,
{
    let table = &index.table;
    assert!(table.is_well_formed(), "{} is not ascending", table.name);
    let intervals = table.intervals();
    for at in table.boundaries() {
        let eps = at.abs().max(1.0) * 1e-9;
        for value in [at - eps, at, at + eps] {
            let hits: Vec<_> = intervals.iter().filter(|i| i.contains(value)).collect();
            assert_eq!(
                hits.len(),
                1,
                "{}: {value} hit {} bands",
                table.name,
                hits.len()
            );
            assert_eq!(hits[0].band.category, table.category(value));
        }
    }
}
