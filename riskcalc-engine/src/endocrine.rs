//! Thyroid function and the sex-hormone indices shared with the PCOS screen.

use riskcalc_core::{
    Assessment, Band, Breakpoint, CalcError, CalculationInput, Edge, FieldKind, FieldSpec, Grade,
    Severity, Status, ThresholdTable,
};

use crate::scoring::{Index, Scored, Sheet};
use crate::CalculatorKind;

pub const THYROID_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "tsh",
        "TSH",
        FieldKind::Number {
            min: 0.005,
            max: 150.0,
        },
    )
    .unit("mIU/L"),
    FieldSpec::optional(
        "ft4",
        "Free T4",
        FieldKind::Number {
            min: 1.0,
            max: 100.0,
        },
    )
    .unit("pmol/L"),
];

pub static TSH: Index<Status> = Index {
    name: "TSH",
    unit: Some("mIU/L"),
    decimals: 2,
    reference_range: "0.4-4.0",
    table: ThresholdTable {
        name: "tsh",
        base: Band {
            category: Status::Abnormal,
            label: "Suppressed TSH (possible hyperthyroidism)",
            advice: &[
                "Ask your doctor about free T4/T3 and thyroid antibody testing.",
            ],
        },
        breakpoints: &[
            Breakpoint {
                at: 0.4,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Normal,
                    label: "Normal",
                    advice: &[],
                },
            },
            Breakpoint {
                at: 4.0,
                edge: Edge::Above,
                band: Band {
                    category: Status::Borderline,
                    label: "Mildly raised TSH (subclinical range)",
                    advice: &[
                        "Repeat TSH with free T4 in 6-8 weeks.",
                        "If you are planning pregnancy, mention this result to your doctor.",
                    ],
                },
            },
            Breakpoint {
                at: 10.0,
                edge: Edge::Above,
                band: Band {
                    category: Status::Abnormal,
                    label: "Raised TSH (possible hypothyroidism)",
                    advice: &["See your doctor about thyroid hormone replacement."],
                },
            },
        ],
    },
};

pub static FT4: Index<Status> = Index {
    name: "Free T4",
    unit: Some("pmol/L"),
    decimals: 1,
    reference_range: "12-22",
    table: ThresholdTable {
        name: "ft4",
        base: Band {
            category: Status::Abnormal,
            label: "Low free T4",
            advice: &[],
        },
        breakpoints: &[
            Breakpoint {
                at: 12.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Normal,
                    label: "Normal",
                    advice: &[],
                },
            },
            Breakpoint {
                at: 22.0,
                edge: Edge::Above,
                band: Band {
                    category: Status::Abnormal,
                    label: "High free T4",
                    advice: &[],
                },
            },
        ],
    },
};

/// Jostel's TSH index.
pub static TSH_INDEX: Index<Status> = Index {
    name: "TSH index",
    unit: None,
    decimals: 2,
    reference_range: "1.3-4.1",
    table: ThresholdTable {
        name: "tsh_index",
        base: Band {
            category: Status::Abnormal,
            label: "Low (possible central hypothyroidism)",
            advice: &[
                "A low TSH index with low free T4 warrants a pituitary work-up.",
            ],
        },
        breakpoints: &[
            Breakpoint {
                at: 1.3,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Normal,
                    label: "Within reference",
                    advice: &[],
                },
            },
            Breakpoint {
                at: 4.1,
                edge: Edge::Above,
                band: Band {
                    category: Status::Borderline,
                    label: "Above reference",
                    advice: &[],
                },
            },
        ],
    },
};

pub static LH_FSH: Index<Status> = Index {
    name: "LH/FSH ratio",
    unit: None,
    decimals: 2,
    reference_range: "< 2.0",
    table: ThresholdTable {
        name: "lh_fsh",
        base: Band {
            category: Status::Normal,
            label: "Normal ratio",
            advice: &[],
        },
        breakpoints: &[
            Breakpoint {
                at: 2.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Borderline,
                    label: "Borderline ratio",
                    advice: &["Repeat LH and FSH on cycle day 2-5."],
                },
            },
            Breakpoint {
                at: 2.5,
                edge: Edge::Above,
                band: Band {
                    category: Status::Abnormal,
                    label: "Suggestive of PCOS",
                    advice: &[
                        "An LH/FSH ratio above 2.5 supports a PCOS work-up with pelvic ultrasound.",
                    ],
                },
            },
        ],
    },
};

pub static FREE_ANDROGEN_INDEX: Index<Status> = Index {
    name: "Free androgen index",
    unit: Some("%"),
    decimals: 1,
    reference_range: "< 5",
    table: ThresholdTable {
        name: "free_androgen_index",
        base: Band {
            category: Status::Normal,
            label: "Normal androgen level",
            advice: &[],
        },
        breakpoints: &[Breakpoint {
            at: 5.0,
            edge: Edge::AtOrAbove,
            band: Band {
                category: Status::Abnormal,
                label: "Hyperandrogenism",
                advice: &[
                    "Discuss acne, hair growth or hair loss with a gynecologist or endocrinologist.",
                ],
            },
        }],
    },
};

/// ln(TSH) + 0.1345 × FT4 (pmol/L).
pub fn tsh_index(tsh: f64, ft4_pmol_l: f64) -> f64 {
    tsh.ln() + 0.1345 * ft4_pmol_l
}

pub fn lh_fsh_ratio(lh: f64, fsh: f64) -> f64 {
    lh / fsh
}

/// Free androgen index: testosterone / SHBG × 100 (both nmol/L).
pub fn free_androgen_index(testosterone: f64, shbg: f64) -> f64 {
    testosterone / shbg * 100.0
}

fn ft4_score(input: &CalculationInput) -> Result<Scored, CalcError> {
    let ft4 = input.require_number(FT4.name, "ft4")?;
    Ok(FT4.score(ft4))
}

fn tsh_index_score(input: &CalculationInput, tsh: f64) -> Result<Scored, CalcError> {
    let ft4 = input.require_number(TSH_INDEX.name, "ft4")?;
    Ok(TSH_INDEX.score(tsh_index(tsh, ft4)))
}

pub(crate) fn lh_fsh_score(input: &CalculationInput) -> Result<Scored, CalcError> {
    let lh = input.require_number(LH_FSH.name, "lh")?;
    let fsh = input.require_number(LH_FSH.name, "fsh")?;
    Ok(LH_FSH.score(lh_fsh_ratio(lh, fsh)))
}

pub(crate) fn free_androgen_score(input: &CalculationInput) -> Result<Scored, CalcError> {
    let testosterone = input.require_number(FREE_ANDROGEN_INDEX.name, "testosterone")?;
    let shbg = input.require_number(FREE_ANDROGEN_INDEX.name, "shbg")?;
    let index = free_androgen_index(testosterone, shbg);
    Ok(FREE_ANDROGEN_INDEX.score(index))
}

pub fn assess_thyroid(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let tsh = input.require_number(TSH.name, "tsh")?;
    let mut sheet = Sheet::new(CalculatorKind::Thyroid);

    let tsh_grade = sheet.push(TSH.score(tsh));
    let ft4_grade = sheet.record(ft4_score(input))?;
    sheet.record(tsh_index_score(input, tsh))?;

    if ft4_grade.is_none() && tsh_grade != Grade::Status(Status::Normal) {
        sheet.advise(
            Severity::Moderate,
            "Add a free T4 result to tell subclinical from overt thyroid disease.",
        );
    }

    sheet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::assert_table_total;
    use riskcalc_core::FieldValue;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn lh_fsh_bands_follow_pcos_cutoffs() {
        let grade = |ratio: f64| LH_FSH.score(ratio).result.grade;
        assert_eq!(grade(1.99), Grade::Status(Status::Normal));
        assert_eq!(grade(2.0), Grade::Status(Status::Borderline));
        assert_eq!(grade(2.5), Grade::Status(Status::Borderline));
        assert_eq!(grade(2.51), Grade::Status(Status::Abnormal));
        assert_eq!(lh_fsh_ratio(15.0, 5.0), 3.0);
    }

    #[test]
    fn free_androgen_index_threshold_is_inclusive() {
        assert_eq!(free_androgen_index(2.0, 40.0), 5.0);
        assert_eq!(
            FREE_ANDROGEN_INDEX.score(5.0).result.grade,
            Grade::Status(Status::Abnormal)
        );
        assert_eq!(
            FREE_ANDROGEN_INDEX.score(4.99).result.grade,
            Grade::Status(Status::Normal)
        );
    }

    #[test]
    fn tsh_index_formula() {
        assert!(approx(tsh_index(1.0, 16.0), 0.1345 * 16.0));
        assert!(approx(tsh_index(2.0, 15.0), 2.0_f64.ln() + 2.0175));
    }

    #[test]
    fn thyroid_without_ft4_skips_dependent_scores() {
        let input = CalculationInput::new().with("tsh", FieldValue::Number(6.2));
        let assessment = assess_thyroid(&input).unwrap();

        assert_eq!(assessment.scores.len(), 1);
        assert_eq!(
            assessment.scores[0].label,
            "Mildly raised TSH (subclinical range)"
        );
        let skipped: Vec<&str> = assessment.skipped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skipped, vec!["Free T4", "TSH index"]);
        assert!(assessment
            .recommendations
            .iter()
            .any(|line| line.starts_with("Add a free T4 result")));
    }

    #[test]
    fn thyroid_with_ft4_reports_all_scores() {
        let input = CalculationInput::new()
            .with("tsh", FieldValue::Number(2.0))
            .with("ft4", FieldValue::Number(15.0));
        let assessment = assess_thyroid(&input).unwrap();
        assert_eq!(assessment.scores.len(), 3);
        assert!(assessment.skipped.is_empty());
        assert_eq!(
            assessment.score("TSH index").unwrap().label,
            "Within reference"
        );
        assert!(!assessment.is_critical());
    }

    #[test]
    fn tables_are_total() {
        for index in [&TSH, &FT4, &TSH_INDEX, &LH_FSH, &FREE_ANDROGEN_INDEX] {
            assert_table_total(index);
        }
    }
}
