//! PCOS hormone screen: LH/FSH ratio, free androgen index and the PCOS
//! variant of HOMA-IR. Each marker is computed independently.

use riskcalc_core::{
    Assessment, Band, Breakpoint, CalcError, CalculationInput, Edge, FieldKind, FieldSpec, Grade,
    Severity, Status, ThresholdTable,
};

use crate::cardiometabolic::homa_ir;
use crate::endocrine::{free_androgen_score, lh_fsh_score};
use crate::scoring::{Index, Scored, Sheet};
use crate::CalculatorKind;

/// HOMA-IR cutoff for the PCOS screen. The metabolic panel uses
/// [`crate::cardiometabolic::HOMA_IR_METABOLIC_CUTOFF`]; the two are kept apart.
pub const HOMA_IR_PCOS_CUTOFF: f64 = 1.9;

const HORMONE: FieldKind = FieldKind::Number {
    min: 0.1,
    max: 200.0,
};

pub const PCOS_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("lh", "LH", HORMONE).unit("IU/L"),
    FieldSpec::optional("fsh", "FSH", HORMONE).unit("IU/L"),
    FieldSpec::optional(
        "testosterone",
        "Total testosterone",
        FieldKind::Number {
            min: 0.01,
            max: 50.0,
        },
    )
    .unit("nmol/L"),
    FieldSpec::optional(
        "shbg",
        "SHBG",
        FieldKind::Number {
            min: 1.0,
            max: 500.0,
        },
    )
    .unit("nmol/L"),
    FieldSpec::optional(
        "glucose",
        "Fasting glucose",
        FieldKind::Number {
            min: 1.0,
            max: 40.0,
        },
    )
    .unit("mmol/L"),
    FieldSpec::optional(
        "insulin",
        "Fasting insulin",
        FieldKind::Number {
            min: 0.5,
            max: 500.0,
        },
    )
    .unit("µU/mL"),
];

pub static HOMA_IR_PCOS: Index<Status> = Index {
    name: "HOMA-IR",
    unit: None,
    decimals: 2,
    reference_range: "< 1.9",
    table: ThresholdTable {
        name: "homa_ir_pcos",
        base: Band {
            category: Status::Normal,
            label: "Normal insulin sensitivity",
            advice: &[],
        },
        breakpoints: &[Breakpoint {
            at: HOMA_IR_PCOS_CUTOFF,
            edge: Edge::AtOrAbove,
            band: Band {
                category: Status::Abnormal,
                label: "Insulin resistance",
                advice: &[
                    "Insulin resistance is common in PCOS; ask about lifestyle measures and metformin.",
                ],
            },
        }],
    },
};

fn homa_ir_pcos_score(input: &CalculationInput) -> Result<Scored, CalcError> {
    let glucose = input.require_number(HOMA_IR_PCOS.name, "glucose")?;
    let insulin = input.require_number(HOMA_IR_PCOS.name, "insulin")?;
    Ok(HOMA_IR_PCOS.score(homa_ir(glucose, insulin)))
}

pub fn assess_pcos_screen(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let mut sheet = Sheet::new(CalculatorKind::PcosScreen);

    let grades = [
        sheet.record(lh_fsh_score(input))?,
        sheet.record(free_androgen_score(input))?,
        sheet.record(homa_ir_pcos_score(input))?,
    ];

    let abnormal = grades
        .iter()
        .flatten()
        .filter(|grade| **grade == Grade::Status(Status::Abnormal))
        .count();
    if abnormal >= 2 {
        sheet.advise(
            Severity::High,
            "Several markers point towards PCOS; a gynecologist can assess the Rotterdam criteria.",
        );
    }

    sheet.finish()
}
