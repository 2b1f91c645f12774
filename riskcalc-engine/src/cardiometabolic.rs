//! Cardiometabolic calculators: insulin resistance indices, BMI and energy
//! needs, kidney function and the composite cardiovascular point score.

use riskcalc_core::{
    Assessment, Band, Breakpoint, CalcError, CalculationInput, Edge, FieldKind, FieldSpec, Grade,
    RiskLevel, ScoringConfig, Severity, Status, ThresholdTable,
};
use serde::{Deserialize, Serialize};

use crate::scoring::{informational, Index, Scored, Sheet};
use crate::{CalculatorKind, Sex};

/// mmol/L to mg/dL for glucose.
pub const GLUCOSE_MG_DL_PER_MMOL_L: f64 = 18.016;
/// HOMA-IR cutoff used by the metabolic panel. The PCOS screen keeps its
/// own, lower cutoff in [`crate::gynecological`].
pub const HOMA_IR_METABOLIC_CUTOFF: f64 = 2.7;

const GLUCOSE: FieldKind = FieldKind::Number {
    min: 1.0,
    max: 40.0,
};
const INSULIN: FieldKind = FieldKind::Number {
    min: 0.5,
    max: 500.0,
};
const AGE: FieldKind = FieldKind::Number {
    min: 18.0,
    max: 110.0,
};
const SEX: FieldKind = FieldKind::Choice {
    options: Sex::OPTIONS,
};

pub const INSULIN_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("glucose", "Fasting glucose", GLUCOSE)
        .unit("mmol/L"),
    FieldSpec::required("insulin", "Fasting insulin", INSULIN)
        .unit("µU/mL"),
    FieldSpec::optional(
        "triglycerides",
        "Fasting triglycerides",
        FieldKind::Number {
            min: 0.1,
            max: 30.0,
        },
    )
    .unit("mmol/L"),
];

pub const BODY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "weight",
        "Weight",
        FieldKind::Number {
            min: 20.0,
            max: 350.0,
        },
    )
    .unit("kg"),
    FieldSpec::required(
        "height",
        "Height",
        FieldKind::Number {
            min: 100.0,
            max: 250.0,
        },
    )
    .unit("cm"),
    FieldSpec::required("age", "Age", AGE).unit("years"),
    FieldSpec::required("sex", "Sex", SEX),
    FieldSpec::required(
        "activity",
        "Activity level",
        FieldKind::Choice {
            options: ActivityLevel::OPTIONS,
        },
    ),
];

pub const KIDNEY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "creatinine",
        "Serum creatinine",
        FieldKind::Number {
            min: 10.0,
            max: 2000.0,
        },
    )
    .unit("µmol/L"),
    FieldSpec::required("age", "Age", AGE).unit("years"),
    FieldSpec::required("sex", "Sex", SEX),
];

pub const CARDIOVASCULAR_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("age", "Age", AGE).unit("years"),
    FieldSpec::required("sex", "Sex", SEX),
    FieldSpec::required(
        "systolic_bp",
        "Systolic blood pressure",
        FieldKind::Number {
            min: 70.0,
            max: 260.0,
        },
    )
    .unit("mmHg"),
    FieldSpec::required(
        "cholesterol_ratio",
        "Total cholesterol / HDL ratio",
        FieldKind::Number {
            min: 1.0,
            max: 20.0,
        },
    ),
    FieldSpec::required(
        "bmi",
        "BMI",
        FieldKind::Number {
            min: 10.0,
            max: 80.0,
        },
    )
    .unit("kg/m²"),
    FieldSpec::optional("smoker", "Current smoker", FieldKind::Flag),
    FieldSpec::optional("diabetes", "Diabetes", FieldKind::Flag),
    FieldSpec::optional(
        "family_history",
        "Heart disease in a first-degree relative under 60",
        FieldKind::Flag,
    ),
    FieldSpec::optional(
        "rheumatoid_arthritis",
        "Rheumatoid arthritis",
        FieldKind::Flag,
    ),
    FieldSpec::optional(
        "atrial_fibrillation",
        "Atrial fibrillation",
        FieldKind::Flag,
    ),
    FieldSpec::optional("ckd", "Chronic kidney disease (stage 3-5)", FieldKind::Flag),
];

pub static HOMA_IR_METABOLIC: Index<Status> = Index {
    name: "HOMA-IR",
    unit: None,
    decimals: 2,
    reference_range: "< 2.7",
    table: ThresholdTable {
        name: "homa_ir_metabolic",
        base: Band {
            category: Status::Normal,
            label: "Normal insulin sensitivity",
            advice: &["Keep up regular activity and a fibre-rich diet."],
        },
        breakpoints: &[Breakpoint {
            at: HOMA_IR_METABOLIC_CUTOFF,
            edge: Edge::AtOrAbove,
            band: Band {
                category: Status::Abnormal,
                label: "Insulin resistance",
                advice: &[
                    "Discuss insulin resistance with your doctor.",
                    "Aim for 150 minutes of moderate activity per week, including resistance training.",
                    "Cut back on refined carbohydrates and added sugars.",
                ],
            },
        }],
    },
};

pub static QUICKI: Index<Status> = Index {
    name: "QUICKI",
    unit: None,
    decimals: 3,
    reference_range: "> 0.33",
    table: ThresholdTable {
        name: "quicki",
        base: Band {
            category: Status::Abnormal,
            label: "Reduced insulin sensitivity",
            advice: &[
                "Repeat fasting glucose and insulin to confirm reduced sensitivity.",
            ],
        },
        breakpoints: &[Breakpoint {
            at: 0.33,
            edge: Edge::Above,
            band: Band {
                category: Status::Normal,
                label: "Normal insulin sensitivity",
                advice: &[],
            },
        }],
    },
};

pub static FIRI: Index<Status> = Index {
    name: "FIRI",
    unit: None,
    decimals: 2,
    reference_range: "< 2.0",
    table: ThresholdTable {
        name: "firi",
        base: Band {
            category: Status::Normal,
            label: "Normal fasting insulin",
            advice: &[],
        },
        breakpoints: &[Breakpoint {
            at: 2.0,
            edge: Edge::AtOrAbove,
            band: Band {
                category: Status::Abnormal,
                label: "Raised fasting insulin",
                advice: &[
                    "Raised fasting insulin: review diet and activity with your doctor.",
                ],
            },
        }],
    },
};

pub static MCAULEY: Index<Status> = Index {
    name: "McAuley index",
    unit: None,
    decimals: 2,
    reference_range: "> 5.8",
    table: ThresholdTable {
        name: "mcauley",
        base: Band {
            category: Status::Abnormal,
            label: "Insulin resistance likely",
            advice: &[
                "Ask about a lipid profile review alongside insulin resistance.",
            ],
        },
        breakpoints: &[Breakpoint {
            at: 5.8,
            edge: Edge::Above,
            band: Band {
                category: Status::Normal,
                label: "Normal",
                advice: &[],
            },
        }],
    },
};

pub static BMI: Index<Status> = Index {
    name: "BMI",
    unit: Some("kg/m²"),
    decimals: 1,
    reference_range: "18.5-24.9",
    table: ThresholdTable {
        name: "bmi",
        base: Band {
            category: Status::Borderline,
            label: "Underweight",
            advice: &[
                "Talk to a dietitian about reaching a healthy weight; low weight can disturb the cycle.",
            ],
        },
        breakpoints: &[
            Breakpoint {
                at: 18.5,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Normal,
                    label: "Healthy weight",
                    advice: &[],
                },
            },
            Breakpoint {
                at: 25.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Borderline,
                    label: "Overweight",
                    advice: &[
                        "A 5-10% weight reduction improves metabolic and cycle health.",
                    ],
                },
            },
            Breakpoint {
                at: 30.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Abnormal,
                    label: "Obesity",
                    advice: &[
                        "Discuss a structured weight management plan with your doctor.",
                        "Ask for blood pressure, glucose and lipid checks.",
                    ],
                },
            },
        ],
    },
};

pub static EGFR: Index<Status> = Index {
    name: "eGFR",
    unit: Some("mL/min/1.73m²"),
    decimals: 0,
    reference_range: ">= 90",
    table: ThresholdTable {
        name: "egfr",
        base: Band {
            category: Status::Abnormal,
            label: "Kidney failure (G5)",
            advice: &["Specialist kidney care is needed."],
        },
        breakpoints: &[
            Breakpoint {
                at: 15.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Abnormal,
                    label: "Severely decreased (G4)",
                    advice: &["Ask for a nephrology referral."],
                },
            },
            Breakpoint {
                at: 30.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Abnormal,
                    label: "Moderately decreased (G3)",
                    advice: &[
                        "Review medication doses with your doctor.",
                        "Monitor blood pressure and kidney function every 6 months.",
                    ],
                },
            },
            Breakpoint {
                at: 60.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Borderline,
                    label: "Mildly decreased (G2)",
                    advice: &["Recheck kidney function yearly."],
                },
            },
            Breakpoint {
                at: 90.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: Status::Normal,
                    label: "Normal (G1)",
                    advice: &[],
                },
            },
        ],
    },
};

pub static CARDIOVASCULAR: Index<RiskLevel> = Index {
    name: "Cardiovascular points",
    unit: Some("points"),
    decimals: 0,
    reference_range: "< 5",
    table: ThresholdTable {
        name: "cardiovascular",
        base: Band {
            category: RiskLevel::Low,
            label: "Low risk",
            advice: &["Keep a heart-healthy lifestyle and recheck in 5 years."],
        },
        breakpoints: &[
            Breakpoint {
                at: 5.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: RiskLevel::Moderate,
                    label: "Intermediate risk",
                    advice: &[
                        "Review blood pressure, cholesterol and activity with your doctor.",
                    ],
                },
            },
            Breakpoint {
                at: 10.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: RiskLevel::High,
                    label: "High risk",
                    advice: &[
                        "Ask your doctor about lipid-lowering and blood pressure treatment.",
                        "Stopping smoking gives the largest single risk reduction.",
                    ],
                },
            },
            Breakpoint {
                at: 20.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: RiskLevel::VeryHigh,
                    label: "Very high risk",
                    advice: &[
                        "Treat modifiable risk factors intensively under medical supervision.",
                    ],
                },
            },
        ],
    },
};

/// HOMA-IR: glucose (mmol/L) × insulin (µU/mL) / 22.5.
pub fn homa_ir(glucose_mmol_l: f64, insulin: f64) -> f64 {
    glucose_mmol_l * insulin / 22.5
}

/// QUICKI: 1 / (log10(insulin) + log10(glucose in mg/dL)).
pub fn quicki(glucose_mmol_l: f64, insulin: f64) -> f64 {
    1.0 / (insulin.log10() + (glucose_mmol_l * GLUCOSE_MG_DL_PER_MMOL_L).log10())
}

/// Fasting insulin resistance index.
pub fn firi(insulin: f64) -> f64 {
    insulin / 25.0
}

/// McAuley index from fasting insulin (µU/mL) and triglycerides (mmol/L).
pub fn mcauley(insulin: f64, triglycerides: f64) -> f64 {
    let exponent = 2.63 - 0.28 * insulin.ln() - 0.31 * triglycerides.ln();
    exponent.exp()
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const OPTIONS: &'static [&'static str] =
        &["sedentary", "light", "moderate", "active", "very_active"];

    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day.
pub fn bmr(sex: Sex, weight_kg: f64, height_cm: f64, age: f64) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age;
    match sex {
        Sex::Female => base - 161.0,
        Sex::Male => base + 5.0,
    }
}

pub fn daily_energy(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

/// CKD-EPI (2009) eGFR from serum creatinine in µmol/L.
pub fn egfr(sex: Sex, creatinine_umol_l: f64, age: f64) -> f64 {
    let (kappa, alpha, sex_factor) = match sex {
        Sex::Female => (61.9, -0.329, 1.018),
        Sex::Male => (79.6, -0.411, 1.0),
    };
    let ratio = creatinine_umol_l / kappa;
    141.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.209)
        * 0.993_f64.powf(age)
        * sex_factor
}

/// Inputs of the composite cardiovascular point score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardiovascularFactors {
    pub age: f64,
    pub sex: Sex,
    pub systolic_bp: f64,
    pub cholesterol_ratio: f64,
    pub bmi: f64,
    pub smoker: bool,
    pub diabetes: bool,
    pub family_history: bool,
    pub rheumatoid_arthritis: bool,
    pub atrial_fibrillation: bool,
    pub ckd: bool,
}

/// Additive point score, capped at `cap`.
pub fn cardiovascular_points(factors: &CardiovascularFactors, cap: u32) -> u32 {
    let age_points = match factors.age {
        age if age >= 70.0 => 8,
        age if age >= 60.0 => 6,
        age if age >= 50.0 => 4,
        age if age >= 40.0 => 2,
        _ => 0,
    };

    let mut points = age_points;
    let mut add = |present: bool, value: u32| {
        if present {
            points += value;
        }
    };
    add(factors.sex == Sex::Male, 2);
    add(factors.smoker, 4);
    add(factors.diabetes, 4);
    add(factors.systolic_bp > 140.0, 2);
    add(factors.systolic_bp > 160.0, 2);
    add(factors.cholesterol_ratio > 6.0, 3);
    add(factors.bmi > 30.0, 2);
    add(factors.family_history, 3);
    add(factors.rheumatoid_arthritis, 2);
    add(factors.atrial_fibrillation, 4);
    add(factors.ckd, 3);

    points.min(cap)
}

fn fasting_pair(input: &CalculationInput) -> Result<(f64, f64), CalcError> {
    let glucose = input.require_number("HOMA-IR", "glucose")?;
    let insulin = input.require_number("HOMA-IR", "insulin")?;
    Ok((glucose, insulin))
}

fn mcauley_score(input: &CalculationInput, insulin: f64) -> Result<Scored, CalcError> {
    let triglycerides = input.require_number(MCAULEY.name, "triglycerides")?;
    Ok(MCAULEY.score(mcauley(insulin, triglycerides)))
}

pub fn assess_insulin_resistance(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let (glucose, insulin) = fasting_pair(input)?;
    let mut sheet = Sheet::new(CalculatorKind::InsulinResistance);

    sheet.push(HOMA_IR_METABOLIC.score(homa_ir(glucose, insulin)));
    sheet.push(QUICKI.score(quicki(glucose, insulin)));
    sheet.push(FIRI.score(firi(insulin)));
    sheet.record(mcauley_score(input, insulin))?;

    sheet.finish()
}

pub fn assess_body_composition(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let weight = input.require_number("BMI", "weight")?;
    let height = input.require_number("BMI", "height")?;
    let age = input.require_number("BMR", "age")?;
    let sex = Sex::from_input(input, "BMR", "sex")?;
    let activity = input
        .require_choice("Daily energy need", "activity")
        .and_then(|id| {
            ActivityLevel::from_id(id)
                .ok_or_else(|| CalcError::insufficient("Daily energy need", "activity"))
        })?;

    let mut sheet = Sheet::new(CalculatorKind::BodyComposition);
    sheet.push(BMI.score(bmi(weight, height)));

    let basal = bmr(sex, weight, height, age);
    sheet.push(informational(
        "BMR",
        basal,
        0,
        Some("kcal/day"),
        "Basal metabolic rate (Mifflin-St Jeor)",
        "n/a",
    ));
    sheet.push(informational(
        "Daily energy need",
        daily_energy(basal, activity),
        0,
        Some("kcal/day"),
        format!(
            "Maintenance calories at activity factor {}",
            activity.factor()
        ),
        "n/a",
    ));

    sheet.finish()
}

pub fn assess_kidney_function(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let creatinine = input.require_number(EGFR.name, "creatinine")?;
    let age = input.require_number(EGFR.name, "age")?;
    let sex = Sex::from_input(input, EGFR.name, "sex")?;

    let value = egfr(sex, creatinine, age);
    let mut sheet = Sheet::new(CalculatorKind::KidneyFunction);
    sheet.push(EGFR.score(value));
    if value < 15.0 {
        sheet.urgent(
            Severity::Critical,
            "eGFR below 15: contact your kidney specialist or doctor today.",
        );
    }
    sheet.finish()
}

pub fn assess_cardiovascular_risk(
    input: &CalculationInput,
    config: &ScoringConfig,
) -> Result<Assessment, CalcError> {
    let score = CARDIOVASCULAR.name;
    let factors = CardiovascularFactors {
        age: input.require_number(score, "age")?,
        sex: Sex::from_input(input, score, "sex")?,
        systolic_bp: input.require_number(score, "systolic_bp")?,
        cholesterol_ratio: input.require_number(score, "cholesterol_ratio")?,
        bmi: input.require_number(score, "bmi")?,
        smoker: input.flag("smoker"),
        diabetes: input.flag("diabetes"),
        family_history: input.flag("family_history"),
        rheumatoid_arthritis: input.flag("rheumatoid_arthritis"),
        atrial_fibrillation: input.flag("atrial_fibrillation"),
        ckd: input.flag("ckd"),
    };

    let points = cardiovascular_points(&factors, config.cardiovascular_point_cap);
    let mut sheet = Sheet::new(CalculatorKind::CardiovascularRisk);
    let grade = sheet.push(CARDIOVASCULAR.score(f64::from(points)));

    if factors.smoker {
        sheet.advise(Severity::High, "Ask about smoking cessation support.");
    }
    if factors.systolic_bp > 140.0 {
        sheet.advise(
            Severity::Moderate,
            "Confirm raised blood pressure with home readings.",
        );
    }
    if grade == Grade::Risk(RiskLevel::VeryHigh) {
        sheet.urgent(
            Severity::Critical,
            "Very high cardiovascular risk: book a clinical review promptly.",
        );
    }

    sheet.finish()
}
