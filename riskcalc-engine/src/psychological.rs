//! Questionnaire scoring: PHQ-9, GAD-7 and PSS-10, alone or as one
//! combined wellbeing screen.

use riskcalc_core::{
    Assessment, Band, Breakpoint, CalcError, CalculationInput, Edge, FieldKind, FieldSpec, Grade,
    RiskLevel, Severity, SymptomLevel, ThresholdTable,
};

use crate::scoring::{Index, Sheet};
use crate::CalculatorKind;

/// Zero-based index of the PHQ-9 item on thoughts of self-harm.
pub const SELF_HARM_ITEM: usize = 8;
/// Zero-based PSS-10 items scored as `4 - answer`.
pub const PSS10_REVERSED: [usize; 4] = [3, 4, 6, 7];

const PHQ9_ANSWERS: FieldKind = FieldKind::Answers {
    count: 9,
    min: 0,
    max: 3,
};
const GAD7_ANSWERS: FieldKind = FieldKind::Answers {
    count: 7,
    min: 0,
    max: 3,
};
const PSS10_ANSWERS: FieldKind = FieldKind::Answers {
    count: 10,
    min: 0,
    max: 4,
};

const PHQ9_FIELD: FieldSpec = FieldSpec::required("phq9", "PHQ-9 answers", PHQ9_ANSWERS);
const GAD7_FIELD: FieldSpec = FieldSpec::required("gad7", "GAD-7 answers", GAD7_ANSWERS);
const PSS10_FIELD: FieldSpec = FieldSpec::required("pss10", "PSS-10 answers", PSS10_ANSWERS);

pub const PHQ9_FIELDS: &[FieldSpec] = &[PHQ9_FIELD];
pub const GAD7_FIELDS: &[FieldSpec] = &[GAD7_FIELD];
pub const PSS10_FIELDS: &[FieldSpec] = &[PSS10_FIELD];
pub const SCREENING_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("phq9", "PHQ-9 answers", PHQ9_ANSWERS),
    FieldSpec::optional("gad7", "GAD-7 answers", GAD7_ANSWERS),
    FieldSpec::optional("pss10", "PSS-10 answers", PSS10_ANSWERS),
];

const SELF_HARM_WARNING: &str = "You reported thoughts of being better off dead or of hurting \
yourself. Please contact a crisis line, emergency services or your doctor today.";
const SEVERE_DEPRESSION_WARNING: &str = "Your answers suggest severe depression. \
Please arrange to see a doctor or mental health professional promptly.";
const SEVERE_ANXIETY_WARNING: &str = "Your answers suggest severe anxiety. \
Please arrange to see a doctor or mental health professional promptly.";

pub static PHQ9: Index<SymptomLevel> = Index {
    name: "PHQ-9",
    unit: None,
    decimals: 0,
    reference_range: "0-27",
    table: ThresholdTable {
        name: "phq9",
        base: Band {
            category: SymptomLevel::Minimal,
            label: "Minimal depressive symptoms",
            advice: &[],
        },
        breakpoints: &[
            Breakpoint {
                at: 10.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Mild,
                    label: "Mild depression",
                    advice: &[
                        "Repeat the questionnaire in two weeks and talk to your GP if symptoms persist.",
                    ],
                },
            },
            Breakpoint {
                at: 15.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Moderate,
                    label: "Moderate depression",
                    advice: &[
                        "Discuss talking therapy or treatment options with your doctor.",
                    ],
                },
            },
            Breakpoint {
                at: 20.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Severe,
                    label: "Severe depression",
                    advice: &["Treatment by a specialist is recommended."],
                },
            },
        ],
    },
};

pub static GAD7: Index<SymptomLevel> = Index {
    name: "GAD-7",
    unit: None,
    decimals: 0,
    reference_range: "0-21",
    table: ThresholdTable {
        name: "gad7",
        base: Band {
            category: SymptomLevel::Minimal,
            label: "Minimal anxiety",
            advice: &[],
        },
        breakpoints: &[
            Breakpoint {
                at: 5.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Mild,
                    label: "Mild anxiety",
                    advice: &[
                        "Relaxation techniques and regular exercise can help; monitor your symptoms.",
                    ],
                },
            },
            Breakpoint {
                at: 10.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Moderate,
                    label: "Moderate anxiety",
                    advice: &["Talk to your doctor about cognitive behavioural therapy."],
                },
            },
            Breakpoint {
                at: 15.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: SymptomLevel::Severe,
                    label: "Severe anxiety",
                    advice: &["Treatment by a specialist is recommended."],
                },
            },
        ],
    },
};

pub static PSS10: Index<RiskLevel> = Index {
    name: "PSS-10",
    unit: None,
    decimals: 0,
    reference_range: "0-40",
    table: ThresholdTable {
        name: "pss10",
        base: Band {
            category: RiskLevel::Low,
            label: "Low perceived stress",
            advice: &[],
        },
        breakpoints: &[
            Breakpoint {
                at: 14.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: RiskLevel::Moderate,
                    label: "Moderate perceived stress",
                    advice: &[
                        "Plan regular breaks, sleep and physical activity to manage stress.",
                    ],
                },
            },
            Breakpoint {
                at: 27.0,
                edge: Edge::AtOrAbove,
                band: Band {
                    category: RiskLevel::High,
                    label: "High perceived stress",
                    advice: &[
                        "Consider stress counselling or a structured stress-management programme.",
                    ],
                },
            },
        ],
    },
};

fn sum(answers: &[u8]) -> u32 {
    answers.iter().map(|&answer| u32::from(answer)).sum()
}

pub fn phq9_total(answers: &[u8]) -> u32 {
    sum(answers)
}

pub fn gad7_total(answers: &[u8]) -> u32 {
    sum(answers)
}

/// Sum after reverse-scoring [`PSS10_REVERSED`]. All-zero answers give 16.
pub fn pss10_total(answers: &[u8]) -> u32 {
    answers
        .iter()
        .enumerate()
        .map(|(index, &answer)| {
            let answer = u32::from(answer);
            if PSS10_REVERSED.contains(&index) {
                4u32.saturating_sub(answer)
            } else {
                answer
            }
        })
        .sum()
}

pub fn self_harm_reported(phq9_answers: &[u8]) -> bool {
    phq9_answers
        .get(SELF_HARM_ITEM)
        .is_some_and(|&answer| answer > 0)
}

fn score_phq9(sheet: &mut Sheet, answers: &[u8]) {
    let grade = sheet.push(PHQ9.score(f64::from(phq9_total(answers))));
    if self_harm_reported(answers) {
        tracing::warn!("self-harm item answered above zero");
        sheet.urgent(Severity::Critical, SELF_HARM_WARNING);
    }
    if grade == Grade::Symptom(SymptomLevel::Severe) {
        sheet.urgent(Severity::High, SEVERE_DEPRESSION_WARNING);
    }
}

fn score_gad7(sheet: &mut Sheet, answers: &[u8]) {
    let grade = sheet.push(GAD7.score(f64::from(gad7_total(answers))));
    if grade == Grade::Symptom(SymptomLevel::Severe) {
        sheet.urgent(Severity::High, SEVERE_ANXIETY_WARNING);
    }
}

fn score_pss10(sheet: &mut Sheet, answers: &[u8]) {
    sheet.push(PSS10.score(f64::from(pss10_total(answers))));
}

pub fn assess_phq9(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let answers = input.require_answers(PHQ9.name, "phq9")?;
    let mut sheet = Sheet::new(CalculatorKind::Phq9);
    score_phq9(&mut sheet, answers);
    sheet.finish()
}

pub fn assess_gad7(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let answers = input.require_answers(GAD7.name, "gad7")?;
    let mut sheet = Sheet::new(CalculatorKind::Gad7);
    score_gad7(&mut sheet, answers);
    sheet.finish()
}

pub fn assess_pss10(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let answers = input.require_answers(PSS10.name, "pss10")?;
    let mut sheet = Sheet::new(CalculatorKind::Pss10);
    score_pss10(&mut sheet, answers);
    sheet.finish()
}

/// Score whichever questionnaires were filled in and merge their advice.
pub fn assess_screening(input: &CalculationInput) -> Result<Assessment, CalcError> {
    let mut sheet = Sheet::new(CalculatorKind::PsychScreening);

    let instruments: [(&str, &str, fn(&mut Sheet, &[u8])); 3] = [
        (PHQ9.name, "phq9", score_phq9),
        (GAD7.name, "gad7", score_gad7),
        (PSS10.name, "pss10", score_pss10),
    ];
    for (score, field, run) in instruments {
        match input.require_answers(score, field) {
            Ok(answers) => run(&mut sheet, answers),
            Err(err) => {
                sheet.record(Err(err))?;
            }
        }
    }

    sheet.finish()
}
