use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use riskcalc_core::{
    save_assessment, DisplayRecord, PersistenceError, PersistenceRecord, RecordSink, ScoringConfig,
};
use riskcalc_engine::{evaluate_form, CalculatorKind};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "riskcalc-cli",
    about = "Run a health risk calculator over a JSON form."
)]
struct Args {
    /// Calculator id, e.g. `insulin_resistance` or `phq9`.
    #[arg(short, long, required_unless_present = "list")]
    calculator: Option<String>,

    /// JSON file holding the form fields.
    #[arg(short, long, required_unless_present = "list")]
    input: Option<PathBuf>,

    /// JSON file overriding scoring constants.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Patient id written to the saved record.
    #[arg(long, default_value = "anonymous")]
    patient: String,

    /// Append the persistence record to this JSON-lines file.
    #[arg(long)]
    save: Option<PathBuf>,

    /// Free-text notes stored with the record.
    #[arg(long, default_value = "")]
    notes: String,

    /// Print the available calculators and exit.
    #[arg(long)]
    list: bool,
}

/// Appends one JSON record per line. The file is opened on the first save.
struct JsonLinesSink {
    path: PathBuf,
    file: Option<File>,
}

impl JsonLinesSink {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    fn file(&mut self) -> Result<&mut File, PersistenceError> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|err| {
                    PersistenceError::Unavailable(format!("{}: {err}", self.path.display()))
                })?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| PersistenceError::Unavailable(self.path.display().to_string()))
    }
}

impl RecordSink for JsonLinesSink {
    fn save(&mut self, record: &PersistenceRecord) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(record)
            .map_err(|err| PersistenceError::Rejected(err.to_string()))?;
        let file = self.file()?;
        writeln!(file, "{line}")
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("{} is not valid JSON", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list {
        for kind in CalculatorKind::ALL {
            println!(
                "{:<20} {:<14} {}",
                kind.id(),
                kind.domain().as_str(),
                kind.name()
            );
        }
        return Ok(());
    }

    let calculator = args
        .calculator
        .as_deref()
        .context("--calculator is required")?;
    let input = args.input.as_deref().context("--input is required")?;

    let config = match &args.config {
        Some(path) => serde_json::from_value::<ScoringConfig>(read_json(path)?)
            .with_context(|| format!("Invalid config in {}", path.display()))?,
        None => ScoringConfig::default(),
    };

    let mut fields = read_json(input)?;
    if calculator.parse::<CalculatorKind>()? == CalculatorKind::CyclePhase {
        if let Some(object) = fields.as_object_mut() {
            if !object.contains_key("on_date") {
                let today = chrono::Local::now().date_naive();
                object.insert("on_date".to_string(), Value::String(today.to_string()));
            }
        }
    }

    let (validated, assessment) = evaluate_form(calculator, &fields, &config)?;
    tracing::info!(
        calculator,
        scores = assessment.scores.len(),
        urgent = assessment.urgent,
        "calculated"
    );

    let display = DisplayRecord::from(&assessment);
    println!("{}", serde_json::to_string_pretty(&display)?);

    if let Some(path) = &args.save {
        let (patient, notes) = (args.patient.as_str(), args.notes.as_str());
        let record = PersistenceRecord::from_assessment(patient, &assessment, &validated, notes);
        let notice = save_assessment(&mut JsonLinesSink::new(path), &record);
        eprintln!("{}", notice.message());
    }

    Ok(())
}
