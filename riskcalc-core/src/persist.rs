//! Seam to the external results store.
//!
//! Saving is fire-and-forget from the calculator's point of view: a failed
//! save becomes a notification and never touches the displayed result.

use serde::Serialize;

use crate::PersistenceRecord;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersistenceError {
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error("results store unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can store a [`PersistenceRecord`].
pub trait RecordSink {
    fn save(&mut self, record: &PersistenceRecord) -> Result<(), PersistenceError>;
}

impl RecordSink for Vec<PersistenceRecord> {
    fn save(&mut self, record: &PersistenceRecord) -> Result<(), PersistenceError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Outcome shown to the user after a save attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SaveNotice {
    Saved,
    Failed(String),
}

impl SaveNotice {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveNotice::Saved)
    }

    pub fn message(&self) -> String {
        match self {
            SaveNotice::Saved => "Result saved".to_string(),
            SaveNotice::Failed(reason) => format!("Result not saved: {reason}"),
        }
    }
}

pub fn save_assessment<S>(sink: &mut S, record: &PersistenceRecord) -> SaveNotice
where
    S: RecordSink + ?Sized,
{
    match sink.save(record) {
        Ok(()) => {
            tracing::debug!(
                calculator = %record.calculator_name,
                patient = %record.patient_id,
                "result saved"
            );
            SaveNotice::Saved
        }
        Err(err) => {
            tracing::warn!(calculator = %record.calculator_name, "save failed: {err}");
            SaveNotice::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Assessment, CalculationInput};

    struct OfflineStore;

    impl RecordSink for OfflineStore {
        fn save(&mut self, _record: &PersistenceRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("network down".to_string()))
        }
    }

    fn record() -> PersistenceRecord {
        let assessment = Assessment {
            calculator_id: "phq9".to_string(),
            calculator_name: "PHQ-9".to_string(),
            calculator_type: "psychological".to_string(),
            scores: Vec::new(),
            skipped: Vec::new(),
            recommendations: Vec::new(),
            urgent: false,
        };
        PersistenceRecord::from_assessment("patient-7", &assessment, &CalculationInput::new(), "")
    }

    #[test]
    fn in_memory_sink_keeps_records() {
        let mut store: Vec<PersistenceRecord> = Vec::new();
        let notice = save_assessment(&mut store, &record());
        assert!(notice.is_saved());
        assert_eq!(store.len(), 1);
        assert_eq!(store[0].patient_id, "patient-7");
    }

    #[test]
    fn failure_becomes_a_notice() {
        let notice = save_assessment(&mut OfflineStore, &record());
        assert_eq!(
            notice,
            SaveNotice::Failed("results store unavailable: network down".to_string())
        );
        assert_eq!(
            notice.message(),
            "Result not saved: results store unavailable: network down"
        );
    }
}
