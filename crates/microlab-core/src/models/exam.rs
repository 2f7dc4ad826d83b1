//! Exam records and their completion status.

use serde::{Deserialize, Serialize};

use super::answers::{Answers, SampleType};

/// Lifecycle status of an exam.
///
/// Always re-derived from content on write; see [`ExamStatus::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamStatus {
    /// Draft: saved but not finished
    #[default]
    Pending,
    /// Sample type chosen and a report written
    Complete,
}

impl ExamStatus {
    /// Derive the status from the current answers.
    ///
    /// `Complete` iff the sample type is recognized and the report is not
    /// blank. Not monotonic: clearing the report sends a record back to
    /// `Pending`.
    pub fn derive(answers: &Answers) -> Self {
        if answers.sample_type.is_recognized() && answers.trimmed_report().is_some() {
            ExamStatus::Complete
        } else {
            ExamStatus::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExamStatus::Pending => "PENDING",
            ExamStatus::Complete => "COMPLETE",
        }
    }

    /// Parse a stored tag. Case-insensitive.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ExamStatus::Pending),
            "COMPLETE" => Some(ExamStatus::Complete),
            _ => None,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, ExamStatus::Complete)
    }
}

/// A persisted microbiology exam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamRecord {
    /// Server-assigned ID
    pub id: i64,
    /// Owning patient
    pub patient_id: i64,
    /// Sample type column (mirrors `answers.sample_type`)
    pub sample_type: SampleType,
    /// Creation timestamp (RFC 3339, immutable)
    pub created_at: String,
    /// Derived status
    pub status: ExamStatus,
    /// Full answers payload
    pub answers: Answers,
}

impl ExamRecord {
    /// Build an unsaved record. `id` is assigned by the store.
    pub fn new(patient_id: i64, answers: Answers) -> Self {
        let status = ExamStatus::derive(&answers);
        Self {
            id: 0,
            patient_id,
            sample_type: answers.sample_type,
            created_at: now_timestamp(),
            status,
            answers,
        }
    }

    /// Swap in new answers and re-derive the mirrored columns.
    pub fn replace_answers(&mut self, answers: Answers) {
        self.sample_type = answers.sample_type;
        self.status = ExamStatus::derive(&answers);
        self.answers = answers;
    }
}

/// An exam joined with its owner's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamListing {
    pub exam: ExamRecord,
    pub patient_name: String,
}

/// Minimal exam reference used in patient overviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamStub {
    pub id: i64,
    pub created_at: String,
}

/// Millisecond-precision UTC timestamp, so ordering by text is chronological.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
