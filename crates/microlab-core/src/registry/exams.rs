//! Exam lifecycle: create, replace, delete, list.

use crate::db::Database;
use crate::models::{Answers, ExamListing, ExamRecord, ExamStatus, SampleType};
use crate::panel::check_panel_shape;

use super::{ExamError, ExamResult, ValidationError};

/// Validates and persists exam records.
pub struct ExamRegistry<'a> {
    db: &'a Database,
}

impl<'a> ExamRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create an exam for a patient.
    ///
    /// `sample_type` is written into the answers. The status is always derived
    /// from the answers; `status_hint` is only compared and logged.
    pub fn create(
        &self,
        patient_id: Option<i64>,
        sample_type: SampleType,
        mut answers: Answers,
        status_hint: Option<ExamStatus>,
    ) -> ExamResult<ExamRecord> {
        let patient_id = patient_id.ok_or(ValidationError::MissingPatientId)?;
        if !self.db.patient_exists(patient_id)? {
            return Err(ValidationError::UnknownPatient(patient_id).into());
        }

        if answers.sample_type.is_recognized() && answers.sample_type != sample_type {
            return Err(ValidationError::SampleTypeConflict {
                declared: sample_type,
                answers: answers.sample_type,
            }
            .into());
        }
        answers.sample_type = sample_type;
        check_panel_shape(sample_type, &answers.panel_specific).map_err(ValidationError::from)?;

        let mut exam = ExamRecord::new(patient_id, answers);
        note_status_hint(status_hint, exam.status);
        exam.id = self.db.insert_exam(&exam)?;

        tracing::info!(
            exam_id = exam.id,
            patient_id,
            sample_type = %exam.sample_type,
            status = exam.status.as_str(),
            "created exam"
        );
        Ok(exam)
    }

    /// Replace the answers of an existing exam wholesale.
    ///
    /// The owning patient and creation timestamp are kept. Answers without a
    /// sample type inherit the stored one; a GENERAL draft adopts the type the
    /// answers name.
    pub fn replace(
        &self,
        exam_id: i64,
        mut answers: Answers,
        status_hint: Option<ExamStatus>,
    ) -> ExamResult<ExamRecord> {
        let mut exam = self.get(exam_id)?;
        answers.sample_type = settle_sample_type(exam.sample_type, answers.sample_type)?;
        check_panel_shape(answers.sample_type, &answers.panel_specific)
            .map_err(ValidationError::from)?;

        let previous = exam.status;
        exam.replace_answers(answers);
        note_status_hint(status_hint, exam.status);

        if !self.db.update_exam(&exam)? {
            return Err(ExamError::not_found("exam", exam_id));
        }

        if previous != exam.status {
            tracing::debug!(
                exam_id,
                from = previous.as_str(),
                to = exam.status.as_str(),
                "exam status changed"
            );
        }
        tracing::info!(exam_id, status = exam.status.as_str(), "replaced exam");
        Ok(exam)
    }

    /// Delete an exam. Returns the deleted ID.
    pub fn delete(&self, exam_id: i64) -> ExamResult<i64> {
        if !self.db.delete_exam(exam_id)? {
            return Err(ExamError::not_found("exam", exam_id));
        }
        tracing::info!(exam_id, "deleted exam");
        Ok(exam_id)
    }

    pub fn get(&self, exam_id: i64) -> ExamResult<ExamRecord> {
        self.db
            .get_exam(exam_id)?
            .ok_or_else(|| ExamError::not_found("exam", exam_id))
    }

    /// A patient's exams, newest first. Unknown patients have none.
    pub fn list_by_patient(&self, patient_id: i64) -> ExamResult<Vec<ExamRecord>> {
        Ok(self.db.list_exams_for_patient(patient_id)?)
    }

    /// Every exam with its patient's name, newest first.
    pub fn list_all(&self) -> ExamResult<Vec<ExamListing>> {
        Ok(self.db.list_exams_with_patient_names()?)
    }
}

/// Sample type an exam keeps after a replace.
fn settle_sample_type(
    stored: SampleType,
    submitted: SampleType,
) -> Result<SampleType, ValidationError> {
    match (stored, submitted) {
        (stored, SampleType::General) => Ok(stored),
        (SampleType::General, submitted) => Ok(submitted),
        (stored, submitted) if stored == submitted => Ok(stored),
        (stored, submitted) => Err(ValidationError::SampleTypeConflict {
            declared: stored,
            answers: submitted,
        }),
    }
}

fn note_status_hint(hint: Option<ExamStatus>, derived: ExamStatus) {
    if let Some(hint) = hint.filter(|hint| *hint != derived) {
        tracing::debug!(
            hint = hint.as_str(),
            derived = derived.as_str(),
            "ignoring caller status"
        );
    }
}
