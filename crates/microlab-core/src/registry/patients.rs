//! Patient registry.

use chrono::NaiveDate;

use crate::db::Database;
use crate::models::{NewPatient, Patient, PatientOverview};

use super::{ExamError, ExamResult, ValidationError};

/// Validates and persists patients. Ages are derived as of `today`.
pub struct PatientRegistry<'a> {
    db: &'a Database,
    today: NaiveDate,
}

impl<'a> PatientRegistry<'a> {
    /// Registry using the local calendar date.
    pub fn new(db: &'a Database) -> Self {
        Self::with_today(db, chrono::Local::now().date_naive())
    }

    /// Registry with a fixed date for age derivation.
    pub fn with_today(db: &'a Database, today: NaiveDate) -> Self {
        Self { db, today }
    }

    pub fn create(&self, new_patient: NewPatient) -> ExamResult<Patient> {
        if new_patient.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name").into());
        }
        if new_patient
            .birth_date
            .as_deref()
            .map_or(true, |birth_date| birth_date.trim().is_empty())
        {
            return Err(ValidationError::BlankField("birth_date").into());
        }

        let mut patient = new_patient.into_patient(self.today);
        patient.id = self.db.insert_patient(&patient)?;

        tracing::info!(patient_id = patient.id, "created patient");
        Ok(patient)
    }

    /// Overwrite a patient's details. The age is re-derived from the birth date.
    pub fn update(&self, mut patient: Patient) -> ExamResult<Patient> {
        if patient.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name").into());
        }

        patient.refresh_age(self.today);
        if !self.db.update_patient(&patient)? {
            return Err(ExamError::not_found("patient", patient.id));
        }

        tracing::info!(patient_id = patient.id, "updated patient");
        Ok(patient)
    }

    /// Delete a patient and, with them, all their exams.
    pub fn delete(&self, patient_id: i64) -> ExamResult<i64> {
        if !self.db.delete_patient(patient_id)? {
            return Err(ExamError::not_found("patient", patient_id));
        }
        tracing::info!(patient_id, "deleted patient and their exams");
        Ok(patient_id)
    }

    pub fn get(&self, patient_id: i64) -> ExamResult<Patient> {
        self.db
            .get_patient(patient_id)?
            .ok_or_else(|| ExamError::not_found("patient", patient_id))
    }

    /// Patients by name, each with their exams newest first.
    pub fn list_with_exams(&self) -> ExamResult<Vec<PatientOverview>> {
        let patients = self.db.list_patients()?;
        let mut overviews = Vec::with_capacity(patients.len());

        for patient in patients {
            let exams = self.db.list_exam_stubs(patient.id)?;
            overviews.push(PatientOverview { patient, exams });
        }

        Ok(overviews)
    }
}
