//! Microlab Core Library
//!
//! Offline microbiology exam records: patients, conditional bench panels and
//! a derived completion status, stored in a local SQLite file.
//!
//! # Architecture
//!
//! ```text
//!   UI (Kotlin/Swift via UniFFI)
//!            │ answers_json
//!            ▼
//!   ┌─────────────────┐     sample type ──► panel shape
//!   │  codec::decode  │     stain result ──► biochemistry vocabulary
//!   └────────┬────────┘                │
//!            ▼                         ▼
//!   ┌─────────────────┐   ┌───────────────────────┐
//!   │  ExamRegistry   │──►│ check_panel_shape     │
//!   │  (validate,     │   │ ExamStatus::derive    │
//!   │   derive status)│   └───────────────────────┘
//!   └────────┬────────┘
//!            ▼
//!   SQLite: patients ─┬─ exams (answers = opaque JSON blob)
//!                     └─ templates
//!            │
//!            ▼
//!   History export (JSON / CSV)
//! ```
//!
//! # Core Principle
//!
//! **Status is never trusted from the caller.** Every write re-derives it from
//! the answers.
//!
//! # Modules
//!
//! - [`codec`]: Single decode entry point for stored and submitted answers
//! - [`config`]: Startup configuration (database path, log filter)
//! - [`db`]: SQLite storage layer
//! - [`export`]: Exam history export
//! - [`models`]: Domain types (Answers, ExamRecord, Patient, Template)
//! - [`panel`]: Conditional panel and biochemistry vocabulary resolution
//! - [`registry`]: Validated create/replace/delete for exams, patients, templates

pub mod codec;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod panel;
pub mod registry;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::Database;
pub use export::{ExamHistoryExport, HistoryExporter};
pub use models::{
    Answers, ExamListing, ExamRecord, ExamStatus, NewPatient, Patient, PatientOverview,
    SampleType, StainResult, Template, TemplateField,
};
pub use panel::{resolve_biochemistry_vocabulary, resolve_panel_specific, PanelShape, Vocabulary};
pub use registry::{ExamError, ExamRegistry, PatientRegistry, TemplateRegistry, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use models::{ExamStub, FieldKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MicrolabError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<db::DbError> for MicrolabError {
    fn from(e: db::DbError) -> Self {
        MicrolabError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for MicrolabError {
    fn from(e: serde_json::Error) -> Self {
        MicrolabError::Serialization(e.to_string())
    }
}

impl From<codec::DecodeError> for MicrolabError {
    fn from(e: codec::DecodeError) -> Self {
        MicrolabError::Serialization(e.to_string())
    }
}

impl From<config::ConfigError> for MicrolabError {
    fn from(e: config::ConfigError) -> Self {
        MicrolabError::Validation(e.to_string())
    }
}

impl From<ExamError> for MicrolabError {
    fn from(e: ExamError) -> Self {
        match e {
            ExamError::Validation(e) => MicrolabError::Validation(e.to_string()),
            ExamError::NotFound { entity, id } => {
                MicrolabError::NotFound(format!("{entity} {id}"))
            }
            ExamError::Database(e) => e.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MicrolabError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MicrolabError::Database(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MicrolabCore>, MicrolabError> {
    let db = Database::open(&path)?;
    Ok(MicrolabCore::wrap(db))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MicrolabCore>, MicrolabError> {
    let db = Database::open_in_memory()?;
    Ok(MicrolabCore::wrap(db))
}

/// Resolve configuration from `.env` and the environment, start logging and
/// open the configured database.
#[uniffi::export]
pub fn open_from_env() -> Result<Arc<MicrolabCore>, MicrolabError> {
    let config = CoreConfig::from_env()?;
    init_logging(config.log_filter().to_string())?;
    let db = config.open_database()?;
    Ok(MicrolabCore::wrap(db))
}

/// Install the global `tracing` subscriber. Later calls are no-ops.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<(), MicrolabError> {
    let filter = EnvFilter::try_new(&filter)
        .map_err(|e| MicrolabError::Validation(format!("Invalid log filter: {e}")))?;

    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_err()
    {
        tracing::debug!("logging already initialized");
    }
    Ok(())
}

/// Panel shape expected for a sample type tag.
#[uniffi::export]
pub fn panel_shape_for(sample_type: String) -> FfiPanelShape {
    resolve_panel_specific(SampleType::parse(&sample_type)).into()
}

/// Biochemistry field keys active for a stain result tag. Empty when unset.
#[uniffi::export]
pub fn biochemistry_keys_for(stain_result: String) -> Vec<String> {
    resolve_biochemistry_vocabulary(StainResult::parse(&stain_result))
        .keys()
        .map(str::to_string)
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MicrolabCore {
    db: Arc<Mutex<Database>>,
}

impl MicrolabCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl MicrolabCore {
    // =========================================================================
    // Exam Operations
    // =========================================================================

    /// Create an exam. The sample type is read from the answers.
    pub fn create_exam(
        &self,
        patient_id: Option<i64>,
        answers_json: String,
        status_hint: Option<String>,
    ) -> Result<FfiExamRecord, MicrolabError> {
        let answers = codec::decode_text(&answers_json).into_result()?;
        let db = self.db.lock()?;
        let exam = ExamRegistry::new(&db).create(
            patient_id,
            answers.sample_type,
            answers,
            parse_status_hint(status_hint),
        )?;
        Ok(exam.into())
    }

    /// Replace an exam's answers wholesale.
    pub fn replace_exam(
        &self,
        exam_id: i64,
        answers_json: String,
        status_hint: Option<String>,
    ) -> Result<FfiExamRecord, MicrolabError> {
        let answers = codec::decode_text(&answers_json).into_result()?;
        let db = self.db.lock()?;
        let exam = ExamRegistry::new(&db).replace(exam_id, answers, parse_status_hint(status_hint))?;
        Ok(exam.into())
    }

    /// Delete an exam.
    pub fn delete_exam(&self, exam_id: i64) -> Result<FfiDeletion, MicrolabError> {
        let db = self.db.lock()?;
        let id = ExamRegistry::new(&db).delete(exam_id)?;
        Ok(FfiDeletion {
            id,
            message: format!("Exam {id} deleted"),
        })
    }

    /// Get an exam by ID (e.g. to resume a draft).
    pub fn get_exam(&self, exam_id: i64) -> Result<FfiExamRecord, MicrolabError> {
        let db = self.db.lock()?;
        Ok(ExamRegistry::new(&db).get(exam_id)?.into())
    }

    /// A patient's exams, newest first.
    pub fn list_exams_for_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiExamRecord>, MicrolabError> {
        let db = self.db.lock()?;
        let exams = ExamRegistry::new(&db).list_by_patient(patient_id)?;
        Ok(exams.into_iter().map(|e| e.into()).collect())
    }

    /// Every exam with its patient's name, newest first.
    pub fn list_all_exams(&self) -> Result<Vec<FfiExamListing>, MicrolabError> {
        let db = self.db.lock()?;
        let listings = ExamRegistry::new(&db).list_all()?;
        Ok(listings.into_iter().map(|l| l.into()).collect())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, patient: FfiNewPatient) -> Result<FfiPatient, MicrolabError> {
        let db = self.db.lock()?;
        let patient = PatientRegistry::new(&db).create(patient.into())?;
        Ok(patient.into())
    }

    /// Update a patient. The age is re-derived from the birth date.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<FfiPatient, MicrolabError> {
        let db = self.db.lock()?;
        let registry = PatientRegistry::new(&db);
        let mut current = registry.get(patient.id)?;
        patient.apply_to(&mut current);
        Ok(registry.update(current)?.into())
    }

    /// Delete a patient together with their exams.
    pub fn delete_patient(&self, patient_id: i64) -> Result<FfiDeletion, MicrolabError> {
        let db = self.db.lock()?;
        let id = PatientRegistry::new(&db).delete(patient_id)?;
        Ok(FfiDeletion {
            id,
            message: format!("Patient {id} and their exams deleted"),
        })
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: i64) -> Result<FfiPatient, MicrolabError> {
        let db = self.db.lock()?;
        Ok(PatientRegistry::new(&db).get(patient_id)?.into())
    }

    /// Patients by name, each with their exams newest first.
    pub fn list_patients_with_exams(&self) -> Result<Vec<FfiPatientOverview>, MicrolabError> {
        let db = self.db.lock()?;
        let overviews = PatientRegistry::new(&db).list_with_exams()?;
        Ok(overviews.into_iter().map(|o| o.into()).collect())
    }

    // =========================================================================
    // Template Operations
    // =========================================================================

    /// Create a questionnaire template. `id` is ignored.
    pub fn create_template(&self, template: FfiTemplate) -> Result<FfiTemplate, MicrolabError> {
        let template = Template::try_from(template)?;
        let db = self.db.lock()?;
        Ok(TemplateRegistry::new(&db).create(template)?.into())
    }

    /// Overwrite a questionnaire template.
    pub fn update_template(&self, template: FfiTemplate) -> Result<FfiTemplate, MicrolabError> {
        let template = Template::try_from(template)?;
        let db = self.db.lock()?;
        Ok(TemplateRegistry::new(&db).update(template)?.into())
    }

    /// Delete a questionnaire template.
    pub fn delete_template(&self, template_id: i64) -> Result<FfiDeletion, MicrolabError> {
        let db = self.db.lock()?;
        let id = TemplateRegistry::new(&db).delete(template_id)?;
        Ok(FfiDeletion {
            id,
            message: format!("Template {id} deleted"),
        })
    }

    /// Templates, newest first.
    pub fn list_templates(&self) -> Result<Vec<FfiTemplate>, MicrolabError> {
        let db = self.db.lock()?;
        let templates = TemplateRegistry::new(&db).list()?;
        Ok(templates.into_iter().map(|t| t.into()).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the exam history as JSON.
    pub fn export_history_json(&self) -> Result<String, MicrolabError> {
        let db = self.db.lock()?;
        let history = HistoryExporter::new(&db).export_all()?;
        Ok(history.to_json()?)
    }

    /// Export the exam history as CSV.
    pub fn export_history_csv(&self) -> Result<String, MicrolabError> {
        let db = self.db.lock()?;
        let history = HistoryExporter::new(&db).export_all()?;
        Ok(history.to_csv())
    }
}

fn parse_status_hint(hint: Option<String>) -> Option<ExamStatus> {
    hint.as_deref().and_then(ExamStatus::parse)
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe panel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiPanelShape {
    Urine,
    Sputum,
    Unselected,
}

impl From<PanelShape> for FfiPanelShape {
    fn from(shape: PanelShape) -> Self {
        match shape {
            PanelShape::Urine => FfiPanelShape::Urine,
            PanelShape::Sputum => FfiPanelShape::Sputum,
            PanelShape::Unselected => FfiPanelShape::Unselected,
        }
    }
}

/// FFI-safe exam record. Answers travel as JSON text.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExamRecord {
    pub id: i64,
    pub patient_id: i64,
    pub sample_type: String,
    pub created_at: String,
    pub status: String,
    pub answers_json: String,
}

impl From<ExamRecord> for FfiExamRecord {
    fn from(exam: ExamRecord) -> Self {
        Self {
            answers_json: codec::encode(&exam.answers),
            id: exam.id,
            patient_id: exam.patient_id,
            sample_type: exam.sample_type.as_str().to_string(),
            created_at: exam.created_at,
            status: exam.status.as_str().to_string(),
        }
    }
}

/// FFI-safe exam with its patient's name.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExamListing {
    pub exam: FfiExamRecord,
    pub patient_name: String,
}

impl From<ExamListing> for FfiExamListing {
    fn from(listing: ExamListing) -> Self {
        Self {
            exam: listing.exam.into(),
            patient_name: listing.patient_name,
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDeletion {
    pub id: i64,
    pub message: String,
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub age: Option<u32>,
    pub mother_name: Option<String>,
    pub blood_type: Option<String>,
    pub collection_date: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            phone: patient.phone,
            birth_date: patient.birth_date,
            age: patient.age,
            mother_name: patient.mother_name,
            blood_type: patient.blood_type,
            collection_date: patient.collection_date,
            created_at: patient.created_at,
        }
    }
}

impl FfiPatient {
    /// Copy the editable fields onto a stored patient. `created_at` is kept.
    fn apply_to(self, patient: &mut Patient) {
        patient.name = self.name;
        patient.phone = self.phone;
        patient.birth_date = self.birth_date;
        patient.age = self.age;
        patient.mother_name = self.mother_name;
        patient.blood_type = self.blood_type;
        patient.collection_date = self.collection_date;
    }
}

/// FFI-safe patient input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub age: Option<u32>,
    pub mother_name: Option<String>,
    pub blood_type: Option<String>,
    pub collection_date: Option<String>,
}

impl From<FfiNewPatient> for NewPatient {
    fn from(patient: FfiNewPatient) -> Self {
        NewPatient {
            name: patient.name,
            phone: patient.phone,
            birth_date: patient.birth_date,
            age: patient.age,
            mother_name: patient.mother_name,
            blood_type: patient.blood_type,
            collection_date: patient.collection_date,
        }
    }
}

/// FFI-safe exam reference.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExamStub {
    pub id: i64,
    pub created_at: String,
}

impl From<ExamStub> for FfiExamStub {
    fn from(stub: ExamStub) -> Self {
        Self {
            id: stub.id,
            created_at: stub.created_at,
        }
    }
}

/// FFI-safe patient with exam references.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientOverview {
    pub patient: FfiPatient,
    pub exams: Vec<FfiExamStub>,
}

impl From<PatientOverview> for FfiPatientOverview {
    fn from(overview: PatientOverview) -> Self {
        Self {
            patient: overview.patient.into(),
            exams: overview.exams.into_iter().map(|e| e.into()).collect(),
        }
    }
}

/// FFI-safe template field. `kind` is `single_choice`, `short_text` or `long_text`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTemplateField {
    pub title: String,
    pub kind: String,
    pub options: String,
}

impl From<TemplateField> for FfiTemplateField {
    fn from(field: TemplateField) -> Self {
        Self {
            title: field.title,
            kind: field.kind.as_str().to_string(),
            options: field.options,
        }
    }
}

impl TryFrom<FfiTemplateField> for TemplateField {
    type Error = MicrolabError;

    fn try_from(field: FfiTemplateField) -> Result<Self, Self::Error> {
        let kind = FieldKind::parse(&field.kind).ok_or_else(|| {
            MicrolabError::Validation(format!("Unknown field kind: {}", field.kind))
        })?;
        Ok(TemplateField {
            title: field.title,
            kind,
            options: field.options,
        })
    }
}

/// FFI-safe questionnaire template.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FfiTemplateField>,
}

impl From<Template> for FfiTemplate {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            fields: template.fields.into_iter().map(|f| f.into()).collect(),
        }
    }
}

impl TryFrom<FfiTemplate> for Template {
    type Error = MicrolabError;

    fn try_from(template: FfiTemplate) -> Result<Self, Self::Error> {
        let fields = template
            .fields
            .into_iter()
            .map(TemplateField::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Template {
            id: template.id,
            name: template.name,
            description: template.description,
            fields,
        })
    }
}
