//! Registries enforcing the write rules on top of the store.
//!
//! The [`Database`](crate::db::Database) methods are plain CRUD. Everything
//! that decides whether a write is allowed (patient ownership, panel shape,
//! derived status, age) lives here.

mod exams;
mod patients;
mod templates;

pub use exams::*;
pub use patients::*;
pub use templates::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::SampleType;
use crate::panel::PanelMismatch;

/// Rejected input. Nothing was written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Patient ID is required")]
    MissingPatientId,

    #[error("Unknown patient: {0}")]
    UnknownPatient(i64),

    #[error(transparent)]
    PanelMismatch(#[from] PanelMismatch),

    #[error("Sample type {declared} conflicts with {answers} in the answers")]
    SampleTypeConflict {
        declared: SampleType,
        answers: SampleType,
    },

    #[error("Field must not be blank: {0}")]
    BlankField(&'static str),
}

/// Registry errors.
#[derive(Error, Debug)]
pub enum ExamError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type ExamResult<T> = Result<T, ExamError>;

impl ExamError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        ExamError::NotFound { entity, id }
    }
}
