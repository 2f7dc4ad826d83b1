//! Exam database operations.
//!
//! Only the patient, sample type, timestamp and status are real columns. The
//! answers are stored as one JSON blob and decoded through [`crate::codec`];
//! an unreadable blob reads back as empty answers instead of failing the query.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::codec;
use crate::models::{ExamListing, ExamRecord, ExamStatus, SampleType};

impl Database {
    /// Insert a new exam. Returns the assigned ID; `exam.id` is ignored.
    pub fn insert_exam(&self, exam: &ExamRecord) -> DbResult<i64> {
        let answers_json = codec::encode(&exam.answers);

        self.conn.execute(
            r#"
            INSERT INTO exams (
                patient_id, sample_type, answers, created_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                exam.patient_id,
                exam.sample_type.as_str(),
                answers_json,
                exam.created_at,
                exam.status.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite the sample type, answers and status of an exam.
    ///
    /// Patient and creation timestamp are never touched.
    pub fn update_exam(&self, exam: &ExamRecord) -> DbResult<bool> {
        let answers_json = codec::encode(&exam.answers);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE exams SET
                sample_type = ?2,
                answers = ?3,
                status = ?4
            WHERE id = ?1
            "#,
            params![
                exam.id,
                exam.sample_type.as_str(),
                answers_json,
                exam.status.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an exam by ID.
    pub fn get_exam(&self, id: i64) -> DbResult<Option<ExamRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, sample_type, answers, created_at, status
                FROM exams
                WHERE id = ?
                "#,
                [id],
                exam_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a patient's exams, newest first.
    pub fn list_exams_for_patient(&self, patient_id: i64) -> DbResult<Vec<ExamRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, sample_type, answers, created_at, status
            FROM exams
            WHERE patient_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], exam_row)?;

        let mut exams = Vec::new();
        for row in rows {
            exams.push(row?.try_into()?);
        }
        Ok(exams)
    }

    /// List every exam with its patient's name, newest first.
    pub fn list_exams_with_patient_names(&self) -> DbResult<Vec<ExamListing>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.id, e.patient_id, e.sample_type, e.answers, e.created_at, e.status,
                   p.name
            FROM exams e
            JOIN patients p ON e.patient_id = p.id
            ORDER BY e.created_at DESC, e.id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let exam = exam_row(row)?;
            let patient_name: String = row.get(6)?;
            Ok((exam, patient_name))
        })?;

        let mut listings = Vec::new();
        for row in rows {
            let (exam, patient_name) = row?;
            listings.push(ExamListing {
                exam: exam.try_into()?,
                patient_name,
            });
        }
        Ok(listings)
    }

    /// Delete an exam.
    pub fn delete_exam(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM exams WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ExamRow {
    id: i64,
    patient_id: i64,
    sample_type: String,
    answers: String,
    created_at: String,
    status: String,
}

fn exam_row(row: &Row<'_>) -> rusqlite::Result<ExamRow> {
    Ok(ExamRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        sample_type: row.get(2)?,
        answers: row.get(3)?,
        created_at: row.get(4)?,
        status: row.get(5)?,
    })
}

impl TryFrom<ExamRow> for ExamRecord {
    type Error = DbError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let status = ExamStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown exam status: {}", row.status)))?;

        let answers = tracing::warn_span!("exam_answers", exam_id = row.id)
            .in_scope(|| codec::decode_text(&row.answers).into_answers());

        Ok(ExamRecord {
            id: row.id,
            patient_id: row.patient_id,
            sample_type: SampleType::parse(&row.sample_type),
            created_at: row.created_at,
            status,
            answers,
        })
    }
}
