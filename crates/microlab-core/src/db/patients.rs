//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{ExamStub, Patient};

const PATIENT_COLUMNS: &str = r#"
    id, name, phone, birth_date, age, mother_name,
    blood_type, collection_date, created_at
"#;

impl Database {
    /// Insert a new patient. Returns the assigned ID; `patient.id` is ignored.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                name, phone, birth_date, age, mother_name,
                blood_type, collection_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                patient.name,
                patient.phone,
                patient.birth_date,
                patient.age,
                patient.mother_name,
                patient.blood_type,
                patient.collection_date,
                patient.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                phone = ?3,
                birth_date = ?4,
                age = ?5,
                mother_name = ?6,
                blood_type = ?7,
                collection_date = ?8
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.phone,
                patient.birth_date,
                patient.age,
                patient.mother_name,
                patient.blood_type,
                patient.collection_date,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Check whether a patient exists.
    pub fn patient_exists(&self, id: i64) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all patients ordered by name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name, id"
        ))?;

        let rows = stmt.query_map([], patient_from_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Exam references for a patient, newest first.
    pub fn list_exam_stubs(&self, patient_id: i64) -> DbResult<Vec<ExamStub>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, created_at
            FROM exams
            WHERE patient_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], |row| {
            Ok(ExamStub {
                id: row.get(0)?,
                created_at: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient. Their exams go with them.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        birth_date: row.get(3)?,
        age: row.get(4)?,
        mother_name: row.get(5)?,
        blood_type: row.get(6)?,
        collection_date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut new_patient = NewPatient::new("Maria Souza", "15/06/2000");
        new_patient.blood_type = Some("O+".into());
        new_patient.mother_name = Some("Joana Souza".into());
        let patient = new_patient.into_patient(today());

        let id = db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(id).unwrap().unwrap();
        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.name, "Maria Souza");
        assert_eq!(retrieved.age, Some(23));
        assert_eq!(retrieved.blood_type, Some("O+".into()));
        assert_eq!(retrieved.mother_name, Some("Joana Souza".into()));
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = NewPatient::new("Maria", "15/06/2000").into_patient(today());
        patient.id = db.insert_patient(&patient).unwrap();

        patient.phone = Some("555-0100".into());
        patient.collection_date = Some("09/06/2024".into());
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved.phone, Some("555-0100".into()));
        assert_eq!(retrieved.collection_date, Some("09/06/2024".into()));
    }

    #[test]
    fn test_update_missing_patient() {
        let db = setup_db();
        let mut patient = NewPatient::new("Ghost", "01/01/1990").into_patient(today());
        patient.id = 404;
        assert!(!db.update_patient(&patient).unwrap());
    }

    #[test]
    fn test_list_patients_by_name() {
        let db = setup_db();

        for name in ["Paulo", "Ana", "Carla"] {
            let patient = NewPatient::new(name, "01/01/1990").into_patient(today());
            db.insert_patient(&patient).unwrap();
        }

        let names: Vec<String> = db
            .list_patients()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Carla", "Paulo"]);
    }

    #[test]
    fn test_delete_patient() {
        let db = setup_db();
        let patient = NewPatient::new("Ana", "01/01/1990").into_patient(today());
        let id = db.insert_patient(&patient).unwrap();

        assert!(db.patient_exists(id).unwrap());
        assert!(db.delete_patient(id).unwrap());
        assert!(!db.patient_exists(id).unwrap());
        assert!(!db.delete_patient(id).unwrap());
    }
}
