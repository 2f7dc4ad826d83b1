//! SQLite schema definition.

/// Complete database schema for microlab.
pub const SCHEMA: &str = r#"
-- Enable foreign keys (exam cascade relies on it)
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT,
    birth_date TEXT,                             -- DD/MM/YYYY
    age INTEGER CHECK (age IS NULL OR age >= 0), -- derived from birth_date
    mother_name TEXT,
    blood_type TEXT,
    collection_date TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Exams (answers live in an opaque JSON blob)
-- ============================================================================

CREATE TABLE IF NOT EXISTS exams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    sample_type TEXT NOT NULL DEFAULT 'GENERAL', -- URINE, SPUTUM, GENERAL
    answers TEXT NOT NULL DEFAULT '{}',          -- JSON object
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING'       -- PENDING, COMPLETE
        CHECK (status IN ('PENDING', 'COMPLETE'))
);

CREATE INDEX IF NOT EXISTS idx_exams_patient ON exams(patient_id);
CREATE INDEX IF NOT EXISTS idx_exams_created ON exams(created_at);

-- ============================================================================
-- Questionnaire Templates
-- ============================================================================

CREATE TABLE IF NOT EXISTS templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    fields TEXT NOT NULL DEFAULT '[]'            -- JSON array of TemplateField
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_exam_requires_patient() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO exams (patient_id, created_at) VALUES (42, '2024-01-01T00:00:00.000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (name, created_at) VALUES ('Ana', '2024-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();
        let patient_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO exams (patient_id, created_at) VALUES (?, '2024-01-01T00:00:00.000Z')",
            [patient_id],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = ?", [patient_id])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM exams", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO patients (name, created_at) VALUES ('Ana', '2024-01-01T00:00:00.000Z')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO exams (patient_id, created_at, status) VALUES (1, 'x', 'DONE')",
            [],
        );
        assert!(result.is_err());
    }
}
