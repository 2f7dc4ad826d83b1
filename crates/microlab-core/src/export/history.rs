//! Exam history export.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{ExamListing, ExamStatus, SampleType};

/// One exam in the history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamHistoryRow {
    pub exam_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub sample_type: SampleType,
    pub status: ExamStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Final identification, empty while pending
    pub report: String,
}

impl From<ExamListing> for ExamHistoryRow {
    fn from(listing: ExamListing) -> Self {
        let exam = listing.exam;
        Self {
            exam_id: exam.id,
            patient_id: exam.patient_id,
            patient_name: listing.patient_name,
            sample_type: exam.sample_type,
            status: exam.status,
            report: exam.answers.trimmed_report().unwrap_or_default().to_string(),
            created_at: exam.created_at,
        }
    }
}

/// Snapshot of every exam, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamHistoryExport {
    /// Export timestamp
    pub exported_at: String,
    pub rows: Vec<ExamHistoryRow>,
}

impl ExamHistoryExport {
    pub fn pending_count(&self) -> usize {
        self.count_with(ExamStatus::Pending)
    }

    pub fn complete_count(&self) -> usize {
        self.count_with(ExamStatus::Complete)
    }

    fn count_with(&self, status: ExamStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("exam_id,patient_id,patient_name,sample_type,status,created_at,report\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                row.exam_id,
                row.patient_id,
                escape_csv(&row.patient_name),
                row.sample_type.as_str(),
                row.status.as_str(),
                escape_csv(&row.created_at),
                escape_csv(&row.report),
            ));
        }

        csv
    }
}

/// History exporter.
pub struct HistoryExporter<'a> {
    db: &'a Database,
}

impl<'a> HistoryExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export every exam.
    pub fn export_all(&self) -> DbResult<ExamHistoryExport> {
        let rows: Vec<ExamHistoryRow> = self
            .db
            .list_exams_with_patient_names()?
            .into_iter()
            .map(ExamHistoryRow::from)
            .collect();

        tracing::debug!(rows = rows.len(), "exported exam history");
        Ok(ExamHistoryExport {
            exported_at: chrono::Utc::now().to_rfc3339(),
            rows,
        })
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answers, ExamRecord, NewPatient};
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let patient = NewPatient::new("Souza, Maria", "15/06/2000").into_patient(today);
        let patient_id = db.insert_patient(&patient).unwrap();

        db.insert_exam(&ExamRecord::new(patient_id, Answers::new(SampleType::Sputum)))
            .unwrap();

        let mut answers = Answers::new(SampleType::Urine);
        answers.report = "Escherichia coli, \"ESBL\"".into();
        db.insert_exam(&ExamRecord::new(patient_id, answers)).unwrap();
        db
    }

    #[test]
    fn test_export_all() {
        let db = setup_db();
        let export = HistoryExporter::new(&db).export_all().unwrap();

        assert_eq!(export.rows.len(), 2);
        assert_eq!(export.pending_count(), 1);
        assert_eq!(export.complete_count(), 1);
        assert_eq!(export.rows[0].sample_type, SampleType::Urine);
        assert_eq!(export.rows[0].patient_name, "Souza, Maria");
    }

    #[test]
    fn test_history_json() {
        let db = setup_db();
        let export = HistoryExporter::new(&db).export_all().unwrap();

        let json = export.to_json().unwrap();
        assert!(json.contains("\"sample_type\": \"URINE\""));
        assert!(json.contains("\"status\": \"PENDING\""));
    }

    #[test]
    fn test_history_csv() {
        let db = setup_db();
        let export = HistoryExporter::new(&db).export_all().unwrap();

        let csv = export.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 exams
        assert!(lines[0].starts_with("exam_id,"));
        assert!(lines[1].contains("\"Souza, Maria\""));
        assert!(lines[1].ends_with("\"Escherichia coli, \"\"ESBL\"\"\""));
        assert!(lines[2].contains(",SPUTUM,PENDING,"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
