//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::exam::ExamStub;

/// Birth dates are entered as `DD/MM/YYYY`.
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Server-assigned ID
    pub id: i64,
    /// Patient name
    pub name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Birth date, `DD/MM/YYYY`
    pub birth_date: Option<String>,
    /// Age in whole years, derived from `birth_date` when it is complete
    pub age: Option<u32>,
    /// Mother's name
    pub mother_name: Option<String>,
    /// Blood type (e.g. "O+")
    pub blood_type: Option<String>,
    /// Sample collection date
    pub collection_date: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

/// Patient fields supplied by the caller. The store assigns the ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    /// Only kept when `birth_date` cannot be read.
    pub age: Option<u32>,
    pub mother_name: Option<String>,
    pub blood_type: Option<String>,
    pub collection_date: Option<String>,
}

impl NewPatient {
    pub fn new(name: impl Into<String>, birth_date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: Some(birth_date.into()),
            ..Self::default()
        }
    }

    /// Build the record to persist, deriving the age as of `today`.
    pub fn into_patient(self, today: NaiveDate) -> Patient {
        let mut patient = Patient {
            id: 0,
            name: self.name,
            phone: self.phone,
            birth_date: self.birth_date,
            age: self.age,
            mother_name: self.mother_name,
            blood_type: self.blood_type,
            collection_date: self.collection_date,
            created_at: super::exam::now_timestamp(),
        };
        patient.refresh_age(today);
        patient
    }
}

impl Patient {
    /// Recompute the age from the birth date. Leaves the stored age alone when
    /// the birth date is missing or incomplete.
    pub fn refresh_age(&mut self, today: NaiveDate) {
        if let Some(age) = self
            .birth_date
            .as_deref()
            .and_then(|birth_date| derive_age(birth_date, today))
        {
            self.age = Some(age);
        }
    }
}

/// Whole years between a `DD/MM/YYYY` birth date and `today`.
///
/// Returns `None` for incomplete or invalid dates. A birth date after `today`
/// gives 0.
pub fn derive_age(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let birth_date = birth_date.trim();
    if birth_date.len() != 10 {
        return None;
    }
    let born = NaiveDate::parse_from_str(birth_date, BIRTH_DATE_FORMAT).ok()?;
    Some(today.years_since(born).unwrap_or(0))
}

/// A patient with references to their exams, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientOverview {
    pub patient: Patient,
    pub exams: Vec<ExamStub>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32, month: u32, year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_age_before_birthday() {
        assert_eq!(derive_age("15/06/2000", date(10, 6, 2024)), Some(23));
    }

    #[test]
    fn test_age_after_birthday() {
        assert_eq!(derive_age("15/06/2000", date(20, 6, 2024)), Some(24));
    }

    #[test]
    fn test_age_on_birthday() {
        assert_eq!(derive_age("15/06/2000", date(15, 6, 2024)), Some(24));
    }

    #[test]
    fn test_incomplete_birth_date() {
        assert_eq!(derive_age("15/06/20", date(10, 6, 2024)), None);
        assert_eq!(derive_age("", date(10, 6, 2024)), None);
        assert_eq!(derive_age("31/02/2000", date(10, 6, 2024)), None);
    }

    #[test]
    fn test_future_birth_date_is_zero() {
        assert_eq!(derive_age("01/01/2030", date(10, 6, 2024)), Some(0));
    }

    #[test]
    fn test_refresh_age_keeps_stored_age_when_unreadable() {
        let mut new_patient = NewPatient::new("Maria", "15/06");
        new_patient.age = Some(40);
        let patient = new_patient.into_patient(date(10, 6, 2024));
        assert_eq!(patient.age, Some(40));
    }

    #[test]
    fn test_derived_age_overrides_supplied_age() {
        let mut new_patient = NewPatient::new("Maria", "15/06/2000");
        new_patient.age = Some(99);
        let patient = new_patient.into_patient(date(10, 6, 2024));
        assert_eq!(patient.age, Some(23));
    }
}
