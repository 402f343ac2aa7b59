//! Persisted document shapes for the students collection.
//!
//! A student is stored as a single document:
//!
//! ```text
//! { id: <i64>, name: <string>, phone: <string>,
//!   marks: [ { subject: <string>, date: <datetime>, score: <i32> }, ... ] }
//! ```
//!
//! Mark dates are calendar days and are stored as BSON datetimes at 00:00 UTC.

use bson::DateTime;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, Result, StudentsError};
use crate::model::{Mark, Student};

/// Full persisted student record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDocument {
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub marks: Vec<MarkDocument>,
}

/// Mark as embedded in a student document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDocument {
    pub subject: String,
    pub date: DateTime,
    pub score: i32,
}

/// Result shape of a marks-only projection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarksOnly {
    #[serde(default)]
    pub marks: Vec<MarkDocument>,
}

/// Convert a calendar date to the stored datetime (start of day, UTC).
pub fn date_to_bson(date: NaiveDate) -> DateTime {
    DateTime::from_millis(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Convert a stored datetime back to its calendar date (UTC).
pub fn bson_to_date(value: DateTime) -> Result<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(value.timestamp_millis())
        .map(|dt| dt.date_naive())
        .ok_or_else(|| {
            StudentsError::from(ExecutionError::Decode(format!(
                "mark date out of range: {value}"
            )))
        })
}

impl StudentDocument {
    /// Document for a newly registered student, with no marks.
    pub fn from_student(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            phone: student.phone.clone(),
            marks: Vec::new(),
        }
    }

    /// Public view without marks.
    pub fn to_student(&self) -> Student {
        Student {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl From<StudentDocument> for Student {
    fn from(doc: StudentDocument) -> Self {
        Student {
            id: doc.id,
            name: doc.name,
            phone: doc.phone,
        }
    }
}

impl From<&Mark> for MarkDocument {
    fn from(mark: &Mark) -> Self {
        Self {
            subject: mark.subject.clone(),
            date: date_to_bson(mark.date),
            score: mark.score,
        }
    }
}

impl TryFrom<MarkDocument> for Mark {
    type Error = StudentsError;

    fn try_from(doc: MarkDocument) -> Result<Self> {
        Ok(Mark {
            date: bson_to_date(doc.date)?,
            subject: doc.subject,
            score: doc.score,
        })
    }
}

/// Convert stored marks to public marks, preserving order.
pub fn to_marks(docs: Vec<MarkDocument>) -> Result<Vec<Mark>> {
    docs.into_iter().map(Mark::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_stored_at_utc_midnight() {
        let stored = date_to_bson(date(2024, 1, 2));
        assert_eq!(stored.timestamp_millis(), 1_704_153_600_000);
        assert_eq!(bson_to_date(stored).unwrap(), date(2024, 1, 2));
    }

    #[test]
    fn test_student_document_layout() {
        let mut doc = StudentDocument::from_student(&Student::new(1, "Vasya", "050-1234567"));
        doc.marks.push(MarkDocument::from(&Mark::new("Math", date(2024, 1, 2), 90)));

        let encoded = bson::to_document(&doc).unwrap();
        assert_eq!(encoded.get_i64("id").unwrap(), 1);
        assert_eq!(encoded.get_str("phone").unwrap(), "050-1234567");
        let marks = encoded.get_array("marks").unwrap();
        let first = marks[0].as_document().unwrap();
        assert_eq!(first.get_str("subject").unwrap(), "Math");
        assert!(matches!(first.get("date"), Some(Bson::DateTime(_))));
        assert_eq!(first.get_i32("score").unwrap(), 90);
    }

    #[test]
    fn test_missing_marks_read_as_empty() {
        let decoded: StudentDocument =
            bson::from_document(doc! { "id": 2_i64, "name": "Sara", "phone": "052-1111111" })
                .unwrap();
        assert!(decoded.marks.is_empty());
        assert_eq!(decoded.to_student(), Student::new(2, "Sara", "052-1111111"));
    }

    #[test]
    fn test_to_marks_preserves_order() {
        let marks = vec![
            Mark::new("Math", date(2024, 1, 2), 90),
            Mark::new("Physics", date(2023, 12, 30), 70),
        ];
        let docs = marks.iter().map(MarkDocument::from).collect();
        assert_eq!(to_marks(docs).unwrap(), marks);
    }
}
