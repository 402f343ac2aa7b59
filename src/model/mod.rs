//! Public view records returned by the service.
//!
//! These types never carry storage details: dates are calendar dates and a
//! [`Student`] never includes its marks.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Public view of a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

/// A dated, scored record of performance in one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct Mark {
    pub subject: String,
    pub date: NaiveDate,
    pub score: i32,
}

/// Mean score of all marks recorded under one student name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct NameAvgScore {
    pub name: String,
    #[tabled(rename = "average score")]
    pub avg_score: f64,
}

/// Number of marks above the "best" threshold for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighMarkCount {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

/// Sum of all scores for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTotal {
    pub id: i64,
    pub name: String,
    pub total: i64,
}

impl Student {
    pub fn new(id: i64, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phone: phone.into(),
        }
    }
}

impl Mark {
    pub fn new(subject: impl Into<String>, date: NaiveDate, score: i32) -> Self {
        Self {
            subject: subject.into(),
            date,
            score,
        }
    }
}

impl fmt::Display for HighMarkCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: {}, Name: {}, Count: {}", self.id, self.name, self.count)
    }
}

impl fmt::Display for ScoreTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Total Score: {}",
            self.id, self.name, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_display() {
        let best = HighMarkCount {
            id: 3,
            name: "Vasya".to_string(),
            count: 4,
        };
        assert_eq!(best.to_string(), "ID: 3, Name: Vasya, Count: 4");

        let worst = ScoreTotal {
            id: 5,
            name: "Petya".to_string(),
            total: 120,
        };
        assert_eq!(worst.to_string(), "ID: 5, Name: Petya, Total Score: 120");
    }

    #[test]
    fn test_ranking_rows_decode_from_aggregation_output() {
        // `$sum` yields Int32 until it overflows into Int64.
        let best: HighMarkCount =
            bson::from_document(bson::doc! { "id": 1_i64, "name": "Vasya", "count": 3_i32 })
                .unwrap();
        assert_eq!(best.to_string(), "ID: 1, Name: Vasya, Count: 3");

        let worst: ScoreTotal =
            bson::from_document(bson::doc! { "id": 4_i64, "name": "Moshe", "total": 50_i32 })
                .unwrap();
        assert_eq!(worst.to_string(), "ID: 4, Name: Moshe, Total Score: 50");

        let large: ScoreTotal = bson::from_document(
            bson::doc! { "id": 2_i64, "name": "Sara", "total": 3_000_000_000_i64 },
        )
        .unwrap();
        assert_eq!(large.total, 3_000_000_000);
    }

    #[test]
    fn test_average_row_decodes_from_double() {
        let row: NameAvgScore =
            bson::from_document(bson::doc! { "name": "Sara", "avg_score": 80.0_f64 }).unwrap();
        assert_eq!(
            row,
            NameAvgScore {
                name: "Sara".to_string(),
                avg_score: 80.0,
            }
        );

        let mean = 232.0_f64 / 3.0;
        let row: NameAvgScore =
            bson::from_document(bson::doc! { "name": "Yosef", "avg_score": mean }).unwrap();
        assert!((row.avg_score - 77.333).abs() < 0.001);
    }

    #[test]
    fn test_mark_serializes_calendar_date() {
        let mark = Mark::new("Math", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 90);
        let json = serde_json::to_string(&mark).unwrap();
        assert_eq!(json, r#"{"subject":"Math","date":"2024-03-01","score":90}"#);
    }
}
