//! JSON rendering of query results

use serde::Serialize;

use crate::error::{ExecutionError, Result};

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `pretty` - Enable pretty printing
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serialize any value as JSON
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| ExecutionError::Encode(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mark, Student};
    use chrono::NaiveDate;

    #[test]
    fn test_compact_students() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format(&[Student::new(1, "Vasya", "050-1111111")])
            .unwrap();
        assert_eq!(output, r#"[{"id":1,"name":"Vasya","phone":"050-1111111"}]"#);
    }

    #[test]
    fn test_mark_date_is_iso() {
        let formatter = JsonFormatter::new(false);
        let mark = Mark::new("Math", NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), 90);
        let output = formatter.format(&mark).unwrap();
        assert_eq!(output, r#"{"subject":"Math","date":"2024-01-05","score":90}"#);
    }

    #[test]
    fn test_pretty_is_indented() {
        let formatter = JsonFormatter::new(true);
        let output = formatter.format(&vec!["ID: 1, Name: Vasya, Count: 3"]).unwrap();
        assert_eq!(output, "[\n  \"ID: 1, Name: Vasya, Count: 3\"\n]");
    }
}
