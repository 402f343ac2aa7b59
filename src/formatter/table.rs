//! Table formatting for result rows using tabled

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Modify, Style, Width, object::Columns},
};

use crate::config::{DisplayConfig, TableStyle};

/// Placeholder printed for an empty result
pub const EMPTY_RESULT: &str = "(empty result set)";

/// Table formatter for typed rows
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Table style
    style: TableStyle,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self::from_config(&DisplayConfig::default())
    }

    /// Create a table formatter from display configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self {
            max_column_width: config.max_column_width,
            style: config.table_style,
        }
    }

    /// Render rows with a header taken from the row type
    pub fn format_rows<T: Tabled>(&self, rows: &[T]) -> String {
        if rows.is_empty() {
            return EMPTY_RESULT.to_string();
        }
        let mut table = Table::new(rows);
        self.finish(&mut table)
    }

    /// Render plain text lines as a single-column table
    pub fn format_lines(&self, header: &str, lines: &[String]) -> String {
        if lines.is_empty() {
            return EMPTY_RESULT.to_string();
        }
        let mut builder = Builder::default();
        builder.push_record([header]);
        for line in lines {
            builder.push_record([line.as_str()]);
        }
        let mut table = builder.build();
        self.finish(&mut table)
    }

    fn finish(&self, table: &mut Table) -> String {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Psql => table.with(Style::psql()),
        };
        // Wrap long cells instead of truncating them
        table.with(Modify::new(Columns::new(..)).with(Width::wrap(self.max_column_width)));
        table.to_string()
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NameAvgScore, Student};

    fn styled(table_style: TableStyle) -> TableFormatter {
        TableFormatter::from_config(&DisplayConfig {
            table_style,
            ..DisplayConfig::default()
        })
    }

    #[test]
    fn test_format_empty_rows() {
        let formatter = TableFormatter::new();
        let rows: Vec<Student> = Vec::new();
        assert_eq!(formatter.format_rows(&rows), EMPTY_RESULT);
    }

    #[test]
    fn test_student_columns() {
        let formatter = styled(TableStyle::Ascii);
        let output = formatter.format_rows(&[Student::new(1, "Vasya", "050-1111111")]);
        assert!(output.contains("| id | name  | phone       |"));
        assert!(output.contains("| 1  | Vasya | 050-1111111 |"));
    }

    #[test]
    fn test_average_header_is_renamed() {
        let formatter = TableFormatter::new();
        let output = formatter.format_rows(&[NameAvgScore {
            name: "Sara".to_string(),
            avg_score: 80.5,
        }]);
        assert!(output.contains("average score"));
        assert!(output.contains("80.5"));
    }

    #[test]
    fn test_lines_table() {
        let formatter = styled(TableStyle::Psql);
        let output = formatter.format_lines(
            "student",
            &["ID: 1, Name: Vasya, Count: 3".to_string()],
        );
        assert!(output.contains("student"));
        assert!(output.contains("ID: 1, Name: Vasya, Count: 3"));
    }
}
