//! In-process student repository.
//!
//! Keeps documents in insertion order behind a `tokio` lock and evaluates
//! filters with [`StudentFilter::matches`]. Rankings use the same tie-break
//! keys as the MongoDB pipelines, so both implementations return identical
//! results for identical data.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tokio::sync::RwLock;

use super::StudentRepository;
use crate::error::Result;
use crate::model::{HighMarkCount, NameAvgScore, ScoreTotal};
use crate::query::{BEST_SCORE_THRESHOLD, StudentFilter};
use crate::store::{MarkDocument, StudentDocument, date_to_bson};

/// Student repository held entirely in memory.
#[derive(Clone, Default)]
pub struct InMemoryStudentRepository {
    students: Arc<RwLock<Vec<StudentDocument>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with documents, bypassing the write counter.
    pub fn with_documents(documents: Vec<StudentDocument>) -> Self {
        Self {
            students: Arc::new(RwLock::new(documents)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of successful writes performed through the repository.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored document.
    pub async fn documents(&self) -> Vec<StudentDocument> {
        self.students.read().await.clone()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    async fn marks_where<F>(&self, id: i64, keep: F) -> Vec<MarkDocument>
    where
        F: Fn(&MarkDocument) -> bool + Send,
    {
        let students = self.students.read().await;
        students
            .iter()
            .filter(|s| s.id == id)
            .flat_map(|s| s.marks.iter())
            .filter(|m| keep(m))
            .cloned()
            .collect()
    }
}

/// Copy of a document without its marks.
fn view(student: &StudentDocument) -> StudentDocument {
    StudentDocument {
        marks: Vec::new(),
        ..student.clone()
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn insert_if_absent(&self, student: &StudentDocument) -> Result<bool> {
        let mut students = self.students.write().await;
        if students.iter().any(|s| s.id == student.id) {
            return Ok(false);
        }
        students.push(student.clone());
        self.record_write();
        Ok(true)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.students.read().await.iter().any(|s| s.id == id))
    }

    async fn set_phone(&self, id: i64, phone: &str) -> Result<Option<StudentDocument>> {
        let mut students = self.students.write().await;
        let Some(student) = students.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        let previous = view(student);
        student.phone = phone.to_string();
        self.record_write();
        Ok(Some(previous))
    }

    async fn push_mark(&self, id: i64, mark: &MarkDocument) -> Result<Option<Vec<MarkDocument>>> {
        let mut students = self.students.write().await;
        let Some(student) = students.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        student.marks.push(mark.clone());
        self.record_write();
        Ok(Some(student.marks.clone()))
    }

    async fn delete(&self, id: i64) -> Result<Option<StudentDocument>> {
        let mut students = self.students.write().await;
        let Some(position) = students.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let removed = students.remove(position);
        self.record_write();
        Ok(Some(removed))
    }

    async fn find_marks(&self, id: i64) -> Result<Option<Vec<MarkDocument>>> {
        let students = self.students.read().await;
        Ok(students
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.marks.clone()))
    }

    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentDocument>> {
        let students = self.students.read().await;
        Ok(students.iter().find(|s| filter.matches(s)).map(view))
    }

    async fn find_many(&self, filter: &StudentFilter) -> Result<Vec<StudentDocument>> {
        let students = self.students.read().await;
        Ok(students
            .iter()
            .filter(|s| filter.matches(s))
            .map(view)
            .collect())
    }

    async fn subject_marks(&self, id: i64, subject: &str) -> Result<Vec<MarkDocument>> {
        Ok(self.marks_where(id, |m| m.subject == subject).await)
    }

    async fn marks_between_dates(
        &self,
        id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MarkDocument>> {
        let lower = date_to_bson(from).timestamp_millis();
        let upper = to
            .checked_add_days(Days::new(1))
            .map(|next_day| date_to_bson(next_day).timestamp_millis());

        Ok(self
            .marks_where(id, |m| {
                let at = m.date.timestamp_millis();
                at >= lower && upper.is_none_or(|upper| at < upper)
            })
            .await)
    }

    async fn avg_score_greater(&self, threshold: i32) -> Result<Vec<NameAvgScore>> {
        let students = self.students.read().await;

        // BTreeMap keeps names ascending for the tie-break.
        let mut sums: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for student in students.iter() {
            for mark in &student.marks {
                let entry = sums.entry(student.name.as_str()).or_default();
                entry.0 += i64::from(mark.score);
                entry.1 += 1;
            }
        }

        let mut averages: Vec<NameAvgScore> = sums
            .into_iter()
            .map(|(name, (sum, count))| NameAvgScore {
                name: name.to_string(),
                avg_score: sum as f64 / count as f64,
            })
            .filter(|row| row.avg_score > f64::from(threshold))
            .collect();
        averages.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
        Ok(averages)
    }

    async fn best_students(&self, n: u32) -> Result<Vec<HighMarkCount>> {
        let students = self.students.read().await;
        let mut rows: Vec<HighMarkCount> = students
            .iter()
            .map(|s| HighMarkCount {
                id: s.id,
                name: s.name.clone(),
                count: s
                    .marks
                    .iter()
                    .filter(|m| m.score > BEST_SCORE_THRESHOLD)
                    .count() as i64,
            })
            .filter(|row| row.count > 0)
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));
        rows.truncate(n as usize);
        Ok(rows)
    }

    async fn worst_students(&self, n: u32) -> Result<Vec<ScoreTotal>> {
        let students = self.students.read().await;
        let mut rows: Vec<ScoreTotal> = students
            .iter()
            .filter(|s| !s.marks.is_empty())
            .map(|s| ScoreTotal {
                id: s.id,
                name: s.name.clone(),
                total: s.marks.iter().map(|m| i64::from(m.score)).sum(),
            })
            .collect();
        rows.sort_by(|a, b| a.total.cmp(&b.total).then(a.id.cmp(&b.id)));
        rows.truncate(n as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;

    fn doc(id: i64, name: &str, scores: &[i32]) -> StudentDocument {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        StudentDocument {
            id,
            name: name.to_string(),
            phone: format!("050-000000{id}"),
            marks: scores
                .iter()
                .map(|score| MarkDocument::from(&Mark::new("Math", date, *score)))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let repo = InMemoryStudentRepository::new();
        assert!(repo.insert_if_absent(&doc(1, "Vasya", &[])).await.unwrap());
        assert!(!repo.insert_if_absent(&doc(1, "Other", &[])).await.unwrap());

        let stored = repo.documents().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Vasya");
        assert_eq!(repo.write_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_marks() {
        let repo = InMemoryStudentRepository::with_documents(vec![doc(1, "A", &[70, 90])]);
        let removed = repo.delete(1).await.unwrap().unwrap();
        assert_eq!(removed.marks.len(), 2);
        assert!(repo.documents().await.is_empty());
        assert!(repo.delete(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_best_students_ties_by_id() {
        let repo = InMemoryStudentRepository::with_documents(vec![
            doc(3, "C", &[90, 95]),
            doc(1, "A", &[85, 99]),
            doc(2, "B", &[81, 70]),
            doc(4, "D", &[50]),
        ]);
        let best = repo.best_students(3).await.unwrap();
        let ids: Vec<i64> = best.iter().map(|row| row.id).collect();
        assert_eq!(ids, [1, 3, 2]);
    }

    #[tokio::test]
    async fn test_worst_students_skip_students_without_marks() {
        let repo = InMemoryStudentRepository::with_documents(vec![
            doc(1, "A", &[]),
            doc(2, "B", &[60, 60]),
            doc(3, "C", &[100, 20]),
            doc(4, "D", &[90]),
        ]);
        let worst = repo.worst_students(10).await.unwrap();
        let ids: Vec<i64> = worst.iter().map(|row| row.id).collect();
        assert_eq!(ids, [4, 2, 3]);
        assert_eq!(worst[1].total, 120);
    }

    #[tokio::test]
    async fn test_avg_score_groups_by_name() {
        let repo = InMemoryStudentRepository::with_documents(vec![
            doc(1, "Sara", &[90]),
            doc(2, "Sara", &[70]),
            doc(3, "Moshe", &[80]),
            doc(4, "Anna", &[95]),
        ]);
        let averages = repo.avg_score_greater(75).await.unwrap();
        let names: Vec<&str> = averages.iter().map(|row| row.name.as_str()).collect();
        assert_eq!(names, ["Anna", "Moshe", "Sara"]);
        assert_eq!(averages[2].avg_score, 80.0);
    }
}
