//! Student service
//!
//! Orchestrates repository calls, enforces existence invariants and converts
//! stored documents to public views:
//! - Writes: add student, update phone, add mark, remove student
//! - Lookups: marks, phone, phone prefix
//! - Predicates: good marks, few marks, good marks in subject, mark count range
//! - Analytics: subject marks, marks at dates, average scores, best/worst
//!
//! Failures are [`StudentsError::NotFound`] for an unknown id and
//! [`StudentsError::AlreadyExists`] for a duplicate id on creation.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, StudentsError};
use crate::model::{Mark, NameAvgScore, Student};
use crate::query::StudentFilter;
use crate::repository::StudentRepository;
use crate::store::{MarkDocument, StudentDocument, to_marks};

#[cfg(test)]
mod tests;

/// Student record service over a repository.
pub struct StudentsService<R> {
    repository: R,
}

impl<R: StudentRepository> StudentsService<R> {
    /// Create a new service
    ///
    /// # Arguments
    /// * `repository` - Storage backend
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Access the underlying repository
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Register a new student with no marks.
    ///
    /// # Returns
    /// * `Result<Student>` - The input, unchanged
    pub async fn add_student(&self, student: Student) -> Result<Student> {
        let document = StudentDocument::from_student(&student);
        if !self.repository.insert_if_absent(&document).await? {
            return Err(StudentsError::AlreadyExists(student.id));
        }
        debug!("saved {:?}", student);
        Ok(student)
    }

    /// Replace a student's phone.
    ///
    /// # Returns
    /// * `Result<Student>` - The student view with the new phone
    pub async fn update_phone(&self, id: i64, phone: &str) -> Result<Student> {
        let previous = self
            .repository
            .set_phone(id, phone)
            .await?
            .ok_or(StudentsError::NotFound(id))?;
        debug!(
            "student {}, old phone number {}, new phone number {}",
            id, previous.phone, phone
        );
        let mut student = Student::from(previous);
        student.phone = phone.to_string();
        Ok(student)
    }

    /// Append a mark to a student's marks.
    ///
    /// # Returns
    /// * `Result<Vec<Mark>>` - Full mark list after the append
    pub async fn add_mark(&self, id: i64, mark: Mark) -> Result<Vec<Mark>> {
        let marks = self
            .repository
            .push_mark(id, &MarkDocument::from(&mark))
            .await?
            .ok_or(StudentsError::NotFound(id))?;
        debug!("student {}, added mark {:?}", id, mark);
        to_marks(marks)
    }

    /// Remove a student together with all marks.
    ///
    /// # Returns
    /// * `Result<Student>` - The student view as it was before removal
    pub async fn remove_student(&self, id: i64) -> Result<Student> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or(StudentsError::NotFound(id))?;
        debug!("removed student {}, marks {:?}", id, removed.marks);
        Ok(removed.into())
    }

    /// All marks of a student in insertion order.
    pub async fn get_marks(&self, id: i64) -> Result<Vec<Mark>> {
        let marks = self
            .repository
            .find_marks(id)
            .await?
            .ok_or(StudentsError::NotFound(id))?;
        debug!("id {}, marks {:?}", id, marks);
        to_marks(marks)
    }

    /// Student owning exactly this phone, if any.
    pub async fn get_student_by_phone(&self, phone: &str) -> Result<Option<Student>> {
        let found = self
            .repository
            .find_one(&StudentFilter::Phone(phone.to_string()))
            .await?;
        Ok(found.map(Student::from))
    }

    /// Students whose phone starts with `prefix`.
    pub async fn get_students_by_phone_prefix(&self, prefix: &str) -> Result<Vec<Student>> {
        let students = self
            .find_students(StudentFilter::PhonePrefix(prefix.to_string()))
            .await?;
        debug!(
            "number of the students having phone prefix {} is {}",
            prefix,
            students.len()
        );
        Ok(students)
    }

    /// Students with at least one mark and every mark above `threshold`.
    pub async fn get_students_all_good_marks(&self, threshold: i32) -> Result<Vec<Student>> {
        self.find_students(StudentFilter::AllMarksAbove(threshold))
            .await
    }

    /// Students with fewer than `n_marks` marks.
    pub async fn get_students_few_marks(&self, n_marks: u32) -> Result<Vec<Student>> {
        self.find_students(StudentFilter::FewerMarksThan(n_marks))
            .await
    }

    /// Students with at least one mark in `subject` and all of them at least
    /// `threshold`.
    pub async fn get_students_all_good_marks_subject(
        &self,
        subject: &str,
        threshold: i32,
    ) -> Result<Vec<Student>> {
        self.find_students(StudentFilter::AllGoodInSubject {
            subject: subject.to_string(),
            threshold,
        })
        .await
    }

    /// Students whose mark count lies in `[min, max]`.
    pub async fn get_students_marks_amount_between(
        &self,
        min: u32,
        max: u32,
    ) -> Result<Vec<Student>> {
        self.find_students(StudentFilter::MarkCountBetween { min, max })
            .await
    }

    /// Marks of a student in one subject.
    pub async fn get_student_subject_marks(&self, id: i64, subject: &str) -> Result<Vec<Mark>> {
        self.require_student(id).await?;
        let marks = self.repository.subject_marks(id, subject).await?;
        debug!("student {}, subject {}, marks {:?}", id, subject, marks);
        to_marks(marks)
    }

    /// Names whose mean score is above `threshold`, highest mean first.
    ///
    /// Equal means are ordered by name ascending.
    pub async fn get_student_avg_score_greater(&self, threshold: i32) -> Result<Vec<NameAvgScore>> {
        let averages = self.repository.avg_score_greater(threshold).await?;
        debug!("result: {:?}", averages);
        Ok(averages)
    }

    /// Marks of a student dated from `from` through `to`, both inclusive.
    pub async fn get_student_marks_at_dates(
        &self,
        id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Mark>> {
        self.require_student(id).await?;
        let marks = self.repository.marks_between_dates(id, from, to).await?;
        debug!("student {}, {} marks between {} and {}", id, marks.len(), from, to);
        to_marks(marks)
    }

    /// Top `n` students by number of marks above 80.
    ///
    /// # Returns
    /// * `Result<Vec<String>>` - Lines of the form `ID: <id>, Name: <name>, Count: <count>`
    pub async fn get_best_students(&self, n: u32) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let rows = self.repository.best_students(n).await?;
        Ok(rows.iter().map(ToString::to_string).collect())
    }

    /// Bottom `n` students by total score.
    ///
    /// # Returns
    /// * `Result<Vec<String>>` - Lines of the form `ID: <id>, Name: <name>, Total Score: <total>`
    pub async fn get_worst_students(&self, n: u32) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let rows = self.repository.worst_students(n).await?;
        Ok(rows.iter().map(ToString::to_string).collect())
    }

    async fn find_students(&self, filter: StudentFilter) -> Result<Vec<Student>> {
        let documents = self.repository.find_many(&filter).await?;
        Ok(documents.into_iter().map(Student::from).collect())
    }

    async fn require_student(&self, id: i64) -> Result<()> {
        if self.repository.exists(id).await? {
            Ok(())
        } else {
            Err(StudentsError::NotFound(id))
        }
    }
}
