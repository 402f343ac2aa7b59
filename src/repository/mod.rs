//! Data access for student documents.
//!
//! [`StudentRepository`] is the seam between the service and the document
//! store. Two implementations share its contract:
//! - `mongo`: the MongoDB collection, driven by compiled filters and pipelines
//! - `memory`: an in-process store evaluating the same predicates directly
//!
//! Every write is a single-document atomic operation, so there is no
//! check-then-write window on student creation or mark append.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{HighMarkCount, NameAvgScore, ScoreTotal};
use crate::query::StudentFilter;
use crate::store::{MarkDocument, StudentDocument};

pub mod memory;
pub mod mongo;

pub use memory::InMemoryStudentRepository;
pub use mongo::MongoStudentRepository;

/// Persistence operations over the students collection.
///
/// Methods returning a [`StudentDocument`] other than through marks
/// projections leave `marks` empty.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Store a new student unless one with the same id exists.
    ///
    /// Returns `false` when the id is already taken; nothing is written then.
    async fn insert_if_absent(&self, student: &StudentDocument) -> Result<bool>;

    /// Whether a student with this id exists.
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Replace the phone and return the record as it was before the update.
    async fn set_phone(&self, id: i64, phone: &str) -> Result<Option<StudentDocument>>;

    /// Append a mark and return the full updated mark list.
    async fn push_mark(&self, id: i64, mark: &MarkDocument) -> Result<Option<Vec<MarkDocument>>>;

    /// Delete the student and return the removed record, marks included.
    async fn delete(&self, id: i64) -> Result<Option<StudentDocument>>;

    /// All marks of one student, in insertion order.
    async fn find_marks(&self, id: i64) -> Result<Option<Vec<MarkDocument>>>;

    /// First student matching the filter.
    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentDocument>>;

    /// All students matching the filter, in natural order.
    async fn find_many(&self, filter: &StudentFilter) -> Result<Vec<StudentDocument>>;

    /// Marks of one student in one subject.
    async fn subject_marks(&self, id: i64, subject: &str) -> Result<Vec<MarkDocument>>;

    /// Marks of one student dated within `[from, to]`.
    async fn marks_between_dates(
        &self,
        id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MarkDocument>>;

    /// Per-name mean scores above `threshold`, highest first, ties by name.
    async fn avg_score_greater(&self, threshold: i32) -> Result<Vec<NameAvgScore>>;

    /// Top `n` students by count of marks above the best-score threshold.
    async fn best_students(&self, n: u32) -> Result<Vec<HighMarkCount>>;

    /// Bottom `n` students by total score.
    async fn worst_students(&self, n: u32) -> Result<Vec<ScoreTotal>>;
}
