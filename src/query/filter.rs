//! Student predicates compiled to MongoDB filter documents.
//!
//! Each [`StudentFilter`] has two renderings that must agree: a native query
//! document for the server ([`StudentFilter::to_document`]) and an in-process
//! evaluator ([`StudentFilter::matches`]) used by the in-memory repository.

use bson::{Document, doc};

use crate::store::StudentDocument;

/// A fixed set of parametrized student queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentFilter {
    /// Exact id match.
    Id(i64),

    /// Exact phone match.
    Phone(String),

    /// Phone starts with the given prefix.
    PhonePrefix(String),

    /// At least one mark, and every mark scores strictly above the threshold.
    AllMarksAbove(i32),

    /// Fewer than `n` marks in total.
    FewerMarksThan(u32),

    /// At least one mark in `subject`, and every mark in `subject` scores at
    /// least `threshold`.
    AllGoodInSubject { subject: String, threshold: i32 },

    /// Total mark count within `[min, max]`.
    MarkCountBetween { min: u32, max: u32 },
}

/// `$size` of the marks array, counting a missing array as empty.
fn marks_size() -> Document {
    doc! { "$size": { "$ifNull": ["$marks", []] } }
}

impl StudentFilter {
    /// Compile to a MongoDB query document.
    pub fn to_document(&self) -> Document {
        match self {
            StudentFilter::Id(id) => doc! { "id": *id },
            StudentFilter::Phone(phone) => doc! { "phone": phone.as_str() },
            StudentFilter::PhonePrefix(prefix) => {
                let pattern = format!("^{}", regex::escape(prefix));
                doc! { "phone": { "$regex": pattern } }
            }
            StudentFilter::AllMarksAbove(threshold) => doc! {
                "$and": [
                    { "marks": { "$elemMatch": { "score": { "$gt": *threshold } } } },
                    { "marks": { "$not": { "$elemMatch": { "score": { "$lte": *threshold } } } } },
                ]
            },
            StudentFilter::FewerMarksThan(n) => doc! {
                "$expr": { "$lt": [marks_size(), i64::from(*n)] }
            },
            StudentFilter::AllGoodInSubject { subject, threshold } => doc! {
                "$and": [
                    { "marks": { "$elemMatch": { "subject": subject.as_str() } } },
                    { "marks": { "$not": { "$elemMatch": {
                        "subject": subject.as_str(),
                        "score": { "$lt": *threshold },
                    } } } },
                ]
            },
            StudentFilter::MarkCountBetween { min, max } => doc! {
                "$expr": { "$and": [
                    { "$gte": [marks_size(), i64::from(*min)] },
                    { "$lte": [marks_size(), i64::from(*max)] },
                ] }
            },
        }
    }

    /// Evaluate the predicate against a stored document.
    pub fn matches(&self, student: &StudentDocument) -> bool {
        let marks = &student.marks;
        match self {
            StudentFilter::Id(id) => student.id == *id,
            StudentFilter::Phone(phone) => student.phone == *phone,
            StudentFilter::PhonePrefix(prefix) => student.phone.starts_with(prefix.as_str()),
            StudentFilter::AllMarksAbove(threshold) => {
                !marks.is_empty() && marks.iter().all(|m| m.score > *threshold)
            }
            StudentFilter::FewerMarksThan(n) => (marks.len() as u64) < u64::from(*n),
            StudentFilter::AllGoodInSubject { subject, threshold } => {
                let mut in_subject = marks.iter().filter(|m| m.subject == *subject).peekable();
                in_subject.peek().is_some() && in_subject.all(|m| m.score >= *threshold)
            }
            StudentFilter::MarkCountBetween { min, max } => {
                let count = marks.len() as u64;
                u64::from(*min) <= count && count <= u64::from(*max)
            }
        }
    }
}

/// Projection for the public student view (no marks).
pub fn student_view_projection() -> Document {
    doc! { "_id": 0, "id": 1, "name": 1, "phone": 1 }
}

/// Projection keeping only the marks array.
pub fn marks_only_projection() -> Document {
    doc! { "_id": 0, "marks": 1 }
}
