//! Named analytical pipelines over the students collection.
//!
//! Every ranking sort carries a secondary key so that ties come back in a
//! stable order: average scores by name ascending, best/worst rankings by
//! student id ascending.

use bson::{Document, doc};
use chrono::{Days, NaiveDate};

use super::filter::StudentFilter;
use super::pipeline::{Pipeline, SortOrder};
use crate::store::date_to_bson;

/// A mark counts toward "best students" only when its score exceeds this.
pub const BEST_SCORE_THRESHOLD: i32 = 80;

/// Flatten an unwound mark back to `{subject, date, score}`.
fn mark_projection() -> Document {
    doc! {
        "_id": 0,
        "subject": "$marks.subject",
        "date": "$marks.date",
        "score": "$marks.score",
    }
}

/// Flatten a `{_id: {id, name}, <value>}` group row.
fn ranking_projection(value: &str) -> Document {
    doc! { "_id": 0, "id": "$_id.id", "name": "$_id.name", value: 1 }
}

/// Marks of one student in one subject, in stored order.
pub fn subject_marks(id: i64, subject: &str) -> Pipeline {
    Pipeline::new()
        .match_filter(StudentFilter::Id(id).to_document())
        .unwind("marks")
        .match_filter(doc! { "marks.subject": subject })
        .project(mark_projection())
}

/// Marks of one student dated within `[from, to]`, both days inclusive.
///
/// Rendered as the half-open interval `[from 00:00, to+1 00:00)`. A `to` at
/// the end of the calendar range has no successor and leaves the upper bound
/// open.
pub fn marks_between_dates(id: i64, from: NaiveDate, to: NaiveDate) -> Pipeline {
    let mut range = doc! { "$gte": date_to_bson(from) };
    if let Some(next_day) = to.checked_add_days(Days::new(1)) {
        range.insert("$lt", date_to_bson(next_day));
    }

    Pipeline::new()
        .match_filter(StudentFilter::Id(id).to_document())
        .unwind("marks")
        .match_filter(doc! { "marks.date": range })
        .project(mark_projection())
}

/// Per-name mean score, keeping means strictly above `threshold`, highest first.
pub fn avg_score_greater(threshold: i32) -> Pipeline {
    Pipeline::new()
        .unwind("marks")
        .group("$name", doc! { "avg_score": { "$avg": "$marks.score" } })
        .match_filter(doc! { "avg_score": { "$gt": threshold } })
        .sort(&[
            ("avg_score", SortOrder::Descending),
            ("_id", SortOrder::Ascending),
        ])
        .project(doc! { "_id": 0, "name": "$_id", "avg_score": 1 })
}

/// Top `n` students by number of marks above [`BEST_SCORE_THRESHOLD`].
pub fn best_students(n: u32) -> Pipeline {
    Pipeline::new()
        .unwind("marks")
        .match_filter(doc! { "marks.score": { "$gt": BEST_SCORE_THRESHOLD } })
        .group(
            doc! { "id": "$id", "name": "$name" },
            doc! { "count": { "$sum": 1 } },
        )
        .sort(&[
            ("count", SortOrder::Descending),
            ("_id.id", SortOrder::Ascending),
        ])
        .limit(n)
        .project(ranking_projection("count"))
}

/// Bottom `n` students by total score. Students without marks are not ranked.
pub fn worst_students(n: u32) -> Pipeline {
    Pipeline::new()
        .unwind("marks")
        .group(
            doc! { "id": "$id", "name": "$name" },
            doc! { "total": { "$sum": "$marks.score" } },
        )
        .sort(&[
            ("total", SortOrder::Ascending),
            ("_id.id", SortOrder::Ascending),
        ])
        .limit(n)
        .project(ranking_projection("total"))
}
