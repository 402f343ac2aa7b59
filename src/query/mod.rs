//! Query and aggregation layer.
//!
//! Translates domain questions into MongoDB query documents and aggregation
//! pipelines:
//! - `filter`: predicates on a single student document
//! - `pipeline`: the typed stage builder
//! - `analytics`: the named analytical pipelines built on top of it

pub mod analytics;
pub mod filter;
pub mod pipeline;

pub use analytics::BEST_SCORE_THRESHOLD;
pub use filter::StudentFilter;
pub use pipeline::{Pipeline, SortOrder, Stage};
