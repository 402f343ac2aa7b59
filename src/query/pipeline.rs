//! Typed aggregation pipeline builder.
//!
//! Stages are kept as a typed list until the pipeline is handed to the
//! driver, so analytical queries can be inspected and tested without a
//! server.

use bson::{Bson, Document, doc};

/// Sort direction for a `$sort` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// A single aggregation stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// `$match` with a query document.
    Match(Document),

    /// `$unwind` of an array field path (without the leading `$`).
    Unwind(String),

    /// `$group` by `id` with named accumulators.
    Group { id: Bson, accumulators: Document },

    /// `$sort` by keys, in order of precedence.
    Sort(Vec<(String, SortOrder)>),

    /// `$limit`; the server rejects zero.
    Limit(u32),

    /// `$project` with a projection document.
    Project(Document),
}

impl Stage {
    /// Render the stage as a pipeline document.
    pub fn to_document(&self) -> Document {
        match self {
            Stage::Match(filter) => doc! { "$match": filter.clone() },
            Stage::Unwind(field) => doc! { "$unwind": format!("${field}") },
            Stage::Group { id, accumulators } => {
                let mut group = doc! { "_id": id.clone() };
                for (field, accumulator) in accumulators {
                    group.insert(field.clone(), accumulator.clone());
                }
                doc! { "$group": group }
            }
            Stage::Sort(keys) => {
                let mut sort = Document::new();
                for (field, order) in keys {
                    sort.insert(field.clone(), order.as_i32());
                }
                doc! { "$sort": sort }
            }
            Stage::Limit(n) => doc! { "$limit": i64::from(*n) },
            Stage::Project(spec) => doc! { "$project": spec.clone() },
        }
    }

    /// Stage operator name, e.g. `$match`.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Unwind(_) => "$unwind",
            Stage::Group { .. } => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Limit(_) => "$limit",
            Stage::Project(_) => "$project",
        }
    }
}

/// Ordered sequence of aggregation stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_filter(mut self, filter: Document) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    pub fn unwind(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind(field.into()));
        self
    }

    pub fn group(mut self, id: impl Into<Bson>, accumulators: Document) -> Self {
        self.stages.push(Stage::Group {
            id: id.into(),
            accumulators,
        });
        self
    }

    pub fn sort(mut self, keys: &[(&str, SortOrder)]) -> Self {
        let keys = keys
            .iter()
            .map(|(field, order)| (field.to_string(), *order))
            .collect();
        self.stages.push(Stage::Sort(keys));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    pub fn project(mut self, spec: Document) -> Self {
        self.stages.push(Stage::Project(spec));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Render all stages in order, ready for `Collection::aggregate`.
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(Stage::to_document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_rendering() {
        assert_eq!(
            Stage::Unwind("marks".to_string()).to_document(),
            doc! { "$unwind": "$marks" }
        );
        assert_eq!(Stage::Limit(3).to_document(), doc! { "$limit": 3_i64 });

        let group = Stage::Group {
            id: Bson::String("$name".to_string()),
            accumulators: doc! { "avg_score": { "$avg": "$marks.score" } },
        };
        assert_eq!(
            group.to_document(),
            doc! { "$group": { "_id": "$name", "avg_score": { "$avg": "$marks.score" } } }
        );
    }

    #[test]
    fn test_sort_keeps_key_precedence() {
        let sort = Stage::Sort(vec![
            ("count".to_string(), SortOrder::Descending),
            ("_id.id".to_string(), SortOrder::Ascending),
        ])
        .to_document();
        let keys: Vec<&String> = sort.get_document("$sort").unwrap().keys().collect();
        assert_eq!(keys, ["count", "_id.id"]);
        assert_eq!(sort, doc! { "$sort": { "count": -1, "_id.id": 1 } });
    }

    #[test]
    fn test_builder_preserves_order() {
        let pipeline = Pipeline::new()
            .match_filter(doc! { "id": 1_i64 })
            .unwind("marks")
            .project(doc! { "_id": 0 });
        let names: Vec<&str> = pipeline.stages().iter().map(Stage::name).collect();
        assert_eq!(names, ["$match", "$unwind", "$project"]);
        assert_eq!(pipeline.to_documents().len(), 3);
    }
}
