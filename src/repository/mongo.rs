//! MongoDB-backed student repository.
//!
//! Writes use single-document atomic primitives:
//! - creation is an upsert with `$setOnInsert`, so an existing id is never
//!   overwritten
//! - mark append is a `$push` through `findOneAndUpdate`
//! - phone change and removal return the pre-image in the same round trip

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{
    CountOptions, FindOneAndDeleteOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions,
    IndexOptions, ReturnDocument, UpdateOptions,
};
use mongodb::{Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::StudentRepository;
use crate::error::{ExecutionError, Result, map_insert_error};
use crate::model::{HighMarkCount, NameAvgScore, ScoreTotal};
use crate::query::filter::{marks_only_projection, student_view_projection};
use crate::query::{Pipeline, StudentFilter, analytics};
use crate::store::{MarkDocument, MarksOnly, StudentDocument};

/// Name of the unique index on student ids.
pub const ID_INDEX_NAME: &str = "id_unique";

/// Student repository over one MongoDB collection.
#[derive(Clone)]
pub struct MongoStudentRepository {
    collection: Collection<StudentDocument>,
}

impl MongoStudentRepository {
    /// Create a repository over `collection` in `database`.
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }

    /// Create the unique index on `id`.
    ///
    /// Idempotent; the server accepts re-creating an identical index.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let options = IndexOptions::builder()
            .unique(true)
            .name(ID_INDEX_NAME.to_string())
            .build();
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(options)
            .build();

        self.collection.create_index(index).await?;
        info!(
            "Ensured unique index '{}' on collection '{}'",
            ID_INDEX_NAME,
            self.collection.name()
        );
        Ok(())
    }

    fn marks_collection(&self) -> Collection<MarksOnly> {
        self.collection.clone_with_type()
    }

    /// Run a pipeline and decode each output document.
    async fn aggregate<T: DeserializeOwned + Send>(&self, pipeline: Pipeline) -> Result<Vec<T>> {
        let stages = pipeline.to_documents();
        debug!(
            "Executing aggregate on collection '{}' with {} pipeline stages",
            self.collection.name(),
            stages.len()
        );

        let cursor = self
            .collection
            .aggregate(stages)
            .await
            .map_err(|e| ExecutionError::QueryFailed(e.to_string()))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| ExecutionError::CursorError(e.to_string()))?;

        info!("Aggregation returned {} documents", documents.len());

        documents
            .into_iter()
            .map(|doc| bson::from_document(doc).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl StudentRepository for MongoStudentRepository {
    async fn insert_if_absent(&self, student: &StudentDocument) -> Result<bool> {
        // `id` comes from the equality filter on insert.
        let on_insert = doc! {
            "name": student.name.as_str(),
            "phone": student.phone.as_str(),
            "marks": bson::to_bson(&student.marks)?,
        };

        let mut options = UpdateOptions::default();
        options.upsert = Some(true);

        let result = self
            .collection
            .update_one(
                StudentFilter::Id(student.id).to_document(),
                doc! { "$setOnInsert": on_insert },
            )
            .with_options(options)
            .await
            .map_err(|e| map_insert_error(student.id, e))?;

        Ok(result.upserted_id.is_some())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let mut options = CountOptions::default();
        options.limit = Some(1);

        let count = self
            .collection
            .count_documents(StudentFilter::Id(id).to_document())
            .with_options(options)
            .await?;
        Ok(count > 0)
    }

    async fn set_phone(&self, id: i64, phone: &str) -> Result<Option<StudentDocument>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.projection = Some(student_view_projection());
        options.return_document = Some(ReturnDocument::Before);

        let previous = self
            .collection
            .find_one_and_update(
                StudentFilter::Id(id).to_document(),
                doc! { "$set": { "phone": phone } },
            )
            .with_options(options)
            .await?;
        Ok(previous)
    }

    async fn push_mark(&self, id: i64, mark: &MarkDocument) -> Result<Option<Vec<MarkDocument>>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.projection = Some(marks_only_projection());
        options.return_document = Some(ReturnDocument::After);

        let updated = self
            .marks_collection()
            .find_one_and_update(
                StudentFilter::Id(id).to_document(),
                doc! { "$push": { "marks": bson::to_bson(mark)? } },
            )
            .with_options(options)
            .await?;
        Ok(updated.map(|doc| doc.marks))
    }

    async fn delete(&self, id: i64) -> Result<Option<StudentDocument>> {
        let mut options = FindOneAndDeleteOptions::default();
        options.projection = Some(doc! { "_id": 0 });

        let removed = self
            .collection
            .find_one_and_delete(StudentFilter::Id(id).to_document())
            .with_options(options)
            .await?;
        Ok(removed)
    }

    async fn find_marks(&self, id: i64) -> Result<Option<Vec<MarkDocument>>> {
        let mut options = FindOneOptions::default();
        options.projection = Some(marks_only_projection());

        let found = self
            .marks_collection()
            .find_one(StudentFilter::Id(id).to_document())
            .with_options(options)
            .await?;
        Ok(found.map(|doc| doc.marks))
    }

    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentDocument>> {
        let mut options = FindOneOptions::default();
        options.projection = Some(student_view_projection());

        let found = self
            .collection
            .find_one(filter.to_document())
            .with_options(options)
            .await?;
        Ok(found)
    }

    async fn find_many(&self, filter: &StudentFilter) -> Result<Vec<StudentDocument>> {
        debug!("Executing find with filter: {:?}", filter);

        let mut options = FindOptions::default();
        options.projection = Some(student_view_projection());

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await
            .map_err(|e| ExecutionError::QueryFailed(e.to_string()))?;

        let students: Vec<StudentDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| ExecutionError::CursorError(e.to_string()))?;
        Ok(students)
    }

    async fn subject_marks(&self, id: i64, subject: &str) -> Result<Vec<MarkDocument>> {
        self.aggregate(analytics::subject_marks(id, subject)).await
    }

    async fn marks_between_dates(
        &self,
        id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MarkDocument>> {
        self.aggregate(analytics::marks_between_dates(id, from, to))
            .await
    }

    async fn avg_score_greater(&self, threshold: i32) -> Result<Vec<NameAvgScore>> {
        self.aggregate(analytics::avg_score_greater(threshold)).await
    }

    async fn best_students(&self, n: u32) -> Result<Vec<HighMarkCount>> {
        self.aggregate(analytics::best_students(n)).await
    }

    async fn worst_students(&self, n: u32) -> Result<Vec<ScoreTotal>> {
        self.aggregate(analytics::worst_students(n)).await
    }
}
