use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;

use crate::error::Result;
use crate::models::CollectionName;

/// Single-document primitives a backend must provide. Every call touches
/// at most one document and is atomic for that document only.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: CollectionName, filter: Document)
        -> Result<Option<Document>>;

    /// Every matching document, in natural order.
    async fn find_many(&self, collection: CollectionName, filter: Document) -> Result<Vec<Document>>;

    /// Inserts `doc`, generating `_id` when it is absent.
    async fn insert_one(&self, collection: CollectionName, doc: Document) -> Result<ObjectId>;

    /// Applies an operator update (`$set`, `$push`, `$pull`) to the first
    /// match and returns the document as it is after the update.
    async fn find_one_and_update(
        &self,
        collection: CollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>>;

    async fn find_one_and_delete(
        &self,
        collection: CollectionName,
        filter: Document,
    ) -> Result<Option<Document>>;

    /// Returns whether a document was removed.
    async fn delete_one(&self, collection: CollectionName, filter: Document) -> Result<bool>;
}
