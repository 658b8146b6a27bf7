use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::error::{MarketError, Result};
use crate::models::CollectionName;
use crate::repository::document_store::DocumentStore;

/// [`DocumentStore`] over a live MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn collection(&self, name: CollectionName) -> Collection<Document> {
        self.db.collection::<Document>(name.as_str())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_one(
        &self,
        collection: CollectionName,
        filter: Document,
    ) -> Result<Option<Document>> {
        Ok(self.collection(collection).find_one(filter, None).await?)
    }

    async fn find_many(&self, collection: CollectionName, filter: Document) -> Result<Vec<Document>> {
        let mut cursor = self.collection(collection).find(filter, None).await?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }
        Ok(documents)
    }

    async fn insert_one(&self, collection: CollectionName, doc: Document) -> Result<ObjectId> {
        let result = self.collection(collection).insert_one(doc, None).await?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id),
            other => Err(MarketError::MalformedDocument(format!(
                "db.{collection} generated a non-ObjectId key: {other}"
            ))),
        }
    }

    async fn find_one_and_update(
        &self,
        collection: CollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .collection(collection)
            .find_one_and_update(filter, update, options)
            .await?)
    }

    async fn find_one_and_delete(
        &self,
        collection: CollectionName,
        filter: Document,
    ) -> Result<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one_and_delete(filter, None)
            .await?)
    }

    async fn delete_one(&self, collection: CollectionName, filter: Document) -> Result<bool> {
        let result = self.collection(collection).delete_one(filter, None).await?;
        Ok(result.deleted_count > 0)
    }
}
