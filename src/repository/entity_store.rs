use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, from_document, Document};

use crate::error::{MarketError, Result};
use crate::models::{CollectionName, Entity};
use crate::repository::deadline::Deadline;
use crate::repository::document_store::DocumentStore;

/// Deadline-bounded single-document reads and writes, decoding into typed
/// records at the boundary. Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct EntityStore {
    backend: Arc<dyn DocumentStore>,
}

impl EntityStore {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        EntityStore { backend }
    }

    pub async fn find_document(
        &self,
        collection: CollectionName,
        id: &ObjectId,
        deadline: Deadline,
    ) -> Result<Option<Document>> {
        deadline
            .run("find_one", self.backend.find_one(collection, doc! { "_id": *id }))
            .await
    }

    pub async fn find_document_by(
        &self,
        collection: CollectionName,
        filter: Document,
        deadline: Deadline,
    ) -> Result<Option<Document>> {
        deadline
            .run("find_one", self.backend.find_one(collection, filter))
            .await
    }

    pub async fn find_by_id<T: Entity>(&self, id: &ObjectId, deadline: Deadline) -> Result<Option<T>> {
        self.find_document(T::KIND.collection(), id, deadline)
            .await?
            .map(decode)
            .transpose()
    }

    /// Like [`EntityStore::find_by_id`], but absence is `NotFound`.
    pub async fn get<T: Entity>(&self, id: &ObjectId, deadline: Deadline) -> Result<T> {
        self.find_by_id(id, deadline)
            .await?
            .ok_or_else(|| MarketError::not_found(T::KIND.collection(), id))
    }

    pub async fn find_one_by<T: Entity>(&self, filter: Document, deadline: Deadline) -> Result<Option<T>> {
        self.find_document_by(T::KIND.collection(), filter, deadline)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn find_all<T: Entity>(&self, filter: Document, deadline: Deadline) -> Result<Vec<T>> {
        let documents = deadline
            .run("find", self.backend.find_many(T::KIND.collection(), filter))
            .await?;
        documents.into_iter().map(decode).collect()
    }

    pub async fn insert(
        &self,
        collection: CollectionName,
        document: Document,
        deadline: Deadline,
    ) -> Result<ObjectId> {
        deadline
            .run("insert_one", self.backend.insert_one(collection, document))
            .await
    }

    /// Raw find-and-update by id; `None` when no document has that id.
    pub async fn update_document(
        &self,
        collection: CollectionName,
        id: &ObjectId,
        update: Document,
        deadline: Deadline,
    ) -> Result<Option<Document>> {
        deadline
            .run(
                "find_one_and_update",
                self.backend
                    .find_one_and_update(collection, doc! { "_id": *id }, update),
            )
            .await
    }

    pub async fn update_by_id<T: Entity>(
        &self,
        id: &ObjectId,
        update: Document,
        deadline: Deadline,
    ) -> Result<T> {
        self.update_document(T::KIND.collection(), id, update, deadline)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| MarketError::not_found(T::KIND.collection(), id))
    }

    /// Atomic find-and-delete; returns the deleted snapshot.
    pub async fn take<T: Entity>(&self, id: &ObjectId, deadline: Deadline) -> Result<T> {
        let collection = T::KIND.collection();
        deadline
            .run(
                "find_one_and_delete",
                self.backend
                    .find_one_and_delete(collection, doc! { "_id": *id }),
            )
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| MarketError::not_found(collection, id))
    }

    /// Plain delete by id; returns whether anything was removed.
    pub async fn remove(
        &self,
        collection: CollectionName,
        id: &ObjectId,
        deadline: Deadline,
    ) -> Result<bool> {
        deadline
            .run(
                "delete_one",
                self.backend.delete_one(collection, doc! { "_id": *id }),
            )
            .await
    }
}

pub fn decode<T: Entity>(document: Document) -> Result<T> {
    Ok(from_document::<T>(document)?)
}
