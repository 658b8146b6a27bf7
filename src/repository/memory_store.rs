//! In-process [`DocumentStore`]. Understands top-level equality filters and
//! the `$set`, `$push` and `$pull` update operators, which is everything the
//! marketplace issues. Faults and latency can be injected so that deadline
//! and compensation paths can be driven without a live server.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::Mutex;

use crate::error::{MarketError, Result};
use crate::models::CollectionName;
use crate::repository::document_store::DocumentStore;

/// Kind of primitive, for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Find,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<CollectionName, Vec<Document>>,
    faults: HashSet<(StoreOp, CollectionName)>,
    latency: Option<Duration>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `op` on `collection` fails until [`MemoryStore::clear_faults`].
    pub async fn fail_on(&self, op: StoreOp, collection: CollectionName) {
        self.state.lock().await.faults.insert((op, collection));
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    /// Delay applied before every call.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    pub async fn count(&self, collection: CollectionName) -> usize {
        self.state
            .lock()
            .await
            .collections
            .get(&collection)
            .map_or(0, Vec::len)
    }

    async fn enter(&self, op: StoreOp, collection: CollectionName) -> Result<()> {
        let (latency, faulted) = {
            let state = self.state.lock().await;
            (state.latency, state.faults.contains(&(op, collection)))
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if faulted {
            return Err(MarketError::Unavailable(format!(
                "injected {op:?} failure on db.{collection}"
            )));
        }
        Ok(())
    }
}

fn same_value(stored: &Bson, wanted: &Bson) -> bool {
    match (as_number(stored), as_number(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => stored == wanted,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, wanted)| match doc.get(key) {
        Some(stored) => same_value(stored, wanted),
        None => matches!(wanted, Bson::Null),
    })
}

fn apply_update(doc: &mut Document, update: &Document) -> Result<()> {
    for (operator, fields) in update {
        let fields = match fields {
            Bson::Document(fields) => fields,
            other => {
                return Err(MarketError::Unavailable(format!(
                    "{operator} expects a document, got {other}"
                )))
            }
        };
        match operator.as_str() {
            "$set" => {
                for (field, value) in fields {
                    doc.insert(field.clone(), value.clone());
                }
            }
            "$push" => {
                for (field, value) in fields {
                    match doc.get_mut(field) {
                        Some(Bson::Array(values)) => values.push(value.clone()),
                        Some(other) => {
                            return Err(MarketError::Unavailable(format!(
                                "cannot $push to non-array field {field} ({other})"
                            )))
                        }
                        None => {
                            doc.insert(field.clone(), Bson::Array(vec![value.clone()]));
                        }
                    }
                }
            }
            "$pull" => {
                for (field, value) in fields {
                    match doc.get_mut(field) {
                        Some(Bson::Array(values)) => values.retain(|v| !same_value(v, value)),
                        Some(other) => {
                            return Err(MarketError::Unavailable(format!(
                                "cannot $pull from non-array field {field} ({other})"
                            )))
                        }
                        None => {}
                    }
                }
            }
            other => {
                return Err(MarketError::Unavailable(format!(
                    "unsupported update operator {other}"
                )))
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: CollectionName,
        filter: Document,
    ) -> Result<Option<Document>> {
        self.enter(StoreOp::Find, collection).await?;
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, &filter)))
            .cloned())
    }

    async fn find_many(&self, collection: CollectionName, filter: Document) -> Result<Vec<Document>> {
        self.enter(StoreOp::Find, collection).await?;
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches(doc, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: CollectionName, mut doc: Document) -> Result<ObjectId> {
        self.enter(StoreOp::Insert, collection).await?;
        let id = match doc.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(MarketError::MalformedDocument(format!(
                    "_id must be an ObjectId, got {other}"
                )))
            }
            None => {
                let id = ObjectId::new();
                doc.insert("_id", id);
                id
            }
        };
        let mut state = self.state.lock().await;
        let docs = state.collections.entry(collection).or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&Bson::ObjectId(id))) {
            return Err(MarketError::Conflict(format!(
                "duplicate _id {id} in db.{collection}"
            )));
        }
        docs.push(doc);
        Ok(id)
    }

    async fn find_one_and_update(
        &self,
        collection: CollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>> {
        self.enter(StoreOp::Update, collection).await?;
        let mut state = self.state.lock().await;
        let Some(doc) = state
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| matches(doc, &filter)))
        else {
            return Ok(None);
        };
        let mut updated = doc.clone();
        apply_update(&mut updated, &update)?;
        *doc = updated.clone();
        Ok(Some(updated))
    }

    async fn find_one_and_delete(
        &self,
        collection: CollectionName,
        filter: Document,
    ) -> Result<Option<Document>> {
        self.enter(StoreOp::Delete, collection).await?;
        let mut state = self.state.lock().await;
        let Some(docs) = state.collections.get_mut(&collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|doc| matches(doc, &filter))
            .map(|index| docs.remove(index)))
    }

    async fn delete_one(&self, collection: CollectionName, filter: Document) -> Result<bool> {
        Ok(self.find_one_and_delete(collection, filter).await?.is_some())
    }
}
