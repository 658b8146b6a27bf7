use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Complete,
    Failed,
}

/// The trade that follows an accepted listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    pub state: TransactionState,
    pub price: i64,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub buyer_reported_complete: Option<DateTime>,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub seller_reported_complete: Option<DateTime>,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub reported_failed: Option<DateTime>,
    pub note: Option<String>,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub listing: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub buyer: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub seller: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub goes_first: ObjectId,
    #[serde(serialize_with = "serde_fmt::optional_object_id")]
    pub unhappy_user: Option<ObjectId>,
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn id(&self) -> ObjectId {
        self.id
    }
}
