use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// Daily price statistics for one item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemMarketRecord {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    #[serde(serialize_with = "serde_fmt::datetime")]
    pub date: DateTime,
    pub avg: i64,
    pub median: i64,
    pub high: i64,
    pub low: i64,
    pub num_listings: i64,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub item: ObjectId,
}

impl Entity for ItemMarketRecord {
    const KIND: EntityKind = EntityKind::ItemMarketRecord;

    fn id(&self) -> ObjectId {
        self.id
    }
}
