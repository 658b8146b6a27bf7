use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// A tradeable in-game item. Items are catalog data; nothing in the
/// marketplace creates or deletes them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub variations: Vec<String>,
    pub category: String,
    pub in_game_price: i64,
    pub current_avg: i64,
    pub current_median: i64,
    #[serde(default, serialize_with = "serde_fmt::object_ids")]
    pub records: Vec<ObjectId>,
    #[serde(default, serialize_with = "serde_fmt::object_ids")]
    pub listings: Vec<ObjectId>,
}

impl Entity for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> ObjectId {
        self.id
    }
}
