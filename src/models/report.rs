use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// One user's complaint about another. Unique per (reporter, scumbag).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserReport {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    pub note: String,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub reporter: ObjectId,
    #[serde(serialize_with = "serde_fmt::object_id")]
    pub scumbag: ObjectId,
}

impl Entity for UserReport {
    const KIND: EntityKind = EntityKind::UserReport;

    fn id(&self) -> ObjectId {
        self.id
    }
}
