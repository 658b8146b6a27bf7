use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::{serde_fmt, Entity, EntityKind};

/// A marketplace account, keyed externally by its Discord id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing)]
    pub id: ObjectId,
    #[serde(rename = "discordID")]
    pub discord_id: i64,
    #[serde(serialize_with = "serde_fmt::datetime")]
    pub last_login: DateTime,
    pub reputation: i32,
    pub admin: bool,
    #[serde(serialize_with = "serde_fmt::optional_datetime")]
    pub banned: Option<DateTime>,
    pub ban_note: Option<String>,
    #[serde(serialize_with = "serde_fmt::object_ids")]
    pub listings: Vec<ObjectId>,
    #[serde(serialize_with = "serde_fmt::object_ids")]
    pub inquiries: Vec<ObjectId>,
    #[serde(serialize_with = "serde_fmt::object_ids")]
    pub transactions: Vec<ObjectId>,
}

impl User {
    pub fn is_banned(&self) -> bool {
        self.banned.is_some()
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> ObjectId {
        self.id
    }
}
