use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, DateTime};
use tracing::info;

use crate::error::{MarketError, Result};
use crate::models::{CollectionName, User, UserReport};
use crate::repository::{Deadline, EntityStore};

pub struct UserService {
    store: EntityStore,
}

impl UserService {
    pub fn new(store: EntityStore) -> Self {
        UserService { store }
    }

    pub async fn get_user(&self, user_id: ObjectId, deadline: Deadline) -> Result<User> {
        self.store.get(&user_id, deadline).await
    }

    /// Registers a Discord account. The uniqueness check is not atomic with
    /// the insert.
    pub async fn add_user(&self, discord_id: i64, deadline: Deadline) -> Result<User> {
        let existing = self
            .store
            .find_document_by(CollectionName::Users, doc! { "discordID": discord_id }, deadline)
            .await?;
        if existing.is_some() {
            return Err(MarketError::Conflict(format!(
                "discordID {discord_id} is already registered"
            )));
        }

        let user_id = self
            .store
            .insert(
                CollectionName::Users,
                doc! {
                    "discordID": discord_id,
                    "lastLogin": DateTime::now(),
                    "reputation": 0,
                    "admin": false,
                    "banned": Bson::Null,
                    "banNote": Bson::Null,
                    "listings": [],
                    "inquiries": [],
                    "transactions": [],
                },
                deadline,
            )
            .await?;
        info!(%user_id, discord_id, "user added");
        self.store.get(&user_id, deadline).await
    }

    pub async fn ban_user(
        &self,
        user_id: ObjectId,
        note: Option<String>,
        deadline: Deadline,
    ) -> Result<User> {
        let note = note.map_or(Bson::Null, Bson::String);
        let user: User = self
            .store
            .update_by_id(
                &user_id,
                doc! { "$set": { "banned": DateTime::now(), "banNote": note } },
                deadline,
            )
            .await?;
        info!(%user_id, "user banned");
        Ok(user)
    }

    pub async fn set_user_admin(
        &self,
        user_id: ObjectId,
        is_admin: bool,
        deadline: Deadline,
    ) -> Result<User> {
        let user: User = self
            .store
            .update_by_id(&user_id, doc! { "$set": { "admin": is_admin } }, deadline)
            .await?;
        info!(%user_id, is_admin, "user admin flag set");
        Ok(user)
    }

    /// Removes the user document only; listings and inquiries that point at
    /// it are left as they are.
    pub async fn delete_user(&self, user_id: ObjectId, deadline: Deadline) -> Result<User> {
        let user: User = self.store.take(&user_id, deadline).await?;
        info!(%user_id, "user deleted");
        Ok(user)
    }

    /// Files a report of `scumbag` by `reporter`, once per ordered pair.
    /// Neither user is checked for existence.
    pub async fn report_user(
        &self,
        reporter: ObjectId,
        scumbag: ObjectId,
        note: String,
        deadline: Deadline,
    ) -> Result<UserReport> {
        let existing = self
            .store
            .find_document_by(
                CollectionName::Reports,
                doc! { "reporter": reporter, "scumbag": scumbag },
                deadline,
            )
            .await?;
        if existing.is_some() {
            return Err(MarketError::Conflict(format!(
                "user {reporter} has already reported user {scumbag}"
            )));
        }

        let report_id = self
            .store
            .insert(
                CollectionName::Reports,
                doc! { "note": note, "reporter": reporter, "scumbag": scumbag },
                deadline,
            )
            .await?;
        info!(%report_id, %reporter, %scumbag, "user reported");
        self.store.get(&report_id, deadline).await
    }
}
