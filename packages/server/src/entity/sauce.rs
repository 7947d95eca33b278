use std::collections::BTreeSet;

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Set of user ids holding one vote state, stored as a JSON column.
///
/// Invariants maintained by the vote transition logic: a user id is never
/// in both of a sauce's sets at once, and each counter equals the
/// cardinality of its set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct UserIdSet(BTreeSet<i32>);

impl UserIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user_id: i32) -> bool {
        self.0.contains(&user_id)
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, user_id: i32) -> bool {
        self.0.insert(user_id)
    }

    /// Returns `true` if the id was present.
    pub fn remove(&mut self, user_id: i32) -> bool {
        self.0.remove(&user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    /// Counter value matching this set's cardinality.
    pub fn count(&self) -> i32 {
        i32::try_from(self.0.len()).unwrap_or(i32::MAX)
    }
}

impl FromIterator<i32> for UserIdSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sauce")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Creator; fixed at creation from the authenticated caller, checked on
    /// every mutation.
    pub user_id: i32,

    pub name: String,
    pub manufacturer: String,
    pub description: String,
    pub main_pepper: String,
    pub heat: i32, // 1-10

    pub image_url: String,

    pub likes: i32,
    pub dislikes: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub users_liked: UserIdSet,
    #[sea_orm(column_type = "JsonBinary")]
    pub users_disliked: UserIdSet,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
