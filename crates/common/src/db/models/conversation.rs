//! One row per pair of users that exchanged messages

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Smaller of the two participant ids
    pub user_low_id: i64,

    /// Larger of the two participant ids
    pub user_high_id: i64,

    pub last_message_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The participant that is not `user_id`
    pub fn peer_of(&self, user_id: i64) -> i64 {
        if self.user_low_id == user_id {
            self.user_high_id
        } else {
            self.user_low_id
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
