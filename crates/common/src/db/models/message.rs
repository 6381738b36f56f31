//! Direct message between two users

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub sender_id: i64,

    pub receiver_id: i64,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Set once the receiver opens the conversation
    pub read_at: Option<DateTimeWithTimeZone>,

    /// Recalled messages are hidden from both participants
    pub recalled_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
