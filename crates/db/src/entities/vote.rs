//! Vote entity for the per-user, per-item vote ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a vote.
///
/// The ledger only ever sees this two-valued enum; external encodings
/// (strings, legacy integers) are translated at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    #[sea_orm(string_value = "upvote")]
    Upvote,
    #[sea_orm(string_value = "downvote")]
    Downvote,
}

/// One row per (`user_id`, `feedback_id`) pair, enforced by a unique index.
/// A repeat cast overwrites `kind` in place instead of inserting.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub feedback_id: String,

    pub kind: VoteKind,

    pub created_at: DateTimeWithTimeZone,

    /// Refreshed whenever a repeat cast changes the kind
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::feedback::Entity",
        from = "Column::FeedbackId",
        to = "super::feedback::Column::Id",
        on_delete = "Cascade"
    )]
    Feedback,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
