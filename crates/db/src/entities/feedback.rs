//! Feedback entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a feedback item.
///
/// Every item starts `pending`; only the moderation workflow moves it to one
/// of the terminal states. Public surfaces show `approved` items only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeedbackStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Sentiment tag derived from the comment text at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Sentiment {
    #[sea_orm(string_value = "positive")]
    Positive,
    #[sea_orm(string_value = "neutral")]
    #[default]
    Neutral,
    #[sea_orm(string_value = "negative")]
    Negative,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Submitting user. NULL for legacy rows that predate accounts.
    #[sea_orm(indexed, nullable)]
    pub user_id: Option<String>,

    pub company_name: String,

    /// Display URL resolved from the company catalog at submission time
    pub company_logo: String,

    #[sea_orm(column_type = "Text")]
    pub comment: String,

    /// Classified once at submission, never recomputed
    pub sentiment: Sentiment,

    /// Mutated only by the moderation workflow
    #[sea_orm(indexed)]
    pub status: FeedbackStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
