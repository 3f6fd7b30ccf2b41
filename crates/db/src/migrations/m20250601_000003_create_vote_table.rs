//! Create vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Vote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::FeedbackId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::Kind).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vote::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_user")
                            .from(Vote::Table, Vote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_feedback")
                            .from(Vote::Table, Vote::FeedbackId)
                            .to(Feedback::Table, Feedback::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, feedback_id) - one vote per user per item
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_user_feedback")
                    .table(Vote::Table)
                    .col(Vote::UserId)
                    .col(Vote::FeedbackId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: feedback_id (tallying votes per item)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_feedback_id")
                    .table(Vote::Table)
                    .col(Vote::FeedbackId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    UserId,
    FeedbackId,
    Kind,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
}
