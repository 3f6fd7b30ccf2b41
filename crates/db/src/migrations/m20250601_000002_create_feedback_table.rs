//! Create feedback table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedback::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedback::UserId).string_len(32))
                    .col(ColumnDef::new(Feedback::CompanyName).string_len(128).not_null())
                    .col(ColumnDef::new(Feedback::CompanyLogo).string_len(512).not_null())
                    .col(ColumnDef::new(Feedback::Comment).text().not_null())
                    .col(ColumnDef::new(Feedback::Sentiment).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Feedback::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_user")
                            .from(Feedback::Table, Feedback::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (feed and moderation queue both filter on it)
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_status")
                    .table(Feedback::Table)
                    .col(Feedback::Status)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (profile listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_user_id")
                    .table(Feedback::Table)
                    .col(Feedback::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (recent/oldest ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_created_at")
                    .table(Feedback::Table)
                    .col(Feedback::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    UserId,
    CompanyName,
    CompanyLogo,
    Comment,
    Sentiment,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
