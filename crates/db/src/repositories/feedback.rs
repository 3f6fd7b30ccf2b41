//! Feedback repository.

use std::sync::Arc;

use crate::entities::{
    Feedback,
    feedback::{self, FeedbackStatus, Sentiment},
};
use feedboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};

/// One row of the per-sentiment count aggregation.
#[derive(Debug, FromQueryResult)]
pub struct SentimentCountRow {
    /// Sentiment bucket.
    pub sentiment: Sentiment,
    /// Number of approved items in the bucket.
    pub count: i64,
}

/// Feedback repository for database operations.
#[derive(Clone)]
pub struct FeedbackRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedbackRepository {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a feedback item by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<feedback::Model>> {
        Feedback::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a feedback item by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<feedback::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::FeedbackNotFound(id.to_string()))
    }

    /// Fetch multiple feedback items by ID. Missing ids are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<feedback::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Feedback::find()
            .filter(feedback::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new feedback item.
    pub async fn create(&self, model: feedback::ActiveModel) -> AppResult<feedback::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a feedback item.
    pub async fn update(&self, model: feedback::ActiveModel) -> AppResult<feedback::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List feedback matching the given filters, newest first.
    ///
    /// Filters compose with AND. The search term matches company name or
    /// comment body case-insensitively. Unless `include_all_statuses` is set
    /// (admin viewers), only approved items are returned.
    pub async fn list_filtered(
        &self,
        search: Option<&str>,
        sentiment: Option<Sentiment>,
        company: Option<&str>,
        include_all_statuses: bool,
    ) -> AppResult<Vec<feedback::Model>> {
        let mut condition = Condition::all();

        if !include_all_statuses {
            condition = condition.add(feedback::Column::Status.eq(FeedbackStatus::Approved));
        }

        if let Some(term) = search {
            let pattern = format!(
                "%{}%",
                term.to_lowercase().replace('%', "\\%").replace('_', "\\_")
            );
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(feedback::Column::CompanyName)))
                            .like(&pattern),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(feedback::Column::Comment)))
                            .like(&pattern),
                    ),
            );
        }

        if let Some(s) = sentiment {
            condition = condition.add(feedback::Column::Sentiment.eq(s));
        }

        if let Some(name) = company {
            condition = condition.add(feedback::Column::CompanyName.eq(name));
        }

        Feedback::find()
            .filter(condition)
            .order_by_desc(feedback::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's own submissions (all statuses), newest first.
    pub async fn list_by_author(&self, user_id: &str) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::UserId.eq(user_id))
            .order_by_desc(feedback::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List feedback in a given status, oldest first (moderation queue order).
    pub async fn list_by_status(
        &self,
        status: FeedbackStatus,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<feedback::Model>> {
        Feedback::find()
            .filter(feedback::Column::Status.eq(status))
            .order_by_asc(feedback::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count approved items per sentiment in a single grouped query.
    pub async fn count_by_sentiment(&self) -> AppResult<Vec<SentimentCountRow>> {
        Feedback::find()
            .select_only()
            .column(feedback::Column::Sentiment)
            .column_as(feedback::Column::Id.count(), "count")
            .filter(feedback::Column::Status.eq(FeedbackStatus::Approved))
            .group_by(feedback::Column::Sentiment)
            .into_model::<SentimentCountRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
