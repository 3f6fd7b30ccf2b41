//! Vote repository.

use std::sync::Arc;

use crate::entities::{
    Vote,
    vote::{self, VoteKind},
};
use feedboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect,
};

/// One row of the grouped vote tally: how many votes of one kind a
/// feedback item has.
#[derive(Debug, FromQueryResult)]
pub struct VoteTallyRow {
    /// Feedback item the votes belong to.
    pub feedback_id: String,
    /// Vote direction.
    pub kind: VoteKind,
    /// Number of votes of this kind.
    pub count: i64,
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a voter's vote on a feedback item, if any.
    pub async fn find_by_voter_and_feedback(
        &self,
        user_id: &str,
        feedback_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::FeedbackId.eq(feedback_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an existing vote (direction switch).
    pub async fn update(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a voter's vote on a feedback item, returning the number of
    /// rows removed (0 when no vote existed).
    pub async fn delete_by_voter_and_feedback(
        &self,
        user_id: &str,
        feedback_id: &str,
    ) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::FeedbackId.eq(feedback_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Tally votes for a set of feedback items in one grouped query.
    ///
    /// Returns at most two rows per feedback id (one per vote kind); items
    /// with no votes produce no rows.
    pub async fn tally_by_feedback_ids(&self, ids: &[String]) -> AppResult<Vec<VoteTallyRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Vote::find()
            .select_only()
            .column(vote::Column::FeedbackId)
            .column(vote::Column::Kind)
            .column_as(vote::Column::Id.count(), "count")
            .filter(vote::Column::FeedbackId.is_in(ids.to_vec()))
            .group_by(vote::Column::FeedbackId)
            .group_by(vote::Column::Kind)
            .into_model::<VoteTallyRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch one voter's votes across a set of feedback items.
    pub async fn find_by_voter_for_feedback_ids(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> AppResult<Vec<vote::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::FeedbackId.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_vote(id: &str, user_id: &str, feedback_id: &str, kind: VoteKind) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            feedback_id: feedback_id.to_string(),
            kind,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_voter_and_feedback() {
        let vote = create_test_vote("v1", "u1", "fb1", VoteKind::Upvote);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_voter_and_feedback("u1", "fb1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, VoteKind::Upvote);
    }

    #[tokio::test]
    async fn test_delete_by_voter_and_feedback_counts_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let removed = repo.delete_by_voter_and_feedback("u1", "fb1").await.unwrap();

        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_tally_by_feedback_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "feedback_id" => sea_orm::Value::from("fb1"),
                        "kind" => sea_orm::Value::from("upvote"),
                        "count" => sea_orm::Value::BigInt(Some(2)),
                    },
                    maplit::btreemap! {
                        "feedback_id" => sea_orm::Value::from("fb1"),
                        "kind" => sea_orm::Value::from("downvote"),
                        "count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let rows = repo
            .tally_by_feedback_ids(&["fb1".to_string()])
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, VoteKind::Upvote);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].kind, VoteKind::Downvote);
        assert_eq!(rows[1].count, 1);
    }

    #[tokio::test]
    async fn test_tally_with_no_ids_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VoteRepository::new(db);
        let rows = repo.tally_by_feedback_ids(&[]).await.unwrap();

        assert!(rows.is_empty());
    }
}
