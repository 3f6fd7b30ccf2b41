//! Feedback service: submission, visibility, moderation, statistics, export.

use std::collections::HashMap;

use feedboard_common::{AppError, AppResult, IdGenerator};
use feedboard_db::{
    entities::{
        feedback::{self, FeedbackStatus, Sentiment},
        vote::VoteKind,
    },
    repositories::{FeedbackRepository, VoteRepository},
};
use sea_orm::{ActiveEnum, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{companies, sentiment, viewer::Viewer};

/// Feedback service for business logic.
#[derive(Clone)]
pub struct FeedbackService {
    feedback_repo: FeedbackRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

/// Input for submitting feedback.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitFeedbackInput {
    #[validate(length(min = 1, max = 128))]
    pub company_name: String,

    #[validate(length(min = 1, max = 5000))]
    pub comment: String,
}

/// Terminal decision a moderator applies to a feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationDecision {
    /// Publish the item to the public feed.
    Approved,
    /// Keep the item off the feed.
    Rejected,
}

impl ModerationDecision {
    /// Parse the wire form. Anything that is not a terminal status is
    /// rejected, including `pending`.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(AppError::BadRequest(format!("Invalid decision: {other}"))),
        }
    }

    const fn as_status(self) -> FeedbackStatus {
        match self {
            Self::Approved => FeedbackStatus::Approved,
            Self::Rejected => FeedbackStatus::Rejected,
        }
    }
}

/// Totals over approved feedback, bucketed by sentiment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackStatistics {
    pub total: i64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub fn new(feedback_repo: FeedbackRepository, vote_repo: VoteRepository) -> Self {
        Self {
            feedback_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit feedback for moderation.
    ///
    /// The comment is classified into a sentiment bucket and the company
    /// logo resolved at this point; both are stored on the row. New
    /// submissions always start out pending.
    pub async fn submit(
        &self,
        author: &Viewer,
        input: SubmitFeedbackInput,
    ) -> AppResult<feedback::Model> {
        input.validate()?;

        let author_id = author.user_id.clone().ok_or(AppError::Unauthorized)?;

        let sentiment = sentiment::classify(&input.comment);
        let logo = companies::resolve_logo(&input.company_name);

        let model = feedback::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(Some(author_id)),
            company_name: Set(input.company_name),
            company_logo: Set(logo.to_string()),
            comment: Set(input.comment),
            sentiment: Set(sentiment),
            status: Set(FeedbackStatus::Pending),
            ..Default::default()
        };

        let created = self.feedback_repo.create(model).await?;

        tracing::info!(
            feedback_id = %created.id,
            company = %created.company_name,
            "feedback submitted for review"
        );

        Ok(created)
    }

    /// Fetch one feedback item, applying the viewer's visibility rules.
    ///
    /// Rows the viewer cannot see are reported as missing, so hidden and
    /// nonexistent items are indistinguishable.
    pub async fn get(&self, viewer: &Viewer, id: &str) -> AppResult<feedback::Model> {
        let item = self.feedback_repo.get_by_id(id).await?;

        if !viewer.can_see(&item) {
            return Err(AppError::FeedbackNotFound(id.to_string()));
        }

        Ok(item)
    }

    /// List the viewer's own submissions, all statuses, newest first.
    pub async fn list_by_author(&self, viewer: &Viewer) -> AppResult<Vec<feedback::Model>> {
        let author_id = viewer.user_id.as_deref().ok_or(AppError::Unauthorized)?;

        self.feedback_repo.list_by_author(author_id).await
    }

    /// List pending items awaiting review, oldest first.
    pub async fn moderation_queue(
        &self,
        viewer: &Viewer,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<feedback::Model>> {
        require_admin(viewer)?;

        self.feedback_repo
            .list_by_status(FeedbackStatus::Pending, limit, offset)
            .await
    }

    /// Apply a moderation decision to a feedback item.
    ///
    /// Re-applying the decision already in place returns the row unchanged
    /// instead of failing, so a double-submitted review form is harmless.
    /// Votes on the item are never touched by a status change.
    pub async fn moderate(
        &self,
        viewer: &Viewer,
        id: &str,
        decision: ModerationDecision,
    ) -> AppResult<feedback::Model> {
        require_admin(viewer)?;

        let item = self.feedback_repo.get_by_id(id).await?;
        let next = decision.as_status();

        if item.status == next {
            return Ok(item);
        }

        let mut active: feedback::ActiveModel = item.into();
        active.status = Set(next);

        let updated = self.feedback_repo.update(active).await?;

        tracing::info!(
            feedback_id = %updated.id,
            status = %updated.status.to_value(),
            "feedback moderated"
        );

        Ok(updated)
    }

    /// Sentiment totals over the approved feed, from one grouped query.
    pub async fn statistics(&self, viewer: &Viewer) -> AppResult<FeedbackStatistics> {
        require_admin(viewer)?;

        let rows = self.feedback_repo.count_by_sentiment().await?;

        let mut stats = FeedbackStatistics::default();
        for row in rows {
            match row.sentiment {
                Sentiment::Positive => stats.positive = row.count,
                Sentiment::Neutral => stats.neutral = row.count,
                Sentiment::Negative => stats.negative = row.count,
            }
            stats.total += row.count;
        }

        Ok(stats)
    }

    /// Export the approved feed as CSV.
    ///
    /// Vote scores come from one grouped tally pass over the exported ids.
    /// An empty feed exports as an empty document rather than a header-only
    /// file.
    pub async fn export_csv(&self, viewer: &Viewer) -> AppResult<String> {
        require_admin(viewer)?;

        let items = self
            .feedback_repo
            .list_filtered(None, None, None, false)
            .await?;

        if items.is_empty() {
            return Ok(String::new());
        }

        let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
        let mut scores: HashMap<String, i64> = HashMap::new();
        for row in self.vote_repo.tally_by_feedback_ids(&ids).await? {
            let delta = match row.kind {
                VoteKind::Upvote => row.count,
                VoteKind::Downvote => -row.count,
            };
            *scores.entry(row.feedback_id).or_insert(0) += delta;
        }

        let mut out = String::from("Company,Sentiment,Score,Comment,Created At\n");
        for item in items {
            let score = scores.get(&item.id).copied().unwrap_or(0);
            out.push_str(&csv_field(&item.company_name));
            out.push(',');
            out.push_str(&item.sentiment.to_value());
            out.push(',');
            out.push_str(&score.to_string());
            out.push(',');
            out.push_str(&csv_field(&item.comment));
            out.push(',');
            out.push_str(&item.created_at.to_rfc3339());
            out.push('\n');
        }

        Ok(out)
    }
}

fn require_admin(viewer: &Viewer) -> AppResult<()> {
    if viewer.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Admin privileges required".to_string(),
        ))
    }
}

/// Quote a CSV field per RFC 4180 when it contains a delimiter, quote, or
/// line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn admin() -> Viewer {
        Viewer {
            user_id: Some("admin1".to_string()),
            is_admin: true,
        }
    }

    fn member(id: &str) -> Viewer {
        Viewer {
            user_id: Some(id.to_string()),
            is_admin: false,
        }
    }

    fn create_test_feedback(id: &str, status: FeedbackStatus) -> feedback::Model {
        feedback::Model {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            company_name: "Google".to_string(),
            company_logo: "/static/logos/google.png".to_string(),
            comment: "Great docs".to_string(),
            sentiment: Sentiment::Positive,
            status,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_service(
        feedback_db: Arc<sea_orm::DatabaseConnection>,
        vote_db: Arc<sea_orm::DatabaseConnection>,
    ) -> FeedbackService {
        FeedbackService::new(
            FeedbackRepository::new(feedback_db),
            VoteRepository::new(vote_db),
        )
    }

    fn empty_mock() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!(
            ModerationDecision::parse("approved").unwrap(),
            ModerationDecision::Approved
        );
        assert_eq!(
            ModerationDecision::parse("rejected").unwrap(),
            ModerationDecision::Rejected
        );

        match ModerationDecision::parse("pending") {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("pending")),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[tokio::test]
    async fn test_submit_requires_author() {
        let service = create_test_service(empty_mock(), empty_mock());

        let result = service
            .submit(
                &Viewer::anonymous(),
                SubmitFeedbackInput {
                    company_name: "Google".to_string(),
                    comment: "Great".to_string(),
                },
            )
            .await;

        match result {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_comment() {
        let service = create_test_service(empty_mock(), empty_mock());

        let result = service
            .submit(
                &member("u1"),
                SubmitFeedbackInput {
                    company_name: "Google".to_string(),
                    comment: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_inserts_pending_row() {
        let stored = create_test_feedback("fb1", FeedbackStatus::Pending);

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let created = service
            .submit(
                &member("u1"),
                SubmitFeedbackInput {
                    company_name: "Google".to_string(),
                    comment: "Great docs".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.status, FeedbackStatus::Pending);
        assert_eq!(created.sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn test_get_hides_pending_from_strangers() {
        let pending = create_test_feedback("fb1", FeedbackStatus::Pending);

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let result = service.get(&member("u2"), "fb1").await;

        match result {
            Err(AppError::FeedbackNotFound(id)) => assert_eq!(id, "fb1"),
            _ => panic!("Expected FeedbackNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_get_shows_pending_to_author() {
        let pending = create_test_feedback("fb1", FeedbackStatus::Pending);

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let item = service.get(&member("u1"), "fb1").await.unwrap();

        assert_eq!(item.id, "fb1");
    }

    #[tokio::test]
    async fn test_moderation_queue_requires_admin() {
        let service = create_test_service(empty_mock(), empty_mock());

        let result = service.moderation_queue(&member("u1"), 50, 0).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_moderate_requires_admin() {
        let service = create_test_service(empty_mock(), empty_mock());

        let result = service
            .moderate(&member("u1"), "fb1", ModerationDecision::Approved)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_moderate_applies_decision() {
        let pending = create_test_feedback("fb1", FeedbackStatus::Pending);
        let approved = create_test_feedback("fb1", FeedbackStatus::Approved);

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![pending], vec![approved]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let updated = service
            .moderate(&admin(), "fb1", ModerationDecision::Approved)
            .await
            .unwrap();

        assert_eq!(updated.status, FeedbackStatus::Approved);
    }

    #[tokio::test]
    async fn test_moderate_same_decision_skips_write() {
        // Only the lookup result is mocked; an update would hit an empty
        // result set and fail the test.
        let approved = create_test_feedback("fb1", FeedbackStatus::Approved);

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[approved]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let unchanged = service
            .moderate(&admin(), "fb1", ModerationDecision::Approved)
            .await
            .unwrap();

        assert_eq!(unchanged.status, FeedbackStatus::Approved);
    }

    #[tokio::test]
    async fn test_moderate_missing_item() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feedback::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let result = service
            .moderate(&admin(), "ghost", ModerationDecision::Rejected)
            .await;

        match result {
            Err(AppError::FeedbackNotFound(id)) => assert_eq!(id, "ghost"),
            _ => panic!("Expected FeedbackNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_statistics_sums_buckets() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "sentiment" => sea_orm::Value::from("positive"),
                        "count" => sea_orm::Value::BigInt(Some(4)),
                    },
                    maplit::btreemap! {
                        "sentiment" => sea_orm::Value::from("neutral"),
                        "count" => sea_orm::Value::BigInt(Some(2)),
                    },
                    maplit::btreemap! {
                        "sentiment" => sea_orm::Value::from("negative"),
                        "count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let stats = service.statistics(&admin()).await.unwrap();

        assert_eq!(
            stats,
            FeedbackStatistics {
                total: 7,
                positive: 4,
                neutral: 2,
                negative: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_export_csv_includes_scores() {
        let mut item = create_test_feedback("fb1", FeedbackStatus::Approved);
        item.comment = "Great, but the billing UI needs work".to_string();

        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[item]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "feedback_id" => sea_orm::Value::from("fb1"),
                        "kind" => sea_orm::Value::from("upvote"),
                        "count" => sea_orm::Value::BigInt(Some(3)),
                    },
                    maplit::btreemap! {
                        "feedback_id" => sea_orm::Value::from("fb1"),
                        "kind" => sea_orm::Value::from("downvote"),
                        "count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, vote_db);
        let csv = service.export_csv(&admin()).await.unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Company,Sentiment,Score,Comment,Created At"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Google,positive,2,"));
        assert!(row.contains("\"Great, but the billing UI needs work\""));
    }

    #[tokio::test]
    async fn test_export_csv_empty_feed() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feedback::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(feedback_db, empty_mock());
        let csv = service.export_csv(&admin()).await.unwrap();

        assert!(csv.is_empty());
    }

    #[tokio::test]
    async fn test_export_csv_requires_admin() {
        let service = create_test_service(empty_mock(), empty_mock());

        let result = service.export_csv(&member("u1")).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
