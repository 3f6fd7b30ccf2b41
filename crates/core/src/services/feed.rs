//! Feed service: filtered listing and helpful-first ranking.
//!
//! The feed is assembled in three fixed steps regardless of how many items
//! match: one filtered row query, one grouped vote tally, and (for signed-in
//! viewers) one caller-vote query. Ordering happens in memory afterwards so
//! the ranking contract stays independent of the storage backend.

use std::collections::HashMap;

use feedboard_common::AppResult;
use feedboard_db::{
    entities::{
        feedback::{FeedbackStatus, Sentiment},
        vote::VoteKind,
    },
    repositories::{FeedbackRepository, VoteRepository},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::services::vote::fold_tally_rows;
use crate::viewer::Viewer;

/// Hard cap on requested page sizes.
const MAX_FEED_LIMIT: u64 = 100;

/// Sort orders for the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    /// Newest first.
    #[default]
    Recent,
    /// Oldest first.
    Oldest,
    /// Highest net vote score first, newest breaking ties.
    Helpful,
}

/// Filters and paging for one feed request. Blank search and company
/// strings mean "no filter".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedQuery {
    pub search: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub company: Option<String>,
    pub sort: FeedSort,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// One entry in the assembled feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub company_name: String,
    pub company_logo: String,
    pub comment: String,
    pub sentiment: Sentiment,
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub caller_vote: Option<VoteKind>,
    pub created_at: DateTimeWithTimeZone,
    /// Present only when the viewer is an admin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeedbackStatus>,
}

/// Order feed items in place.
///
/// `Helpful` ranks by net score with newer items winning ties, so items
/// with no votes yet rank at score zero instead of dropping out.
pub fn order_items(items: &mut [FeedItem], sort: FeedSort) {
    match sort {
        FeedSort::Recent => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        FeedSort::Oldest => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        FeedSort::Helpful => items.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }
}

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    feedback_repo: FeedbackRepository,
    vote_repo: VoteRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(feedback_repo: FeedbackRepository, vote_repo: VoteRepository) -> Self {
        Self {
            feedback_repo,
            vote_repo,
        }
    }

    /// List the feed for a viewer: visibility, filters, tallies, ordering,
    /// then pagination, in that order.
    pub async fn list(&self, viewer: &Viewer, query: FeedQuery) -> AppResult<Vec<FeedItem>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());
        let company = query
            .company
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let models = self
            .feedback_repo
            .list_filtered(search, query.sentiment, company, viewer.is_admin)
            .await?;

        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
        let counts = fold_tally_rows(self.vote_repo.tally_by_feedback_ids(&ids).await?);

        let mut caller_votes: HashMap<String, VoteKind> = HashMap::new();
        if let Some(user_id) = viewer.user_id.as_deref() {
            for vote in self
                .vote_repo
                .find_by_voter_for_feedback_ids(user_id, &ids)
                .await?
            {
                caller_votes.insert(vote.feedback_id, vote.kind);
            }
        }

        let mut items: Vec<FeedItem> = models
            .into_iter()
            .map(|model| {
                let c = counts.get(&model.id).copied().unwrap_or_default();
                let caller_vote = caller_votes.get(&model.id).copied();
                FeedItem {
                    score: c.score(),
                    upvotes: c.upvotes,
                    downvotes: c.downvotes,
                    caller_vote,
                    status: viewer.is_admin.then_some(model.status),
                    id: model.id,
                    company_name: model.company_name,
                    company_logo: model.company_logo,
                    comment: model.comment,
                    sentiment: model.sentiment,
                    created_at: model.created_at,
                }
            })
            .collect();

        order_items(&mut items, query.sort);

        // Offsets past the end and oversized limits degrade gracefully.
        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| {
                usize::try_from(l.min(MAX_FEED_LIMIT)).unwrap_or(usize::MAX)
            });

        Ok(items.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use feedboard_db::entities::feedback;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn ts(secs: i64) -> DateTimeWithTimeZone {
        DateTime::from_timestamp(secs, 0).unwrap().into()
    }

    fn feed_item(id: &str, score: i64, created_secs: i64) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            company_name: "Google".to_string(),
            company_logo: "/static/logos/google.png".to_string(),
            comment: "Fine".to_string(),
            sentiment: Sentiment::Neutral,
            score,
            upvotes: score.max(0),
            downvotes: (-score).max(0),
            caller_vote: None,
            created_at: ts(created_secs),
            status: None,
        }
    }

    fn db_item(id: &str, created_secs: i64, status: FeedbackStatus) -> feedback::Model {
        feedback::Model {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            company_name: "Google".to_string(),
            company_logo: "/static/logos/google.png".to_string(),
            comment: "Fine".to_string(),
            sentiment: Sentiment::Neutral,
            status,
            created_at: ts(created_secs),
        }
    }

    fn tally_row(
        feedback_id: &str,
        kind: &str,
        count: i64,
    ) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "feedback_id" => sea_orm::Value::from(feedback_id.to_string()),
            "kind" => sea_orm::Value::from(kind.to_string()),
            "count" => sea_orm::Value::BigInt(Some(count)),
        }
    }

    #[test]
    fn test_helpful_ranks_score_then_recency() {
        // Equal scores fall back to newest-first; zero-vote items stay in.
        let mut items = vec![
            feed_item("a", 3, 10),
            feed_item("b", 3, 20),
            feed_item("c", 0, 5),
        ];

        order_items(&mut items, FeedSort::Helpful);

        let order: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn test_helpful_negative_scores_sink() {
        let mut items = vec![
            feed_item("down", -2, 50),
            feed_item("zero", 0, 1),
            feed_item("up", 1, 10),
        ];

        order_items(&mut items, FeedSort::Helpful);

        let order: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, ["up", "zero", "down"]);
    }

    #[test]
    fn test_recent_and_oldest() {
        let mut items = vec![feed_item("a", 0, 10), feed_item("b", 0, 20)];

        order_items(&mut items, FeedSort::Recent);
        assert_eq!(items[0].id, "b");

        order_items(&mut items, FeedSort::Oldest);
        assert_eq!(items[0].id, "a");
    }

    #[tokio::test]
    async fn test_list_merges_tallies() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    db_item("fb1", 20, FeedbackStatus::Approved),
                    db_item("fb2", 10, FeedbackStatus::Approved),
                ]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    tally_row("fb1", "upvote", 2),
                    tally_row("fb1", "downvote", 1),
                ]])
                .into_connection(),
        );

        let service = FeedService::new(
            FeedbackRepository::new(feedback_db),
            VoteRepository::new(vote_db),
        );

        let items = service
            .list(&Viewer::anonymous(), FeedQuery::default())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "fb1");
        assert_eq!(items[0].score, 1);
        assert_eq!(items[0].upvotes, 2);
        assert_eq!(items[0].downvotes, 1);
        assert_eq!(items[1].score, 0);
        // Anonymous viewers see no status field.
        assert_eq!(items[0].status, None);
    }

    #[tokio::test]
    async fn test_list_helpful_applies_ranking() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    db_item("a", 10, FeedbackStatus::Approved),
                    db_item("b", 20, FeedbackStatus::Approved),
                    db_item("c", 5, FeedbackStatus::Approved),
                ]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    tally_row("a", "upvote", 3),
                    tally_row("b", "upvote", 3),
                ]])
                .into_connection(),
        );

        let service = FeedService::new(
            FeedbackRepository::new(feedback_db),
            VoteRepository::new(vote_db),
        );

        let query = FeedQuery {
            sort: FeedSort::Helpful,
            ..Default::default()
        };
        let items = service.list(&Viewer::anonymous(), query).await.unwrap();

        let order: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_list_paginates_after_ordering() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    db_item("a", 10, FeedbackStatus::Approved),
                    db_item("b", 20, FeedbackStatus::Approved),
                    db_item("c", 5, FeedbackStatus::Approved),
                ]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    tally_row("c", "upvote", 9),
                    tally_row("a", "upvote", 4),
                ]])
                .into_connection(),
        );

        let service = FeedService::new(
            FeedbackRepository::new(feedback_db),
            VoteRepository::new(vote_db),
        );

        // Helpful order is [c, a, b]; the second page of size one is "a".
        let query = FeedQuery {
            sort: FeedSort::Helpful,
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        };
        let items = service.list(&Viewer::anonymous(), query).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a");
    }

    #[tokio::test]
    async fn test_list_admin_sees_status() {
        let feedback_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![db_item("fb1", 10, FeedbackStatus::Pending)]])
                .into_connection(),
        );
        let vote_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .append_query_results([Vec::<feedboard_db::entities::vote::Model>::new()])
                .into_connection(),
        );

        let admin = Viewer {
            user_id: Some("admin1".to_string()),
            is_admin: true,
        };
        let service = FeedService::new(
            FeedbackRepository::new(feedback_db),
            VoteRepository::new(vote_db),
        );

        let items = service.list(&admin, FeedQuery::default()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, Some(FeedbackStatus::Pending));
    }
}
