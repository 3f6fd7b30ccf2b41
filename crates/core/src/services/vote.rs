//! Vote service: the per-user, per-item vote ledger.
//!
//! Scores are always recomputed from the ledger at read time; there is no
//! cached counter to drift. Status changes on feedback never touch votes,
//! so an item that is rejected and later re-approved keeps its score.

use std::collections::HashMap;

use chrono::Utc;
use feedboard_common::{AppError, AppResult, IdGenerator};
use feedboard_db::{
    entities::{
        feedback::FeedbackStatus,
        vote::{self, VoteKind},
    },
    repositories::{FeedbackRepository, VoteRepository, VoteTallyRow},
};
use sea_orm::Set;
use serde::Serialize;

use crate::viewer::Viewer;

/// What a cast actually did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// A new ledger row was inserted.
    Added,
    /// An existing row had its direction overwritten.
    Updated,
}

/// Aggregated votes on one feedback item, as seen by one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    /// The viewer's own vote. Other users' individual votes are never
    /// exposed, only the totals.
    pub caller_vote: Option<VoteKind>,
}

/// Result of casting a vote: what happened plus the post-write tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastOutcome {
    pub action: VoteAction,
    #[serde(flatten)]
    pub tally: VoteTally,
}

/// Upvote/downvote counters folded out of tally rows.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct VoteCounts {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VoteCounts {
    pub(crate) const fn score(self) -> i64 {
        self.upvotes - self.downvotes
    }
}

/// Fold grouped tally rows into per-item counters.
pub(crate) fn fold_tally_rows(rows: Vec<VoteTallyRow>) -> HashMap<String, VoteCounts> {
    let mut counts: HashMap<String, VoteCounts> = HashMap::new();
    for row in rows {
        let entry = counts.entry(row.feedback_id).or_default();
        match row.kind {
            VoteKind::Upvote => entry.upvotes += row.count,
            VoteKind::Downvote => entry.downvotes += row.count,
        }
    }
    counts
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    feedback_repo: FeedbackRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(vote_repo: VoteRepository, feedback_repo: FeedbackRepository) -> Self {
        Self {
            vote_repo,
            feedback_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a vote on an approved feedback item.
    ///
    /// One ledger row exists per (voter, item): a repeat cast overwrites
    /// the direction in place rather than failing, so retries and direction
    /// switches are the same operation. Authors cannot vote on their own
    /// submissions.
    pub async fn cast(
        &self,
        voter_id: &str,
        feedback_id: &str,
        kind: VoteKind,
    ) -> AppResult<CastOutcome> {
        let item = self.feedback_repo.get_by_id(feedback_id).await?;

        if item.status != FeedbackStatus::Approved {
            return Err(AppError::BadRequest(
                "Feedback is not open for voting".to_string(),
            ));
        }

        if item.user_id.as_deref() == Some(voter_id) {
            return Err(AppError::Forbidden(
                "Cannot vote on your own feedback".to_string(),
            ));
        }

        let existing = self
            .vote_repo
            .find_by_voter_and_feedback(voter_id, feedback_id)
            .await?;

        let action = match existing {
            Some(vote) => {
                let mut active: vote::ActiveModel = vote.into();
                active.kind = Set(kind);
                active.updated_at = Set(Utc::now().into());
                self.vote_repo.update(active).await?;
                VoteAction::Updated
            }
            None => {
                let now = Utc::now();
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(voter_id.to_string()),
                    feedback_id: Set(feedback_id.to_string()),
                    kind: Set(kind),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                self.vote_repo.create(model).await?;
                VoteAction::Added
            }
        };

        let counts = self.counts_for(feedback_id).await?;

        tracing::debug!(
            feedback_id = %feedback_id,
            score = counts.score(),
            "vote cast"
        );

        Ok(CastOutcome {
            action,
            tally: VoteTally {
                score: counts.score(),
                upvotes: counts.upvotes,
                downvotes: counts.downvotes,
                caller_vote: Some(kind),
            },
        })
    }

    /// Retract the voter's vote from a feedback item.
    ///
    /// Deleting is idempotent at the storage layer; zero rows removed
    /// means there was no vote to retract and reports as not found, so a
    /// double-submitted retraction can never decrement twice.
    pub async fn retract(&self, voter_id: &str, feedback_id: &str) -> AppResult<VoteTally> {
        let removed = self
            .vote_repo
            .delete_by_voter_and_feedback(voter_id, feedback_id)
            .await?;

        if removed == 0 {
            return Err(AppError::VoteNotFound(feedback_id.to_string()));
        }

        let counts = self.counts_for(feedback_id).await?;

        Ok(VoteTally {
            score: counts.score(),
            upvotes: counts.upvotes,
            downvotes: counts.downvotes,
            caller_vote: None,
        })
    }

    /// Tally votes on one feedback item for the given viewer.
    pub async fn tally(&self, viewer: &Viewer, feedback_id: &str) -> AppResult<VoteTally> {
        let item = self.feedback_repo.get_by_id(feedback_id).await?;

        if !viewer.can_see(&item) {
            return Err(AppError::FeedbackNotFound(feedback_id.to_string()));
        }

        let counts = self.counts_for(feedback_id).await?;

        let caller_vote = match viewer.user_id.as_deref() {
            Some(user_id) => self
                .vote_repo
                .find_by_voter_and_feedback(user_id, feedback_id)
                .await?
                .map(|vote| vote.kind),
            None => None,
        };

        Ok(VoteTally {
            score: counts.score(),
            upvotes: counts.upvotes,
            downvotes: counts.downvotes,
            caller_vote,
        })
    }

    /// Tally votes for many feedback items at once.
    ///
    /// One grouped query covers all totals and one more fetches the
    /// viewer's own votes. Ids the viewer cannot see (or that do not
    /// exist) are absent from the map; visible items with no votes are
    /// present with zeroes.
    pub async fn tally_bulk(
        &self,
        viewer: &Viewer,
        feedback_ids: &[String],
    ) -> AppResult<HashMap<String, VoteTally>> {
        let items = self.feedback_repo.find_by_ids(feedback_ids).await?;

        let visible: Vec<String> = items
            .iter()
            .filter(|item| viewer.can_see(item))
            .map(|item| item.id.clone())
            .collect();

        if visible.is_empty() {
            return Ok(HashMap::new());
        }

        let counts = fold_tally_rows(self.vote_repo.tally_by_feedback_ids(&visible).await?);

        let mut caller_votes: HashMap<String, VoteKind> = HashMap::new();
        if let Some(user_id) = viewer.user_id.as_deref() {
            for vote in self
                .vote_repo
                .find_by_voter_for_feedback_ids(user_id, &visible)
                .await?
            {
                caller_votes.insert(vote.feedback_id, vote.kind);
            }
        }

        let mut tallies = HashMap::with_capacity(visible.len());
        for id in visible {
            let c = counts.get(&id).copied().unwrap_or_default();
            let caller_vote = caller_votes.get(&id).copied();
            tallies.insert(
                id,
                VoteTally {
                    score: c.score(),
                    upvotes: c.upvotes,
                    downvotes: c.downvotes,
                    caller_vote,
                },
            );
        }

        Ok(tallies)
    }

    async fn counts_for(&self, feedback_id: &str) -> AppResult<VoteCounts> {
        let rows = self
            .vote_repo
            .tally_by_feedback_ids(&[feedback_id.to_string()])
            .await?;

        Ok(fold_tally_rows(rows)
            .remove(feedback_id)
            .unwrap_or_default())
    }
}
