//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod feed;
pub mod feedback;
pub mod vote;

pub use account::{AccountService, LoginOutcome, RegisterInput};
pub use feed::{FeedItem, FeedQuery, FeedService, FeedSort, order_items};
pub use feedback::{FeedbackService, FeedbackStatistics, ModerationDecision, SubmitFeedbackInput};
pub use vote::{CastOutcome, VoteAction, VoteService, VoteTally};
