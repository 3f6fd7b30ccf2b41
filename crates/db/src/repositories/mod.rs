//! Database repositories.
//!
//! Plain query functions over the entities; no business rules live here.

mod feedback;
mod user;
mod vote;

pub use feedback::{FeedbackRepository, SentimentCountRow};
pub use user::UserRepository;
pub use vote::{VoteRepository, VoteTallyRow};
