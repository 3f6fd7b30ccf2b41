//! Database entities.

pub mod feedback;
pub mod user;
pub mod vote;

pub use feedback::Entity as Feedback;
pub use user::Entity as User;
pub use vote::Entity as Vote;
