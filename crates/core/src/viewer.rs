//! Request-scoped viewer context.
//!
//! Every query that depends on who is asking takes a [`Viewer`] argument
//! instead of reading ambient session state, so visibility rules live in
//! one place and are trivially testable.

use feedboard_db::entities::{
    feedback::{self, FeedbackStatus},
    user,
};

/// Identity and role of the caller for the current request.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    /// ID of the authenticated user, if any.
    pub user_id: Option<String>,
    /// Whether the caller holds the admin role.
    pub is_admin: bool,
}

impl Viewer {
    /// A viewer that is not signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            is_admin: false,
        }
    }

    /// A viewer backed by an authenticated user row.
    #[must_use]
    pub fn from_user(user: &user::Model) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            is_admin: user.is_admin,
        }
    }

    /// Whether the viewer is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether the viewer is the author of the given feedback item.
    #[must_use]
    pub fn owns(&self, item: &feedback::Model) -> bool {
        match (&self.user_id, &item.user_id) {
            (Some(viewer), Some(author)) => viewer == author,
            _ => false,
        }
    }

    /// Visibility rule for a feedback row: approved items are public,
    /// everything else is only visible to admins and to the author.
    #[must_use]
    pub fn can_see(&self, item: &feedback::Model) -> bool {
        item.status == FeedbackStatus::Approved || self.is_admin || self.owns(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use feedboard_db::entities::feedback::Sentiment;

    fn item(status: FeedbackStatus, author: Option<&str>) -> feedback::Model {
        feedback::Model {
            id: "fb1".to_string(),
            user_id: author.map(str::to_string),
            company_name: "Google".to_string(),
            company_logo: "/static/logos/google.png".to_string(),
            comment: "Solid".to_string(),
            sentiment: Sentiment::Neutral,
            status,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_approved_visible_to_everyone() {
        let approved = item(FeedbackStatus::Approved, Some("u1"));
        assert!(Viewer::anonymous().can_see(&approved));
    }

    #[test]
    fn test_pending_hidden_from_strangers() {
        let pending = item(FeedbackStatus::Pending, Some("u1"));

        let stranger = Viewer {
            user_id: Some("u2".to_string()),
            is_admin: false,
        };
        assert!(!stranger.can_see(&pending));
        assert!(!Viewer::anonymous().can_see(&pending));
    }

    #[test]
    fn test_pending_visible_to_author_and_admin() {
        let pending = item(FeedbackStatus::Pending, Some("u1"));

        let author = Viewer {
            user_id: Some("u1".to_string()),
            is_admin: false,
        };
        let admin = Viewer {
            user_id: Some("mod".to_string()),
            is_admin: true,
        };
        assert!(author.can_see(&pending));
        assert!(admin.can_see(&pending));
    }

    #[test]
    fn test_orphaned_row_not_owned() {
        // Author account deleted; user_id went NULL.
        let orphan = item(FeedbackStatus::Rejected, None);

        let viewer = Viewer {
            user_id: Some("u1".to_string()),
            is_admin: false,
        };
        assert!(!viewer.owns(&orphan));
        assert!(!viewer.can_see(&orphan));
    }
}
