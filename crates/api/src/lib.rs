//! HTTP API layer for feedboard.
//!
//! - **Endpoints**: auth, feedback, votes, and admin moderation routes
//! - **Extractors**: bearer-token authentication and viewer context
//! - **Middleware**: token resolution, logging, CORS
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
