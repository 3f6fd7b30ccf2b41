//! Core business logic for feedboard.

pub mod companies;
pub mod sentiment;
pub mod services;
pub mod viewer;

pub use services::*;
pub use viewer::Viewer;
