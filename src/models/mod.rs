//! Data models for the community site.
//!
//! These models match the frontend TypeScript interfaces so stored JSON stays
//! readable by older clients.

mod article;
mod contact;
mod event;

pub use article::*;
pub use contact::*;
pub use event::*;
