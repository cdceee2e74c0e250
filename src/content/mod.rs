//! Site content operations used by the HTTP handlers.
//!
//! Loads for public pages degrade to empty results when the backend fails;
//! admin saves always report failure to the caller.

mod calendar;
mod news;
mod roster;

pub use calendar::*;
pub use news::*;
pub use roster::*;

use crate::archive::ArchiveError;
use crate::db::StoreError;

/// Errors from content operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

fn require_text(value: &str, field: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        return Err(ContentError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
