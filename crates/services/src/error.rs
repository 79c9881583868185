//! Shared error types for the services crate.

use thiserror::Error;

use guide_core::model::{CompletionStatus, InputError};

/// Errors returned to the presentation layer by a guide session.
///
/// Persistence failures never appear here; they are logged and dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GuideError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error("reward is locked: {} of {} challenges complete", .0.completed_count, .0.quota)]
    RewardLocked(CompletionStatus),
    #[error("guide session is no longer running")]
    SessionClosed,
}
