use std::sync::Arc;

use thiserror::Error;

use crate::Id;

/// Errors reported by a [`crate::DataSource`].
///
/// Errors are `Clone` because a single failed fetch is delivered to every consumer that was
/// attached to it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("record `{0}` not found")]
    NotFound(Id),
    #[error("invalid criterion for field `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },
    #[error("transport failure: {0}")]
    Transport(Arc<str>),
}

impl SourceError {
    pub fn transport(message: impl Into<Arc<str>>) -> Self {
        Self::Transport(message.into())
    }
}

/// Errors surfaced by [`crate::DataStorage`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("storage has been disposed")]
    Disposed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
