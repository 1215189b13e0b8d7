use telex_db::DbError;
use thiserror::Error;

use crate::identity::ResolveError;

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthenticated,
    Forbidden,
    Conflict,
    PersistenceFailure,
}

#[derive(Debug, Error)]
pub enum RtmError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(#[source] ResolveError),

    #[error("user {user_id} is not subscribed to channel {channel}")]
    NotSubscribed { user_id: i64, channel: String },

    #[error("user {user_id} is already subscribed to channel {channel}")]
    AlreadySubscribed { user_id: i64, channel: String },

    /// The message transaction failed and was rolled back.
    #[error("failed to persist message: {0}")]
    PersistenceFailure(#[source] DbError),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl RtmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChannelNotFound(_) => ErrorKind::NotFound,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::NotSubscribed { .. } => ErrorKind::Forbidden,
            Self::AlreadySubscribed { .. } => ErrorKind::Conflict,
            Self::PersistenceFailure(_) | Self::Storage(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl From<ResolveError> for RtmError {
    fn from(e: ResolveError) -> Self {
        match e {
            // An unreachable user table is an outage, not a bad credential.
            ResolveError::Storage(db) => Self::Storage(db),
            other => Self::Unauthenticated(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RtmError>;
