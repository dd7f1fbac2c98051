//! Error taxonomy shared by the database layer and the HTTP API.
//!
//! Every failure carries a stable kind plus a human-readable reason, and
//! surfaces synchronously to the caller. Nothing here is retried; a rejected
//! call is a terminal outcome for that request.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation conflicts with existing state (resident already
    /// assigned, duplicate room number, deleting an occupied room).
    #[error("{0}")]
    Conflict(String),

    /// The target room has no free beds.
    #[error("{0}")]
    Capacity(String),

    /// The entity is not in a state that permits the operation (no active
    /// assignment, same-room transfer, capacity below occupancy).
    #[error("{0}")]
    InvalidState(String),

    /// Billing was requested for a resident with no active assignment.
    #[error("{0}")]
    Precondition(String),

    /// Input failed validation (payment amount mismatch, out-of-range
    /// capacity or fee).
    #[error("{0}")]
    Validation(String),

    /// Storage or transaction failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Stable kind string reported in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Capacity(_) => "capacity",
            Self::InvalidState(_) => "invalid_state",
            Self::Precondition(_) => "precondition",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
