use thiserror::Error;

use crate::models::CellId;
use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, BoardError>;

/// Failure reported by a [`DataSource`](crate::source::DataSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("data source unavailable: {message}")]
    Unavailable { message: String },

    #[error("allocation not found: {id}")]
    NotFound { id: String },

    #[error("stale write to allocation {id}: expected version {expected}, stored {actual}")]
    StaleVersion { id: String, expected: u64, actual: u64 },

    #[error("cell {cell} already holds allocation {occupant}")]
    CellOccupied { cell: CellId, occupant: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl SourceError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Failure surfaced by a [`ScheduleBoard`](crate::board::ScheduleBoard).
#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("grid failed validation with {} error(s)", .0.len())]
    InvalidGrid(Vec<ValidationError>),

    #[error("grid not loaded")]
    NotLoaded,
}
