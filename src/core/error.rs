//! Error types shared by every engine.

use thiserror::Error;

/// Coarse classification of a [`GameError`], used by callers that only need
/// to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientResource,
    NotFound,
    InvalidState,
    PersistenceFailure,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checksum verification failed for '{0}'")]
    Checksum(String),

    #[error("Unsupported save version {found} for '{key}' (current {current})")]
    UnsupportedVersion { key: String, found: u32, current: u32 },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Not a save export: {0}")]
    InvalidExport(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Not enough stat points: {available} available, {requested} requested")]
    InsufficientPoints { available: u32, requested: u32 },

    #[error("Army is at capacity ({capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("Inventory is full ({capacity} slots)")]
    InventoryFull { capacity: usize },

    #[error("Not enough gold: have {available}, need {requested}")]
    InsufficientGold { available: u64, requested: u64 },

    #[error("Not enough of item {id}: have {available}, need {requested}")]
    InsufficientQuantity {
        id: String,
        available: u32,
        requested: u32,
    },

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl GameError {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        GameError::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InsufficientPoints { .. }
            | GameError::CapacityExceeded { .. }
            | GameError::InventoryFull { .. }
            | GameError::InsufficientGold { .. }
            | GameError::InsufficientQuantity { .. } => ErrorKind::InsufficientResource,
            GameError::NotFound { .. } => ErrorKind::NotFound,
            GameError::InvalidSelection(_)
            | GameError::InvalidState(_)
            | GameError::MissingDependency(_) => ErrorKind::InvalidState,
            GameError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = GameError::InsufficientPoints {
            available: 1,
            requested: 3,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientResource);
        assert_eq!(
            GameError::CapacityExceeded { capacity: 5 }.kind(),
            ErrorKind::InsufficientResource
        );
        assert_eq!(GameError::not_found("soldier", 7).kind(), ErrorKind::NotFound);
        assert_eq!(
            GameError::InvalidSelection("busy".into()).kind(),
            ErrorKind::InvalidState
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(
            GameError::from(PersistenceError::from(io)).kind(),
            ErrorKind::PersistenceFailure
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = GameError::not_found("quest", "daily-1");
        assert_eq!(err.to_string(), "quest not found: daily-1");
    }
}
