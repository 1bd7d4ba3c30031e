//! The module contains the errors the engine can throw.
//!
//! They fall in four families:
//!
//! - validation ([`InvalidAmount`], [`InvalidName`], [`InvalidId`],
//!   [`InvalidReference`], [`InvalidCursor`], [`InvalidTransition`]): nothing
//!   was mutated;
//! - [`KeyNotFound`]: the entity is unknown for the caller's tenants;
//! - conflicts ([`StateConflict`], [`ExistingKey`]): the request is well
//!   formed but illegal for the current state;
//! - [`Database`]: the store is unavailable.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`InvalidReference`]: EngineError::InvalidReference
//!  [`InvalidCursor`]: EngineError::InvalidCursor
//!  [`InvalidTransition`]: EngineError::InvalidTransition
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`StateConflict`]: EngineError::StateConflict
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound(_) => "not_found",
            Self::ExistingKey(_) => "already_exists",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidId(_) => "invalid_id",
            Self::InvalidReference(_) => "invalid_reference",
            Self::InvalidCursor(_) => "invalid_cursor",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::StateConflict(_) => "state_conflict",
            Self::Forbidden(_) => "forbidden",
            Self::Database(_) => "upstream",
        }
    }

    /// Returns `true` for errors raised before any mutation took place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidName(_)
                | Self::InvalidId(_)
                | Self::InvalidReference(_)
                | Self::InvalidCursor(_)
                | Self::InvalidTransition(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::StateConflict(a), Self::StateConflict(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
