//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when an input has a bad shape or value.
//! - [`Forbidden`] thrown when the actor lacks the required membership/role.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`InvalidState`] thrown when an operation is not legal in the current
//!   status of a transaction or chain log.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidState`]: EngineError::InvalidState
use ledger::LedgerError;
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Ledger(a), Self::Ledger(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
