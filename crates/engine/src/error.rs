//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item is missing or owned by someone else.
//! - [`ExistingKey`] thrown when a unique key (email, account number) is taken.
//! - [`Validation`] thrown when a required field is missing or malformed.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Validation`]: EngineError::Validation
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("{0} already present")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Email not sent: {0}")]
    Mail(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Mail(a), Self::Mail(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
