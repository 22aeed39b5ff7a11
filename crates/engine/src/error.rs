//! The module contains the error the engine can throw.
//!
//! Report inputs are rejected before any computation starts: a malformed
//! date range is an [`InvalidRange`], a malformed identifier an
//! [`InvalidFilter`]. Empty report matches are **not** errors; they return
//! zeroed structures.
//!
//! [`InvalidRange`]: EngineError::InvalidRange
//! [`InvalidFilter`]: EngineError::InvalidFilter
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Payout not allowed: {0}")]
    PayoutNotAllowed(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::PayoutNotAllowed(a), Self::PayoutNotAllowed(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
