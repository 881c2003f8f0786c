//! The module contains the errors the engine can throw.
//!
//! Expected per-record reconciliation failures (missing rate, provider
//! timeout, receipt not found) are **not** errors: they are reported through
//! [`ReconcileOutcome`] messages. An [`EngineError`] is reserved for invalid
//! calls and store faults.
//!
//! [`ReconcileOutcome`]: crate::ReconcileOutcome

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Rate source error: {0}")]
    RateSource(String),
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::RateSource(a), Self::RateSource(b)) => a == b,
            (Self::Extraction(a), Self::Extraction(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
