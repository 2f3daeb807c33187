//! Error types for transaction intake.
//!
//! The analytics themselves are total and never fail; these errors only
//! arise while turning raw input into a [`crate::Transaction`].

use thiserror::Error;

/// A label that is not a member of the category taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("amount and description required: missing amount")]
    MissingAmount,

    #[error("amount and description required: missing description")]
    MissingDescription,

    #[error("amount must be positive, got {0}")]
    NegativeAmount(f64),

    #[error("type must be debit or credit, got {0:?}")]
    InvalidType(String),
}
