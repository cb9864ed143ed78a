//! Minimal error set for core-domain validation & parsing.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid token: {0:?}")]
    InvalidToken(String),

    /// Standard shape does not fit the discipline's scoring family
    /// (e.g. a single divisor on a time-based discipline).
    #[error("discipline {reference}: standard does not match scoring family {family}")]
    StandardMismatch { reference: String, family: &'static str },

    /// Standards must be finite and strictly positive (they divide or multiply scores).
    #[error("discipline {0}: standard must be finite and > 0")]
    InvalidStandard(String),

    #[error("duplicate discipline ref in catalogue: {0}")]
    DuplicateDiscipline(String),

    #[error("score must be a finite number")]
    NonFiniteScore,
}
