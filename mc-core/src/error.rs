//! Crate-wide error type.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error that originates in this crate: configuration, population
    /// extinction, or an I/O failure that the caller has already described.
    #[error("{0}")]
    General(String),
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
