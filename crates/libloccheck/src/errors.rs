//! Error taxonomy for the location-list checker core.

use std::io;
use thiserror::Error;

/// Unified result type across the checker core.
pub type LocCheckResult<T> = Result<T, LocCheckError>;

/// Error cases
///
/// A failed coverage check is not an error; it is reported through
/// [`crate::validator::Verdict`].
#[derive(Debug, Error)]
pub enum LocCheckError {
    #[error("failed to read dump")]
    Io(#[from] io::Error),

    #[error("invalid line pattern")]
    Pattern(#[from] regex::Error),

    #[error("address 0x{text} does not fit in 64 bits")]
    InvalidAddress { text: String },
}
