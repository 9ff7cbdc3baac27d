//! Patient identifiers.
//!
//! Every admission record is keyed by a [`PatientId`]: a random (v4) UUID rendered in a *canonical*
//! form of **32 lowercase hexadecimal characters** with no hyphens.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Identifiers supplied from outside (URL path segments, CLI arguments) must already be canonical;
//! [`PatientId::parse`] rejects hyphenated, uppercase or truncated input rather than normalising it,
//! so one patient can never be reachable under two different spellings.

mod id;

pub use id::PatientId;

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
