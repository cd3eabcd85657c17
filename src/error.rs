//! Error types for owner resolution.
//!
//! Name resolution itself never fails: unparseable names become invalid-owner
//! entries. These errors cover malformed input records and configuration.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid date bucket key '{value}': expected an ISO date (YYYY-MM-DD) or \"current\"")]
    InvalidDateKey {
        value: String,
    },

    #[error("Date bucket '{key}' appears more than once")]
    DuplicateBucket {
        key: String,
    },

    #[error("Override rule '{id}' is invalid: {reason}")]
    InvalidOverrideRule {
        id: String,
        reason: String,
    },
}
