// ✅ Data Quality - Invalid owner report
//
// Names that cannot be resolved never abort a run. Each one is recorded
// here with a reason and the run continues.
//
// Entries are de-duplicated on (raw, reason) and kept in first-seen order,
// so the same garbage string appearing in five date buckets is one entry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// INVALID OWNER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Neither a company signal nor a parseable person name
    Unclassified,
    /// Structured descriptor missing a required field
    IncompleteDescriptor,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Unclassified => "unclassified",
            InvalidReason::IncompleteDescriptor => "incomplete_descriptor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvalidOwner {
    pub raw: String,
    pub reason: InvalidReason,
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InvalidOwnerReport {
    entries: Vec<InvalidOwner>,
    seen: HashSet<InvalidOwner>,
}

impl InvalidOwnerReport {
    pub fn new() -> Self {
        InvalidOwnerReport::default()
    }

    /// Record an invalid owner. Returns false if it was already recorded.
    pub fn record(&mut self, raw: &str, reason: InvalidReason) -> bool {
        let entry = InvalidOwner {
            raw: raw.trim().to_string(),
            reason,
        };

        if !self.seen.insert(entry.clone()) {
            return false;
        }

        warn!(raw = %entry.raw, reason = reason.as_str(), "invalid owner");
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[InvalidOwner] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<InvalidOwner> {
        self.entries
    }

    pub fn count_by_reason(&self, reason: InvalidReason) -> usize {
        self.entries.iter().filter(|e| e.reason == reason).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Invalid owners: {} ({} unclassified, {} incomplete descriptors)",
            self.entries.len(),
            self.count_by_reason(InvalidReason::Unclassified),
            self.count_by_reason(InvalidReason::IncompleteDescriptor)
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
