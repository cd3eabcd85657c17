// 👤 Person Entity
//
// Problem solved:
// - "SMITH JOHN A", "John A. Smith", "SMITH, JOHN A" → one Person
// - A later, fuller spelling may fill in a missing middle name exactly once

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub prefix_name: Option<String>,
    pub suffix_name: Option<String>,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Person {
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            prefix_name: None,
            suffix_name: None,
        }
    }

    pub fn with_middle(mut self, middle_name: Option<String>) -> Self {
        self.middle_name = middle_name.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_prefix(mut self, prefix_name: Option<String>) -> Self {
        self.prefix_name = prefix_name.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_suffix(mut self, suffix_name: Option<String>) -> Self {
        self.suffix_name = suffix_name.filter(|s| !s.trim().is_empty());
        self
    }

    /// First letter of the middle name, upper-cased
    pub fn middle_initial(&self) -> Option<char> {
        self.middle_name
            .as_deref()
            .and_then(|m| m.chars().find(|c| c.is_alphabetic()))
            .map(|c| c.to_ascii_uppercase())
    }

    /// "Dr. John A Smith Jr."
    pub fn display_name(&self) -> String {
        [
            self.prefix_name.as_deref(),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
            self.suffix_name.as_deref(),
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Both sides carry a middle name and the initials disagree.
    pub fn middle_conflicts(&self, other: &Person) -> bool {
        match (self.middle_initial(), other.middle_initial()) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    /// Fill a missing middle name. Returns false (and changes nothing) if a
    /// middle name is already recorded.
    pub fn backfill_middle(&mut self, middle_name: &str) -> bool {
        if self.middle_name.is_some() || middle_name.trim().is_empty() {
            return false;
        }
        self.middle_name = Some(middle_name.trim().to_string());
        true
    }
}
