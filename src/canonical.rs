// 🔑 Canonical Key Builder - Order- and stop-word-insensitive identity keys
//
// "JOHN A SMITH", "SMITH, JOHN A", "SMITH JOHN A TRUSTEE" → "JOHN|SMITH"
//
// The key is coarser than exact matching. Two different owners
// can collide on one key; the store resolves that first-writer-wins.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::normalizer::strip_qualifier_phrases;
use crate::vocabulary::Vocabulary;

pub const KEY_SEPARATOR: &str = "|";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CANONICAL KEY BUILDER
// ============================================================================

#[derive(Debug, Clone)]
pub struct CanonicalKeyBuilder {
    vocabulary: Arc<Vocabulary>,
}

impl CanonicalKeyBuilder {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        CanonicalKeyBuilder { vocabulary }
    }

    /// Build the canonical key for a raw name.
    ///
    /// Returns `None` when nothing but stop-words remains.
    pub fn build_key(&self, raw: &str) -> Option<CanonicalKey> {
        let mut tokens: Vec<String> = tokenize(raw)
            .into_iter()
            .filter(|token| !self.vocabulary.is_stop_word(token))
            .collect();

        if tokens.is_empty() {
            return None;
        }

        tokens.sort();
        tokens.dedup();

        Some(CanonicalKey(tokens.join(KEY_SEPARATOR)))
    }
}

impl Default for CanonicalKeyBuilder {
    fn default() -> Self {
        Self::new(Arc::new(Vocabulary::standard()))
    }
}

// ============================================================================
// TOKENIZER (shared with the variant index)
// ============================================================================

/// Upper-cased alphanumeric tokens of a raw name, in original order.
///
/// - "ET AL"-style phrases and H/W markers are removed first
/// - Periods and apostrophes are deleted inside words ("L.L.C." → "LLC", "O'NEIL" → "ONEIL")
/// - Every other non-alphanumeric character separates tokens
pub fn tokenize(raw: &str) -> Vec<String> {
    let stripped = strip_qualifier_phrases(raw);

    stripped
        .chars()
        .filter(|c| *c != '.' && *c != '\'')
        .collect::<String>()
        .to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case/whitespace/punctuation-insensitive surface form, word order preserved.
///
/// "Smith,  John A." → "SMITH JOHN A"
pub fn surface_form(raw: &str) -> String {
    tokenize(raw).join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
